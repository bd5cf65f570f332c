// ─────────────────────────────────────────────────────────────────────
// SCPN HMcode Core — Numerical Errors
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Failures of the numerical strategies. Callers attach the physical
//! quantity when converting to [`hmcode_types::error::HmcodeError`].

use hmcode_types::error::HmcodeError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NumericalError {
    #[error("no sign change in [{lower:e}, {upper:e}] (f = {f_lower:e}, {f_upper:e})")]
    NotBracketed {
        lower: f64,
        upper: f64,
        f_lower: f64,
        f_upper: f64,
    },

    #[error("bracket still {width:e} wide after {iterations} iterations (best {best:e})")]
    MaxIterations {
        iterations: usize,
        width: f64,
        best: f64,
    },

    #[error("step budget of {steps} exhausted at t = {t:e}")]
    StepLimit { steps: usize, t: f64 },

    #[error("non-finite value encountered at t = {t:e}")]
    NonFinite { t: f64 },

    #[error("invalid grid: {0}")]
    InvalidGrid(String),
}

impl NumericalError {
    /// Iterations or steps consumed before failing.
    pub fn iterations(&self) -> usize {
        match self {
            NumericalError::MaxIterations { iterations, .. } => *iterations,
            NumericalError::StepLimit { steps, .. } => *steps,
            _ => 0,
        }
    }

    /// Attach the physical quantity being solved for.
    pub fn into_hmcode(self, quantity: &'static str) -> HmcodeError {
        match self {
            NumericalError::InvalidGrid(msg) => {
                HmcodeError::configuration(format!("{quantity}: {msg}"))
            }
            other => HmcodeError::convergence(quantity, other.iterations(), other.to_string()),
        }
    }
}
