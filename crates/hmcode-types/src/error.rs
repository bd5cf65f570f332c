// ─────────────────────────────────────────────────────────────────────
// SCPN HMcode Core — Errors
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HmcodeError {
    /// Argument outside a tabulated or valid range. Nothing is extrapolated.
    #[error("Domain error: {quantity} requested at {value:e}, outside [{min:e}, {max:e}]")]
    Domain {
        quantity: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Root-find or iterative solve failed within its iteration budget.
    #[error("Convergence error: {quantity} not solved after {iterations} iterations: {message}")]
    Convergence {
        quantity: &'static str,
        iterations: usize,
        message: String,
    },

    /// Inconsistent/unphysical parameters or unsupported k-range.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HmcodeError {
    pub fn domain(quantity: &'static str, value: f64, min: f64, max: f64) -> Self {
        HmcodeError::Domain {
            quantity,
            value,
            min,
            max,
        }
    }

    pub fn convergence(
        quantity: &'static str,
        iterations: usize,
        message: impl Into<String>,
    ) -> Self {
        HmcodeError::Convergence {
            quantity,
            iterations,
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        HmcodeError::Configuration(message.into())
    }
}

pub type HmcodeResult<T> = Result<T, HmcodeError>;
