// ─────────────────────────────────────────────────────────────────────
// SCPN HMcode Core — Fitted Halo-Model Parameters
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! HMcode-2020 calibration (Mead et al. 2021, arXiv:2009.01858, Table 2).
//!
//! Each free parameter is a power law in the cold-matter σ8(z), except α
//! which depends on n_eff at the collapse scale. The forms are fits, not
//! derived quantities. One strategy exists per [`ModelVariant`]; all share
//! the published table unless constructed with another.

use hmcode_types::cosmology::ModelVariant;

/// `amplitude * sigma8^exponent`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerLaw {
    pub amplitude: f64,
    pub exponent: f64,
}

impl PowerLaw {
    pub const fn new(amplitude: f64, exponent: f64) -> Self {
        PowerLaw {
            amplitude,
            exponent,
        }
    }

    pub fn at(&self, sigma8: f64) -> f64 {
        self.amplitude * sigma8.powf(self.exponent)
    }
}

/// Coefficients of one calibration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationTable {
    /// Two-halo damping amplitude f.
    pub f_damp: PowerLaw,
    /// Two-halo damping wavenumber k_d [h/Mpc].
    pub k_d: PowerLaw,
    pub n_d: f64,
    /// One-halo damping wavenumber k_* [h/Mpc].
    pub k_star: PowerLaw,
    /// Halo bloating η.
    pub eta: PowerLaw,
    /// Concentration amplitude B.
    pub b_conc: f64,
    /// α = alpha_amplitude * alpha_base^n_eff
    pub alpha_amplitude: f64,
    pub alpha_base: f64,
}

pub const HMCODE_2020: CalibrationTable = CalibrationTable {
    f_damp: PowerLaw::new(0.2696, 0.9403),
    k_d: PowerLaw::new(0.05699, -1.089),
    n_d: 2.853,
    k_star: PowerLaw::new(0.05618, -1.013),
    eta: PowerLaw::new(0.1281, -0.3644),
    b_conc: 5.196,
    alpha_amplitude: 1.875,
    alpha_base: 1.603,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FittedParameters {
    pub f_damp: f64,
    pub k_d: f64,
    pub n_d: f64,
    pub k_star: f64,
    pub eta: f64,
    pub b_conc: f64,
    pub alpha: f64,
}

/// Maps (σ8, n_eff) to the free halo-model parameters. Implementations
/// must be pure.
pub trait HaloModelCalibration: Send + Sync {
    fn variant(&self) -> ModelVariant;

    fn table(&self) -> &CalibrationTable;

    fn parameters(&self, sigma8: f64, n_eff: f64) -> FittedParameters {
        let t = self.table();
        FittedParameters {
            f_damp: t.f_damp.at(sigma8),
            k_d: t.k_d.at(sigma8),
            n_d: t.n_d,
            k_star: t.k_star.at(sigma8),
            eta: t.eta.at(sigma8),
            b_conc: t.b_conc,
            alpha: t.alpha_amplitude * t.alpha_base.powf(n_eff),
        }
    }

    /// Multiplier of the one-halo integral. Only cold matter sits in haloes.
    fn one_halo_weight(&self, _f_nu: f64) -> f64 {
        1.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LcdmCalibration {
    pub table: CalibrationTable,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaCdmCalibration {
    pub table: CalibrationTable,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeutrinoCalibration {
    pub table: CalibrationTable,
}

impl Default for LcdmCalibration {
    fn default() -> Self {
        LcdmCalibration { table: HMCODE_2020 }
    }
}

impl Default for WaCdmCalibration {
    fn default() -> Self {
        WaCdmCalibration { table: HMCODE_2020 }
    }
}

impl Default for NeutrinoCalibration {
    fn default() -> Self {
        NeutrinoCalibration { table: HMCODE_2020 }
    }
}

impl HaloModelCalibration for LcdmCalibration {
    fn variant(&self) -> ModelVariant {
        ModelVariant::Lcdm
    }

    fn table(&self) -> &CalibrationTable {
        &self.table
    }
}

impl HaloModelCalibration for WaCdmCalibration {
    fn variant(&self) -> ModelVariant {
        ModelVariant::WaCdm
    }

    fn table(&self) -> &CalibrationTable {
        &self.table
    }
}

impl HaloModelCalibration for NeutrinoCalibration {
    fn variant(&self) -> ModelVariant {
        ModelVariant::MassiveNeutrino
    }

    fn table(&self) -> &CalibrationTable {
        &self.table
    }

    fn one_halo_weight(&self, f_nu: f64) -> f64 {
        (1.0 - f_nu).powi(2)
    }
}

/// Default strategy for a cosmology's variant tag.
pub fn calibration_for(variant: ModelVariant) -> Box<dyn HaloModelCalibration> {
    match variant {
        ModelVariant::Lcdm => Box::new(LcdmCalibration::default()),
        ModelVariant::WaCdm => Box::new(WaCdmCalibration::default()),
        ModelVariant::MassiveNeutrino => Box::new(NeutrinoCalibration::default()),
    }
}
