// ─────────────────────────────────────────────────────────────────────
// SCPN HMcode Core — Cosmology
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Cosmological parameter set, model-variant tag and cache fingerprint.
//!
//! Densities are fractions of the critical density today. Neutrino density
//! follows Ω_ν h² = Σm_ν / 93.14 eV. Dark energy uses the CPL equation of
//! state w(a) = w0 + wa (1 - a). Curvature closes the budget:
//! Ω_k = 1 - Ω_m - Ω_w.

use crate::constants::{NEUTRINO_MASS_DENSITY_EV, T_CMB_DEFAULT};
use crate::error::{HmcodeError, HmcodeResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// |Ω_k| below this is snapped to exact flatness.
pub const FLATNESS_TOLERANCE: f64 = 1e-8;

/// Largest curvature magnitude accepted.
pub const MAX_ABS_OMEGA_K: f64 = 0.5;

/// Immutable description of a cosmology.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CosmologicalParameters {
    /// Cold dark matter density Ω_c.
    pub omega_c: f64,
    /// Baryon density Ω_b.
    pub omega_b: f64,
    /// Dark-energy density Ω_w.
    pub omega_w: f64,
    /// Dimensionless Hubble rate h = H0 / (100 km/s/Mpc).
    pub h: f64,
    /// Primordial spectral index.
    pub n_s: f64,
    /// Sum of neutrino masses [eV].
    #[serde(default)]
    pub m_nu: f64,
    #[serde(default = "default_w0")]
    pub w0: f64,
    #[serde(default)]
    pub wa: f64,
    /// CMB temperature [K].
    #[serde(default = "default_t_cmb")]
    pub t_cmb: f64,
}

fn default_w0() -> f64 {
    -1.0
}
fn default_t_cmb() -> f64 {
    T_CMB_DEFAULT
}

/// Calibration variant selected from the cosmology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelVariant {
    /// Flat or curved Λ (w = -1), massless neutrinos.
    Lcdm,
    /// Evolving dark energy, massless neutrinos.
    WaCdm,
    /// Massive neutrinos, any dark energy.
    MassiveNeutrino,
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelVariant::Lcdm => "LCDM",
            ModelVariant::WaCdm => "w(a)CDM",
            ModelVariant::MassiveNeutrino => "massive-neutrino",
        };
        f.write_str(name)
    }
}

/// Bit-exact key identifying a parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CosmologyFingerprint([u64; 9]);

impl CosmologicalParameters {
    /// Flat ΛCDM with massless neutrinos.
    pub fn flat_lcdm(omega_m: f64, omega_b: f64, h: f64, n_s: f64) -> Self {
        CosmologicalParameters {
            omega_c: omega_m - omega_b,
            omega_b,
            omega_w: 1.0 - omega_m,
            h,
            n_s,
            m_nu: 0.0,
            w0: -1.0,
            wa: 0.0,
            t_cmb: T_CMB_DEFAULT,
        }
    }

    /// Give the neutrinos mass `m_nu` [eV] at fixed total Ω_m (taken from Ω_c).
    pub fn with_neutrino_mass(mut self, m_nu: f64) -> Self {
        let omega_m = self.omega_m();
        self.m_nu = m_nu;
        self.omega_c = omega_m - self.omega_b - self.omega_nu();
        self
    }

    pub fn with_dark_energy(mut self, w0: f64, wa: f64) -> Self {
        self.w0 = w0;
        self.wa = wa;
        self
    }

    /// Set curvature by adjusting Ω_w.
    pub fn with_curvature(mut self, omega_k: f64) -> Self {
        self.omega_w = 1.0 - self.omega_m() - omega_k;
        self
    }

    pub fn omega_nu(&self) -> f64 {
        self.m_nu / (NEUTRINO_MASS_DENSITY_EV * self.h * self.h)
    }

    /// Total matter, neutrinos included.
    pub fn omega_m(&self) -> f64 {
        self.omega_c + self.omega_b + self.omega_nu()
    }

    /// Cold matter (CDM + baryons).
    pub fn omega_cold(&self) -> f64 {
        self.omega_c + self.omega_b
    }

    /// Curvature density, snapped to zero within [`FLATNESS_TOLERANCE`].
    pub fn omega_k(&self) -> f64 {
        let omega_k = 1.0 - self.omega_m() - self.omega_w;
        if omega_k.abs() < FLATNESS_TOLERANCE {
            0.0
        } else {
            omega_k
        }
    }

    /// Neutrino fraction of the matter density.
    pub fn f_nu(&self) -> f64 {
        self.omega_nu() / self.omega_m()
    }

    pub fn omega_m_h2(&self) -> f64 {
        self.omega_m() * self.h * self.h
    }

    pub fn omega_b_h2(&self) -> f64 {
        self.omega_b * self.h * self.h
    }

    pub fn is_lambda(&self) -> bool {
        self.w0 == -1.0 && self.wa == 0.0
    }

    pub fn variant(&self) -> ModelVariant {
        if self.m_nu > 0.0 {
            ModelVariant::MassiveNeutrino
        } else if !self.is_lambda() {
            ModelVariant::WaCdm
        } else {
            ModelVariant::Lcdm
        }
    }

    /// Flat ΛCDM sharing this cosmology's matter content.
    pub fn lcdm_reference(&self) -> Self {
        CosmologicalParameters {
            omega_w: 1.0 - self.omega_m(),
            w0: -1.0,
            wa: 0.0,
            ..*self
        }
    }

    pub fn fingerprint(&self) -> CosmologyFingerprint {
        // +0.0 folds -0.0 onto the same key
        let bits = |x: f64| (x + 0.0).to_bits();
        CosmologyFingerprint([
            bits(self.omega_c),
            bits(self.omega_b),
            bits(self.omega_w),
            bits(self.h),
            bits(self.n_s),
            bits(self.m_nu),
            bits(self.w0),
            bits(self.wa),
            bits(self.t_cmb),
        ])
    }

    /// Range checks. Background positivity is checked where E(a) is built.
    pub fn validate(&self) -> HmcodeResult<()> {
        let fields = [
            ("omega_c", self.omega_c),
            ("omega_b", self.omega_b),
            ("omega_w", self.omega_w),
            ("h", self.h),
            ("n_s", self.n_s),
            ("m_nu", self.m_nu),
            ("w0", self.w0),
            ("wa", self.wa),
            ("t_cmb", self.t_cmb),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(HmcodeError::configuration(format!(
                    "{name} must be finite, got {value}"
                )));
            }
        }
        for (name, value) in [
            ("omega_c", self.omega_c),
            ("omega_b", self.omega_b),
            ("omega_w", self.omega_w),
            ("m_nu", self.m_nu),
        ] {
            if value < 0.0 {
                return Err(HmcodeError::configuration(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }
        if self.h <= 0.0 || self.n_s <= 0.0 || self.t_cmb <= 0.0 {
            return Err(HmcodeError::configuration(format!(
                "h, n_s and t_cmb must be positive, got h={}, n_s={}, t_cmb={}",
                self.h, self.n_s, self.t_cmb
            )));
        }
        if self.omega_cold() <= 0.0 {
            return Err(HmcodeError::configuration(
                "cold matter density omega_c + omega_b must be positive",
            ));
        }
        let omega_k = self.omega_k();
        if omega_k.abs() > MAX_ABS_OMEGA_K {
            return Err(HmcodeError::configuration(format!(
                "curvature omega_k = {omega_k} exceeds closure tolerance {MAX_ABS_OMEGA_K}"
            )));
        }
        if self.w0 + self.wa >= 0.0 {
            return Err(HmcodeError::configuration(format!(
                "w0 + wa = {} must be negative for an early matter era",
                self.w0 + self.wa
            )));
        }
        Ok(())
    }
}

pub fn scale_factor_from_redshift(z: f64) -> f64 {
    1.0 / (1.0 + z)
}

pub fn redshift_from_scale_factor(a: f64) -> f64 {
    1.0 / a - 1.0
}
