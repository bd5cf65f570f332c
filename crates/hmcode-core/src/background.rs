// ─────────────────────────────────────────────────────────────────────
// SCPN HMcode Core — Background Expansion
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Homogeneous expansion history E(a) = H(a)/H0.
//!
//! E² = Ω_m a⁻³ + Ω_k a⁻² + Ω_w X(a), with the CPL equation of state
//! w(a) = w0 + wa (1 - a) and X(a) = a^{-3(1+w0+wa)} exp(-3 wa (1 - a)).
//! Massive neutrinos are counted in Ω_m as if they were cold.

use hmcode_types::cosmology::CosmologicalParameters;
use hmcode_types::error::{HmcodeError, HmcodeResult};

/// Earliest scale factor at which E² > 0 is checked.
const POSITIVITY_A_MIN: f64 = 1e-4;
const POSITIVITY_SAMPLES: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Background {
    omega_m: f64,
    omega_k: f64,
    omega_w: f64,
    w0: f64,
    wa: f64,
}

impl Background {
    pub fn new(cosmology: &CosmologicalParameters) -> HmcodeResult<Self> {
        cosmology.validate()?;
        let background = Background {
            omega_m: cosmology.omega_m(),
            omega_k: cosmology.omega_k(),
            omega_w: cosmology.omega_w,
            w0: cosmology.w0,
            wa: cosmology.wa,
        };

        let ln_min = POSITIVITY_A_MIN.ln();
        for i in 0..=POSITIVITY_SAMPLES {
            let a = (ln_min * (1.0 - i as f64 / POSITIVITY_SAMPLES as f64)).exp();
            let e2 = background.e_squared(a);
            if !(e2 > 0.0 && e2.is_finite()) {
                return Err(HmcodeError::configuration(format!(
                    "expansion rate E²(a) = {e2:e} is not positive at a = {a:.4e}"
                )));
            }
        }
        Ok(background)
    }

    pub fn omega_m(&self) -> f64 {
        self.omega_m
    }

    /// Dark-energy equation of state w(a).
    pub fn w(&self, a: f64) -> f64 {
        self.w0 + self.wa * (1.0 - a)
    }

    /// ρ_w(a)/ρ_w(1).
    pub fn dark_energy_scaling(&self, a: f64) -> f64 {
        a.powf(-3.0 * (1.0 + self.w0 + self.wa)) * (-3.0 * self.wa * (1.0 - a)).exp()
    }

    pub fn e_squared(&self, a: f64) -> f64 {
        self.omega_m / (a * a * a)
            + self.omega_k / (a * a)
            + self.omega_w * self.dark_energy_scaling(a)
    }

    pub fn hubble(&self, a: f64) -> f64 {
        self.e_squared(a).sqrt()
    }

    /// Ω_m(a) = Ω_m a⁻³ / E².
    pub fn omega_m_at(&self, a: f64) -> f64 {
        self.omega_m / (a * a * a) / self.e_squared(a)
    }

    pub fn omega_w_at(&self, a: f64) -> f64 {
        self.omega_w * self.dark_energy_scaling(a) / self.e_squared(a)
    }

    /// d ln H / d ln a.
    pub fn dlnh_dlna(&self, a: f64) -> f64 {
        let de2 = -3.0 * self.omega_m / (a * a * a)
            - 2.0 * self.omega_k / (a * a)
            - 3.0 * (1.0 + self.w(a)) * self.omega_w * self.dark_energy_scaling(a);
        0.5 * de2 / self.e_squared(a)
    }
}
