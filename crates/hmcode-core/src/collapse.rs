// ─────────────────────────────────────────────────────────────────────
// SCPN HMcode Core — Spherical Collapse
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Collapse threshold δ_c, virial overdensity Δ_v, the Dolag concentration
//! correction and halo formation epochs.
//!
//! The Mead (2017, arXiv:1606.05345) fits take x = g/a and y = G/a from the
//! growth table, where g → a in matter domination:
//!
//! ```text
//! δ_c = δ_c0 (1 - 0.041 f_ν) [1 + f(x, y; p1) log10 Ω_m(z) + f(x, y; p2)]
//! Δ_v = Δ_v0 (1 + 0.763 f_ν) [1 + f(x, y; p3) log10 Ω_m(z) + f(x, y; p4) log10² Ω_m(z)]
//! f(x, y; p) = p0 + p1 (1 - x) + p2 (1 - x)² + p3 (1 - y)
//! ```

use crate::background::Background;
use crate::growth::GrowthTable;
use hmcode_math::roots::RootFinder;
use hmcode_types::config::{CollapseConfig, CollapseFit};
use hmcode_types::constants::{DELTA_C_EDS, DELTA_V_EDS};
use hmcode_types::cosmology::scale_factor_from_redshift;
use hmcode_types::error::{HmcodeError, HmcodeResult};

const DC_LOG_TERM: [f64; 4] = [-0.0069, -0.0208, 0.0312, 0.0021];
const DC_CONST_TERM: [f64; 4] = [0.0001, -0.0647, -0.0417, 0.0646];
const DV_LOG_TERM: [f64; 4] = [-0.79, -10.17, 2.51, 6.51];
const DV_LOG2_TERM: [f64; 4] = [-1.89, 0.38, 18.8, -15.87];

/// δ_c response to the neutrino fraction.
const DC_NEUTRINO_SLOPE: f64 = 0.041;
/// Δ_v response to the neutrino fraction.
const DV_NEUTRINO_SLOPE: f64 = 0.763;

fn mead_polynomial(x: f64, y: f64, p: [f64; 4]) -> f64 {
    p[0] + p[1] * (1.0 - x) + p[2] * (1.0 - x).powi(2) + p[3] * (1.0 - y)
}

/// Mead (2017) δ_c. `g` and `big_g` use the g → a normalisation.
pub fn delta_c_mead(a: f64, omega_m_z: f64, f_nu: f64, g: f64, big_g: f64) -> f64 {
    let (x, y) = (g / a, big_g / a);
    let correction = 1.0
        + mead_polynomial(x, y, DC_LOG_TERM) * omega_m_z.log10()
        + mead_polynomial(x, y, DC_CONST_TERM);
    DELTA_C_EDS * (1.0 - DC_NEUTRINO_SLOPE * f_nu) * correction
}

/// Mead (2017) Δ_v relative to the mean matter density.
pub fn delta_v_mead(a: f64, omega_m_z: f64, f_nu: f64, g: f64, big_g: f64) -> f64 {
    let (x, y) = (g / a, big_g / a);
    let log_om = omega_m_z.log10();
    let correction = 1.0
        + mead_polynomial(x, y, DV_LOG_TERM) * log_om
        + mead_polynomial(x, y, DV_LOG2_TERM) * log_om * log_om;
    DELTA_V_EDS * (1.0 + DV_NEUTRINO_SLOPE * f_nu) * correction
}

/// Nakamura & Suto (1997) ΛCDM δ_c.
pub fn delta_c_nakamura_suto(omega_m_z: f64) -> f64 {
    DELTA_C_EDS * (1.0 + 0.012299 * omega_m_z.log10())
}

/// Bryan & Norman (1998) ΛCDM Δ_v, converted to mean-matter units.
pub fn delta_v_bryan_norman(omega_m_z: f64) -> f64 {
    let x = omega_m_z - 1.0;
    (DELTA_V_EDS + 82.0 * x - 39.0 * x * x) / omega_m_z
}

/// δ_c(a) and Δ_v(a) for one cosmology.
pub struct SphericalCollapse<'a> {
    background: Background,
    growth: &'a GrowthTable,
    f_nu: f64,
    fit: CollapseFit,
}

impl<'a> SphericalCollapse<'a> {
    pub fn new(
        background: Background,
        growth: &'a GrowthTable,
        f_nu: f64,
        fit: CollapseFit,
    ) -> Self {
        SphericalCollapse {
            background,
            growth,
            f_nu,
            fit,
        }
    }

    pub fn delta_c(&self, a: f64) -> HmcodeResult<f64> {
        let omega_m_z = self.background.omega_m_at(a);
        match self.fit {
            CollapseFit::Mead2017 => Ok(delta_c_mead(
                a,
                omega_m_z,
                self.f_nu,
                self.growth.growth_unnormalized(a)?,
                self.growth.accumulated_growth(a)?,
            )),
            CollapseFit::LcdmFits => Ok(delta_c_nakamura_suto(omega_m_z)),
        }
    }

    pub fn delta_v(&self, a: f64) -> HmcodeResult<f64> {
        let omega_m_z = self.background.omega_m_at(a);
        match self.fit {
            CollapseFit::Mead2017 => Ok(delta_v_mead(
                a,
                omega_m_z,
                self.f_nu,
                self.growth.growth_unnormalized(a)?,
                self.growth.accumulated_growth(a)?,
            )),
            CollapseFit::LcdmFits => Ok(delta_v_bryan_norman(omega_m_z)),
        }
    }
}

/// Dolag et al. (2004) concentration factor
/// [D(z∞) / D_ΛCDM(z∞)]^exponent, with both growth factors normalised
/// today. `reference` is `None` when the cosmology is its own flat ΛCDM
/// reference, in which case the factor is exactly 1.
pub fn dolag_factor(
    growth: &GrowthTable,
    reference: Option<&GrowthTable>,
    config: &CollapseConfig,
) -> HmcodeResult<f64> {
    match reference {
        None => Ok(1.0),
        Some(reference) => {
            let a_inf = scale_factor_from_redshift(config.z_infinity);
            let ratio = growth.growth(a_inf)? / reference.growth(a_inf)?;
            Ok(ratio.powf(config.dolag_exponent))
        }
    }
}

/// Bullock et al. (2001) formation epochs: the scale factor a_f at which
/// a fraction of the halo mass had collapsed, D(a_f) σ(fM) / D(a) = δ_c.
pub struct FormationSolver<'a> {
    growth: &'a GrowthTable,
    finder: &'a dyn RootFinder,
    tolerance: f64,
}

impl<'a> FormationSolver<'a> {
    pub fn new(growth: &'a GrowthTable, finder: &'a dyn RootFinder, tolerance: f64) -> Self {
        FormationSolver {
            growth,
            finder,
            tolerance,
        }
    }

    /// `sigma_formation` is σ(R(fM)) of the linear spectrum at scale factor
    /// `a`. Returns `a` itself when the halo is still forming. A halo that
    /// formed before the growth table starts has no root in range and is a
    /// convergence error.
    pub fn formation_scale_factor(
        &self,
        a: f64,
        sigma_formation: f64,
        delta_c: f64,
    ) -> HmcodeResult<f64> {
        let growth_now = self.growth.growth(a)?;
        let target = growth_now * delta_c / sigma_formation;
        if target >= growth_now {
            return Ok(a);
        }
        let a_min = self.growth.a_min();
        let growth_min = self.growth.growth(a_min)?;
        if target <= growth_min {
            return Err(HmcodeError::convergence(
                "formation redshift",
                0,
                format!(
                    "D(a_f) = {target:.4e} lies below D(a_min = {a_min:e}) = {growth_min:.4e}; \
                     σ(fM) = {sigma_formation:.4e} collapses before the growth table starts"
                ),
            ));
        }
        let objective = |ln_a: f64| match self.growth.growth(ln_a.exp()) {
            Ok(d) => d - target,
            Err(_) => f64::NAN,
        };
        let ln_af = self
            .finder
            .solve(&objective, (a_min.ln(), a.ln()), self.tolerance)
            .map_err(|e| e.into_hmcode("formation redshift"))?;
        Ok(ln_af.exp().clamp(a_min, a))
    }
}
