// ─────────────────────────────────────────────────────────────────────
// SCPN HMcode Core — Linear Growth
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Linear growth factor g(a), accumulated growth G(a) and growth rate f(a).
//!
//! Integrates, in t = ln a,
//!
//! ```text
//! g'' + (2 + dlnH/dlna) g' - 1.5 Ω_m(a) g = 0,     G' = g
//! ```
//!
//! from a_initial with g = g' = G = a_initial (matter domination), so that
//! G(a) = ∫ g(a')/a' da'. Neutrinos are treated as cold matter here.
//! The table is immutable once built and safe to share between threads.

use crate::background::Background;
use hmcode_math::interp::CubicSpline;
use hmcode_math::ode::{DormandPrince, OdeIntegrator, OdeSystem};
use hmcode_types::config::GrowthConfig;
use hmcode_types::cosmology::{scale_factor_from_redshift, CosmologicalParameters};
use hmcode_types::error::{HmcodeError, HmcodeResult};
use tracing::{debug, warn};

struct GrowthEquations<'a> {
    background: &'a Background,
}

impl OdeSystem<3> for GrowthEquations<'_> {
    fn derivatives(&self, ln_a: f64, y: &[f64; 3]) -> [f64; 3] {
        let a = ln_a.exp();
        let friction = 2.0 + self.background.dlnh_dlna(a);
        let source = 1.5 * self.background.omega_m_at(a);
        [y[1], source * y[0] - friction * y[1], y[0]]
    }
}

/// Interpolated growth history between `a_initial` and a = 1.
#[derive(Debug, Clone)]
pub struct GrowthTable {
    a_min: f64,
    ln_g: CubicSpline,
    ln_big_g: CubicSpline,
    rate: CubicSpline,
    /// g(a = 1), the normalisation of [`GrowthTable::growth`].
    g_today: f64,
}

impl GrowthTable {
    /// Build with the adaptive Dormand-Prince integrator.
    pub fn build(cosmology: &CosmologicalParameters, config: &GrowthConfig) -> HmcodeResult<Self> {
        Self::build_with(cosmology, config, &DormandPrince::default())
    }

    pub fn build_with<I: OdeIntegrator>(
        cosmology: &CosmologicalParameters,
        config: &GrowthConfig,
        integrator: &I,
    ) -> HmcodeResult<Self> {
        let background = Background::new(cosmology)?;
        let a_min = config.a_initial;
        if !(a_min > 0.0 && a_min < 1.0) || config.steps < 4 {
            return Err(HmcodeError::configuration(format!(
                "growth table needs 0 < a_initial < 1 and >= 4 nodes, got a_initial={}, steps={}",
                a_min, config.steps
            )));
        }

        let n = config.steps;
        let ln_a_min = a_min.ln();
        let ln_a: Vec<f64> = (0..n)
            .map(|i| {
                if i == n - 1 {
                    0.0
                } else {
                    ln_a_min * (1.0 - i as f64 / (n - 1) as f64)
                }
            })
            .collect();

        let system = GrowthEquations {
            background: &background,
        };
        let states = integrator
            .integrate(&system, [a_min, a_min, a_min], &ln_a)
            .map_err(|e| e.into_hmcode("linear growth"))?;

        let g: Vec<f64> = states.iter().map(|y| y[0]).collect();
        let big_g: Vec<f64> = states.iter().map(|y| y[2]).collect();
        let f: Vec<f64> = states.iter().map(|y| y[1] / y[0]).collect();

        if g.iter().any(|v| *v <= 0.0)
            || g.windows(2).any(|w| w[1] <= w[0])
            || big_g.windows(2).any(|w| w[1] <= w[0])
        {
            return Err(HmcodeError::configuration(
                "linear growth g(a) and G(a) must increase monotonically with a",
            ));
        }
        if let Some((i, rate)) = f
            .iter()
            .enumerate()
            .find(|(_, rate)| !(0.0..=1.0).contains(*rate))
        {
            warn!(
                a = ln_a[i].exp(),
                growth_rate = *rate,
                "growth rate outside [0, 1]"
            );
        }

        let to_hmcode = |e: hmcode_math::error::NumericalError| e.into_hmcode("linear growth");
        let ln_g = CubicSpline::new(ln_a.clone(), g.iter().map(|v| v.ln()).collect())
            .map_err(to_hmcode)?;
        let ln_big_g = CubicSpline::new(ln_a.clone(), big_g.iter().map(|v| v.ln()).collect())
            .map_err(to_hmcode)?;
        let rate = CubicSpline::new(ln_a, f).map_err(to_hmcode)?;
        let g_today = ln_g.eval(0.0).exp();

        debug!(
            a_min,
            nodes = n,
            g_today,
            variant = %cosmology.variant(),
            "growth table built"
        );
        Ok(GrowthTable {
            a_min,
            ln_g,
            ln_big_g,
            rate,
            g_today,
        })
    }

    pub fn a_min(&self) -> f64 {
        self.a_min
    }

    pub fn a_max(&self) -> f64 {
        1.0
    }

    fn ln_a(&self, a: f64) -> HmcodeResult<f64> {
        if a >= self.a_min && a <= 1.0 {
            Ok(a.ln())
        } else {
            Err(HmcodeError::domain("scale factor", a, self.a_min, 1.0))
        }
    }

    /// Growth factor normalised to 1 at a = 1.
    pub fn growth(&self, a: f64) -> HmcodeResult<f64> {
        Ok(self.growth_unnormalized(a)? / self.g_today)
    }

    /// Growth factor with g → a deep in matter domination.
    pub fn growth_unnormalized(&self, a: f64) -> HmcodeResult<f64> {
        Ok(self.ln_g.eval(self.ln_a(a)?).exp())
    }

    /// G(a) = ∫ g(a')/a' da', same normalisation as `growth_unnormalized`.
    pub fn accumulated_growth(&self, a: f64) -> HmcodeResult<f64> {
        Ok(self.ln_big_g.eval(self.ln_a(a)?).exp())
    }

    /// f = d ln g / d ln a.
    pub fn growth_rate(&self, a: f64) -> HmcodeResult<f64> {
        Ok(self.rate.eval(self.ln_a(a)?))
    }

    /// Normalised growth at redshift `z`.
    pub fn growth_at_redshift(&self, z: f64) -> HmcodeResult<f64> {
        self.growth(scale_factor_from_redshift(z))
    }
}
