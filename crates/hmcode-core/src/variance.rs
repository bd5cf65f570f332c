// ─────────────────────────────────────────────────────────────────────
// SCPN HMcode Core — Variance Engine
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! σ(R) of a linear spectrum smoothed with a spherical top-hat.
//!
//! σ²(R) = 1/(2π²) ∫ k³ P(k) W²(kR) dln k, evaluated with Simpson's rule on
//! the uniform ln k grid of a [`LinearSlice`](crate::linear::LinearSlice).
//! The k-range is exactly the range of the input table. The σ² lost above
//! k_max is bounded by continuing k³P as a power law past the last node
//! and using |W(x)| ≤ 3(1 + x)/x³:
//!
//! ```text
//! ΔΣ²(R) ≤ Δ²(k_max) 9 (1 + 1/x₀)² / ((4 - s) x₀⁴),   x₀ = k_max R
//! ```
//!
//! Radii whose bound exceeds the configured tolerance are unresolved; root
//! searches and tables start at the smallest resolved radius.

use hmcode_math::interp::{logspace, CubicSpline};
use hmcode_math::quadrature::simpson_uniform;
use hmcode_math::roots::RootFinder;
use hmcode_types::config::{SolverConfig, VarianceConfig};
use hmcode_types::error::{HmcodeError, HmcodeResult};
use std::f64::consts::PI;
use tracing::debug;

/// Below this kR the window functions use their Taylor series.
const SERIES_THRESHOLD: f64 = 1e-2;
/// Step in ln R for the finite-difference curvature of ln σ².
const CURVATURE_STEP: f64 = 1e-2;

/// Fourier transform of a unit top-hat, W(x) = 3 (sin x - x cos x) / x³.
pub fn top_hat(x: f64) -> f64 {
    if x.abs() < SERIES_THRESHOLD {
        let x2 = x * x;
        1.0 - x2 / 10.0 + x2 * x2 / 280.0 - x2 * x2 * x2 / 15120.0
    } else {
        3.0 * (x.sin() - x * x.cos()) / (x * x * x)
    }
}

/// dW/dx = 3 [(x² - 3) sin x + 3 x cos x] / x⁴.
pub fn top_hat_derivative(x: f64) -> f64 {
    if x.abs() < SERIES_THRESHOLD {
        let x2 = x * x;
        -x / 5.0 + x * x2 / 70.0 - x * x2 * x2 / 2520.0
    } else {
        3.0 * ((x * x - 3.0) * x.sin() + 3.0 * x * x.cos()) / (x * x * x * x)
    }
}

/// 1D linear displacement dispersion, σ_v² = 1/(6π²) ∫ P(k) dk.
pub fn displacement_dispersion(k: &[f64], power: &[f64], dlnk: f64) -> f64 {
    let integrand: Vec<f64> = k.iter().zip(power).map(|(k, p)| k * p).collect();
    (simpson_uniform(&integrand, dlnk) / (6.0 * PI * PI)).sqrt()
}

/// Scales derived from σ(R) at one redshift.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarianceSummary {
    /// σ(8 Mpc/h).
    pub sigma8: f64,
    /// σ(R_nl) = 1.
    pub r_nl: f64,
    pub n_eff_nl: f64,
    /// d² ln σ² / d ln R² at R_nl.
    pub curvature_nl: f64,
    /// σ(r_collapse) = δ_c.
    pub r_collapse: f64,
    pub n_eff_collapse: f64,
}

/// Direct quadrature of σ(R) and its logarithmic slope.
#[derive(Debug, Clone)]
pub struct VarianceEngine {
    k: Vec<f64>,
    /// k³ P(k) / (2π²)
    weight: Vec<f64>,
    dlnk: f64,
}

impl VarianceEngine {
    /// `k` must be uniform in ln k with spacing `dlnk`.
    pub fn new(k: &[f64], power: &[f64], dlnk: f64) -> HmcodeResult<Self> {
        if k.len() != power.len() || k.len() < 4 {
            return Err(HmcodeError::configuration(format!(
                "variance needs >= 4 matching samples, got {} k and {} P",
                k.len(),
                power.len()
            )));
        }
        if !(dlnk > 0.0) {
            return Err(HmcodeError::configuration(format!(
                "variance needs a positive ln k spacing, got {dlnk}"
            )));
        }
        let weight = k
            .iter()
            .zip(power)
            .map(|(k, p)| k * k * k * p / (2.0 * PI * PI))
            .collect();
        Ok(VarianceEngine {
            k: k.to_vec(),
            weight,
            dlnk,
        })
    }

    pub fn sigma_squared(&self, r: f64) -> f64 {
        let integrand: Vec<f64> = self
            .k
            .iter()
            .zip(&self.weight)
            .map(|(k, w)| {
                let window = top_hat(k * r);
                w * window * window
            })
            .collect();
        simpson_uniform(&integrand, self.dlnk)
    }

    pub fn sigma(&self, r: f64) -> f64 {
        self.sigma_squared(r).sqrt()
    }

    /// d ln σ² / d ln R, from the analytic window derivative.
    pub fn dlnsigma2_dlnr(&self, r: f64) -> f64 {
        let integrand: Vec<f64> = self
            .k
            .iter()
            .zip(&self.weight)
            .map(|(k, w)| {
                let x = k * r;
                2.0 * w * top_hat(x) * top_hat_derivative(x) * x
            })
            .collect();
        simpson_uniform(&integrand, self.dlnk) / self.sigma_squared(r)
    }

    /// Effective spectral index n_eff = -3 - d ln σ² / d ln R.
    pub fn n_eff(&self, r: f64) -> f64 {
        -3.0 - self.dlnsigma2_dlnr(r)
    }

    pub fn curvature(&self, r: f64) -> f64 {
        let up = self.dlnsigma2_dlnr(r * CURVATURE_STEP.exp());
        let down = self.dlnsigma2_dlnr(r * (-CURVATURE_STEP).exp());
        (up - down) / (2.0 * CURVATURE_STEP)
    }

    /// Upper bound on the σ² missing above k_max, relative to σ²(R).
    pub fn truncation_error(&self, r: f64) -> f64 {
        let n = self.k.len();
        let (w_last, w_prev) = (self.weight[n - 1], self.weight[n - 2]);
        if !(w_last > 0.0) {
            return 0.0;
        }
        let slope = (w_last / w_prev).ln() / self.dlnk;
        if !(slope < 4.0) {
            return f64::INFINITY;
        }
        let x0 = self.k[n - 1] * r;
        let mut tail = 9.0 * (1.0 + 1.0 / x0).powi(2) / ((4.0 - slope) * x0.powi(4));
        if slope < 0.0 {
            // W² ≤ 1
            tail = tail.min(-1.0 / slope);
        }
        w_last * tail / self.sigma_squared(r)
    }

    /// Smallest radius in `variance`'s range whose truncation bound meets
    /// `variance.truncation_tolerance`.
    pub fn resolved_radius(
        &self,
        variance: &VarianceConfig,
        solver: &SolverConfig,
        finder: &dyn RootFinder,
    ) -> HmcodeResult<f64> {
        let tolerance = variance.truncation_tolerance;
        let (r_min, r_max) = (variance.r_min, variance.r_max);
        if self.truncation_error(r_min) <= tolerance {
            return Ok(r_min);
        }
        let worst = self.truncation_error(r_max);
        if !(worst <= tolerance) {
            return Err(HmcodeError::configuration(format!(
                "linear table k_max = {:e} h/Mpc leaves σ² truncated by {worst:.3e} even at \
                 R = {r_max:e} Mpc/h (tolerance {tolerance:e})",
                self.k[self.k.len() - 1]
            )));
        }
        let objective = |ln_r: f64| (self.truncation_error(ln_r.exp()) / tolerance).ln();
        let ln_r = finder
            .solve(&objective, (r_min.ln(), r_max.ln()), solver.root_tolerance)
            .map_err(|e| e.into_hmcode("resolved radius"))?;
        let r = (ln_r + solver.root_tolerance).exp().clamp(r_min, r_max);
        debug!(
            r_resolved = r,
            k_max = self.k[self.k.len() - 1],
            "σ(R) resolved above truncation radius"
        );
        Ok(r)
    }

    /// Radius at which σ(R) = `target`, searched in ln R between the
    /// smallest resolved radius and `variance.r_max`. `quantity` names the
    /// scale in error messages.
    pub fn radius_at_sigma(
        &self,
        target: f64,
        quantity: &'static str,
        variance: &VarianceConfig,
        solver: &SolverConfig,
        finder: &dyn RootFinder,
    ) -> HmcodeResult<f64> {
        let r_min = self.resolved_radius(variance, solver, finder)?;
        self.radius_in_range(target, quantity, r_min, variance, solver, finder)
    }

    fn radius_in_range(
        &self,
        target: f64,
        quantity: &'static str,
        r_min: f64,
        variance: &VarianceConfig,
        solver: &SolverConfig,
        finder: &dyn RootFinder,
    ) -> HmcodeResult<f64> {
        let r_max = variance.r_max;
        let (sigma_small_r, sigma_large_r) = (self.sigma(r_min), self.sigma(r_max));
        if !(target <= sigma_small_r && target >= sigma_large_r) {
            return Err(HmcodeError::convergence(
                quantity,
                0,
                format!(
                    "σ(R) root-find did not bracket {quantity} in range [{r_min:e}, {r_max:e}] \
                     (σ spans [{sigma_large_r:.4e}, {sigma_small_r:.4e}], target {target})"
                ),
            ));
        }
        let ln_target = target.ln();
        let objective = |ln_r: f64| 0.5 * self.sigma_squared(ln_r.exp()).ln() - ln_target;
        let ln_r = finder
            .solve(&objective, (r_min.ln(), r_max.ln()), solver.root_tolerance)
            .map_err(|e| e.into_hmcode(quantity))?;
        let r = ln_r.exp();
        let achieved = self.sigma(r);
        if (achieved / target - 1.0).abs() > variance.sigma_tolerance {
            return Err(HmcodeError::convergence(
                quantity,
                solver.max_iterations,
                format!(
                    "σ({r:e}) = {achieved} misses target {target} by more than {:e}",
                    variance.sigma_tolerance
                ),
            ));
        }
        Ok(r)
    }

    /// σ8, R_nl and the collapse scale σ(R) = δ_c with their slopes.
    pub fn summary(
        &self,
        delta_c: f64,
        variance: &VarianceConfig,
        solver: &SolverConfig,
        finder: &dyn RootFinder,
    ) -> HmcodeResult<VarianceSummary> {
        let r_min = self.resolved_radius(variance, solver, finder)?;
        let r_nl = self.radius_in_range(1.0, "R_nl", r_min, variance, solver, finder)?;
        let r_collapse =
            self.radius_in_range(delta_c, "collapse radius", r_min, variance, solver, finder)?;
        Ok(VarianceSummary {
            sigma8: self.sigma(8.0),
            r_nl,
            n_eff_nl: self.n_eff(r_nl),
            curvature_nl: self.curvature(r_nl),
            r_collapse,
            n_eff_collapse: self.n_eff(r_collapse),
        })
    }

    /// Tabulate σ(R) on a log grid over the resolved radii for fast
    /// repeated lookups.
    pub fn table(
        &self,
        variance: &VarianceConfig,
        solver: &SolverConfig,
        finder: &dyn RootFinder,
    ) -> HmcodeResult<VarianceTable> {
        let r_min = self.resolved_radius(variance, solver, finder)?;
        let radii = logspace(r_min, variance.r_max, variance.n_r);
        let sigma: Vec<f64> = radii.iter().map(|r| self.sigma(*r)).collect();
        if let Some(w) = sigma.windows(2).find(|w| w[1] > w[0]) {
            return Err(HmcodeError::configuration(format!(
                "σ(R) must decrease with R, found {} -> {}",
                w[0], w[1]
            )));
        }
        if sigma.iter().any(|s| !(s.is_finite() && *s > 0.0)) {
            return Err(HmcodeError::configuration(
                "σ(R) must be positive and finite over the radius table",
            ));
        }
        let ln_sigma = CubicSpline::new(
            radii.iter().map(|r| r.ln()).collect(),
            sigma.iter().map(|s| s.ln()).collect(),
        )
        .map_err(|e| e.into_hmcode("variance table"))?;
        Ok(VarianceTable {
            r_min,
            r_max: variance.r_max,
            ln_sigma,
        })
    }
}

/// Spline of ln σ against ln R. Read-only once built.
#[derive(Debug, Clone)]
pub struct VarianceTable {
    r_min: f64,
    r_max: f64,
    ln_sigma: CubicSpline,
}

impl VarianceTable {
    pub fn r_min(&self) -> f64 {
        self.r_min
    }

    pub fn r_max(&self) -> f64 {
        self.r_max
    }

    pub fn sigma(&self, r: f64) -> HmcodeResult<f64> {
        if !(r >= self.r_min && r <= self.r_max) {
            return Err(HmcodeError::domain("radius", r, self.r_min, self.r_max));
        }
        Ok(self.ln_sigma.eval(r.ln()).exp())
    }

    /// d ln σ / d ln R.
    pub fn dlnsigma_dlnr(&self, r: f64) -> HmcodeResult<f64> {
        if !(r >= self.r_min && r <= self.r_max) {
            return Err(HmcodeError::domain("radius", r, self.r_min, self.r_max));
        }
        Ok(self.ln_sigma.derivative(r.ln()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmcode_math::interp::logspace;
    use hmcode_math::roots::Brent;

    /// Power law P ∝ k^n with a Gaussian cutoff, uniform in ln k.
    fn engine(n: f64) -> VarianceEngine {
        let k = logspace(1e-4, 1e2, 1025);
        let dlnk = (1e2f64 / 1e-4).ln() / 1024.0;
        let p: Vec<f64> = k
            .iter()
            .map(|k| 2e4 * k.powf(n) * (-(k / 20.0).powi(2)).exp())
            .collect();
        VarianceEngine::new(&k, &p, dlnk).unwrap()
    }

    #[test]
    fn test_window_series_matches_closed_form() {
        for x in [0.0099f64, 0.0101, 0.5, 3.0] {
            let closed = 3.0 * (x.sin() - x * x.cos()) / (x * x * x);
            assert!((top_hat(x) - closed).abs() < 1e-9);
        }
        for x in [0.005f64, 0.5, 3.0] {
            let h = 1e-5;
            let fd = (top_hat(x + h) - top_hat(x - h)) / (2.0 * h);
            assert!((top_hat_derivative(x) - fd).abs() < 1e-7);
        }
        let x: f64 = 0.0101;
        assert!((top_hat_derivative(x) - (-x / 5.0 + x * x * x / 70.0)).abs() < 1e-8);
        assert_eq!(top_hat(0.0), 1.0);
        assert_eq!(top_hat_derivative(0.0), 0.0);
    }

    #[test]
    fn test_sigma_decreasing() {
        let e = engine(-1.5);
        let radii = logspace(0.01, 100.0, 40);
        let sigmas: Vec<f64> = radii.iter().map(|r| e.sigma(*r)).collect();
        assert!(sigmas.windows(2).all(|w| w[1] < w[0]));
    }

    #[test]
    fn test_power_law_slope() {
        // For P ∝ k^n well inside the sampled range, n_eff = n.
        let e = engine(-1.5);
        let n_eff = e.n_eff(10.0);
        assert!((n_eff + 1.5).abs() < 0.005, "n_eff = {n_eff}");
    }

    #[test]
    fn test_slope_matches_finite_difference() {
        let e = engine(-2.0);
        let r = 2.0;
        let h: f64 = 1e-4;
        let fd =
            (e.sigma_squared(r * h.exp()).ln() - e.sigma_squared(r * (-h).exp()).ln()) / (2.0 * h);
        assert!((fd - e.dlnsigma2_dlnr(r)).abs() < 1e-6);
    }

    #[test]
    fn test_radius_at_sigma_hits_target() {
        let e = engine(-1.5);
        let variance = VarianceConfig::default();
        let solver = SolverConfig::default();
        let r = e
            .radius_at_sigma(1.0, "R_nl", &variance, &solver, &Brent::default())
            .unwrap();
        assert!((e.sigma(r) - 1.0).abs() < variance.sigma_tolerance);
    }

    #[test]
    fn test_unbracketed_target_names_range() {
        let e = engine(-1.5);
        let err = e
            .radius_at_sigma(
                1e9,
                "R_nl",
                &VarianceConfig::default(),
                &SolverConfig::default(),
                &Brent::default(),
            )
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("did not bracket R_nl in range"), "{message}");
        assert!(matches!(err, HmcodeError::Convergence { quantity: "R_nl", .. }));
    }

    #[test]
    fn test_table_agrees_with_direct() {
        let e = engine(-1.5);
        let table = e
            .table(&VarianceConfig::default(), &SolverConfig::default(), &Brent::default())
            .unwrap();
        for r in [0.01, 0.37, 5.0, 60.0] {
            let direct = e.sigma(r);
            assert!((table.sigma(r).unwrap() / direct - 1.0).abs() < 1e-4);
        }
        assert!(table.sigma(2e3).is_err());
        assert!(table.dlnsigma_dlnr(1.0).unwrap() < 0.0);
    }

    /// Pure power law, still rising at k_max.
    fn truncated(k_max: f64, n_k: usize) -> VarianceEngine {
        let k = logspace(1e-4, k_max, n_k);
        let dlnk = (k_max / 1e-4).ln() / (n_k - 1) as f64;
        let p: Vec<f64> = k.iter().map(|k| 2e4 * k.powf(-1.5)).collect();
        VarianceEngine::new(&k, &p, dlnk).unwrap()
    }

    #[test]
    fn test_truncation_bound_covers_missing_tail() {
        let e = truncated(1e2, 1025);
        let full = truncated(1e5, 16385);
        for r in [0.05, 0.2, 0.5] {
            let lost = full.sigma_squared(r) / e.sigma_squared(r) - 1.0;
            let bound = e.truncation_error(r);
            assert!(lost > 0.0 && lost < bound, "R = {r}: lost {lost}, bound {bound}");
        }
        assert!(e.truncation_error(0.01) > e.truncation_error(0.1));
    }

    #[test]
    fn test_unresolved_radii_rejected() {
        let e = truncated(1e2, 1025);
        let variance = VarianceConfig::default();
        let solver = SolverConfig::default();
        let finder = Brent::default();
        let r = e.resolved_radius(&variance, &solver, &finder).unwrap();
        assert!(r > 0.4 && r < 0.7, "r = {r}");
        assert!(e.truncation_error(r) <= variance.truncation_tolerance);

        let table = e.table(&variance, &solver, &finder).unwrap();
        assert_eq!(table.r_min(), r);
        assert!(table.sigma(r).is_ok());
        assert!(matches!(
            table.sigma(variance.r_min),
            Err(HmcodeError::Domain { .. })
        ));
        assert!(matches!(
            table.dlnsigma_dlnr(0.5 * r),
            Err(HmcodeError::Domain { .. })
        ));

        // σ = 100 sits near R = 0.3, inside the truncated region.
        let err = e
            .radius_at_sigma(100.0, "collapse radius", &variance, &solver, &finder)
            .unwrap_err();
        assert!(matches!(err, HmcodeError::Convergence { .. }), "{err}");
    }

    #[test]
    fn test_displacement_dispersion_analytic() {
        // ∫ A exp(-k) dk over [0, ∞) ≈ A when the grid covers the support.
        let k = logspace(1e-6, 60.0, 4097);
        let dlnk = (60.0f64 / 1e-6).ln() / 4096.0;
        let p: Vec<f64> = k.iter().map(|k| 6.0 * PI * PI * (-k).exp()).collect();
        let sv = displacement_dispersion(&k, &p, dlnk);
        assert!((sv - 1.0).abs() < 1e-5);
    }
}
