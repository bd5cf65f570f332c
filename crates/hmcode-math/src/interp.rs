//! One-dimensional interpolation on strictly increasing abscissae.
//!
//! Natural cubic splines and piecewise-linear interpolation. Evaluation
//! outside `[x_min, x_max]` continues the end polynomial; callers that must
//! not extrapolate check [`CubicSpline::contains`] first.

use crate::error::NumericalError;

/// Natural cubic spline (zero second derivative at both ends).
#[derive(Debug, Clone, PartialEq)]
pub struct CubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    /// Second derivatives at the knots.
    m: Vec<f64>,
}

impl CubicSpline {
    /// Build the spline. Needs >= 2 finite knots with strictly increasing x.
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Result<Self, NumericalError> {
        check_knots(&x, &y)?;
        let n = x.len();
        let mut m = vec![0.0; n];

        if n > 2 {
            // Moment equations for the interior knots, Thomas sweep.
            // h[i-1] m[i-1] + 2 (h[i-1] + h[i]) m[i] + h[i] m[i+1] = rhs[i]
            let interior = n - 2;
            let mut c_prime = vec![0.0; interior];
            let mut d_prime = vec![0.0; interior];
            for j in 0..interior {
                let i = j + 1;
                let h_lo = x[i] - x[i - 1];
                let h_hi = x[i + 1] - x[i];
                let rhs = 6.0 * ((y[i + 1] - y[i]) / h_hi - (y[i] - y[i - 1]) / h_lo);
                let diag = 2.0 * (h_lo + h_hi);
                if j == 0 {
                    c_prime[j] = h_hi / diag;
                    d_prime[j] = rhs / diag;
                } else {
                    let den = diag - h_lo * c_prime[j - 1];
                    c_prime[j] = h_hi / den;
                    d_prime[j] = (rhs - h_lo * d_prime[j - 1]) / den;
                }
            }
            m[interior] = d_prime[interior - 1];
            for j in (0..interior - 1).rev() {
                m[j + 1] = d_prime[j] - c_prime[j] * m[j + 2];
            }
        }

        Ok(CubicSpline { x, y, m })
    }

    pub fn x_min(&self) -> f64 {
        self.x[0]
    }

    pub fn x_max(&self) -> f64 {
        self.x[self.x.len() - 1]
    }

    pub fn contains(&self, x: f64) -> bool {
        x >= self.x_min() && x <= self.x_max()
    }

    pub fn knots(&self) -> (&[f64], &[f64]) {
        (&self.x, &self.y)
    }

    fn segment(&self, x: f64) -> (usize, f64, f64, f64) {
        let i = locate(&self.x, x);
        let h = self.x[i + 1] - self.x[i];
        let a = (self.x[i + 1] - x) / h;
        let b = (x - self.x[i]) / h;
        (i, h, a, b)
    }

    pub fn eval(&self, x: f64) -> f64 {
        let (i, h, a, b) = self.segment(x);
        a * self.y[i]
            + b * self.y[i + 1]
            + ((a * a * a - a) * self.m[i] + (b * b * b - b) * self.m[i + 1]) * h * h / 6.0
    }

    /// First derivative dy/dx.
    pub fn derivative(&self, x: f64) -> f64 {
        let (i, h, a, b) = self.segment(x);
        (self.y[i + 1] - self.y[i]) / h - (3.0 * a * a - 1.0) / 6.0 * h * self.m[i]
            + (3.0 * b * b - 1.0) / 6.0 * h * self.m[i + 1]
    }
}

fn check_knots(x: &[f64], y: &[f64]) -> Result<(), NumericalError> {
    if x.len() != y.len() {
        return Err(NumericalError::InvalidGrid(format!(
            "{} abscissae but {} ordinates",
            x.len(),
            y.len()
        )));
    }
    if x.len() < 2 {
        return Err(NumericalError::InvalidGrid(format!(
            "need at least 2 knots, got {}",
            x.len()
        )));
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(NumericalError::InvalidGrid("non-finite knot".to_string()));
    }
    if x.windows(2).any(|w| w[1] <= w[0]) {
        return Err(NumericalError::InvalidGrid(
            "abscissae must be strictly increasing".to_string(),
        ));
    }
    Ok(())
}

/// Index `i` of the interval `[x[i], x[i+1]]` holding `xq`, clamped to
/// the first/last interval. `x` must have at least 2 entries.
pub fn locate(x: &[f64], xq: f64) -> usize {
    let n = x.len();
    debug_assert!(n >= 2, "locate needs at least 2 points");
    x.partition_point(|&v| v <= xq).clamp(1, n - 1) - 1
}

/// Piecewise-linear interpolation; clamps to the end intervals.
pub fn linear_interp(x: &[f64], y: &[f64], xq: f64) -> f64 {
    let i = locate(x, xq);
    let t = (xq - x[i]) / (x[i + 1] - x[i]);
    y[i] * (1.0 - t) + y[i + 1] * t
}

/// `n` points log-spaced between `lo` and `hi` inclusive.
pub fn logspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    let (l0, l1) = (lo.ln(), hi.ln());
    match n {
        0 => Vec::new(),
        1 => vec![lo],
        _ => (0..n)
            .map(|i| {
                if i == 0 {
                    lo
                } else if i == n - 1 {
                    hi
                } else {
                    (l0 + (l1 - l0) * i as f64 / (n - 1) as f64).exp()
                }
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spline_reproduces_knots() {
        let x: Vec<f64> = (0..12).map(|i| i as f64 * 0.7).collect();
        let y: Vec<f64> = x.iter().map(|v| v.sin()).collect();
        let s = CubicSpline::new(x.clone(), y.clone()).unwrap();
        for (xi, yi) in x.iter().zip(&y) {
            assert!((s.eval(*xi) - yi).abs() < 1e-12, "knot {xi}");
        }
    }

    #[test]
    fn test_spline_linear_data_exact() {
        let x = vec![0.0, 0.3, 1.1, 2.0, 3.7];
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v - 1.0).collect();
        let s = CubicSpline::new(x, y).unwrap();
        for q in [0.1, 0.9, 1.5, 3.2] {
            assert!((s.eval(q) - (2.0 * q - 1.0)).abs() < 1e-12);
            assert!((s.derivative(q) - 2.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_spline_smooth_function_accuracy() {
        let x: Vec<f64> = (0..101).map(|i| i as f64 * 0.05).collect();
        let y: Vec<f64> = x.iter().map(|v| (-v).exp()).collect();
        let s = CubicSpline::new(x, y).unwrap();
        let q: f64 = 2.525;
        assert!((s.eval(q) - (-q).exp()).abs() < 1e-6);
        assert!((s.derivative(q) + (-q).exp()).abs() < 1e-4);
    }

    #[test]
    fn test_two_knot_spline_is_linear() {
        let s = CubicSpline::new(vec![1.0, 3.0], vec![2.0, 6.0]).unwrap();
        assert!((s.eval(2.0) - 4.0).abs() < 1e-14);
        assert!(s.contains(3.0));
        assert!(!s.contains(3.0001));
    }

    #[test]
    fn test_spline_rejects_bad_knots() {
        assert!(CubicSpline::new(vec![0.0, 1.0, 1.0], vec![0.0; 3]).is_err());
        assert!(CubicSpline::new(vec![0.0], vec![0.0]).is_err());
        assert!(CubicSpline::new(vec![0.0, 1.0], vec![0.0, f64::NAN]).is_err());
        assert!(CubicSpline::new(vec![0.0, 1.0], vec![0.0]).is_err());
    }

    #[test]
    fn test_locate_edges() {
        let x = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(locate(&x, -1.0), 0);
        assert_eq!(locate(&x, 0.0), 0);
        assert_eq!(locate(&x, 1.0), 1);
        assert_eq!(locate(&x, 2.5), 2);
        assert_eq!(locate(&x, 3.0), 2);
        assert_eq!(locate(&x, 9.0), 2);
    }

    #[test]
    fn test_linear_interp_midpoint() {
        let x = [0.0, 2.0, 4.0];
        let y = [1.0, 5.0, -3.0];
        assert!((linear_interp(&x, &y, 1.0) - 3.0).abs() < 1e-14);
        assert!((linear_interp(&x, &y, 3.0) - 1.0).abs() < 1e-14);
    }

    #[test]
    fn test_logspace_endpoints_exact() {
        let v = logspace(1e-4, 1e2, 61);
        assert_eq!(v.len(), 61);
        assert_eq!(v[0], 1e-4);
        assert_eq!(v[60], 1e2);
        assert!((v[30] - 0.1).abs() < 1e-12);
    }
}
