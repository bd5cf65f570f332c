// ─────────────────────────────────────────────────────────────────────
// SCPN HMcode Core — Roots
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Bracketed scalar root finders.
//!
//! Physics code talks to the [`RootFinder`] trait so tests can swap the
//! strategy. Both implementations require a sign change over the bracket
//! and stop after a fixed iteration budget.

use crate::error::NumericalError;

/// Strategy for solving f(x) = 0 on a bracket.
pub trait RootFinder: Send + Sync {
    /// Returns x with the bracket shrunk below `tolerance` (absolute, in x).
    fn solve(
        &self,
        f: &dyn Fn(f64) -> f64,
        bracket: (f64, f64),
        tolerance: f64,
    ) -> Result<f64, NumericalError>;
}

fn endpoints(
    f: &dyn Fn(f64) -> f64,
    bracket: (f64, f64),
) -> Result<(f64, f64, f64, f64), NumericalError> {
    let (lower, upper) = if bracket.0 <= bracket.1 {
        bracket
    } else {
        (bracket.1, bracket.0)
    };
    let (f_lower, f_upper) = (f(lower), f(upper));
    if !f_lower.is_finite() {
        return Err(NumericalError::NonFinite { t: lower });
    }
    if !f_upper.is_finite() {
        return Err(NumericalError::NonFinite { t: upper });
    }
    if f_lower * f_upper > 0.0 {
        return Err(NumericalError::NotBracketed {
            lower,
            upper,
            f_lower,
            f_upper,
        });
    }
    Ok((lower, upper, f_lower, f_upper))
}

/// Interval halving. Robust, linear convergence.
#[derive(Debug, Clone, Copy)]
pub struct Bisection {
    pub max_iterations: usize,
}

impl Default for Bisection {
    fn default() -> Self {
        Bisection {
            max_iterations: 200,
        }
    }
}

impl RootFinder for Bisection {
    fn solve(
        &self,
        f: &dyn Fn(f64) -> f64,
        bracket: (f64, f64),
        tolerance: f64,
    ) -> Result<f64, NumericalError> {
        let (mut lo, mut hi, f_lo, f_hi) = endpoints(f, bracket)?;
        if f_lo == 0.0 {
            return Ok(lo);
        }
        if f_hi == 0.0 {
            return Ok(hi);
        }
        let lo_negative = f_lo < 0.0;
        for _ in 0..self.max_iterations {
            let mid = 0.5 * (lo + hi);
            if hi - lo <= tolerance {
                return Ok(mid);
            }
            let f_mid = f(mid);
            if !f_mid.is_finite() {
                return Err(NumericalError::NonFinite { t: mid });
            }
            if f_mid == 0.0 {
                return Ok(mid);
            }
            if (f_mid < 0.0) == lo_negative {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        Err(NumericalError::MaxIterations {
            iterations: self.max_iterations,
            width: hi - lo,
            best: 0.5 * (lo + hi),
        })
    }
}

/// Brent's method: inverse quadratic interpolation guarded by bisection.
#[derive(Debug, Clone, Copy)]
pub struct Brent {
    pub max_iterations: usize,
}

impl Default for Brent {
    fn default() -> Self {
        Brent {
            max_iterations: 200,
        }
    }
}

impl RootFinder for Brent {
    fn solve(
        &self,
        f: &dyn Fn(f64) -> f64,
        bracket: (f64, f64),
        tolerance: f64,
    ) -> Result<f64, NumericalError> {
        let (mut a, mut b, mut fa, mut fb) = endpoints(f, bracket)?;
        if fa == 0.0 {
            return Ok(a);
        }
        if fb == 0.0 {
            return Ok(b);
        }
        let (mut c, mut fc) = (b, fb);
        let mut d = b - a;
        let mut e = d;

        for _ in 0..self.max_iterations {
            if (fb > 0.0) == (fc > 0.0) {
                c = a;
                fc = fa;
                d = b - a;
                e = d;
            }
            if fc.abs() < fb.abs() {
                a = b;
                b = c;
                c = a;
                fa = fb;
                fb = fc;
                fc = fa;
            }
            let tol1 = 2.0 * f64::EPSILON * b.abs() + 0.5 * tolerance;
            let xm = 0.5 * (c - b);
            if xm.abs() <= tol1 || fb == 0.0 {
                return Ok(b);
            }
            if e.abs() >= tol1 && fa.abs() > fb.abs() {
                let s = fb / fa;
                let mut p;
                let mut q;
                if a == c {
                    p = 2.0 * xm * s;
                    q = 1.0 - s;
                } else {
                    let qa = fa / fc;
                    let r = fb / fc;
                    p = s * (2.0 * xm * qa * (qa - r) - (b - a) * (r - 1.0));
                    q = (qa - 1.0) * (r - 1.0) * (s - 1.0);
                }
                if p > 0.0 {
                    q = -q;
                }
                p = p.abs();
                let min1 = 3.0 * xm * q - (tol1 * q).abs();
                let min2 = (e * q).abs();
                if 2.0 * p < min1.min(min2) {
                    e = d;
                    d = p / q;
                } else {
                    d = xm;
                    e = d;
                }
            } else {
                d = xm;
                e = d;
            }
            a = b;
            fa = fb;
            b += if d.abs() > tol1 {
                d
            } else {
                tol1.copysign(xm)
            };
            fb = f(b);
            if !fb.is_finite() {
                return Err(NumericalError::NonFinite { t: b });
            }
        }
        Err(NumericalError::MaxIterations {
            iterations: self.max_iterations,
            width: (c - b).abs(),
            best: b,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finders() -> Vec<Box<dyn RootFinder>> {
        vec![Box::new(Bisection::default()), Box::new(Brent::default())]
    }

    #[test]
    fn test_sqrt_two() {
        for finder in finders() {
            let root = finder.solve(&|x| x * x - 2.0, (0.0, 2.0), 1e-12).unwrap();
            assert!((root - 2f64.sqrt()).abs() < 1e-10, "root = {root}");
        }
    }

    #[test]
    fn test_reversed_bracket() {
        for finder in finders() {
            let root = finder.solve(&|x| x.cos(), (3.0, 0.0), 1e-12).unwrap();
            assert!((root - std::f64::consts::FRAC_PI_2).abs() < 1e-10);
        }
    }

    #[test]
    fn test_not_bracketed() {
        for finder in finders() {
            let err = finder
                .solve(&|x| x * x + 1.0, (-1.0, 1.0), 1e-10)
                .unwrap_err();
            assert!(matches!(err, NumericalError::NotBracketed { .. }));
        }
    }

    #[test]
    fn test_iteration_budget_enforced() {
        let finder = Bisection { max_iterations: 5 };
        let err = finder.solve(&|x| x - 0.123, (0.0, 1.0), 1e-14).unwrap_err();
        assert!(matches!(
            err,
            NumericalError::MaxIterations { iterations: 5, .. }
        ));
    }

    #[test]
    fn test_brent_fewer_evaluations_than_bisection() {
        use std::cell::Cell;
        let calls = Cell::new(0usize);
        let f = |x: f64| {
            calls.set(calls.get() + 1);
            x.exp() - 3.0
        };
        Brent::default().solve(&f, (0.0, 5.0), 1e-12).unwrap();
        let brent_calls = calls.get();
        calls.set(0);
        Bisection::default().solve(&f, (0.0, 5.0), 1e-12).unwrap();
        assert!(
            brent_calls < calls.get(),
            "brent={brent_calls} bisection={}",
            calls.get()
        );
    }

    #[test]
    fn test_root_at_endpoint() {
        for finder in finders() {
            let root = finder.solve(&|x| x - 1.0, (1.0, 4.0), 1e-10).unwrap();
            assert_eq!(root, 1.0);
        }
    }
}
