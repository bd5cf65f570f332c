// ─────────────────────────────────────────────────────────────────────
// SCPN HMcode Core — Property-Based Tests (proptest) for hmcode-math
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for hmcode-math using proptest.
//!
//! Covers: cubic splines, quadrature, root finders, Gaussian smoothing,
//! sine/cosine integrals.

use hmcode_math::interp::{logspace, CubicSpline};
use hmcode_math::quadrature::{simpson, simpson_uniform, trapezoid};
use hmcode_math::roots::{Bisection, Brent, RootFinder};
use hmcode_math::smoothing::gaussian_filter_1d;
use hmcode_math::special::sine_cosine_integrals;
use proptest::prelude::*;

// ── Spline Properties ────────────────────────────────────────────────

proptest! {
    /// A spline passes through every knot.
    #[test]
    fn spline_interpolates_knots(n in 4usize..40, phase in 0.0f64..3.0) {
        let x: Vec<f64> = (0..n).map(|i| i as f64 * 0.3).collect();
        let y: Vec<f64> = x.iter().map(|v| (v + phase).sin()).collect();
        let spline = CubicSpline::new(x.clone(), y.clone()).unwrap();
        for (xi, yi) in x.iter().zip(&y) {
            prop_assert!((spline.eval(*xi) - yi).abs() < 1e-12);
        }
    }

    /// Straight lines are reproduced exactly between knots.
    #[test]
    fn spline_reproduces_lines(slope in -5.0f64..5.0, offset in -5.0f64..5.0, t in 0.0f64..1.0) {
        let x: Vec<f64> = (0..12).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| slope * v + offset).collect();
        let spline = CubicSpline::new(x, y).unwrap();
        let xq = 11.0 * t;
        prop_assert!((spline.eval(xq) - (slope * xq + offset)).abs() < 1e-9);
        prop_assert!((spline.derivative(xq) - slope).abs() < 1e-9);
    }

    /// logspace hits both endpoints exactly and is increasing.
    #[test]
    fn logspace_endpoints(lo_exp in -6.0f64..0.0, span in 0.5f64..8.0, n in 2usize..300) {
        let lo = 10f64.powf(lo_exp);
        let hi = 10f64.powf(lo_exp + span);
        let grid = logspace(lo, hi, n);
        prop_assert_eq!(grid.len(), n);
        prop_assert_eq!(grid[0], lo);
        prop_assert_eq!(grid[n - 1], hi);
        prop_assert!(grid.windows(2).all(|w| w[1] > w[0]));
    }
}

// ── Quadrature Properties ────────────────────────────────────────────

proptest! {
    /// Simpson is exact for cubics on any uniform grid with >= 4 samples.
    #[test]
    fn simpson_exact_for_cubics(n in 4usize..60, c3 in -2.0f64..2.0, c1 in -2.0f64..2.0) {
        let dx = 1.0 / (n - 1) as f64;
        let y: Vec<f64> = (0..n).map(|i| {
            let x = i as f64 * dx;
            c3 * x * x * x + c1 * x
        }).collect();
        let exact = c3 / 4.0 + c1 / 2.0;
        prop_assert!((simpson_uniform(&y, dx) - exact).abs() < 1e-12);
    }

    /// Trapezoid and Simpson agree on smooth integrands at fine resolution.
    #[test]
    fn trapezoid_converges(a in 0.0f64..1.0, width in 0.5f64..3.0) {
        let b = a + width;
        let x: Vec<f64> = (0..2001).map(|i| a + width * i as f64 / 2000.0).collect();
        let y: Vec<f64> = x.iter().map(|v| v.exp()).collect();
        let exact = b.exp() - a.exp();
        prop_assert!((trapezoid(&x, &y) - exact).abs() < 1e-5 * exact);
        prop_assert!((simpson(|v| v.exp(), a, b, 256) - exact).abs() < 1e-9 * exact);
    }
}

// ── Root Finder Properties ───────────────────────────────────────────

proptest! {
    /// Both finders locate the root of a monotone cubic.
    #[test]
    fn finders_locate_root(root in -3.0f64..3.0) {
        let f = move |x: f64| (x - root) * (1.0 + (x - root) * (x - root));
        let bisection = Bisection::default();
        let brent = Brent::default();
        for finder in [&bisection as &dyn RootFinder, &brent] {
            let found = finder.solve(&f, (-10.0, 10.0), 1e-12).unwrap();
            prop_assert!((found - root).abs() < 1e-9);
        }
    }
}

// ── Smoothing Properties ─────────────────────────────────────────────

proptest! {
    /// Smoothing never leaves the range of the input.
    #[test]
    fn smoothing_bounded(
        values in prop::collection::vec(-10.0f64..10.0, 2..80),
        sigma in 0.5f64..6.0,
    ) {
        let out = gaussian_filter_1d(&values, sigma, 4.0).unwrap();
        let lo = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        prop_assert_eq!(out.len(), values.len());
        for v in out {
            prop_assert!(v >= lo - 1e-12 && v <= hi + 1e-12);
        }
    }
}

// ── Special Function Properties ──────────────────────────────────────

proptest! {
    /// dSi/dx = sin(x)/x and dCi/dx = cos(x)/x, checked by central differences.
    #[test]
    fn sici_derivatives(x in 0.2f64..50.0) {
        let h = 1e-5 * x;
        let (sp, cp) = sine_cosine_integrals(x + h);
        let (sm, cm) = sine_cosine_integrals(x - h);
        prop_assert!(((sp - sm) / (2.0 * h) - x.sin() / x).abs() < 1e-6);
        prop_assert!(((cp - cm) / (2.0 * h) - x.cos() / x).abs() < 1e-6);
    }
}
