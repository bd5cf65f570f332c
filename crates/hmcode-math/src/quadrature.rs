// ─────────────────────────────────────────────────────────────────────
// SCPN HMcode Core — Quadrature
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Fixed-grid quadrature.
//!
//! Composite Simpson on uniform samples (Simpson 3/8 closes an odd number
//! of intervals) and the trapezoid rule on arbitrary abscissae.

/// Composite Simpson integral of uniformly spaced samples `y` with step `dx`.
///
/// Even sample counts integrate the last three intervals with Simpson 3/8.
/// Two samples fall back to the trapezoid rule; fewer return 0.
pub fn simpson_uniform(y: &[f64], dx: f64) -> f64 {
    let n = y.len();
    match n {
        0 | 1 => 0.0,
        2 => 0.5 * dx * (y[0] + y[1]),
        3 => dx / 3.0 * (y[0] + 4.0 * y[1] + y[2]),
        _ if n % 2 == 1 => simpson_odd(y, dx),
        _ => {
            let head = &y[..n - 3];
            let tail = &y[n - 4..];
            let three_eighths =
                3.0 * dx / 8.0 * (tail[0] + 3.0 * tail[1] + 3.0 * tail[2] + tail[3]);
            simpson_odd(head, dx) + three_eighths
        }
    }
}

fn simpson_odd(y: &[f64], dx: f64) -> f64 {
    let n = y.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = y[0] + y[n - 1];
    for (i, v) in y.iter().enumerate().take(n - 1).skip(1) {
        sum += if i % 2 == 1 { 4.0 * v } else { 2.0 * v };
    }
    sum * dx / 3.0
}

/// Trapezoid rule on (possibly non-uniform) abscissae.
pub fn trapezoid(x: &[f64], y: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| 0.5 * (xs[1] - xs[0]) * (ys[0] + ys[1]))
        .sum()
}

/// Simpson integral of `f` over `[a, b]` with `intervals` (rounded up to even).
pub fn simpson<F: Fn(f64) -> f64>(f: F, a: f64, b: f64, intervals: usize) -> f64 {
    let n = (intervals.max(2) + 1) & !1;
    let dx = (b - a) / n as f64;
    let samples: Vec<f64> = (0..=n).map(|i| f(a + dx * i as f64)).collect();
    simpson_odd(&samples, dx)
}
