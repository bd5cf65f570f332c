// ─────────────────────────────────────────────────────────────────────
// SCPN HMcode Core — Special Functions
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Sine and cosine integrals Si(x) and Ci(x).
//!
//! Power series for small arguments and a complex continued fraction
//! (modified Lentz) for the exponential integral E1(ix) otherwise.
//! Accuracy is close to machine precision for x > 0.

use hmcode_types::constants::EULER_GAMMA;
use num_complex::Complex64;
use std::f64::consts::FRAC_PI_2;

const SERIES_LIMIT: f64 = 2.0;
const MAX_TERMS: usize = 200;
const FP_MIN: f64 = 1.0e-300;
const EPS: f64 = 6.0e-16;

/// Returns `(Si(x), Ci(x))` for `x > 0`.
///
/// For `x == 0` this returns `(0, -inf)`. Negative arguments use
/// Si(-x) = -Si(x) and return Ci(|x|) (the real part).
pub fn sine_cosine_integrals(x: f64) -> (f64, f64) {
    if x == 0.0 {
        return (0.0, f64::NEG_INFINITY);
    }
    let t = x.abs();
    let (si, ci) = if t > SERIES_LIMIT {
        continued_fraction(t)
    } else {
        power_series(t)
    };
    (si.copysign(x), ci)
}

/// Si(x) alone.
pub fn sine_integral(x: f64) -> f64 {
    sine_cosine_integrals(x).0
}

/// Ci(x) alone.
pub fn cosine_integral(x: f64) -> f64 {
    sine_cosine_integrals(x).1
}

fn continued_fraction(t: f64) -> (f64, f64) {
    let one = Complex64::new(1.0, 0.0);
    let mut b = Complex64::new(1.0, t);
    let mut c = Complex64::new(1.0 / FP_MIN, 0.0);
    let mut d = one / b;
    let mut h = d;
    for i in 2..MAX_TERMS {
        let a = -(((i - 1) * (i - 1)) as f64);
        b += Complex64::new(2.0, 0.0);
        d = one / (d * a + b);
        c = b + Complex64::new(a, 0.0) / c;
        let del = c * d;
        h *= del;
        if (del.re - 1.0).abs() + del.im.abs() < EPS {
            break;
        }
    }
    // E1(it) = exp(-it) * h
    h *= Complex64::new(t.cos(), -t.sin());
    let ci = -h.re;
    let si = FRAC_PI_2 + h.im;
    (si, ci)
}

fn power_series(t: f64) -> (f64, f64) {
    let mut sum_s = 0.0;
    let mut sum_c = 0.0;
    let mut fact = 1.0;
    for k in 1..MAX_TERMS {
        fact *= t / k as f64;
        let term = fact / k as f64;
        let negative = (k / 2) % 2 == 1;
        let signed = if negative { -term } else { term };
        if k % 2 == 1 {
            sum_s += signed;
        } else {
            sum_c += signed;
        }
        if k > 2 && term < EPS * sum_s.abs().max(sum_c.abs()) {
            break;
        }
    }
    (sum_s, sum_c + t.ln() + EULER_GAMMA)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Reference values from Abramowitz & Stegun table 5.1.
    const TABLE: [(f64, f64, f64); 6] = [
        (0.5, 0.493_107_418_043_066_7, -0.177_784_078_806_612_0),
        (1.0, 0.946_083_070_367_183_0, 0.337_403_922_900_968_1),
        (2.0, 1.605_412_976_802_694_8, 0.422_980_828_774_864_9),
        (3.0, 1.848_652_527_999_468_2, 0.119_629_786_008_000_3),
        (5.0, 1.549_931_244_944_674_1, -0.190_029_749_656_643_9),
        (10.0, 1.658_347_594_218_874_0, -0.045_456_433_004_455_4),
    ];

    #[test]
    fn test_reference_values() {
        for (x, si, ci) in TABLE {
            let (s, c) = sine_cosine_integrals(x);
            assert!((s - si).abs() < 1e-9, "Si({x}) = {s}, expected {si}");
            assert!((c - ci).abs() < 1e-9, "Ci({x}) = {c}, expected {ci}");
        }
    }

    #[test]
    fn test_branch_continuity() {
        let below = sine_cosine_integrals(SERIES_LIMIT - 1e-12);
        let above = sine_cosine_integrals(SERIES_LIMIT + 1e-12);
        assert!((below.0 - above.0).abs() < 1e-9);
        assert!((below.1 - above.1).abs() < 1e-9);
    }

    #[test]
    fn test_large_argument_limits() {
        let (s, c) = sine_cosine_integrals(1.0e4);
        assert!((s - FRAC_PI_2).abs() < 1e-3);
        assert!(c.abs() < 1e-3);
    }

    #[test]
    fn test_small_argument_behaviour() {
        let x: f64 = 1e-6;
        let (s, c) = sine_cosine_integrals(x);
        assert!((s - x).abs() < 1e-15);
        assert!((c - (EULER_GAMMA + x.ln())).abs() < 1e-12);
    }

    #[test]
    fn test_odd_sine_integral() {
        assert_eq!(sine_integral(-1.5), -sine_integral(1.5));
        assert_eq!(cosine_integral(-1.5), cosine_integral(1.5));
    }
}
