// ─────────────────────────────────────────────────────────────────────
// SCPN HMcode Core — Halo Profile
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Truncated NFW profile in Fourier space and halo radii.

use hmcode_math::special::sine_cosine_integrals;
use std::f64::consts::PI;

/// Below this k r_v the normalised profile is 1 to double precision.
const SMALL_KRV: f64 = 1e-6;

/// Radius of a sphere holding mass `m` at density `rho` [Mpc/h].
pub fn radius_of_mass(m: f64, rho: f64) -> f64 {
    (3.0 * m / (4.0 * PI * rho)).cbrt()
}

pub fn mass_of_radius(r: f64, rho: f64) -> f64 {
    4.0 / 3.0 * PI * r * r * r * rho
}

/// Virial radius for overdensity `delta_v` relative to `rho_mean`.
pub fn virial_radius(m: f64, rho_mean: f64, delta_v: f64) -> f64 {
    radius_of_mass(m, rho_mean * delta_v)
}

/// Normalised Fourier transform u(k | M) of an NFW halo truncated at
/// `r_virial` with concentration `c`; u → 1 as k → 0.
pub fn nfw_fourier(k: f64, r_virial: f64, c: f64) -> f64 {
    if k * r_virial < SMALL_KRV {
        return 1.0;
    }
    let ks = k * r_virial / c;
    let (si_outer, ci_outer) = sine_cosine_integrals((1.0 + c) * ks);
    let (si_inner, ci_inner) = sine_cosine_integrals(ks);
    let numerator = ks.sin() * (si_outer - si_inner) - (c * ks).sin() / ((1.0 + c) * ks)
        + ks.cos() * (ci_outer - ci_inner);
    numerator / nfw_mass_function(c)
}

/// m(c) = ln(1 + c) - c / (1 + c).
pub fn nfw_mass_function(c: f64) -> f64 {
    (1.0 + c).ln() - c / (1.0 + c)
}
