// ─────────────────────────────────────────────────────────────────────
// SCPN HMcode Core — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
/// Critical density today [(Msun/h) / (Mpc/h)³].
pub const RHO_CRITICAL: f64 = 2.7754e11;

/// Ω_ν h² = Σm_ν / NEUTRINO_MASS_DENSITY_EV (Σm_ν in eV).
pub const NEUTRINO_MASS_DENSITY_EV: f64 = 93.14;

/// Number of massive neutrino species (degenerate hierarchy).
pub const N_MASSIVE_NEUTRINOS: f64 = 3.0;

/// CMB temperature today [K].
pub const T_CMB_DEFAULT: f64 = 2.7255;

/// Einstein-de Sitter linear collapse threshold, (3/20)(12π)^(2/3) ≈ 1.686.
pub const DELTA_C_EDS: f64 = 1.686_470_199_841_145;

/// Einstein-de Sitter virial overdensity, 18π² ≈ 178.
pub const DELTA_V_EDS: f64 = 177.652_879_219_608_45;

/// Euler-Mascheroni constant.
pub const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_eds_thresholds_match_closed_form() {
        let dc = (3.0 / 20.0) * (12.0 * PI).powf(2.0 / 3.0);
        assert!((DELTA_C_EDS - dc).abs() < 1e-9, "dc0 = {dc}");
        assert!((DELTA_V_EDS - 18.0 * PI * PI).abs() < 1e-10);
    }
}
