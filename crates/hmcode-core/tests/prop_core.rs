// ─────────────────────────────────────────────────────────────────────
// SCPN HMcode Core — Property-Based Tests (proptest) for hmcode-core
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for hmcode-core using proptest.
//!
//! Covers: growth monotonicity, σ(R) monotonicity, R_nl accuracy,
//! idempotence, k-support errors, massless-neutrino continuity and
//! neutrino suppression. Pipeline properties run few cases; each case
//! builds a full engine.

use hmcode_core::growth::GrowthTable;
use hmcode_core::linear::EisensteinHuFixture;
use hmcode_core::variance::VarianceEngine;
use hmcode_core::HmCode;
use hmcode_math::interp::logspace;
use hmcode_math::roots::Brent;
use hmcode_types::config::{GrowthConfig, HmcodeConfig, SolverConfig, VarianceConfig};
use hmcode_types::cosmology::CosmologicalParameters;
use hmcode_types::error::HmcodeError;
use proptest::prelude::*;

fn variance_engine(cosmology: &CosmologicalParameters, sigma8: f64) -> VarianceEngine {
    let fixture = EisensteinHuFixture {
        sigma8,
        ..EisensteinHuFixture::default()
    };
    let table = fixture.table(cosmology).unwrap();
    let k = table.k().to_vec();
    let p = table.power().to_vec();
    let dlnk = (k[k.len() - 1] / k[0]).ln() / (k.len() - 1) as f64;
    VarianceEngine::new(&k, &p, dlnk).unwrap()
}

fn engine(cosmology: CosmologicalParameters) -> HmCode {
    let table = EisensteinHuFixture::default().table(&cosmology).unwrap();
    HmCode::new(cosmology, table, HmcodeConfig::default()).unwrap()
}

// ── Growth ───────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// g(a) and G(a) increase with a for ΛCDM, wCDM and mildly curved models.
    #[test]
    fn growth_is_monotone(
        omega_m in 0.15f64..0.5,
        w0 in -1.3f64..-0.7,
        wa in -0.3f64..0.3,
        omega_k in -0.05f64..0.05,
    ) {
        let cosmo = CosmologicalParameters::flat_lcdm(omega_m, 0.05, 0.7, 0.96)
            .with_dark_energy(w0, wa)
            .with_curvature(omega_k);
        let table = GrowthTable::build(&cosmo, &GrowthConfig::default()).unwrap();
        let a = logspace(table.a_min(), 1.0, 64);
        for w in a.windows(2) {
            prop_assert!(table.growth(w[1]).unwrap() > table.growth(w[0]).unwrap());
            prop_assert!(
                table.accumulated_growth(w[1]).unwrap() > table.accumulated_growth(w[0]).unwrap()
            );
        }
        prop_assert!((table.growth(1.0).unwrap() - 1.0).abs() < 1e-12);
    }
}

// ── Variance ─────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    /// σ(R) strictly decreases with R for physical spectra.
    #[test]
    fn sigma_decreases_with_radius(
        omega_m in 0.2f64..0.4,
        h in 0.6f64..0.8,
        sigma8 in 0.6f64..1.0,
    ) {
        let cosmo = CosmologicalParameters::flat_lcdm(omega_m, 0.045, h, 0.96);
        let engine = variance_engine(&cosmo, sigma8);
        let radii = logspace(1e-2, 1e2, 40);
        for w in radii.windows(2) {
            prop_assert!(engine.sigma(w[1]) < engine.sigma(w[0]));
        }
    }

    /// σ(R_nl) = 1 within the configured tolerance.
    #[test]
    fn nonlinear_radius_hits_unit_sigma(
        omega_m in 0.2f64..0.4,
        sigma8 in 0.6f64..1.0,
    ) {
        let cosmo = CosmologicalParameters::flat_lcdm(omega_m, 0.045, 0.7, 0.96);
        let engine = variance_engine(&cosmo, sigma8);
        let variance = VarianceConfig::default();
        let solver = SolverConfig::default();
        let r_nl = engine
            .radius_at_sigma(1.0, "R_nl", &variance, &solver, &Brent::default())
            .unwrap();
        prop_assert!((engine.sigma(r_nl) - 1.0).abs() < variance.sigma_tolerance);
    }
}

// ── Pipeline ─────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(4))]

    /// Identical requests give identical spectra.
    #[test]
    fn pipeline_is_idempotent(z in 0.0f64..2.0, omega_m in 0.25f64..0.35) {
        let hm = engine(CosmologicalParameters::flat_lcdm(omega_m, 0.05, 0.7, 0.96));
        let k = logspace(0.01, 3.0, 12);
        let first = hm.nonlinear_power(&k, z).unwrap();
        let second = hm.nonlinear_power(&k, z).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Any k above the table maximum is a configuration error.
    #[test]
    fn unsupported_k_is_rejected(factor in 1.001f64..100.0) {
        let hm = engine(CosmologicalParameters::flat_lcdm(0.3, 0.05, 0.7, 0.96));
        let k_max = hm.linear_spectrum().k_max();
        let err = hm.nonlinear_power(&[0.1, k_max * factor], 0.0).unwrap_err();
        let is_configuration = matches!(err, HmcodeError::Configuration(_));
        prop_assert!(is_configuration);
    }

    /// Heavier neutrinos suppress non-linear power at fixed primordial shape.
    #[test]
    fn neutrino_mass_suppresses_power(m_light in 0.02f64..0.15, extra in 0.05f64..0.3) {
        let lcdm = CosmologicalParameters::flat_lcdm(0.3, 0.05, 0.7, 0.96);
        let k = [0.3, 1.0, 3.0];
        let light = engine(lcdm.with_neutrino_mass(m_light)).nonlinear_power(&k, 0.0).unwrap();
        let heavy = engine(lcdm.with_neutrino_mass(m_light + extra))
            .nonlinear_power(&k, 0.0)
            .unwrap();
        for (h, l) in heavy.power.iter().zip(&light.power) {
            prop_assert!(h < l);
        }
    }
}

// ── Massless Limit ───────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(3))]

    /// A vanishing neutrino mass reproduces the massless result.
    #[test]
    fn massless_limit_is_continuous(z in 0.0f64..1.0) {
        let lcdm = CosmologicalParameters::flat_lcdm(0.3, 0.05, 0.7, 0.96);
        let k = [0.05, 0.5, 5.0];
        let massless = engine(lcdm).nonlinear_power(&k, z).unwrap();
        let tiny = engine(lcdm.with_neutrino_mass(1e-6)).nonlinear_power(&k, z).unwrap();
        for (a, b) in massless.power.iter().zip(&tiny.power) {
            prop_assert!((a / b - 1.0).abs() < 1e-4, "{} vs {}", a, b);
        }
    }
}
