// ─────────────────────────────────────────────────────────────────────
// SCPN HMcode Core — Linear Spectrum
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Linear power spectrum: interpolation of the input table, rescaling to
//! a target redshift, and the Eisenstein & Hu no-wiggle shape.

use crate::growth::GrowthTable;
use crate::neutrinos::ColdMatterTransfer;
use crate::variance::VarianceEngine;
use hmcode_math::interp::{logspace, CubicSpline};
use hmcode_types::config::GrowthConfig;
use hmcode_types::cosmology::{scale_factor_from_redshift, CosmologicalParameters};
use hmcode_types::error::{HmcodeError, HmcodeResult};
use hmcode_types::state::LinearPowerTable;
use ndarray::Array1;

/// Comoving BAO scale used by the fixture wiggles [Mpc/h].
const FIXTURE_BAO_SCALE: f64 = 105.0;
/// Silk-like damping of the fixture wiggles [h/Mpc].
const FIXTURE_BAO_DAMPING: f64 = 0.25;

/// Eisenstein & Hu (1998, astro-ph/9709112) zero-baryon-wiggle transfer
/// function, eqs. 26 and 28-31. `k` in h/Mpc.
pub fn eisenstein_hu_no_wiggle(k: f64, cosmology: &CosmologicalParameters) -> f64 {
    let h = cosmology.h;
    let wm = cosmology.omega_m_h2();
    let wb = cosmology.omega_b_h2();
    let rb = wb / wm;
    let s = 44.5 * (9.83 / wm).ln() / (1.0 + 10.0 * wb.powf(0.75)).sqrt();
    let alpha = 1.0 - 0.328 * (431.0 * wm).ln() * rb + 0.38 * (22.3 * wm).ln() * rb * rb;

    let gamma = (wm / h) * (alpha + (1.0 - alpha) / (1.0 + (0.43 * k * s * h).powi(4)));
    let q = k * (cosmology.t_cmb / 2.7).powi(2) / gamma;
    let l = (2.0 * std::f64::consts::E + 1.8 * q).ln();
    let c = 14.2 + 731.0 / (1.0 + 62.5 * q);
    l / (l + c * q * q)
}

/// Log-log cubic interpolation of a [`LinearPowerTable`].
#[derive(Debug, Clone)]
pub struct LinearSpectrum {
    table: LinearPowerTable,
    ln_power: CubicSpline,
    ln_power_cold: Option<CubicSpline>,
}

impl LinearSpectrum {
    pub fn new(table: LinearPowerTable) -> HmcodeResult<Self> {
        let ln_k: Vec<f64> = table.k().iter().map(|k| k.ln()).collect();
        let spline = |p: &Array1<f64>| {
            CubicSpline::new(ln_k.clone(), p.iter().map(|v| v.ln()).collect())
                .map_err(|e| e.into_hmcode("linear power table"))
        };
        let ln_power = spline(table.power())?;
        let ln_power_cold = match table.power_cold() {
            Some(cold) => Some(spline(cold)?),
            None => None,
        };
        Ok(LinearSpectrum {
            table,
            ln_power,
            ln_power_cold,
        })
    }

    pub fn table(&self) -> &LinearPowerTable {
        &self.table
    }

    pub fn k_min(&self) -> f64 {
        self.table.k_min()
    }

    pub fn k_max(&self) -> f64 {
        self.table.k_max()
    }

    pub fn z_ref(&self) -> f64 {
        self.table.z_ref()
    }

    pub fn supports(&self, k: f64) -> bool {
        self.table.supports(k)
    }

    pub fn has_cold_power(&self) -> bool {
        self.ln_power_cold.is_some()
    }

    fn check(&self, k: f64) -> HmcodeResult<()> {
        if self.supports(k) {
            Ok(())
        } else {
            Err(HmcodeError::configuration(format!(
                "k = {k:e} h/Mpc outside linear table support [{:e}, {:e}]",
                self.k_min(),
                self.k_max()
            )))
        }
    }

    /// Total matter power at the table redshift.
    pub fn power(&self, k: f64) -> HmcodeResult<f64> {
        self.check(k)?;
        Ok(self.ln_power.eval(k.ln()).exp())
    }

    /// Cold matter power at the table redshift, if the table carries it.
    pub fn power_cold(&self, k: f64) -> HmcodeResult<Option<f64>> {
        self.check(k)?;
        Ok(self.ln_power_cold.as_ref().map(|s| s.eval(k.ln()).exp()))
    }
}

/// Linear spectra at one redshift on a uniform ln k grid spanning the
/// input table exactly.
#[derive(Debug, Clone)]
pub struct LinearSlice {
    pub redshift: f64,
    pub k: Vec<f64>,
    /// Total matter P_lin(k, z).
    pub power: Vec<f64>,
    /// Cold matter (CDM + baryons) P_lin(k, z).
    pub power_cold: Vec<f64>,
    pub dlnk: f64,
}

impl LinearSlice {
    pub fn build(
        spectrum: &LinearSpectrum,
        growth: &GrowthTable,
        transfer: &ColdMatterTransfer,
        redshift: f64,
        n_k: usize,
    ) -> HmcodeResult<Self> {
        if n_k < 4 {
            return Err(HmcodeError::configuration(format!(
                "linear slice needs >= 4 nodes, got {n_k}"
            )));
        }
        let a = scale_factor_from_redshift(redshift);
        let growth_ratio = growth.growth(a)? / growth.growth_at_redshift(spectrum.z_ref())?;
        let scale = growth_ratio * growth_ratio;
        let g = growth.growth_unnormalized(a)?;

        let (k_min, k_max) = (spectrum.k_min(), spectrum.k_max());
        let k = logspace(k_min, k_max, n_k);
        let dlnk = (k_max / k_min).ln() / (n_k - 1) as f64;

        let mut power = Vec::with_capacity(n_k);
        let mut power_cold = Vec::with_capacity(n_k);
        for &kk in &k {
            let p = spectrum.power(kk)? * scale;
            let cold = match spectrum.power_cold(kk)? {
                Some(cold) => cold * scale,
                None => {
                    let ratio = transfer.cold_to_total(kk, g);
                    p * ratio * ratio
                }
            };
            power.push(p);
            power_cold.push(cold);
        }
        Ok(LinearSlice {
            redshift,
            k,
            power,
            power_cold,
            dlnk,
        })
    }

    pub fn len(&self) -> usize {
        self.k.len()
    }

    pub fn is_empty(&self) -> bool {
        self.k.is_empty()
    }

    pub fn ln_k(&self) -> Vec<f64> {
        self.k.iter().map(|k| k.ln()).collect()
    }
}

/// Synthetic linear spectrum P = A k^{n_s} T_EH²(k), optionally with a
/// damped BAO modulation, normalised so the massless-neutrino equivalent
/// has the requested σ8 at z = 0. Massive neutrinos then suppress the
/// small-scale power.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EisensteinHuFixture {
    pub sigma8: f64,
    pub k_min: f64,
    pub k_max: f64,
    pub points: usize,
    /// Relative amplitude of the BAO wiggles (0 disables them).
    pub bao_amplitude: f64,
}

impl Default for EisensteinHuFixture {
    fn default() -> Self {
        EisensteinHuFixture {
            sigma8: 0.8,
            k_min: 1e-4,
            k_max: 1e2,
            points: 512,
            bao_amplitude: 0.0,
        }
    }
}

impl EisensteinHuFixture {
    pub fn table(&self, cosmology: &CosmologicalParameters) -> HmcodeResult<LinearPowerTable> {
        cosmology.validate()?;
        if !(self.sigma8 > 0.0) || self.points < 4 || !(self.k_min > 0.0 && self.k_max > self.k_min)
        {
            return Err(HmcodeError::configuration(format!(
                "invalid fixture: sigma8={}, k in [{}, {}], {} points",
                self.sigma8, self.k_min, self.k_max, self.points
            )));
        }
        let k = logspace(self.k_min, self.k_max, self.points);
        let shape: Vec<f64> = k
            .iter()
            .map(|&kk| {
                let t = eisenstein_hu_no_wiggle(kk, cosmology);
                let wiggle = 1.0
                    + self.bao_amplitude
                        * (kk * FIXTURE_BAO_SCALE).sin()
                        * (-(kk / FIXTURE_BAO_DAMPING).powi(2)).exp();
                kk.powf(cosmology.n_s) * t * t * wiggle
            })
            .collect();

        let dlnk = (self.k_max / self.k_min).ln() / (self.points - 1) as f64;
        let raw_sigma8 = VarianceEngine::new(&k, &shape, dlnk)?.sigma(8.0);
        let amplitude = (self.sigma8 / raw_sigma8).powi(2);

        let transfer = ColdMatterTransfer::new(cosmology);
        let g_today = if transfer.is_identity() {
            1.0
        } else {
            GrowthTable::build(cosmology, &GrowthConfig::default())?.growth_unnormalized(1.0)?
        };
        let power: Array1<f64> = k
            .iter()
            .zip(&shape)
            .map(|(&kk, s)| amplitude * s * transfer.total_suppression(kk, g_today))
            .collect();
        LinearPowerTable::new(Array1::from(k), power, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lcdm() -> CosmologicalParameters {
        CosmologicalParameters::flat_lcdm(0.3, 0.05, 0.7, 0.96)
    }

    #[test]
    fn test_eh_transfer_limits() {
        let cosmo = lcdm();
        assert!((eisenstein_hu_no_wiggle(1e-5, &cosmo) - 1.0).abs() < 1e-3);
        let t1 = eisenstein_hu_no_wiggle(1.0, &cosmo);
        let t10 = eisenstein_hu_no_wiggle(10.0, &cosmo);
        assert!(t1 < 0.05 && t10 < t1);
    }

    #[test]
    fn test_fixture_normalised() {
        let cosmo = lcdm();
        let fixture = EisensteinHuFixture::default();
        let table = fixture.table(&cosmo).unwrap();
        let dlnk = (fixture.k_max / fixture.k_min).ln() / (fixture.points - 1) as f64;
        let k = table.k().to_vec();
        let p = table.power().to_vec();
        let sigma8 = VarianceEngine::new(&k, &p, dlnk).unwrap().sigma(8.0);
        assert!((sigma8 - 0.8).abs() < 1e-10);
    }

    #[test]
    fn test_spectrum_interpolates_table() {
        let table = EisensteinHuFixture::default().table(&lcdm()).unwrap();
        let spectrum = LinearSpectrum::new(table.clone()).unwrap();
        let (k, p) = (table.k()[100], table.power()[100]);
        assert!((spectrum.power(k).unwrap() / p - 1.0).abs() < 1e-12);
        assert!(!spectrum.has_cold_power());
        assert!(spectrum.power_cold(k).unwrap().is_none());
    }

    #[test]
    fn test_outside_support_is_configuration_error() {
        let table = EisensteinHuFixture::default().table(&lcdm()).unwrap();
        let spectrum = LinearSpectrum::new(table).unwrap();
        let err = spectrum.power(500.0).unwrap_err();
        assert!(matches!(err, HmcodeError::Configuration(_)));
    }

    #[test]
    fn test_slice_scales_with_growth() {
        let cosmo = lcdm();
        let table = EisensteinHuFixture::default().table(&cosmo).unwrap();
        let spectrum = LinearSpectrum::new(table).unwrap();
        let growth = GrowthTable::build(&cosmo, &GrowthConfig::default()).unwrap();
        let transfer = ColdMatterTransfer::new(&cosmo);
        let today = LinearSlice::build(&spectrum, &growth, &transfer, 0.0, 257).unwrap();
        let z1 = LinearSlice::build(&spectrum, &growth, &transfer, 1.0, 257).unwrap();
        let d = growth.growth_at_redshift(1.0).unwrap();
        for i in [0, 128, 256] {
            assert!((z1.power[i] / today.power[i] - d * d).abs() < 1e-12);
            assert_eq!(today.power[i], today.power_cold[i]);
        }
        assert_eq!(today.k[0], spectrum.k_min());
        assert_eq!(today.k[256], spectrum.k_max());
    }

    #[test]
    fn test_neutrinos_suppress_fixture() {
        let fixture = EisensteinHuFixture::default();
        let massless = fixture.table(&lcdm()).unwrap();
        let massive = fixture.table(&lcdm().with_neutrino_mass(0.3)).unwrap();
        let last = massless.len() - 1;
        assert!(massive.power()[last] < 0.9 * massless.power()[last]);
        assert!((massive.power()[0] / massless.power()[0] - 1.0).abs() < 0.02);
    }
}
