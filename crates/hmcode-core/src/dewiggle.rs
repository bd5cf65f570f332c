// ─────────────────────────────────────────────────────────────────────
// SCPN HMcode Core — BAO De-wiggling
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Removal of baryon acoustic wiggles from the linear spectrum.
//!
//! The no-wiggle spectrum is the Eisenstein & Hu smooth shape times the
//! Gaussian-smoothed (in ln k) ratio P_lin / P_EH. The de-wiggled spectrum
//! damps the wiggles with the linear displacement dispersion:
//!
//! ```text
//! P_dwl = P_lin - [1 - exp(-k² σ_v²)] (P_lin - P_nw)
//! ```

use crate::linear::{eisenstein_hu_no_wiggle, LinearSlice};
use hmcode_math::smoothing::gaussian_filter_1d;
use hmcode_types::config::DewiggleConfig;
use hmcode_types::cosmology::CosmologicalParameters;
use hmcode_types::error::{HmcodeError, HmcodeResult};

pub struct Dewiggler<'a> {
    cosmology: &'a CosmologicalParameters,
    config: &'a DewiggleConfig,
}

impl<'a> Dewiggler<'a> {
    pub fn new(cosmology: &'a CosmologicalParameters, config: &'a DewiggleConfig) -> Self {
        Dewiggler { cosmology, config }
    }

    /// Smooth broadband spectrum on a uniform ln k grid of spacing `dlnk`.
    pub fn no_wiggle(&self, k: &[f64], power: &[f64], dlnk: f64) -> HmcodeResult<Vec<f64>> {
        if k.len() != power.len() {
            return Err(HmcodeError::configuration(format!(
                "de-wiggling needs matching k and P, got {} and {}",
                k.len(),
                power.len()
            )));
        }
        let reference: Vec<f64> = k
            .iter()
            .map(|&kk| {
                let t = eisenstein_hu_no_wiggle(kk, self.cosmology);
                kk.powf(self.cosmology.n_s) * t * t
            })
            .collect();
        let ratio: Vec<f64> = power.iter().zip(&reference).map(|(p, r)| p / r).collect();
        let smoothed =
            gaussian_filter_1d(&ratio, self.config.sigma_dlnk / dlnk, self.config.truncate)
                .map_err(|e| e.into_hmcode("no-wiggle spectrum"))?;
        Ok(reference.iter().zip(&smoothed).map(|(r, s)| r * s).collect())
    }

    /// De-wiggled total-matter spectrum of `slice` for displacement
    /// dispersion `sigma_v` [Mpc/h].
    pub fn dewiggle(&self, slice: &LinearSlice, sigma_v: f64) -> HmcodeResult<Vec<f64>> {
        let no_wiggle = self.no_wiggle(&slice.k, &slice.power, slice.dlnk)?;
        Ok(slice
            .k
            .iter()
            .zip(&slice.power)
            .zip(&no_wiggle)
            .map(|((k, p), p_nw)| {
                let damping = 1.0 - (-(k * sigma_v).powi(2)).exp();
                p - damping * (p - p_nw)
            })
            .collect())
    }
}
