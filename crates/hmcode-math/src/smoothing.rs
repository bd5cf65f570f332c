// ─────────────────────────────────────────────────────────────────────
// SCPN HMcode Core — Smoothing
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! One-dimensional Gaussian filter on uniformly sampled data.
//!
//! Boundary handling is half-sample reflection (`d c b a | a b c d | d c b a`),
//! the same convention as `scipy.ndimage.gaussian_filter1d(mode="reflect")`.

use crate::error::NumericalError;

/// Normalised Gaussian weights for offsets `-radius..=radius`.
pub fn gaussian_kernel(sigma: f64, truncate: f64) -> Vec<f64> {
    let radius = (truncate * sigma + 0.5) as usize;
    let mut weights: Vec<f64> = (0..=2 * radius)
        .map(|i| {
            let x = i as f64 - radius as f64;
            (-0.5 * x * x / (sigma * sigma)).exp()
        })
        .collect();
    let total: f64 = weights.iter().sum();
    weights.iter_mut().for_each(|w| *w /= total);
    weights
}

fn reflect(index: isize, n: usize) -> usize {
    let n = n as isize;
    let period = 2 * n;
    let mut i = index.rem_euclid(period);
    if i >= n {
        i = period - 1 - i;
    }
    i as usize
}

/// Smooth `values` with a Gaussian of width `sigma` samples, truncated at
/// `truncate` standard deviations.
pub fn gaussian_filter_1d(
    values: &[f64],
    sigma: f64,
    truncate: f64,
) -> Result<Vec<f64>, NumericalError> {
    if !(sigma.is_finite() && sigma > 0.0) {
        return Err(NumericalError::InvalidGrid(format!(
            "smoothing width must be positive, got {sigma}"
        )));
    }
    if !(truncate.is_finite() && truncate > 0.0) {
        return Err(NumericalError::InvalidGrid(format!(
            "kernel truncation must be positive, got {truncate}"
        )));
    }
    if values.is_empty() {
        return Ok(Vec::new());
    }
    let kernel = gaussian_kernel(sigma, truncate);
    let radius = (kernel.len() / 2) as isize;
    let n = values.len();
    let smoothed = (0..n)
        .map(|i| {
            kernel
                .iter()
                .enumerate()
                .map(|(j, w)| w * values[reflect(i as isize + j as isize - radius, n)])
                .sum()
        })
        .collect();
    Ok(smoothed)
}
