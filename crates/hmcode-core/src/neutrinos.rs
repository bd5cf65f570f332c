// ─────────────────────────────────────────────────────────────────────
// SCPN HMcode Core — Massive Neutrinos
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Scale-dependent growth of cold matter in the presence of massive
//! neutrinos, Eisenstein & Hu (1999, astro-ph/9710252) eqs. 11-15.
//!
//! Used when the linear table carries no separate cold (CDM + baryon)
//! spectrum. With f_ν = 0 every factor here is exactly 1.

use hmcode_types::constants::N_MASSIVE_NEUTRINOS;
use hmcode_types::cosmology::CosmologicalParameters;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColdMatterTransfer {
    f_nu: f64,
    f_cb: f64,
    p_cb: f64,
    /// Θ²/(Ω_m h), turns k [h/Mpc] into the EH q variable.
    q_per_k: f64,
    one_plus_z_eq: f64,
    /// 17.2 f_ν (1 + 0.488 f_ν^{-7/6}) (N_ν / f_ν)²
    free_streaming: f64,
}

impl ColdMatterTransfer {
    pub fn new(cosmology: &CosmologicalParameters) -> Self {
        let f_nu = cosmology.f_nu();
        let f_cb = 1.0 - f_nu;
        let theta2 = (cosmology.t_cmb / 2.7).powi(2);
        let free_streaming = if f_nu > 0.0 {
            17.2 * f_nu
                * (1.0 + 0.488 * f_nu.powf(-7.0 / 6.0))
                * (N_MASSIVE_NEUTRINOS / f_nu).powi(2)
        } else {
            0.0
        };
        ColdMatterTransfer {
            f_nu,
            f_cb,
            p_cb: 0.25 * (5.0 - (1.0 + 24.0 * f_cb).sqrt()),
            q_per_k: theta2 / (cosmology.omega_m() * cosmology.h),
            one_plus_z_eq: 1.0 + 2.5e4 * cosmology.omega_m_h2() / (theta2 * theta2),
            free_streaming,
        }
    }

    pub fn f_nu(&self) -> f64 {
        self.f_nu
    }

    pub fn is_identity(&self) -> bool {
        self.f_nu == 0.0
    }

    fn y_fs(&self, k: f64) -> f64 {
        let q = k * self.q_per_k;
        self.free_streaming * q * q
    }

    /// Growth of δ_cb and δ_cbν, given y_fs and D_1.
    fn growth_pair(&self, y_fs: f64, d1: f64) -> (f64, f64) {
        let x = (d1 / (1.0 + y_fs)).powf(0.7);
        let exponent = self.p_cb / 0.7;
        let tail = d1.powf(1.0 - self.p_cb);
        let d_cb = (1.0 + x).powf(exponent) * tail;
        let d_cbnu = (self.f_cb.powf(0.7 / self.p_cb) + x).powf(exponent) * tail;
        (d_cb, d_cbnu)
    }

    /// δ_cb / δ_m at wavenumber `k` [h/Mpc], where `g` is the growth factor
    /// normalised to a in matter domination. Tends to 1/(1 - f_ν) below the
    /// free-streaming scale and to 1 above it.
    pub fn cold_to_total(&self, k: f64, g: f64) -> f64 {
        if self.is_identity() {
            return 1.0;
        }
        let (d_cb, d_cbnu) = self.growth_pair(self.y_fs(k), self.one_plus_z_eq * g);
        d_cb / d_cbnu
    }

    /// P_m(k) / P_m(k → 0): suppression of total matter power by neutrino
    /// free streaming at fixed large-scale amplitude.
    pub fn total_suppression(&self, k: f64, g: f64) -> f64 {
        if self.is_identity() {
            return 1.0;
        }
        let d1 = self.one_plus_z_eq * g;
        let (_, d_k) = self.growth_pair(self.y_fs(k), d1);
        let (_, d_0) = self.growth_pair(0.0, d1);
        (d_k / d_0).powi(2)
    }
}
