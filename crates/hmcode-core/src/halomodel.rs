// ─────────────────────────────────────────────────────────────────────
// SCPN HMcode Core — Halo Model Integrals
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Mass-function weighted one-halo and two-halo integrals.
//!
//! Haloes are sampled on a logarithmic mass grid and integrated in the
//! peak height ν = δ_c / σ(R(M)):
//!
//! ```text
//! P_1h(k)  = ∫ (M/ρ̄) W²(ν^η k, M) F(ν) dν
//! I_2h(k)  = ∫ b(ν) W(ν^η k, M) F(ν) dν + [1 - ∫ b F dν] W(ν_min^η k, M_min)
//! ```
//!
//! with W the mass-normalised NFW profile and F the multiplicity function.
//! The bracketed term assigns the bias-weighted mass below the grid to the
//! lightest halo so that I_2h → 1 on large scales.

use crate::profile::{mass_of_radius, nfw_fourier, radius_of_mass, virial_radius};
use crate::variance::VarianceTable;
use hmcode_math::interp::logspace;
use hmcode_math::quadrature::trapezoid;
use hmcode_types::config::HaloConfig;
use hmcode_types::error::{HmcodeError, HmcodeResult};
use tracing::debug;

/// Halo multiplicity F(ν) and linear bias b(ν).
pub trait MassFunction: Send + Sync {
    /// F(ν) with ∫ F dν = 1 over all ν.
    fn multiplicity(&self, nu: f64) -> f64;

    /// Peak-background-split bias.
    fn bias(&self, nu: f64, delta_c: f64) -> f64;
}

/// Sheth & Tormen (1999) mass function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShethTormen {
    pub a: f64,
    pub q: f64,
    pub p: f64,
}

impl Default for ShethTormen {
    fn default() -> Self {
        ShethTormen {
            a: 0.21616,
            q: 0.707,
            p: 0.3,
        }
    }
}

impl MassFunction for ShethTormen {
    fn multiplicity(&self, nu: f64) -> f64 {
        let qnu2 = self.q * nu * nu;
        self.a * (1.0 + qnu2.powf(-self.p)) * (-0.5 * qnu2).exp()
    }

    fn bias(&self, nu: f64, delta_c: f64) -> f64 {
        let qnu2 = self.q * nu * nu;
        1.0 + (qnu2 - 1.0) / delta_c + 2.0 * self.p / (delta_c * (1.0 + qnu2.powf(self.p)))
    }
}

/// One sampled halo mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Halo {
    /// M [Msun/h]
    pub mass: f64,
    pub nu: f64,
    /// r_v [Mpc/h]
    pub r_virial: f64,
    pub concentration: f64,
}

/// Collapse quantities shared by every halo at one redshift.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HaloStructure {
    pub delta_c: f64,
    pub delta_v: f64,
    /// Bloating exponent η.
    pub eta: f64,
    /// Comoving mean density of the clustering component [Msun/h / (Mpc/h)³].
    pub rho_bar: f64,
}

/// Haloes at one redshift, ordered by increasing mass (and ν).
#[derive(Debug, Clone)]
pub struct HaloPopulation {
    haloes: Vec<Halo>,
    structure: HaloStructure,
}

impl HaloPopulation {
    /// Samples `config`'s mass grid, narrowed to the masses whose own and
    /// formation radii lie inside `variance`. `concentration` maps
    /// σ(R(f M)) of the formation mass fraction to c(M).
    pub fn build<C>(
        config: &HaloConfig,
        structure: HaloStructure,
        variance: &VarianceTable,
        formation_fraction: f64,
        concentration: C,
    ) -> HmcodeResult<Self>
    where
        C: Fn(f64) -> HmcodeResult<f64>,
    {
        let (m_min, m_max) =
            resolved_masses(config, structure.rho_bar, variance, formation_fraction)?;
        let haloes = logspace(m_min, m_max, config.n_m)
            .into_iter()
            .map(|mass| -> HmcodeResult<Halo> {
                let sigma = variance.sigma(radius_of_mass(mass, structure.rho_bar))?;
                let sigma_formation = variance
                    .sigma(radius_of_mass(formation_fraction * mass, structure.rho_bar))?;
                Ok(Halo {
                    mass,
                    nu: structure.delta_c / sigma,
                    r_virial: virial_radius(mass, structure.rho_bar, structure.delta_v),
                    concentration: concentration(sigma_formation)?,
                })
            })
            .collect::<HmcodeResult<Vec<_>>>()?;
        Self::new(haloes, structure)
    }

    pub fn new(haloes: Vec<Halo>, structure: HaloStructure) -> HmcodeResult<Self> {
        if haloes.len() < 2 {
            return Err(HmcodeError::configuration(format!(
                "halo population needs >= 2 masses, got {}",
                haloes.len()
            )));
        }
        if haloes.windows(2).any(|w| !(w[1].nu > w[0].nu)) {
            return Err(HmcodeError::configuration(
                "halo peak heights must increase with mass",
            ));
        }
        if haloes
            .iter()
            .any(|h| !(h.concentration > 0.0 && h.r_virial > 0.0 && h.concentration.is_finite()))
        {
            return Err(HmcodeError::configuration(
                "halo radii and concentrations must be positive and finite",
            ));
        }
        Ok(HaloPopulation { haloes, structure })
    }

    pub fn haloes(&self) -> &[Halo] {
        &self.haloes
    }

    pub fn structure(&self) -> &HaloStructure {
        &self.structure
    }

    pub fn nu(&self) -> Vec<f64> {
        self.haloes.iter().map(|h| h.nu).collect()
    }

    /// Bloated, mass-normalised profile of `halo` at wavenumber `k`.
    pub fn window(&self, halo: &Halo, k: f64) -> f64 {
        nfw_fourier(halo.nu.powf(self.structure.eta) * k, halo.r_virial, halo.concentration)
    }
}

/// Mass range of `config` whose radii R(M) and R(f M) the σ table covers.
fn resolved_masses(
    config: &HaloConfig,
    rho_bar: f64,
    variance: &VarianceTable,
    formation_fraction: f64,
) -> HmcodeResult<(f64, f64)> {
    let f = formation_fraction;
    let lightest = mass_of_radius(variance.r_min(), rho_bar) * f.recip().max(1.0);
    let heaviest = mass_of_radius(variance.r_max(), rho_bar) * f.recip().min(1.0);
    // keep round trips through R(M) inside the table
    let (m_min, m_max) = (
        config.m_min.max(lightest * (1.0 + 1e-9)),
        config.m_max.min(heaviest * (1.0 - 1e-9)),
    );
    if !(m_max > m_min) {
        return Err(HmcodeError::configuration(format!(
            "no halo mass in [{:e}, {:e}] Msun/h has resolved σ(R); \
             resolved masses span [{lightest:e}, {heaviest:e}]",
            config.m_min, config.m_max
        )));
    }
    if m_min > config.m_min {
        debug!(
            m_min,
            requested = config.m_min,
            r_min = variance.r_min(),
            "halo mass grid starts at the smallest resolved radius"
        );
    }
    Ok((m_min, m_max))
}

/// Mass integration over a sampled [`HaloPopulation`].
pub trait HaloModelIntegrator: Send + Sync {
    /// Undamped one-halo power at `k`.
    fn one_halo(&self, k: f64, haloes: &HaloPopulation, mass_function: &dyn MassFunction) -> f64;

    /// I_2h(k)², the factor multiplying the linear spectrum in the
    /// integrated two-halo term.
    fn two_halo_factor(
        &self,
        k: f64,
        haloes: &HaloPopulation,
        mass_function: &dyn MassFunction,
    ) -> f64;
}

/// Trapezoid rule in ν over the sampled haloes.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrapezoidIntegrator;

impl HaloModelIntegrator for TrapezoidIntegrator {
    fn one_halo(&self, k: f64, haloes: &HaloPopulation, mass_function: &dyn MassFunction) -> f64 {
        let rho_bar = haloes.structure.rho_bar;
        let integrand: Vec<f64> = haloes
            .haloes
            .iter()
            .map(|h| {
                let w = haloes.window(h, k);
                (h.mass / rho_bar) * w * w * mass_function.multiplicity(h.nu)
            })
            .collect();
        trapezoid(&haloes.nu(), &integrand)
    }

    fn two_halo_factor(
        &self,
        k: f64,
        haloes: &HaloPopulation,
        mass_function: &dyn MassFunction,
    ) -> f64 {
        let delta_c = haloes.structure.delta_c;
        let nu = haloes.nu();
        let bias_weight: Vec<f64> = haloes
            .haloes
            .iter()
            .map(|h| mass_function.bias(h.nu, delta_c) * mass_function.multiplicity(h.nu))
            .collect();
        let profile_weighted: Vec<f64> = haloes
            .haloes
            .iter()
            .zip(&bias_weight)
            .map(|(h, bf)| bf * haloes.window(h, k))
            .collect();
        let missing = 1.0 - trapezoid(&nu, &bias_weight);
        let lightest = &haloes.haloes[0];
        let integral = trapezoid(&nu, &profile_weighted) + missing * haloes.window(lightest, k);
        integral * integral
    }
}
