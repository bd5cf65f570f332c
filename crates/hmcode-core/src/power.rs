// ─────────────────────────────────────────────────────────────────────
// SCPN HMcode Core — Non-linear Power Spectrum
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! HMcode-2020 assembler.
//!
//! Per redshift: linear slice → σ(R) scales → δ_c, Δ_v → fitted parameters
//! → halo population → damped one- and two-halo terms, combined as
//!
//! ```text
//! P_2h = P_dwl [1 - f (k/k_d)^n_d / (1 + (k/k_d)^n_d)]
//! P_1h = w(f_ν) P_1h,raw (k/k_*)⁴ / (1 + (k/k_*)⁴)
//! P_nl = (P_2h^α + P_1h^α)^(1/α)
//! ```
//!
//! The growth table is built once per cosmology and shared read-only by
//! every redshift, so [`HmCode::power_grid`] runs redshifts in parallel.

use crate::background::Background;
use crate::cache::GrowthCache;
use crate::collapse::{dolag_factor, FormationSolver, SphericalCollapse};
use crate::dewiggle::Dewiggler;
use crate::fitting::{calibration_for, HaloModelCalibration};
use crate::growth::GrowthTable;
use crate::halomodel::{
    HaloModelIntegrator, HaloPopulation, HaloStructure, MassFunction, ShethTormen,
    TrapezoidIntegrator,
};
use crate::linear::{LinearSlice, LinearSpectrum};
use crate::neutrinos::ColdMatterTransfer;
use crate::variance::{displacement_dispersion, VarianceEngine};
use hmcode_math::interp::CubicSpline;
use hmcode_math::roots::{Brent, RootFinder};
use hmcode_types::config::{HmcodeConfig, TwoHaloMode};
use hmcode_types::constants::RHO_CRITICAL;
use hmcode_types::cosmology::{scale_factor_from_redshift, CosmologicalParameters};
use hmcode_types::error::{HmcodeError, HmcodeResult};
use hmcode_types::state::{HaloModelParameters, LinearPowerTable, NonlinearSpectrumResult};
use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Linear inputs and derived parameters at one redshift.
struct RedshiftStage {
    params: HaloModelParameters,
    slice: LinearSlice,
    cold_variance: VarianceEngine,
}

/// Non-linear power spectrum engine for one cosmology.
pub struct HmCode {
    cosmology: CosmologicalParameters,
    config: HmcodeConfig,
    background: Background,
    spectrum: LinearSpectrum,
    transfer: ColdMatterTransfer,
    growth: Arc<GrowthTable>,
    /// Flat ΛCDM growth for the Dolag correction; `None` for flat ΛCDM.
    reference_growth: Option<Arc<GrowthTable>>,
    finder: Box<dyn RootFinder>,
    mass_function: Box<dyn MassFunction>,
    integrator: Box<dyn HaloModelIntegrator>,
    calibration: Box<dyn HaloModelCalibration>,
}

impl HmCode {
    pub fn new(
        cosmology: CosmologicalParameters,
        table: LinearPowerTable,
        config: HmcodeConfig,
    ) -> HmcodeResult<Self> {
        Self::with_cache(cosmology, table, config, &GrowthCache::new())
    }

    /// Like [`HmCode::new`], taking growth tables from `cache`.
    pub fn with_cache(
        cosmology: CosmologicalParameters,
        table: LinearPowerTable,
        config: HmcodeConfig,
        cache: &GrowthCache,
    ) -> HmcodeResult<Self> {
        config.validate()?;
        let background = Background::new(&cosmology)?;
        let growth = cache.get_or_build(&cosmology, &config.growth)?;
        let reference_growth = if cosmology.is_lambda() && cosmology.omega_k() == 0.0 {
            None
        } else {
            Some(cache.get_or_build(&cosmology.lcdm_reference(), &config.growth)?)
        };
        let spectrum = LinearSpectrum::new(table)?;
        growth.growth_at_redshift(spectrum.z_ref())?;
        debug!(
            variant = ?cosmology.variant(),
            dolag_reference = reference_growth.is_some(),
            k_min = spectrum.k_min(),
            k_max = spectrum.k_max(),
            "HMcode engine ready"
        );
        Ok(HmCode {
            transfer: ColdMatterTransfer::new(&cosmology),
            calibration: calibration_for(cosmology.variant()),
            finder: Box::new(Brent {
                max_iterations: config.solver.max_iterations,
            }),
            mass_function: Box::new(ShethTormen::default()),
            integrator: Box::new(TrapezoidIntegrator),
            cosmology,
            config,
            background,
            spectrum,
            growth,
            reference_growth,
        })
    }

    pub fn with_root_finder(mut self, finder: impl RootFinder + 'static) -> Self {
        self.finder = Box::new(finder);
        self
    }

    pub fn with_mass_function(mut self, mass_function: impl MassFunction + 'static) -> Self {
        self.mass_function = Box::new(mass_function);
        self
    }

    pub fn with_integrator(mut self, integrator: impl HaloModelIntegrator + 'static) -> Self {
        self.integrator = Box::new(integrator);
        self
    }

    pub fn with_calibration(mut self, calibration: impl HaloModelCalibration + 'static) -> Self {
        self.calibration = Box::new(calibration);
        self
    }

    pub fn cosmology(&self) -> &CosmologicalParameters {
        &self.cosmology
    }

    pub fn config(&self) -> &HmcodeConfig {
        &self.config
    }

    pub fn growth(&self) -> &GrowthTable {
        &self.growth
    }

    pub fn linear_spectrum(&self) -> &LinearSpectrum {
        &self.spectrum
    }

    /// Linear total-matter power at `k` and redshift `z`.
    pub fn linear_power(&self, k: f64, z: f64) -> HmcodeResult<f64> {
        let d = self.growth.growth_at_redshift(z)?
            / self.growth.growth_at_redshift(self.spectrum.z_ref())?;
        Ok(self.spectrum.power(k)? * d * d)
    }

    fn stage(&self, z: f64) -> HmcodeResult<RedshiftStage> {
        let a = scale_factor_from_redshift(z);
        let slice = LinearSlice::build(
            &self.spectrum,
            &self.growth,
            &self.transfer,
            z,
            self.config.variance.n_k,
        )?;
        let sigma_v = displacement_dispersion(&slice.k, &slice.power, slice.dlnk);
        let cold_variance = VarianceEngine::new(&slice.k, &slice.power_cold, slice.dlnk)?;

        let f_nu = self.cosmology.f_nu();
        let collapse =
            SphericalCollapse::new(self.background, &self.growth, f_nu, self.config.collapse.fit);
        let delta_c = collapse.delta_c(a)?;
        let delta_v = collapse.delta_v(a)?;

        let scales = cold_variance.summary(
            delta_c,
            &self.config.variance,
            &self.config.solver,
            self.finder.as_ref(),
        )?;
        let fitted = self.calibration.parameters(scales.sigma8, scales.n_eff_collapse);
        let dolag = dolag_factor(
            &self.growth,
            self.reference_growth.as_deref(),
            &self.config.collapse,
        )?;

        let params = HaloModelParameters {
            redshift: z,
            delta_c,
            delta_v,
            sigma8: scales.sigma8,
            sigma_v,
            r_nl: scales.r_nl,
            n_eff_nl: scales.n_eff_nl,
            r_collapse: scales.r_collapse,
            n_eff: scales.n_eff_collapse,
            f_damp: fitted.f_damp,
            k_d: fitted.k_d,
            n_d: fitted.n_d,
            k_star: fitted.k_star,
            eta: fitted.eta,
            b_conc: fitted.b_conc,
            alpha: fitted.alpha,
            dolag,
            f_nu,
        };
        debug!(
            z,
            delta_c,
            delta_v,
            sigma8 = scales.sigma8,
            r_nl = scales.r_nl,
            n_eff = scales.n_eff_collapse,
            alpha = fitted.alpha,
            "halo-model parameters"
        );
        Ok(RedshiftStage {
            params,
            slice,
            cold_variance,
        })
    }

    /// Halo-model parameter bundle at redshift `z`.
    pub fn halo_model_parameters(&self, z: f64) -> HmcodeResult<HaloModelParameters> {
        Ok(self.stage(z)?.params)
    }

    fn haloes(&self, stage: &RedshiftStage) -> HmcodeResult<HaloPopulation> {
        let params = &stage.params;
        let a = scale_factor_from_redshift(params.redshift);
        let variance = stage.cold_variance.table(
            &self.config.variance,
            &self.config.solver,
            self.finder.as_ref(),
        )?;
        let formation = FormationSolver::new(
            &self.growth,
            self.finder.as_ref(),
            self.config.solver.root_tolerance,
        );
        let concentration = |sigma_formation: f64| -> HmcodeResult<f64> {
            let a_f = formation.formation_scale_factor(a, sigma_formation, params.delta_c)?;
            Ok(params.b_conc * a / a_f * params.dolag)
        };
        let structure = HaloStructure {
            delta_c: params.delta_c,
            delta_v: params.delta_v,
            eta: params.eta,
            rho_bar: RHO_CRITICAL * self.cosmology.omega_cold(),
        };
        HaloPopulation::build(
            &self.config.halos,
            structure,
            &variance,
            self.config.collapse.formation_mass_fraction,
            concentration,
        )
    }

    fn check_wavenumbers(&self, k: &[f64]) -> HmcodeResult<()> {
        if k.is_empty() {
            return Err(HmcodeError::configuration("no wavenumbers requested"));
        }
        if k.windows(2).any(|w| !(w[1] > w[0])) {
            return Err(HmcodeError::configuration(
                "requested wavenumbers must be strictly increasing",
            ));
        }
        match k.iter().find(|&&kk| !self.spectrum.supports(kk)) {
            Some(kk) => Err(HmcodeError::configuration(format!(
                "k = {kk:e} h/Mpc outside linear table support [{:e}, {:e}]",
                self.spectrum.k_min(),
                self.spectrum.k_max()
            ))),
            None => Ok(()),
        }
    }

    /// P_nl(k) at redshift `z`. `k` must be strictly increasing and inside
    /// the linear table's support.
    #[instrument(skip(self, k), fields(n_k = k.len()))]
    pub fn nonlinear_power(&self, k: &[f64], z: f64) -> HmcodeResult<NonlinearSpectrumResult> {
        self.check_wavenumbers(k)?;
        let stage = self.stage(z)?;
        let params = &stage.params;

        let dewiggled = Dewiggler::new(&self.cosmology, &self.config.dewiggle)
            .dewiggle(&stage.slice, params.sigma_v)?;
        if dewiggled.iter().any(|p| !(*p > 0.0)) {
            return Err(HmcodeError::configuration(
                "de-wiggled linear spectrum must stay positive",
            ));
        }
        let ln_dewiggled = CubicSpline::new(
            stage.slice.ln_k(),
            dewiggled.iter().map(|p| p.ln()).collect(),
        )
        .map_err(|e| e.into_hmcode("de-wiggled spectrum"))?;

        let haloes = self.haloes(&stage)?;
        let mass_function = self.mass_function.as_ref();
        let one_halo_weight = self.calibration.one_halo_weight(params.f_nu);

        let power = k
            .iter()
            .map(|&kk| {
                let p_dwl = ln_dewiggled.eval(kk.ln()).exp();
                let linear = match self.config.halos.two_halo {
                    TwoHaloMode::Linear => p_dwl,
                    TwoHaloMode::Integrated => {
                        p_dwl * self.integrator.two_halo_factor(kk, &haloes, mass_function)
                    }
                };
                let x = (kk / params.k_d).powf(params.n_d);
                let two_halo = linear * (1.0 - params.f_damp * x / (1.0 + x));

                let y = (kk / params.k_star).powi(4);
                let one_halo = one_halo_weight
                    * self.integrator.one_halo(kk, &haloes, mass_function)
                    * y
                    / (1.0 + y);

                (two_halo.powf(params.alpha) + one_halo.powf(params.alpha)).powf(1.0 / params.alpha)
            })
            .collect();

        Ok(NonlinearSpectrumResult {
            redshift: z,
            k: k.to_vec(),
            power,
        })
    }

    /// P_nl on a (z, k) grid, one redshift per rayon task. `z` must be
    /// strictly increasing.
    #[instrument(skip(self, k, z), fields(n_k = k.len(), n_z = z.len()))]
    pub fn power_grid(&self, k: &[f64], z: &[f64]) -> HmcodeResult<NonlinearPowerGrid> {
        if z.is_empty() || z.windows(2).any(|w| !(w[1] > w[0])) {
            return Err(HmcodeError::configuration(
                "requested redshifts must be non-empty and strictly increasing",
            ));
        }
        let rows = z
            .par_iter()
            .map(|&zz| self.nonlinear_power(k, zz))
            .collect::<HmcodeResult<Vec<_>>>()?;

        let mut power = Array2::zeros((z.len(), k.len()));
        for (mut row, spectrum) in power.rows_mut().into_iter().zip(&rows) {
            for (cell, p) in row.iter_mut().zip(&spectrum.power) {
                *cell = *p;
            }
        }
        Ok(NonlinearPowerGrid {
            k: k.to_vec(),
            z: z.to_vec(),
            power,
        })
    }
}

/// P_nl sampled on a (z, k) grid; `power[[i, j]]` is at `z[i]`, `k[j]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NonlinearPowerGrid {
    pub k: Vec<f64>,
    pub z: Vec<f64>,
    pub power: Array2<f64>,
}

/// Neighbouring nodes of `x` on an increasing axis.
fn bracket(axis: &[f64], x: f64) -> (usize, usize) {
    let n = axis.len();
    if n == 1 {
        return (0, 0);
    }
    let hi = axis.partition_point(|&v| v < x).clamp(1, n - 1);
    (hi - 1, hi)
}

/// Position of `x` between `lo` and `hi`, 0 on a single node.
fn weight(lo: f64, hi: f64, x: f64) -> f64 {
    if hi > lo {
        (x - lo) / (hi - lo)
    } else {
        0.0
    }
}

impl NonlinearPowerGrid {
    /// Bilinear interpolation of ln P in (ln k, z).
    pub fn evaluate(&self, k: f64, z: f64) -> HmcodeResult<f64> {
        let (nz, nk) = self.power.dim();
        let (Some(&k_min), Some(&k_max)) = (self.k.first(), self.k.last()) else {
            return Err(HmcodeError::configuration("power grid has no wavenumbers"));
        };
        let (Some(&z_min), Some(&z_max)) = (self.z.first(), self.z.last()) else {
            return Err(HmcodeError::configuration("power grid has no redshifts"));
        };
        if (nz, nk) != (self.z.len(), self.k.len()) {
            return Err(HmcodeError::configuration(format!(
                "power grid is {nz}x{nk} but axes are {}x{}",
                self.z.len(),
                self.k.len()
            )));
        }
        if !(k >= k_min && k <= k_max) {
            return Err(HmcodeError::domain("grid k", k, k_min, k_max));
        }
        if !(z >= z_min && z <= z_max) {
            return Err(HmcodeError::domain("grid redshift", z, z_min, z_max));
        }
        let (i0, i1) = bracket(&self.z, z);
        let (j0, j1) = bracket(&self.k, k);
        let tz = weight(self.z[i0], self.z[i1], z);
        let tk = weight(self.k[j0].ln(), self.k[j1].ln(), k.ln());
        let ln_p = |a: usize, b: usize| self.power[[a, b]].ln();
        let low = ln_p(i0, j0) * (1.0 - tk) + ln_p(i0, j1) * tk;
        let high = ln_p(i1, j0) * (1.0 - tk) + ln_p(i1, j1) * tk;
        Ok((low * (1.0 - tz) + high * tz).exp())
    }

    pub fn spectrum(&self, index: usize) -> Option<NonlinearSpectrumResult> {
        let redshift = *self.z.get(index)?;
        Some(NonlinearSpectrumResult {
            redshift,
            k: self.k.clone(),
            power: self.power.row(index).to_vec(),
        })
    }
}
