// ─────────────────────────────────────────────────────────────────────
// SCPN HMcode Core — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::error::{HmcodeError, HmcodeResult};
use serde::{Deserialize, Serialize};

/// Top-level numerical configuration for the non-linear power engine.
/// Every section and field is optional in JSON; missing values take the
/// HMcode-2020 defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HmcodeConfig {
    #[serde(default)]
    pub growth: GrowthConfig,
    #[serde(default)]
    pub variance: VarianceConfig,
    #[serde(default)]
    pub dewiggle: DewiggleConfig,
    #[serde(default)]
    pub collapse: CollapseConfig,
    #[serde(default)]
    pub halos: HaloConfig,
    #[serde(default)]
    pub solver: SolverConfig,
}

/// Linear growth ODE integration in ln a.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthConfig {
    /// Starting scale factor, deep in matter domination (g = a there).
    #[serde(default = "default_a_initial")]
    pub a_initial: f64,
    /// Table nodes, uniform in ln a, between a_initial and a = 1.
    #[serde(default = "default_growth_steps")]
    pub steps: usize,
}

fn default_a_initial() -> f64 {
    1e-3
}
fn default_growth_steps() -> usize {
    1024
}

impl Default for GrowthConfig {
    fn default() -> Self {
        GrowthConfig {
            a_initial: default_a_initial(),
            steps: default_growth_steps(),
        }
    }
}

/// σ(R) quadrature and tabulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarianceConfig {
    /// Uniform ln k nodes spanning the linear table.
    #[serde(default = "default_n_k")]
    pub n_k: usize,
    /// Smallest tabulated radius [Mpc/h].
    #[serde(default = "default_r_min")]
    pub r_min: f64,
    /// Largest tabulated radius [Mpc/h].
    #[serde(default = "default_r_max")]
    pub r_max: f64,
    /// Radii in the σ(R) table (log-spaced).
    #[serde(default = "default_n_r")]
    pub n_r: usize,
    /// Accepted |σ(R_nl) - 1| after the root-find.
    #[serde(default = "default_sigma_tolerance")]
    pub sigma_tolerance: f64,
    /// Largest accepted bound on the σ² lost above the table's k_max,
    /// relative to σ². Smaller radii are unresolved.
    #[serde(default = "default_truncation_tolerance")]
    pub truncation_tolerance: f64,
}

fn default_n_k() -> usize {
    1025
}
fn default_r_min() -> f64 {
    1e-6
}
fn default_r_max() -> f64 {
    1e3
}
fn default_n_r() -> usize {
    192
}
fn default_sigma_tolerance() -> f64 {
    1e-4
}
fn default_truncation_tolerance() -> f64 {
    1e-4
}

impl Default for VarianceConfig {
    fn default() -> Self {
        VarianceConfig {
            n_k: default_n_k(),
            r_min: default_r_min(),
            r_max: default_r_max(),
            n_r: default_n_r(),
            sigma_tolerance: default_sigma_tolerance(),
            truncation_tolerance: default_truncation_tolerance(),
        }
    }
}

/// BAO de-wiggling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DewiggleConfig {
    /// Gaussian smoothing width in ln k. Candidate for recalibration.
    #[serde(default = "default_sigma_dlnk")]
    pub sigma_dlnk: f64,
    /// Kernel half-width in units of the smoothing width.
    #[serde(default = "default_truncate")]
    pub truncate: f64,
}

fn default_sigma_dlnk() -> f64 {
    0.25
}
fn default_truncate() -> f64 {
    4.0
}

impl Default for DewiggleConfig {
    fn default() -> Self {
        DewiggleConfig {
            sigma_dlnk: default_sigma_dlnk(),
            truncate: default_truncate(),
        }
    }
}

/// Fitting formulas for δ_c and Δ_v.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollapseFit {
    /// Mead (2017) fits driven by g/a and G/a.
    Mead2017,
    /// Nakamura & Suto (1997) δ_c with Bryan & Norman (1998) Δ_v.
    LcdmFits,
}

/// Spherical collapse, Dolag correction and halo formation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollapseConfig {
    /// High-redshift stand-in for "infinity" in the Dolag correction.
    #[serde(default = "default_z_infinity")]
    pub z_infinity: f64,
    /// Exponent applied to the Dolag growth ratio.
    #[serde(default = "default_dolag_exponent")]
    pub dolag_exponent: f64,
    /// Mass fraction f defining halo formation, σ(fM, z_f) = δ_c.
    #[serde(default = "default_formation_mass_fraction")]
    pub formation_mass_fraction: f64,
    #[serde(default = "default_collapse_fit")]
    pub fit: CollapseFit,
}

fn default_z_infinity() -> f64 {
    10.0
}
fn default_dolag_exponent() -> f64 {
    1.0
}
fn default_formation_mass_fraction() -> f64 {
    0.01
}
fn default_collapse_fit() -> CollapseFit {
    CollapseFit::Mead2017
}

impl Default for CollapseConfig {
    fn default() -> Self {
        CollapseConfig {
            z_infinity: default_z_infinity(),
            dolag_exponent: default_dolag_exponent(),
            formation_mass_fraction: default_formation_mass_fraction(),
            fit: default_collapse_fit(),
        }
    }
}

/// How the two-halo term is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TwoHaloMode {
    /// De-wiggled linear spectrum (HMcode-2020).
    Linear,
    /// Bias-weighted profile integral from the halo-model integrator.
    Integrated,
}

/// Halo mass grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HaloConfig {
    /// Lightest halo [Msun/h].
    #[serde(default = "default_m_min")]
    pub m_min: f64,
    /// Heaviest halo [Msun/h].
    #[serde(default = "default_m_max")]
    pub m_max: f64,
    #[serde(default = "default_n_m")]
    pub n_m: usize,
    #[serde(default = "default_two_halo")]
    pub two_halo: TwoHaloMode,
}

fn default_m_min() -> f64 {
    1.0
}
fn default_m_max() -> f64 {
    1e18
}
fn default_n_m() -> usize {
    256
}
fn default_two_halo() -> TwoHaloMode {
    TwoHaloMode::Linear
}

impl Default for HaloConfig {
    fn default() -> Self {
        HaloConfig {
            m_min: default_m_min(),
            m_max: default_m_max(),
            n_m: default_n_m(),
            two_halo: default_two_halo(),
        }
    }
}

/// Root-finder limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Bracket width at which a root-find stops (in the solved variable,
    /// ln R or ln a).
    #[serde(default = "default_root_tolerance")]
    pub root_tolerance: f64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

fn default_root_tolerance() -> f64 {
    1e-8
}
fn default_max_iterations() -> usize {
    200
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            root_tolerance: default_root_tolerance(),
            max_iterations: default_max_iterations(),
        }
    }
}

impl HmcodeConfig {
    /// Load from a JSON file and validate.
    pub fn from_file(path: &str) -> HmcodeResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> HmcodeResult<()> {
        let g = &self.growth;
        if !(g.a_initial > 0.0 && g.a_initial < 0.1) {
            return Err(HmcodeError::configuration(format!(
                "growth.a_initial must lie in (0, 0.1), got {}",
                g.a_initial
            )));
        }
        if g.steps < 16 {
            return Err(HmcodeError::configuration(format!(
                "growth.steps must be >= 16, got {}",
                g.steps
            )));
        }

        let v = &self.variance;
        if v.n_k < 16 || v.n_r < 8 {
            return Err(HmcodeError::configuration(format!(
                "variance.n_k >= 16 and variance.n_r >= 8 required, got n_k={}, n_r={}",
                v.n_k, v.n_r
            )));
        }
        if !(v.r_min > 0.0 && v.r_max > v.r_min) {
            return Err(HmcodeError::configuration(format!(
                "variance radius range [{}, {}] is invalid",
                v.r_min, v.r_max
            )));
        }
        if !(v.sigma_tolerance > 0.0 && v.truncation_tolerance > 0.0) {
            return Err(HmcodeError::configuration(
                "variance.sigma_tolerance and variance.truncation_tolerance must be positive",
            ));
        }

        let d = &self.dewiggle;
        if !(d.sigma_dlnk > 0.0 && d.truncate > 0.0) {
            return Err(HmcodeError::configuration(format!(
                "dewiggle.sigma_dlnk and dewiggle.truncate must be positive, got {} and {}",
                d.sigma_dlnk, d.truncate
            )));
        }

        let c = &self.collapse;
        if !(c.z_infinity > 0.0 && c.z_infinity.is_finite()) {
            return Err(HmcodeError::configuration(format!(
                "collapse.z_infinity must be positive and finite, got {}",
                c.z_infinity
            )));
        }
        if !c.dolag_exponent.is_finite() {
            return Err(HmcodeError::configuration(
                "collapse.dolag_exponent must be finite",
            ));
        }
        if !(c.formation_mass_fraction > 0.0 && c.formation_mass_fraction <= 1.0) {
            return Err(HmcodeError::configuration(format!(
                "collapse.formation_mass_fraction must lie in (0, 1], got {}",
                c.formation_mass_fraction
            )));
        }

        let h = &self.halos;
        if !(h.m_min > 0.0 && h.m_max > h.m_min) || h.n_m < 2 {
            return Err(HmcodeError::configuration(format!(
                "halo mass grid [{}, {}] with {} points is invalid",
                h.m_min, h.m_max, h.n_m
            )));
        }

        let s = &self.solver;
        if !(s.root_tolerance > 0.0) || s.max_iterations == 0 {
            return Err(HmcodeError::configuration(
                "solver.root_tolerance must be positive and solver.max_iterations non-zero",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_config_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("hmcode_config_{}_{name}.json", std::process::id()))
    }

    #[test]
    fn test_defaults_are_valid() {
        let cfg = HmcodeConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.halos.n_m, 256);
        assert!((cfg.dewiggle.sigma_dlnk - 0.25).abs() < 1e-15);
        assert!((cfg.collapse.z_infinity - 10.0).abs() < 1e-15);
        assert_eq!(cfg.collapse.fit, CollapseFit::Mead2017);
        assert_eq!(cfg.halos.two_halo, TwoHaloMode::Linear);
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let json = r#"{"dewiggle": {"sigma_dlnk": 0.3}, "halos": {"two_halo": "integrated"}}"#;
        let cfg: HmcodeConfig = serde_json::from_str(json).unwrap();
        assert!((cfg.dewiggle.sigma_dlnk - 0.3).abs() < 1e-15);
        assert!((cfg.dewiggle.truncate - 4.0).abs() < 1e-15);
        assert_eq!(cfg.halos.two_halo, TwoHaloMode::Integrated);
        assert_eq!(cfg.halos.n_m, 256);
        assert_eq!(cfg.growth, GrowthConfig::default());
    }

    #[test]
    fn test_from_file_roundtrip() {
        let mut cfg = HmcodeConfig::default();
        cfg.collapse.z_infinity = 8.0;
        cfg.collapse.fit = CollapseFit::LcdmFits;
        let path = temp_config_path("roundtrip");
        std::fs::write(&path, serde_json::to_string_pretty(&cfg).unwrap()).unwrap();
        let loaded = HmcodeConfig::from_file(&path.to_string_lossy()).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn test_from_file_rejects_invalid() {
        let path = temp_config_path("invalid");
        std::fs::write(&path, r#"{"variance": {"r_min": 10.0, "r_max": 1.0}}"#).unwrap();
        let result = HmcodeConfig::from_file(&path.to_string_lossy());
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(HmcodeError::Configuration(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = HmcodeConfig::from_file("/nonexistent/hmcode/config.json");
        assert!(matches!(result, Err(HmcodeError::Io(_))));
    }
}
