// ─────────────────────────────────────────────────────────────────────
// SCPN HMcode Core — State
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::error::{HmcodeError, HmcodeResult};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Minimum number of samples accepted in a linear power table.
const MIN_TABLE_POINTS: usize = 4;

/// Externally supplied linear power spectrum at a reference redshift.
/// k in h/Mpc, P in (Mpc/h)³. Owned by the provider, read-only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearPowerTable {
    k: Array1<f64>,
    power: Array1<f64>,
    /// Optional cold-matter (CDM + baryon) spectrum on the same k grid.
    power_cold: Option<Array1<f64>>,
    z_ref: f64,
}

impl LinearPowerTable {
    /// Validates: equal lengths, at least 4 samples, strictly increasing
    /// positive k, finite positive P, z_ref >= 0.
    pub fn new(k: Array1<f64>, power: Array1<f64>, z_ref: f64) -> HmcodeResult<Self> {
        if k.len() != power.len() {
            return Err(HmcodeError::configuration(format!(
                "linear table length mismatch: {} k values, {} power values",
                k.len(),
                power.len()
            )));
        }
        if k.len() < MIN_TABLE_POINTS {
            return Err(HmcodeError::configuration(format!(
                "linear table needs at least {MIN_TABLE_POINTS} samples, got {}",
                k.len()
            )));
        }
        if !z_ref.is_finite() || z_ref < 0.0 {
            return Err(HmcodeError::configuration(format!(
                "reference redshift must be finite and >= 0, got {z_ref}"
            )));
        }
        if k.iter().any(|&v| !v.is_finite() || v <= 0.0) {
            return Err(HmcodeError::configuration(
                "linear table k values must be finite and positive",
            ));
        }
        if k.windows(2).into_iter().any(|w| w[1] <= w[0]) {
            return Err(HmcodeError::configuration(
                "linear table k values must be strictly increasing",
            ));
        }
        check_power("power", &power)?;
        Ok(LinearPowerTable {
            k,
            power,
            power_cold: None,
            z_ref,
        })
    }

    /// Attach a cold-matter spectrum sampled on the same k grid.
    pub fn with_cold_power(mut self, power_cold: Array1<f64>) -> HmcodeResult<Self> {
        if power_cold.len() != self.k.len() {
            return Err(HmcodeError::configuration(format!(
                "cold spectrum has {} samples, table has {}",
                power_cold.len(),
                self.k.len()
            )));
        }
        check_power("cold power", &power_cold)?;
        self.power_cold = Some(power_cold);
        Ok(self)
    }

    pub fn k(&self) -> &Array1<f64> {
        &self.k
    }

    pub fn power(&self) -> &Array1<f64> {
        &self.power
    }

    pub fn power_cold(&self) -> Option<&Array1<f64>> {
        self.power_cold.as_ref()
    }

    pub fn z_ref(&self) -> f64 {
        self.z_ref
    }

    pub fn len(&self) -> usize {
        self.k.len()
    }

    pub fn is_empty(&self) -> bool {
        self.k.is_empty()
    }

    pub fn k_min(&self) -> f64 {
        self.k[0]
    }

    pub fn k_max(&self) -> f64 {
        self.k[self.k.len() - 1]
    }

    /// True when `k` lies inside the sampled support.
    pub fn supports(&self, k: f64) -> bool {
        k >= self.k_min() && k <= self.k_max()
    }
}

fn check_power(name: &str, power: &Array1<f64>) -> HmcodeResult<()> {
    if power.iter().any(|&p| !p.is_finite() || p <= 0.0) {
        return Err(HmcodeError::configuration(format!(
            "linear table {name} values must be finite and positive"
        )));
    }
    Ok(())
}

/// Per-redshift halo-model parameter bundle. Never mutated after creation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HaloModelParameters {
    pub redshift: f64,
    /// Linear collapse threshold δ_c.
    pub delta_c: f64,
    /// Virial overdensity Δ_v relative to the mean matter density.
    pub delta_v: f64,
    /// σ8 of the cold linear spectrum at this redshift.
    pub sigma8: f64,
    /// 1D linear displacement dispersion [Mpc/h].
    pub sigma_v: f64,
    /// Radius where σ(R) = 1 [Mpc/h].
    pub r_nl: f64,
    /// -3 - dlnσ²/dlnR at `r_nl`.
    pub n_eff_nl: f64,
    /// Radius where σ(R) = δ_c [Mpc/h].
    pub r_collapse: f64,
    /// -3 - dlnσ²/dlnR at `r_collapse`; drives the fitted parameters.
    pub n_eff: f64,
    /// Two-halo damping amplitude f.
    pub f_damp: f64,
    /// Two-halo damping wavenumber k_d [h/Mpc].
    pub k_d: f64,
    /// Two-halo damping index n_d.
    pub n_d: f64,
    /// One-halo damping wavenumber k_* [h/Mpc].
    pub k_star: f64,
    /// Halo bloating η.
    pub eta: f64,
    /// Concentration amplitude B.
    pub b_conc: f64,
    /// One-/two-halo transition smoothing α.
    pub alpha: f64,
    /// Multiplicative Dolag concentration correction.
    pub dolag: f64,
    /// Neutrino fraction entering the halo terms (0 unless massive neutrinos).
    pub f_nu: f64,
}

/// Non-linear power at one redshift. k in h/Mpc, P in (Mpc/h)³.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NonlinearSpectrumResult {
    pub redshift: f64,
    pub k: Vec<f64>,
    pub power: Vec<f64>,
}

impl NonlinearSpectrumResult {
    pub fn len(&self) -> usize {
        self.k.len()
    }

    pub fn is_empty(&self) -> bool {
        self.k.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.k.iter().copied().zip(self.power.iter().copied())
    }

    /// Log-log linear interpolation between the sampled k values.
    pub fn evaluate(&self, k: f64) -> HmcodeResult<f64> {
        let n = self.k.len();
        if n == 0 {
            return Err(HmcodeError::configuration("empty non-linear spectrum"));
        }
        let (k_min, k_max) = (self.k[0], self.k[n - 1]);
        if !(k >= k_min && k <= k_max) {
            return Err(HmcodeError::domain("non-linear spectrum k", k, k_min, k_max));
        }
        if n == 1 {
            return Ok(self.power[0]);
        }
        let hi = self.k.partition_point(|&x| x < k).clamp(1, n - 1);
        let lo = hi - 1;
        let t = (k.ln() - self.k[lo].ln()) / (self.k[hi].ln() - self.k[lo].ln());
        Ok((self.power[lo].ln() * (1.0 - t) + self.power[hi].ln() * t).exp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> LinearPowerTable {
        let k = Array1::logspace(10.0, -3.0, 1.0, 32);
        let power = k.mapv(|k: f64| 1e4 * k / (1.0 + (k / 0.02).powi(3)));
        LinearPowerTable::new(k, power, 0.0).unwrap()
    }

    #[test]
    fn test_table_accessors() {
        let t = sample_table();
        assert_eq!(t.len(), 32);
        assert!((t.k_min() - 1e-3).abs() < 1e-15);
        assert!((t.k_max() - 10.0).abs() < 1e-12);
        assert!(t.supports(1.0));
        assert!(!t.supports(20.0));
        assert!(t.power_cold().is_none());
    }

    #[test]
    fn test_table_rejects_bad_input() {
        let k = Array1::from(vec![0.1, 0.2, 0.2, 0.4]);
        let p = Array1::from(vec![1.0, 1.0, 1.0, 1.0]);
        assert!(LinearPowerTable::new(k, p, 0.0).is_err());

        let k = Array1::from(vec![0.1, 0.2, 0.3, 0.4]);
        let p = Array1::from(vec![1.0, -1.0, 1.0, 1.0]);
        assert!(LinearPowerTable::new(k, p, 0.0).is_err());

        let k = Array1::from(vec![0.1, 0.2, 0.3]);
        let p = Array1::from(vec![1.0, 1.0, 1.0]);
        assert!(LinearPowerTable::new(k, p, 0.0).is_err());

        let k = Array1::from(vec![0.1, 0.2, 0.3, 0.4]);
        let p = Array1::from(vec![1.0, 1.0, 1.0, 1.0]);
        assert!(LinearPowerTable::new(k, p, -1.0).is_err());
    }

    #[test]
    fn test_cold_power_length_checked() {
        let t = sample_table();
        assert!(t.clone().with_cold_power(Array1::ones(5)).is_err());
        let t = t.with_cold_power(Array1::ones(32)).unwrap();
        assert!(t.power_cold().is_some());
    }

    #[test]
    fn test_result_evaluate_power_law_exact() {
        let k: Vec<f64> = (0..10).map(|i| 10f64.powf(-2.0 + 0.3 * i as f64)).collect();
        let power: Vec<f64> = k.iter().map(|k| 5.0 * k.powf(-1.5)).collect();
        let result = NonlinearSpectrumResult {
            redshift: 0.0,
            k,
            power,
        };
        let val = result.evaluate(0.05).unwrap();
        let expected = 5.0 * 0.05f64.powf(-1.5);
        assert!((val / expected - 1.0).abs() < 1e-12, "val = {val}");
        assert!(matches!(
            result.evaluate(1e-3),
            Err(HmcodeError::Domain { .. })
        ));
    }
}
