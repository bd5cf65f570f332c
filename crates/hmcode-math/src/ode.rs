// ─────────────────────────────────────────────────────────────────────
// SCPN HMcode Core — ODE Integration
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Explicit integrators for small fixed-size ODE systems.
//!
//! [`Rk4`] is the fixed-step reference stepper used in regression
//! comparisons. [`DormandPrince`] is the adaptive 5(4) pair used for
//! production growth tables.

use crate::error::NumericalError;

/// Right-hand side of `dy/dt = f(t, y)` with an `N`-component state.
pub trait OdeSystem<const N: usize> {
    fn derivatives(&self, t: f64, y: &[f64; N]) -> [f64; N];
}

/// Integrates an [`OdeSystem`] and reports the state at requested times.
pub trait OdeIntegrator {
    /// `times` must be strictly monotone; `y0` is the state at `times[0]`.
    /// The output has one state per entry of `times`.
    fn integrate<const N: usize, S: OdeSystem<N>>(
        &self,
        system: &S,
        y0: [f64; N],
        times: &[f64],
    ) -> Result<Vec<[f64; N]>, NumericalError>;
}

fn axpy<const N: usize>(y: &[f64; N], h: f64, terms: &[(&[f64; N], f64)]) -> [f64; N] {
    let mut out = *y;
    for (i, slot) in out.iter_mut().enumerate() {
        let mut acc = 0.0;
        for (k, c) in terms {
            acc += c * k[i];
        }
        *slot += h * acc;
    }
    out
}

fn check_times(times: &[f64]) -> Result<(), NumericalError> {
    if times.is_empty() {
        return Err(NumericalError::InvalidGrid(
            "ODE output grid is empty".to_string(),
        ));
    }
    let increasing = times.windows(2).all(|w| w[1] > w[0]);
    let decreasing = times.windows(2).all(|w| w[1] < w[0]);
    if !(increasing || decreasing) || times.iter().any(|t| !t.is_finite()) {
        return Err(NumericalError::InvalidGrid(
            "ODE output times must be finite and strictly monotone".to_string(),
        ));
    }
    Ok(())
}

fn finite<const N: usize>(t: f64, y: &[f64; N]) -> Result<(), NumericalError> {
    if y.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(NumericalError::NonFinite { t })
    }
}

/// Classical fourth-order Runge-Kutta with `substeps` equal steps
/// between consecutive output times.
#[derive(Debug, Clone, Copy)]
pub struct Rk4 {
    pub substeps: usize,
}

impl Default for Rk4 {
    fn default() -> Self {
        Rk4 { substeps: 8 }
    }
}

impl Rk4 {
    pub fn step<const N: usize, S: OdeSystem<N>>(
        system: &S,
        t: f64,
        y: &[f64; N],
        h: f64,
    ) -> [f64; N] {
        let k1 = system.derivatives(t, y);
        let k2 = system.derivatives(t + 0.5 * h, &axpy(y, 0.5 * h, &[(&k1, 1.0)]));
        let k3 = system.derivatives(t + 0.5 * h, &axpy(y, 0.5 * h, &[(&k2, 1.0)]));
        let k4 = system.derivatives(t + h, &axpy(y, h, &[(&k3, 1.0)]));
        axpy(y, h / 6.0, &[(&k1, 1.0), (&k2, 2.0), (&k3, 2.0), (&k4, 1.0)])
    }
}

impl OdeIntegrator for Rk4 {
    fn integrate<const N: usize, S: OdeSystem<N>>(
        &self,
        system: &S,
        y0: [f64; N],
        times: &[f64],
    ) -> Result<Vec<[f64; N]>, NumericalError> {
        check_times(times)?;
        let substeps = self.substeps.max(1);
        let mut out = Vec::with_capacity(times.len());
        let mut y = y0;
        out.push(y);
        for w in times.windows(2) {
            let h = (w[1] - w[0]) / substeps as f64;
            let mut t = w[0];
            for _ in 0..substeps {
                y = Self::step(system, t, &y, h);
                t += h;
            }
            finite(w[1], &y)?;
            out.push(y);
        }
        Ok(out)
    }
}

/// Adaptive Dormand-Prince 5(4) with mixed absolute/relative error control.
#[derive(Debug, Clone, Copy)]
pub struct DormandPrince {
    pub rtol: f64,
    pub atol: f64,
    /// Budget of accepted plus rejected steps over the whole integration.
    pub max_steps: usize,
}

impl Default for DormandPrince {
    fn default() -> Self {
        DormandPrince {
            rtol: 1e-8,
            atol: 1e-10,
            max_steps: 100_000,
        }
    }
}

const C2: f64 = 1.0 / 5.0;
const C3: f64 = 3.0 / 10.0;
const C4: f64 = 4.0 / 5.0;
const C5: f64 = 8.0 / 9.0;
const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;
const B1: f64 = 35.0 / 384.0;
const B3: f64 = 500.0 / 1113.0;
const B4: f64 = 125.0 / 192.0;
const B5: f64 = -2187.0 / 6784.0;
const B6: f64 = 11.0 / 84.0;
// Fifth minus fourth order weights.
const E1: f64 = 71.0 / 57600.0;
const E3: f64 = -71.0 / 16695.0;
const E4: f64 = 71.0 / 1920.0;
const E5: f64 = -17253.0 / 339200.0;
const E6: f64 = 22.0 / 525.0;
const E7: f64 = -1.0 / 40.0;

impl DormandPrince {
    /// One trial step. Returns the fifth-order solution and the error norm.
    fn trial<const N: usize, S: OdeSystem<N>>(
        &self,
        system: &S,
        t: f64,
        y: &[f64; N],
        k1: &[f64; N],
        h: f64,
    ) -> ([f64; N], [f64; N], f64) {
        let k2 = system.derivatives(t + C2 * h, &axpy(y, h, &[(k1, A21)]));
        let k3 = system.derivatives(t + C3 * h, &axpy(y, h, &[(k1, A31), (&k2, A32)]));
        let k4 = system.derivatives(
            t + C4 * h,
            &axpy(y, h, &[(k1, A41), (&k2, A42), (&k3, A43)]),
        );
        let k5 = system.derivatives(
            t + C5 * h,
            &axpy(y, h, &[(k1, A51), (&k2, A52), (&k3, A53), (&k4, A54)]),
        );
        let k6 = system.derivatives(
            t + h,
            &axpy(y, h, &[(k1, A61), (&k2, A62), (&k3, A63), (&k4, A64), (&k5, A65)]),
        );
        let y_new = axpy(y, h, &[(k1, B1), (&k3, B3), (&k4, B4), (&k5, B5), (&k6, B6)]);
        let k7 = system.derivatives(t + h, &y_new);

        let mut sum = 0.0;
        for i in 0..N {
            let err = h
                * (E1 * k1[i] + E3 * k3[i] + E4 * k4[i] + E5 * k5[i] + E6 * k6[i] + E7 * k7[i]);
            let scale = self.atol + self.rtol * y[i].abs().max(y_new[i].abs());
            sum += (err / scale).powi(2);
        }
        let norm = if N == 0 { 0.0 } else { (sum / N as f64).sqrt() };
        (y_new, k7, norm)
    }
}

impl OdeIntegrator for DormandPrince {
    fn integrate<const N: usize, S: OdeSystem<N>>(
        &self,
        system: &S,
        y0: [f64; N],
        times: &[f64],
    ) -> Result<Vec<[f64; N]>, NumericalError> {
        check_times(times)?;
        let mut out = Vec::with_capacity(times.len());
        out.push(y0);
        if times.len() == 1 {
            return Ok(out);
        }

        let direction = (times[1] - times[0]).signum();
        let mut t = times[0];
        let mut y = y0;
        let mut k1 = system.derivatives(t, &y);
        let mut h = 0.01 * (times[1] - times[0]);
        let mut steps = 0usize;

        for &target in &times[1..] {
            while (target - t) * direction > 0.0 {
                if steps >= self.max_steps {
                    return Err(NumericalError::StepLimit { steps, t });
                }
                steps += 1;
                let remaining = target - t;
                let clipped = if (h - remaining) * direction > 0.0 {
                    remaining
                } else {
                    h
                };
                let (y_new, k7, norm) = self.trial(system, t, &y, &k1, clipped);
                if !norm.is_finite() {
                    h = 0.25 * clipped;
                    if h.abs() <= f64::EPSILON * t.abs().max(1.0) {
                        return Err(NumericalError::NonFinite { t });
                    }
                    continue;
                }
                let factor = if norm == 0.0 {
                    5.0
                } else {
                    (0.9 * norm.powf(-0.2)).clamp(0.2, 5.0)
                };
                if norm <= 1.0 {
                    t = if clipped == remaining { target } else { t + clipped };
                    y = y_new;
                    k1 = k7;
                    finite(t, &y)?;
                }
                h = clipped * factor;
            }
            out.push(y);
        }
        Ok(out)
    }
}
