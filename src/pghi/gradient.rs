//! Finite-difference phase-gradient estimates from log-magnitudes.
//!
//! For a Gaussian-like window the phase derivatives of the STFT are tied to
//! the log-magnitude derivatives. With hop `a`, transform size `M` and the
//! window constant `γ`:
//!
//! * `tgrad` (phase advance per hop, used for steps along time) is the
//!   log-magnitude slope across frequency scaled by `aM / 2γ`, plus the
//!   `2πam/M` advance every bin `m` has by construction;
//! * `fgrad` (phase change per bin, used for steps along frequency) is the
//!   log-magnitude slope across time scaled by `-γ / 2aM`.
//!
//! NaN and infinities in the input propagate unchanged.

use num_complex::Complex;
use std::f64::consts::PI;

/// Floor added to magnitudes before taking the logarithm.
pub const LOG_FLOOR: f64 = f64::MIN_POSITIVE;

/// `log(s + ε)` for every bin.
#[inline]
pub fn log_magnitude(s: &[f64], out: &mut [f64]) {
    for (o, &v) in out.iter_mut().zip(s) {
        *o = (v + LOG_FLOOR).ln();
    }
}

/// Time-direction gradient of one frame from its log-magnitudes.
///
/// The first and last bin are fixed to 0.
pub fn time_gradient(logs: &[f64], a: usize, m: usize, gamma: f64, tgrad: &mut [f64]) {
    let m2 = logs.len();
    if m2 == 0 {
        return;
    }
    let mul = (a * m) as f64 / (2.0 * gamma);
    let ramp = 2.0 * PI * a as f64 / m as f64;

    tgrad[0] = 0.0;
    tgrad[m2 - 1] = 0.0;
    for bin in 1..m2.saturating_sub(1) {
        tgrad[bin] = mul * (logs[bin + 1] - logs[bin - 1]) + ramp * bin as f64;
    }
}

/// Frequency-direction gradient from three consecutive log-magnitude frames
/// (`oldest`, `middle`, `newest`).
///
/// Causal mode estimates the gradient at `newest` with the second-order
/// backward difference `3s(n) - 4s(n-1) + s(n-2)`; otherwise the centered
/// difference `s(n+1) - s(n-1)` estimates it at `middle`.
#[allow(clippy::too_many_arguments)]
pub fn frequency_gradient(
    oldest: &[f64],
    middle: &[f64],
    newest: &[f64],
    a: usize,
    m: usize,
    gamma: f64,
    causal: bool,
    fgrad: &mut [f64],
) {
    let mul = -gamma / (2.0 * a as f64 * m as f64);
    if causal {
        for (bin, f) in fgrad.iter_mut().enumerate() {
            *f = mul * (3.0 * newest[bin] - 4.0 * middle[bin] + oldest[bin]);
        }
    } else {
        for (bin, f) in fgrad.iter_mut().enumerate() {
            *f = mul * (newest[bin] - oldest[bin]);
        }
    }
}

/// `s · e^{iφ}` for every bin.
#[inline]
pub fn combine_magnitude_phase(s: &[f64], phase: &[f64], out: &mut [Complex<f64>]) {
    for ((c, &mag), &ph) in out.iter_mut().zip(s).zip(phase) {
        *c = Complex::from_polar(mag, ph);
    }
}
