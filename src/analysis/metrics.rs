//! This module provides metrics to quantify how well a filter recovers a reference signal.
//!
//! Currently the following metrics can be calculated:
//! - Signal-to-Noise Ratio (SNR) in dB
//! - Mean Squared Error (MSE)
//!
//! [`evaluate`] combines both into an [`EvaluationRecord`] for one denoising method.

use crate::error::{DenoiseError, Result};
use crate::filtering::SignalFilter;
use crate::signal::Signal;
use core::fmt;
use log::debug;
use nalgebra::{DVector, DVectorView};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Evaluation of one denoising method against a clean reference.
///
/// `snr_before` and `snr_after` are `f64::INFINITY` when the compared signal is
/// identical to the reference. `mse` is always finite.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationRecord {
    pub label: String,
    pub snr_before: f64,
    pub snr_after: f64,
    pub mse: f64,
}

impl EvaluationRecord {
    /// SNR gain of the filter in dB.
    pub fn snr_improvement(&self) -> f64 {
        self.snr_after - self.snr_before
    }
}

impl fmt::Display for EvaluationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Performance of {}:", self.label)?;
        writeln!(f, "SNR Before Filtering: {:.2} dB", self.snr_before)?;
        writeln!(f, "SNR After Filtering: {:.2} dB", self.snr_after)?;
        write!(f, "MSE After Filtering: {:.6}", self.mse)
    }
}

/// Difference `reference - test` after checking both signals are comparable.
fn residual(reference: &Signal, test: &Signal) -> Result<DVector<f64>> {
    if reference.is_empty() || test.is_empty() {
        return Err(DenoiseError::numeric(
            "Signals must contain at least one element for comparison.",
        ));
    }
    if reference.len() != test.len() {
        return Err(DenoiseError::numeric(format!(
            "Signals must have the same length, got {} and {}",
            reference.len(),
            test.len()
        )));
    }
    let diff = DVectorView::from(reference.samples()) - DVectorView::from(test.samples());
    if diff.iter().any(|d| !d.is_finite()) {
        return Err(DenoiseError::numeric(
            "Sample differences overflowed the f64 range.",
        ));
    }
    Ok(diff)
}

/// Mean square of `values` split into `(scale, power)`.
///
/// The mean square equals `scale^2 * power`, where `scale` is the largest
/// magnitude and `power` lies in `[1/n, 1]`. Neither factor under- or
/// overflows for finite input. An all-zero input gives `(0.0, 0.0)`.
fn scaled_power(values: &[f64]) -> (f64, f64) {
    let values = DVectorView::from(values);
    let scale = values.amax();
    if scale == 0.0 {
        return (0.0, 0.0);
    }
    let scaled = values.map(|v| v / scale);
    (scale, scaled.norm_squared() / values.len() as f64)
}

/// Calculates the Mean Squared Error (MSE) between a reference and a test signal.
///
/// # Returns
///
/// * `Result<f64>` - The mean of the squared sample differences. Zero if and only if the signals are identical.
///   A non-zero MSE below the f64 range is reported as the smallest positive subnormal.
///
/// # Errors
///
/// Returns a `Numeric` error if a signal is empty, the lengths differ, or the
/// squared differences overflow.
pub fn calc_mse(reference: &Signal, test: &Signal) -> Result<f64> {
    let diff = residual(reference, test)?;
    if reference.samples() == test.samples() {
        return Ok(0.0);
    }
    let (scale, power) = scaled_power(diff.as_slice());
    let mse = scale * (scale * power);
    if !mse.is_finite() {
        return Err(DenoiseError::numeric("MSE overflowed the f64 range."));
    }
    Ok(mse.max(f64::from_bits(1)))
}

/// Calculates the Signal-to-Noise Ratio (SNR) in dB.
///
/// The signal power is the mean square of `reference`. The noise power is the
/// mean square of `reference - test`. Both are evaluated on data normalized by
/// its largest magnitude, so the ratio stays finite for any finite input.
///
/// # Returns
///
/// * `Result<f64>` - `10 * log10(signal_power / noise_power)`, or `f64::INFINITY` if the signals are identical.
///
/// # Errors
///
/// Returns a `Numeric` error if a signal is empty, the lengths differ, the
/// sample differences overflow, or the reference has zero power while the test
/// signal differs from it.
///
/// # Examples
///
/// ```
/// use ecg_denoise::Signal;
/// use ecg_denoise::analysis::metrics::calc_snr;
/// let reference = Signal::new(vec![1.0; 1000], 360.0).unwrap();
/// assert_eq!(calc_snr(&reference, &reference).unwrap(), f64::INFINITY);
/// ```
pub fn calc_snr(reference: &Signal, test: &Signal) -> Result<f64> {
    let diff = residual(reference, test)?;
    if reference.samples() == test.samples() {
        return Ok(f64::INFINITY);
    }
    let (signal_scale, signal_power) = scaled_power(reference.samples());
    if signal_scale == 0.0 {
        return Err(DenoiseError::numeric(
            "SNR is undefined for a zero-power reference signal.",
        ));
    }
    // distinct finite samples always leave a non-zero difference
    let (noise_scale, noise_power) = scaled_power(diff.as_slice());
    Ok(10.0 * (signal_power / noise_power).log10()
        + 20.0 * (signal_scale.log10() - noise_scale.log10()))
}

/// Evaluates one denoising method.
///
/// # Arguments
///
/// * `reference` - The clean signal.
/// * `noisy` - The corrupted signal the method was applied to.
/// * `filtered` - The method's output.
/// * `label` - Name of the method, copied into the record.
///
/// # Errors
///
/// Propagates the errors of [`calc_snr`] and [`calc_mse`].
pub fn evaluate(
    reference: &Signal,
    noisy: &Signal,
    filtered: &Signal,
    label: &str,
) -> Result<EvaluationRecord> {
    let record = EvaluationRecord {
        label: label.to_owned(),
        snr_before: calc_snr(reference, noisy)?,
        snr_after: calc_snr(reference, filtered)?,
        mse: calc_mse(reference, filtered)?,
    };
    debug!(
        "{label}: SNR {:.2} dB -> {:.2} dB, MSE {:.6}",
        record.snr_before, record.snr_after, record.mse
    );
    Ok(record)
}

/// Filters `noisy` with `filter` and evaluates the result against `reference`.
///
/// # Errors
///
/// Propagates the filter's error, or the errors of [`evaluate`].
pub fn evaluate_filter(
    reference: &Signal,
    noisy: &Signal,
    filter: &dyn SignalFilter,
    label: &str,
) -> Result<EvaluationRecord> {
    let filtered = filter.filter(noisy)?;
    evaluate(reference, noisy, &filtered, label)
}
