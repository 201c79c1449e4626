//! The `Signal` type: a fixed-length sample buffer tagged with its sampling rate.
//!
//! Signals are immutable once built. Noise injectors and filters never modify
//! their input; they derive a new `Signal` through [`Signal::with_samples`],
//! which keeps the sampling rate of the source.

use crate::error::{DenoiseError, Result};
#[cfg(feature = "serde")]
use serde::Serialize;

/// A single-channel waveform sampled at a constant rate.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    samples: Vec<f64>,
    sampling_rate: f64,
}

impl Signal {
    /// Creates a new signal from raw samples and a sampling rate in Hz.
    ///
    /// # Errors
    ///
    /// * `Configuration` if the sampling rate is not a finite positive number.
    /// * `Numeric` if any sample is NaN or infinite.
    ///
    /// # Examples
    ///
    /// ```
    /// use ecg_denoise::Signal;
    /// let signal = Signal::new(vec![0.0, 0.5, 1.0], 360.0).unwrap();
    /// assert_eq!(signal.len(), 3);
    /// assert_eq!(signal.sampling_rate(), 360.0);
    /// ```
    pub fn new(samples: Vec<f64>, sampling_rate: f64) -> Result<Self> {
        if !(sampling_rate.is_finite() && sampling_rate > 0.0) {
            return Err(DenoiseError::config(format!(
                "Sampling rate must be positive and finite, got {sampling_rate}"
            )));
        }
        if let Some(idx) = samples.iter().position(|x| !x.is_finite()) {
            return Err(DenoiseError::numeric(format!(
                "Sample {idx} is not a finite number"
            )));
        }
        Ok(Self {
            samples,
            sampling_rate,
        })
    }

    /// Builds a signal that shares this signal's sampling rate.
    ///
    /// Used by transforms, whose output must keep the input rate.
    pub(crate) fn with_samples(&self, samples: Vec<f64>) -> Result<Self> {
        Self::new(samples, self.sampling_rate)
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    /// Nyquist frequency in Hz.
    pub fn nyquist(&self) -> f64 {
        0.5 * self.sampling_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Consumes the signal and returns its sample buffer.
    pub fn into_samples(self) -> Vec<f64> {
        self.samples
    }

    /// Fails with `Numeric` if the signal holds no samples.
    pub(crate) fn ensure_not_empty(&self, operation: &str) -> Result<()> {
        if self.is_empty() {
            Err(DenoiseError::numeric(format!(
                "{operation} requires a non-empty signal"
            )))
        } else {
            Ok(())
        }
    }
}

impl AsRef<[f64]> for Signal {
    fn as_ref(&self) -> &[f64] {
        &self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_signal() {
        let signal = Signal::new(vec![1.0, 2.0, 3.0], 250.0).unwrap();
        assert_eq!(signal.samples(), &[1.0, 2.0, 3.0]);
        assert_eq!(signal.nyquist(), 125.0);
        assert!(!signal.is_empty());
    }

    #[test]
    fn test_invalid_sampling_rate() {
        for fs in [0.0, -360.0, f64::NAN, f64::INFINITY] {
            let result = Signal::new(vec![1.0], fs);
            assert!(
                matches!(result, Err(DenoiseError::Configuration(_))),
                "Sampling rate {fs} should be rejected"
            );
        }
    }

    #[test]
    fn test_non_finite_sample() {
        let result = Signal::new(vec![1.0, f64::NAN], 360.0);
        assert!(matches!(result, Err(DenoiseError::Numeric(_))));
    }

    #[test]
    fn test_empty_signal_is_constructible() {
        let signal = Signal::new(vec![], 360.0).unwrap();
        assert!(signal.is_empty());
        assert!(signal.ensure_not_empty("test").is_err());
    }

    #[test]
    fn test_with_samples_keeps_rate() {
        let signal = Signal::new(vec![1.0, 2.0], 500.0).unwrap();
        let derived = signal.with_samples(vec![3.0, 4.0]).unwrap();
        assert_eq!(derived.sampling_rate(), 500.0);
        assert_eq!(signal.samples(), &[1.0, 2.0]);
    }
}
