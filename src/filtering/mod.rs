//! The denoising filter bank.
//!
//! Five stateless transforms are available, selected with [`FilterSpec`]:
//!
//! - `Notch`: removes a narrow band around the powerline frequency.
//! - `HighPass`: Butterworth high-pass against baseline wander.
//! - `LowPass`: Butterworth low-pass against EMG and other high-frequency noise.
//! - `Wavelet`: wavelet soft-threshold denoising.
//! - `SavitzkyGolay`: subtracts a local polynomial trend and keeps the residual.
//!
//! The IIR filters are applied forward and backward (zero phase), so QRS
//! timing and morphology are not shifted. Every transform returns a new
//! [`Signal`] with the input's length and sampling rate.
//!
//! # Example
//!
//! ```rust
//! use ecg_denoise::filtering::{apply_filter, FilterSpec};
//! use ecg_denoise::Signal;
//!
//! let samples = (0..1000).map(|i| (i as f64 * 0.05).sin()).collect();
//! let signal = Signal::new(samples, 360.0).unwrap();
//! let filtered = apply_filter(&signal, &FilterSpec::notch()).unwrap();
//! assert_eq!(filtered.len(), signal.len());
//! ```

pub mod iir;
pub mod savgol;
pub mod wavelet;

use crate::error::{DenoiseError, Result};
use crate::signal::Signal;
use iir::BandType;
use log::trace;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
pub use wavelet::Wavelet;

/// A transform from one signal to a new signal of the same length.
///
/// Implemented by [`FilterSpec`]. Custom filters can implement it to be
/// evaluated with [`crate::analysis::metrics::evaluate_filter`].
///
/// # Example
///
/// ```
/// use ecg_denoise::filtering::SignalFilter;
/// use ecg_denoise::{Result, Signal};
///
/// struct Identity;
///
/// impl SignalFilter for Identity {
///     fn filter(&self, signal: &Signal) -> Result<Signal> {
///         Ok(signal.clone())
///     }
/// }
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait SignalFilter {
    /// Filters `signal` and returns the result as a new signal.
    fn filter(&self, signal: &Signal) -> Result<Signal>;
}

/// Denoising method and its parameters.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterSpec {
    /// Second-order notch at `freq` Hz. Higher `quality_factor` means a narrower notch.
    Notch { freq: f64, quality_factor: f64 },
    /// Butterworth high-pass with cutoff in Hz.
    HighPass { cutoff: f64, order: usize },
    /// Butterworth low-pass with cutoff in Hz.
    LowPass { cutoff: f64, order: usize },
    /// Wavelet soft-threshold denoising with `level` decomposition levels.
    Wavelet { wavelet: Wavelet, level: usize },
    /// Savitzky-Golay detrending. The output is the signal minus its polynomial trend.
    SavitzkyGolay {
        window_size: usize,
        poly_order: usize,
    },
}

impl FilterSpec {
    /// 50 Hz notch with quality factor 30.
    pub fn notch() -> Self {
        FilterSpec::Notch {
            freq: 50.0,
            quality_factor: 30.0,
        }
    }

    /// Fourth-order high-pass at 0.3 Hz.
    pub fn high_pass() -> Self {
        FilterSpec::HighPass {
            cutoff: 0.3,
            order: 4,
        }
    }

    /// Fourth-order low-pass at 50 Hz.
    pub fn low_pass() -> Self {
        FilterSpec::LowPass {
            cutoff: 50.0,
            order: 4,
        }
    }

    /// Five-level db6 wavelet denoising.
    pub fn wavelet() -> Self {
        FilterSpec::Wavelet {
            wavelet: Wavelet::Daubechies(6),
            level: 5,
        }
    }

    /// Savitzky-Golay detrending over 151 samples with a 7th order polynomial.
    pub fn savitzky_golay() -> Self {
        FilterSpec::SavitzkyGolay {
            window_size: 151,
            poly_order: 7,
        }
    }

    /// Short human-readable name of the method.
    pub fn name(&self) -> &'static str {
        match self {
            FilterSpec::Notch { .. } => "Notch Filter",
            FilterSpec::HighPass { .. } => "High-Pass Filter",
            FilterSpec::LowPass { .. } => "Low-Pass Filter",
            FilterSpec::Wavelet { .. } => "Wavelet Transform",
            FilterSpec::SavitzkyGolay { .. } => "Savitzky-Golay Filter",
        }
    }
}

impl SignalFilter for FilterSpec {
    fn filter(&self, signal: &Signal) -> Result<Signal> {
        apply_filter(signal, self)
    }
}

/// Applies the filter described by `spec` to `signal`.
///
/// # Errors
///
/// * `Numeric` if the signal is empty or too short for the method.
/// * `Configuration` if a parameter is out of range:
///   - notch frequency at or above Nyquist
///   - cutoff normalized to Nyquist outside (0, 1)
///   - wavelet level deeper than the signal allows
///   - even or oversized Savitzky-Golay window
pub fn apply_filter(signal: &Signal, spec: &FilterSpec) -> Result<Signal> {
    signal.ensure_not_empty(spec.name())?;
    trace!("applying {spec:?} to {} samples", signal.len());
    let data = signal.samples();
    let filtered = match *spec {
        FilterSpec::Notch {
            freq,
            quality_factor,
        } => iir::notch(freq, quality_factor, signal.sampling_rate())?.filtfilt(data)?,
        FilterSpec::HighPass { cutoff, order } => {
            butterworth_filtfilt(signal, cutoff, order, BandType::HighPass)?
        }
        FilterSpec::LowPass { cutoff, order } => {
            butterworth_filtfilt(signal, cutoff, order, BandType::LowPass)?
        }
        FilterSpec::Wavelet { wavelet, level } => wavelet::denoise(data, wavelet, level)?,
        FilterSpec::SavitzkyGolay {
            window_size,
            poly_order,
        } => savgol::detrend(data, window_size, poly_order)?,
    };
    if filtered.len() != signal.len() {
        return Err(DenoiseError::numeric(format!(
            "{} produced {} samples for an input of {}",
            spec.name(),
            filtered.len(),
            signal.len()
        )));
    }
    signal.with_samples(filtered)
}

fn butterworth_filtfilt(
    signal: &Signal,
    cutoff: f64,
    order: usize,
    band: BandType,
) -> Result<Vec<f64>> {
    let wn = cutoff / signal.nyquist();
    iir::butterworth(order, wn, band)?.filtfilt(signal.samples())
}
