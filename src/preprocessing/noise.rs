//! Synthetic interference injectors used to validate the filter bank.
//!
//! Three kinds of ECG corruption can be simulated:
//! - powerline interference (a 50 Hz or 60 Hz sinusoid)
//! - baseline wander (a slow sinusoid from respiration and electrode drift)
//! - electromyographic noise (zero-mean Gaussian white noise)
//!
//! Every injector returns a new [`Signal`] with the input's length and sampling
//! rate. Random draws come from a caller-supplied generator, so a seeded
//! generator reproduces the same corruption.

use crate::error::{DenoiseError, Result};
use crate::signal::Signal;
use core::f64::consts::PI;
use log::trace;
use nalgebra::{DVector, DVectorView};
use rand::Rng;
use rand_distr::StandardNormal;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Description of the interference to add to a clean signal.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoiseSpec {
    /// Mains interference at `freq` Hz.
    Powerline { freq: f64, amplitude: f64 },
    /// Low-frequency drift at `freq` Hz.
    BaselineWander { freq: f64, amplitude: f64 },
    /// Gaussian muscle noise with standard deviation `amplitude`.
    Emg { amplitude: f64 },
}

impl NoiseSpec {
    /// 50 Hz powerline interference with amplitude 0.2.
    pub fn powerline() -> Self {
        NoiseSpec::Powerline {
            freq: 50.0,
            amplitude: 0.2,
        }
    }

    /// 0.5 Hz baseline wander with amplitude 0.5.
    pub fn baseline_wander() -> Self {
        NoiseSpec::BaselineWander {
            freq: 0.5,
            amplitude: 0.5,
        }
    }

    /// EMG noise with amplitude 0.1.
    pub fn emg() -> Self {
        NoiseSpec::Emg { amplitude: 0.1 }
    }

    /// Adds the described interference to `signal`.
    ///
    /// `rng` is only consumed by [`NoiseSpec::Emg`].
    pub fn apply<R: Rng + ?Sized>(&self, signal: &Signal, rng: &mut R) -> Result<Signal> {
        match *self {
            NoiseSpec::Powerline { freq, amplitude } => {
                add_powerline_noise(signal, freq, amplitude)
            }
            NoiseSpec::BaselineWander { freq, amplitude } => {
                add_baseline_wander(signal, freq, amplitude)
            }
            NoiseSpec::Emg { amplitude } => add_emg_noise(signal, amplitude, rng),
        }
    }
}

/// Adds powerline interference `amplitude * sin(2π·freq·t)` to the signal.
///
/// Time is measured from sample index 0 using the signal's sampling rate.
///
/// # Arguments
///
/// * `signal` - The clean signal.
/// * `freq` - Interference frequency in Hz, typically 50 or 60.
/// * `amplitude` - Peak amplitude of the interference. Zero leaves the signal unchanged.
///
/// # Errors
///
/// Returns a `Configuration` error if `freq` or `amplitude` is negative or not finite.
///
/// # Examples
///
/// ```
/// use ecg_denoise::Signal;
/// use ecg_denoise::preprocessing::noise::add_powerline_noise;
/// let signal = Signal::new(vec![1.0; 360], 360.0).unwrap();
/// let noisy = add_powerline_noise(&signal, 50.0, 0.2).unwrap();
/// assert_eq!(noisy.len(), signal.len());
/// noisy.samples().iter().for_each(|x| assert!((x - 1.0).abs() <= 0.2 + 1e-12));
/// ```
pub fn add_powerline_noise(signal: &Signal, freq: f64, amplitude: f64) -> Result<Signal> {
    add_sinusoid(signal, freq, amplitude)
}

/// Adds a low-frequency sinusoid simulating baseline wander.
///
/// Same form as [`add_powerline_noise`], intended for frequencies well below 1 Hz.
///
/// # Errors
///
/// Returns a `Configuration` error if `freq` or `amplitude` is negative or not finite.
pub fn add_baseline_wander(signal: &Signal, freq: f64, amplitude: f64) -> Result<Signal> {
    add_sinusoid(signal, freq, amplitude)
}

/// Adds zero-mean Gaussian noise with standard deviation `amplitude`.
///
/// The noise is drawn from `rng`, which makes the result reproducible for a
/// seeded generator.
///
/// # Errors
///
/// Returns a `Configuration` error if `amplitude` is negative or not finite.
///
/// # Examples
///
/// ```
/// use ecg_denoise::Signal;
/// use ecg_denoise::preprocessing::noise::add_emg_noise;
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let signal = Signal::new(vec![0.0; 100], 360.0).unwrap();
/// let a = add_emg_noise(&signal, 0.1, &mut StdRng::seed_from_u64(7)).unwrap();
/// let b = add_emg_noise(&signal, 0.1, &mut StdRng::seed_from_u64(7)).unwrap();
/// assert_eq!(a, b);
/// ```
pub fn add_emg_noise<R: Rng + ?Sized>(
    signal: &Signal,
    amplitude: f64,
    rng: &mut R,
) -> Result<Signal> {
    check_amplitude(amplitude)?;
    trace!("adding EMG noise, amplitude {amplitude}");
    let original = DVectorView::from(signal.samples());
    let noise = DVector::from_fn(original.len(), |_, _| {
        amplitude * rng.sample::<f64, _>(StandardNormal)
    });
    let res = original + noise;
    signal.with_samples(res.data.into())
}

fn add_sinusoid(signal: &Signal, freq: f64, amplitude: f64) -> Result<Signal> {
    check_amplitude(amplitude)?;
    if !(freq.is_finite() && freq >= 0.0) {
        return Err(DenoiseError::config(format!(
            "Noise frequency must be non-negative and finite, got {freq}"
        )));
    }
    trace!("adding {freq} Hz sinusoid, amplitude {amplitude}");
    let fs = signal.sampling_rate();
    let original = DVectorView::from(signal.samples());
    let noise = DVector::from_fn(original.len(), |i, _| {
        amplitude * (2.0 * PI * freq * i as f64 / fs).sin()
    });
    let res = original + noise;
    signal.with_samples(res.data.into())
}

fn check_amplitude(amplitude: f64) -> Result<()> {
    if amplitude.is_finite() && amplitude >= 0.0 {
        Ok(())
    } else {
        Err(DenoiseError::config(format!(
            "Noise amplitude must be non-negative and finite, got {amplitude}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn get_test_signal(size: usize) -> Signal {
        let samples = (0..size)
            .map(|i| (2.0 * PI * 1.2 * i as f64 / 360.0).sin())
            .collect();
        Signal::new(samples, 360.0).unwrap()
    }

    #[test]
    fn test_powerline_zero_amplitude_is_identity() {
        let signal = Signal::new(vec![1.0; 1000], 360.0).unwrap();
        let result = add_powerline_noise(&signal, 50.0, 0.0).unwrap();
        assert_eq!(result, signal);
    }

    #[test]
    fn test_baseline_zero_amplitude_is_identity() {
        let signal = get_test_signal(500);
        let result = add_baseline_wander(&signal, 0.5, 0.0).unwrap();
        assert_eq!(result, signal);
    }

    #[test]
    fn test_emg_zero_amplitude_is_identity() {
        let signal = get_test_signal(500);
        let mut rng = StdRng::seed_from_u64(42);
        let result = add_emg_noise(&signal, 0.0, &mut rng).unwrap();
        assert_eq!(result, signal);
    }

    #[test]
    fn test_powerline_values() {
        let signal = Signal::new(vec![0.0; 8], 200.0).unwrap();
        let result = add_powerline_noise(&signal, 50.0, 1.0).unwrap();
        // quarter period per sample: 0, 1, 0, -1, ...
        let expected = [0.0, 1.0, 0.0, -1.0, 0.0, 1.0, 0.0, -1.0];
        for (r, e) in result.samples().iter().zip(expected.iter()) {
            assert!((r - e).abs() < 1e-12, "Expected {e}, got {r}");
        }
        assert_eq!(result.sampling_rate(), 200.0);
    }

    #[test]
    fn test_baseline_wander_bounded() {
        let signal = get_test_signal(1000);
        let result = add_baseline_wander(&signal, 0.5, 0.5).unwrap();
        assert_eq!(result.len(), signal.len());
        for (p, np) in signal.samples().iter().zip(result.samples()) {
            assert!((p - np).abs() <= 0.5 + 1e-12);
        }
    }

    #[test]
    fn test_emg_statistics() {
        let signal = Signal::new(vec![0.0; 20_000], 360.0).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let result = add_emg_noise(&signal, 0.1, &mut rng).unwrap();
        let noise = DVectorView::from(result.samples());
        assert!(noise.mean().abs() < 0.01, "EMG noise should be zero-mean");
        let std = noise.variance().sqrt();
        assert!((std - 0.1).abs() < 0.01, "EMG noise std should match amplitude");
    }

    #[test]
    fn test_emg_reproducible() {
        let signal = get_test_signal(256);
        let a = add_emg_noise(&signal, 0.1, &mut StdRng::seed_from_u64(3)).unwrap();
        let b = add_emg_noise(&signal, 0.1, &mut StdRng::seed_from_u64(3)).unwrap();
        let c = add_emg_noise(&signal, 0.1, &mut StdRng::seed_from_u64(4)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_negative_amplitude() {
        let signal = get_test_signal(10);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(add_powerline_noise(&signal, 50.0, -0.1).is_err());
        assert!(add_baseline_wander(&signal, 0.5, -1.0).is_err());
        assert!(add_emg_noise(&signal, -0.1, &mut rng).is_err());
        assert!(add_powerline_noise(&signal, -50.0, 0.1).is_err());
    }

    #[test]
    fn test_noise_no_data() {
        let signal = Signal::new(vec![], 360.0).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let result = NoiseSpec::emg().apply(&signal, &mut rng).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_spec_dispatch() {
        let signal = get_test_signal(100);
        let mut rng = StdRng::seed_from_u64(0);
        let via_spec = NoiseSpec::powerline().apply(&signal, &mut rng).unwrap();
        let direct = add_powerline_noise(&signal, 50.0, 0.2).unwrap();
        assert_eq!(via_spec, direct);
    }
}
