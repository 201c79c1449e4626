//! IIR filter design and zero-phase application.
//!
//! Filters are represented as cascaded second-order sections (biquads), which
//! stay numerically stable at the low normalized cutoffs used for baseline
//! wander removal. Two designs are provided:
//!
//! - `butterworth`: digital Butterworth low-pass or high-pass, obtained from the
//!   analog prototype through a prewarped bilinear transform.
//! - `notch`: second-order notch with a quality factor.
//!
//! [`SosFilter::filtfilt`] applies a design forward and backward in time so the
//! result has no phase distortion. The signal is extended by odd reflection at
//! both ends, and each section starts from its steady-state response to the
//! first sample, which keeps edge transients small.

use crate::error::{DenoiseError, Result};
use core::f64::consts::PI;
use log::{debug, trace};

/// Pass band of a Butterworth design.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandType {
    LowPass,
    HighPass,
}

/// Second-order section with `a0` normalized to one.
///
/// Transfer function: `H(z) = (b0 + b1 z^-1 + b2 z^-2) / (1 + a1 z^-1 + a2 z^-2)`.
/// First-order sections keep `b2 = a2 = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl Biquad {
    /// Gain at zero frequency.
    pub fn dc_gain(&self) -> f64 {
        (self.b0 + self.b1 + self.b2) / (1.0 + self.a1 + self.a2)
    }

    /// Direct form II transposed state after an infinitely long unit step.
    fn step_state(&self) -> [f64; 2] {
        let g = self.dc_gain();
        [
            self.b1 + self.b2 - (self.a1 + self.a2) * g,
            self.b2 - self.a2 * g,
        ]
    }

    fn is_first_order(&self) -> bool {
        self.b2 == 0.0 && self.a2 == 0.0
    }
}

/// A cascade of second-order sections.
///
/// The filter holds only coefficients; every call allocates its own state,
/// so one design can be shared across threads.
#[derive(Debug, Clone, PartialEq)]
pub struct SosFilter {
    sections: Vec<Biquad>,
}

impl SosFilter {
    pub fn new(sections: Vec<Biquad>) -> Self {
        Self { sections }
    }

    pub fn sections(&self) -> &[Biquad] {
        &self.sections
    }

    /// Number of samples added at each end before zero-phase filtering.
    ///
    /// Three times the number of taps of the equivalent transfer function;
    /// trailing zero coefficients of first-order sections do not count.
    pub fn pad_len(&self) -> usize {
        let first_order = self.sections.iter().filter(|s| s.is_first_order()).count();
        let ntaps = 2 * self.sections.len() + 1 - first_order;
        3 * ntaps
    }

    /// Steady-state section states for a unit step input.
    ///
    /// Each state is scaled by the DC gain of the sections before it, since
    /// that is the level the section sees once the cascade has settled.
    fn initial_states(&self) -> Vec<[f64; 2]> {
        let mut scale = 1.0;
        self.sections
            .iter()
            .map(|section| {
                let [z1, z2] = section.step_state();
                let state = [z1 * scale, z2 * scale];
                scale *= section.dc_gain();
                state
            })
            .collect()
    }

    /// Runs the cascade once over `data`, starting from `states` scaled by `x0`.
    fn run(&self, data: &[f64], states: &[[f64; 2]], x0: f64) -> Vec<f64> {
        let mut z: Vec<[f64; 2]> = states.iter().map(|s| [s[0] * x0, s[1] * x0]).collect();
        data.iter()
            .map(|&x| {
                self.sections
                    .iter()
                    .zip(z.iter_mut())
                    .fold(x, |input, (s, z)| {
                        let output = s.b0 * input + z[0];
                        z[0] = s.b1 * input - s.a1 * output + z[1];
                        z[1] = s.b2 * input - s.a2 * output;
                        output
                    })
            })
            .collect()
    }

    /// Causal single pass, starting from rest.
    pub fn filter(&self, data: &[f64]) -> Vec<f64> {
        let rest = vec![[0.0, 0.0]; self.sections.len()];
        self.run(data, &rest, 0.0)
    }

    /// Zero-phase filtering: forward pass, then a pass over the reversed output.
    ///
    /// The output has the same length as `data`. Its magnitude response is the
    /// square of the filter's magnitude response.
    ///
    /// # Errors
    ///
    /// Returns a `Numeric` error if `data` is not longer than [`SosFilter::pad_len`].
    pub fn filtfilt(&self, data: &[f64]) -> Result<Vec<f64>> {
        let pad = self.pad_len();
        if data.len() <= pad {
            return Err(DenoiseError::numeric(format!(
                "Signal of {} samples is too short for zero-phase filtering, more than {pad} required",
                data.len()
            )));
        }
        trace!(
            "filtfilt over {} samples, {} sections, pad {pad}",
            data.len(),
            self.sections.len()
        );
        let extended = odd_extend(data, pad);
        let states = self.initial_states();

        let mut forward = self.run(&extended, &states, extended[0]);
        forward.reverse();
        let mut backward = self.run(&forward, &states, forward[0]);
        backward.reverse();

        Ok(backward[pad..pad + data.len()].to_vec())
    }
}

/// Extends `data` by `pad` samples on each side, reflecting point-symmetrically
/// about the end samples.
fn odd_extend(data: &[f64], pad: usize) -> Vec<f64> {
    let n = data.len();
    let first = data[0];
    let last = data[n - 1];
    let mut extended = Vec::with_capacity(n + 2 * pad);
    extended.extend((1..=pad).rev().map(|i| 2.0 * first - data[i]));
    extended.extend_from_slice(data);
    extended.extend((0..pad).map(|j| 2.0 * last - data[n - 2 - j]));
    extended
}

/// Designs a digital Butterworth filter.
///
/// # Arguments
///
/// * `order` - Filter order, at least 1.
/// * `wn` - Cutoff normalized to the Nyquist frequency, strictly between 0 and 1.
/// * `band` - Low-pass or high-pass.
///
/// # Errors
///
/// Returns a `Configuration` error if `order` is zero or `wn` is outside (0, 1).
pub fn butterworth(order: usize, wn: f64, band: BandType) -> Result<SosFilter> {
    if order == 0 {
        return Err(DenoiseError::config("Butterworth order must be at least 1"));
    }
    if !(wn > 0.0 && wn < 1.0) {
        return Err(DenoiseError::config(format!(
            "Normalized cutoff must be strictly between 0 and 1, got {wn}"
        )));
    }
    // prewarped analog cutoff for the bilinear transform
    let k = (PI * wn / 2.0).tan();
    let k2 = k * k;

    let mut sections: Vec<Biquad> = (0..order / 2)
        .map(|i| {
            // damping of the i-th conjugate pole pair of the analog prototype
            let theta = PI * (2 * i + 1) as f64 / (2 * order) as f64;
            let d = 2.0 * theta.sin();
            let a0 = 1.0 + d * k + k2;
            let a1 = 2.0 * (k2 - 1.0) / a0;
            let a2 = (1.0 - d * k + k2) / a0;
            match band {
                BandType::LowPass => Biquad {
                    b0: k2 / a0,
                    b1: 2.0 * k2 / a0,
                    b2: k2 / a0,
                    a1,
                    a2,
                },
                BandType::HighPass => Biquad {
                    b0: 1.0 / a0,
                    b1: -2.0 / a0,
                    b2: 1.0 / a0,
                    a1,
                    a2,
                },
            }
        })
        .collect();

    if order % 2 == 1 {
        // real pole at s = -1
        let a1 = (k - 1.0) / (k + 1.0);
        let section = match band {
            BandType::LowPass => Biquad {
                b0: k / (1.0 + k),
                b1: k / (1.0 + k),
                b2: 0.0,
                a1,
                a2: 0.0,
            },
            BandType::HighPass => Biquad {
                b0: 1.0 / (1.0 + k),
                b1: -1.0 / (1.0 + k),
                b2: 0.0,
                a1,
                a2: 0.0,
            },
        };
        sections.push(section);
    }

    debug!(
        "designed {band:?} Butterworth, order {order}, wn {wn:.5}, {} sections",
        sections.len()
    );
    Ok(SosFilter::new(sections))
}

/// Designs a second-order IIR notch filter.
///
/// # Arguments
///
/// * `freq` - Frequency to reject in Hz.
/// * `quality_factor` - `freq` divided by the -3 dB bandwidth. Higher values give a narrower notch.
/// * `fs` - Sampling rate in Hz.
///
/// # Errors
///
/// Returns a `Configuration` error if `freq` is not in (0, fs/2) or the quality factor is not positive.
pub fn notch(freq: f64, quality_factor: f64, fs: f64) -> Result<SosFilter> {
    let nyquist = fs / 2.0;
    if !(freq > 0.0 && freq < nyquist) {
        return Err(DenoiseError::config(format!(
            "Notch frequency ({freq} Hz) must be between 0 and Nyquist ({nyquist} Hz)"
        )));
    }
    if !(quality_factor.is_finite() && quality_factor > 0.0) {
        return Err(DenoiseError::config(format!(
            "Quality factor must be positive, got {quality_factor}"
        )));
    }
    let w0 = PI * freq / nyquist;
    let bandwidth = w0 / quality_factor;
    let gain = 1.0 / (1.0 + (bandwidth / 2.0).tan());
    let cos_w0 = w0.cos();

    debug!("designed notch at {freq} Hz, Q {quality_factor}");
    Ok(SosFilter::new(vec![Biquad {
        b0: gain,
        b1: -2.0 * gain * cos_w0,
        b2: gain,
        a1: -2.0 * gain * cos_w0,
        a2: 2.0 * gain - 1.0,
    }]))
}
