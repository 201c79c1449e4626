//! Batch evaluation of (noise, filter) pairs against one clean reference.
//!
//! A [`Scenario`] corrupts the reference with a [`NoiseSpec`], denoises the
//! result with a [`FilterSpec`] and scores it with
//! [`evaluate`](crate::analysis::metrics::evaluate). [`run_scenarios`] evaluates
//! scenarios in parallel. Each scenario draws its noise from a generator seeded
//! with `seed + index`, so results do not depend on thread scheduling.
//!
//! # Example
//!
//! ```rust
//! use ecg_denoise::analysis::scenario::{run_scenarios, standard_scenarios};
//! use ecg_denoise::Signal;
//!
//! let samples = (0..2000).map(|i| (i as f64 * 0.02).sin()).collect();
//! let reference = Signal::new(samples, 360.0).unwrap();
//! let records = run_scenarios(&reference, &standard_scenarios(), 42).unwrap();
//! assert_eq!(records.len(), 5);
//! for record in &records {
//!     println!("{record}");
//! }
//! ```

use crate::analysis::metrics::{evaluate, EvaluationRecord};
use crate::error::Result;
use crate::filtering::{apply_filter, FilterSpec};
use crate::preprocessing::noise::NoiseSpec;
use crate::signal::Signal;
use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One noise/filter combination to evaluate.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub label: String,
    pub noise: NoiseSpec,
    pub filter: FilterSpec,
}

impl Scenario {
    pub fn new(label: impl Into<String>, noise: NoiseSpec, filter: FilterSpec) -> Self {
        Self {
            label: label.into(),
            noise,
            filter,
        }
    }

    /// Corrupts `reference`, filters it and evaluates the result.
    pub fn run(&self, reference: &Signal, seed: u64) -> Result<EvaluationRecord> {
        let mut rng = StdRng::seed_from_u64(seed);
        let noisy = self.noise.apply(reference, &mut rng)?;
        let filtered = apply_filter(&noisy, &self.filter)?;
        evaluate(reference, &noisy, &filtered, &self.label)
    }
}

/// Pairs each filter with the interference it targets.
pub fn standard_scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new(
            "Notch Filter (Powerline Noise Removal)",
            NoiseSpec::powerline(),
            FilterSpec::notch(),
        ),
        Scenario::new(
            "High-Pass Filter (Baseline Wander Removal)",
            NoiseSpec::baseline_wander(),
            FilterSpec::high_pass(),
        ),
        Scenario::new(
            "Low-Pass Filter (EMG Noise Removal)",
            NoiseSpec::emg(),
            FilterSpec::low_pass(),
        ),
        Scenario::new(
            "Wavelet Transform Denoising",
            NoiseSpec::emg(),
            FilterSpec::wavelet(),
        ),
        Scenario::new(
            "Savitzky-Golay Filter (Baseline Removal)",
            NoiseSpec::baseline_wander(),
            FilterSpec::savitzky_golay(),
        ),
    ]
}

/// Evaluates all `scenarios` against `reference` in parallel.
///
/// Records are returned in the order of `scenarios`.
///
/// # Errors
///
/// Returns the error of the lowest-index failing scenario.
pub fn run_scenarios(
    reference: &Signal,
    scenarios: &[Scenario],
    seed: u64,
) -> Result<Vec<EvaluationRecord>> {
    debug!(
        "running {} scenarios on {} samples",
        scenarios.len(),
        reference.len()
    );
    let results: Vec<Result<EvaluationRecord>> = scenarios
        .par_iter()
        .enumerate()
        .map(|(idx, scenario)| scenario.run(reference, seed.wrapping_add(idx as u64)))
        .collect();
    results.into_iter().collect()
}
