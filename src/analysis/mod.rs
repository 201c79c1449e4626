/// This module contains the evaluation engine for denoising methods.
///
/// The available submodules are:
///
/// - `metrics`: Signal-to-noise ratio, mean squared error and evaluation records.
/// - `scenario`: Parallel evaluation of noise/filter combinations.
pub mod metrics;
pub mod scenario;
