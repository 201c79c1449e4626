//! ECG denoising and evaluation.
//!
//! This crate contains a filter bank for single-channel ECG signals, synthetic
//! noise injectors to validate it, and SNR/MSE metrics to compare the methods.

pub mod analysis;
pub mod error;
pub mod filtering;
pub mod preprocessing;
pub mod signal;

pub use error::{DenoiseError, Result};
pub use signal::Signal;
