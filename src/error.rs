//! Error type shared by the noise synthesizer, the filter bank and the metrics engine.

use thiserror::Error;

/// Errors returned by every fallible operation of this crate.
///
/// Invalid parameters are never clamped or corrected; they are reported to the
/// caller, which decides whether to retry with different settings.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DenoiseError {
    /// A filter, noise or signal parameter is outside its valid range.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The input data cannot be processed (empty, non-finite, mismatched or too short).
    #[error("numeric error: {0}")]
    Numeric(String),
}

impl DenoiseError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        DenoiseError::Configuration(msg.into())
    }

    pub(crate) fn numeric(msg: impl Into<String>) -> Self {
        DenoiseError::Numeric(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, DenoiseError>;
