//! Error types for the analysis core
//!
//! Configuration problems are caught at setup; once a detector is armed, the
//! analysis path itself cannot fail.

use thiserror::Error;

/// Errors reported while validating a [`DetectorConfig`](crate::config::DetectorConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("buffer size {0} is not a power of two")]
    BufferSizeNotPowerOfTwo(usize),

    #[error("sample rate must be greater than zero")]
    ZeroSampleRate,

    #[error("loudness scale must be finite and positive, got {0}")]
    InvalidScale(f32),

    #[error("target '{label}' has no frequency above zero: {frequency_hz} Hz")]
    NonPositiveFrequency { label: String, frequency_hz: f32 },

    #[error("target '{label}' at {frequency_hz} Hz is at or above the Nyquist limit ({nyquist_hz} Hz)")]
    FrequencyAboveNyquist {
        label: String,
        frequency_hz: f32,
        nyquist_hz: f32,
    },
}
