/// Crate-level error type for segsift.
///
/// Only input problems surface here. Degenerate data (too few events, empty
/// candidate sets, empty decoded slices) resolves to well-defined empty or
/// zero results instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid parameter value.
    #[error("invalid parameter `{name}`: got {value}, {reason}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// Audio data is empty when a non-empty signal was required.
    #[error("audio data is empty")]
    EmptyAudio,

    /// Audio data contains non-finite values (NaN or Inf).
    #[error("audio data contains non-finite values")]
    NonFiniteAudio,

    /// Input array has incorrect shape for the operation.
    #[error("shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: String, got: String },

    /// A required dimension is zero or invalid.
    #[error("invalid size for `{name}`: {value} ({reason})")]
    InvalidSize {
        name: &'static str,
        value: usize,
        reason: &'static str,
    },

    /// Frequency range is invalid.
    #[error("invalid frequency range: fmin={fmin}, fmax={fmax} ({reason})")]
    InvalidFrequencyRange {
        fmin: f32,
        fmax: f32,
        reason: String,
    },

    /// An interval whose bounds are not finite or not strictly increasing.
    #[error("invalid interval ({start}, {end}): {reason}")]
    InvalidInterval {
        start: f64,
        end: f64,
        reason: &'static str,
    },

    /// Segmentation policy name that does not match any known policy.
    #[error("unknown segmentation policy `{0}` (expected beats, transients, frequency or onsets)")]
    UnknownPolicy(String),

    /// Configuration file could not be parsed or serialized.
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),

    /// Audio I/O errors.
    #[error(transparent)]
    Audio(#[from] crate::io::AudioError),

    /// File I/O errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for segsift operations.
pub type Result<T> = std::result::Result<T, Error>;
