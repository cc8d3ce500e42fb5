//! Error types for codecs

use thiserror::Error;

/// Codec errors
#[derive(Debug, Error)]
pub enum CodecError {
    /// Input or latent vector has the wrong length
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Invalid configuration
    #[error("Invalid codec configuration: {0}")]
    InvalidConfig(String),

    /// A training step produced a non-finite loss
    #[error("Training diverged at step {step}: loss {loss}")]
    Diverged { step: usize, loss: f32 },
}

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;
