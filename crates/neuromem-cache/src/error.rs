//! Error types for the neural cache

use neuromem_codec::CodecError;
use thiserror::Error;

/// Result type for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Errors that can occur during caching
#[derive(Error, Debug)]
pub enum CacheError {
    /// Payload cannot be interpreted as byte values
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid cache configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Codec failed to train, encode or decode
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}
