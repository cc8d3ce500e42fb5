//! Error types for the neural memory facade

use neuromem_cache::CacheError;
use neuromem_codec::CodecError;
use neuromem_queue::QueueError;
use thiserror::Error;

/// Neural memory errors
#[derive(Debug, Error)]
pub enum MemoryError {
    /// Cache error
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Codec error
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Queue error
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    /// Configuration could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A background store was cancelled before it finished
    #[error("Store cancelled: {0}")]
    Cancelled(String),
}

impl From<toml::de::Error> for MemoryError {
    fn from(err: toml::de::Error) -> Self {
        MemoryError::Config(err.to_string())
    }
}

/// Result type for neural memory operations
pub type Result<T> = std::result::Result<T, MemoryError>;
