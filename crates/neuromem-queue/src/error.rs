//! Error types for the task queue

use thiserror::Error;

/// Queue errors
#[derive(Debug, Error)]
pub enum QueueError {
    /// Invalid configuration
    #[error("Invalid queue configuration: {0}")]
    InvalidConfig(String),

    /// Another consumer loop already owns the queue
    #[error("Consumer already running")]
    ConsumerAlreadyRunning,

    /// Drain did not finish before the deadline
    #[error("Drain timed out after {timeout_ms}ms with {pending} tasks pending")]
    DrainTimeout { timeout_ms: u64, pending: usize },

    /// The consumer task could not be joined
    #[error("Consumer task failed: {0}")]
    Consumer(String),
}

/// Result type for queue operations
pub type Result<T> = std::result::Result<T, QueueError>;
