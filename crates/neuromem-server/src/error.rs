//! Server errors and their HTTP mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use neuromem::{CacheError, MemoryError};
use thiserror::Error;

use crate::metrics::record_error;

/// Server errors
#[derive(Debug, Error)]
pub enum ServerError {
    /// Request payload rejected
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Error from the neural memory
    #[error(transparent)]
    Memory(#[from] MemoryError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CacheError> for ServerError {
    fn from(err: CacheError) -> Self {
        ServerError::Memory(MemoryError::Cache(err))
    }
}

impl ServerError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::InvalidInput(_)
            | ServerError::Memory(MemoryError::Cache(CacheError::InvalidInput(_))) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        record_error(status);
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Result type for server operations
pub type Result<T> = std::result::Result<T, ServerError>;
