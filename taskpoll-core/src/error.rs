//! Core error types for `taskpoll`.

use thiserror::Error;

/// Core error type for `taskpoll` domain operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Invalid data in a remote response.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
