//! Client error types.

use std::time::Duration;
use taskpoll_core::{CoreError, TaskId};
use thiserror::Error;

// ============================================================================
// Task Error
// ============================================================================

/// Error type for task submission and polling.
#[derive(Debug, Error)]
pub enum TaskError {
    /// Caller input was malformed, or the remote system reported a
    /// non-rate-limit task failure. Never retried.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The remote system reported quota exhaustion or throttling.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// The API token is missing or was rejected.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Transport-level failure.
    #[error("Transport error: {0}")]
    Transport(TransportError),

    /// The poll budget ran out before the task reached a terminal state.
    #[error("Task {task_id} did not finish after {attempts} poll attempts")]
    PollTimeout {
        /// The task that was being polled.
        task_id: TaskId,
        /// How many polls were made.
        attempts: u32,
    },

    /// The overall wall-clock bound expired. The remote task may still be running.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Local polling was cancelled.
    #[error("Polling cancelled")]
    Cancelled,

    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A background completion task panicked.
    #[error("Background task failed: {0}")]
    Join(String),

    /// Core error.
    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

impl TaskError {
    /// Returns true if this is a rate-limit failure.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }

    /// Returns true for rate limits and transient transport failures.
    ///
    /// Poll and wall-clock timeouts are final.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited(_) => true,
            Self::Transport(err) => err.is_transient(),
            _ => false,
        }
    }
}

impl From<TransportError> for TaskError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Authentication { status } => Self::Authentication(format!(
                "HTTP {status}, check that the API token is correct"
            )),
            TransportError::BadRequest(body) => Self::InvalidRequest(body),
            TransportError::RateLimited => {
                Self::RateLimited("server returned HTTP 429".to_string())
            }
            other => Self::Transport(other),
        }
    }
}

// ============================================================================
// Transport Error
// ============================================================================

/// Error type for the HTTP transport.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Could not connect.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Request timed out.
    #[error("Request timed out")]
    Timeout,

    /// HTTP 401 or 403.
    #[error("Authentication rejected (HTTP {status})")]
    Authentication {
        /// HTTP status code.
        status: u16,
    },

    /// HTTP 400.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// HTTP 429.
    #[error("Too many requests (HTTP 429)")]
    RateLimited,

    /// HTTP 5xx.
    #[error("Server error (HTTP {status}): {body}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// Any other non-success status.
    #[error("Unexpected status (HTTP {status}): {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// The body was not valid JSON.
    #[error("Could not decode response: {0}")]
    Decode(String),

    /// Any other request failure.
    #[error("HTTP error: {0}")]
    Http(String),
}

impl TransportError {
    /// Returns true for failures that are retried inside a poll cycle.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Connection(_)
                | Self::Timeout
                | Self::RateLimited
                | Self::Server { .. }
                | Self::Status { .. }
                | Self::Decode(_)
        )
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connection(err.to_string())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_mapping() {
        assert!(matches!(
            TaskError::from(TransportError::BadRequest("nope".into())),
            TaskError::InvalidRequest(_)
        ));
        assert!(TaskError::from(TransportError::RateLimited).is_rate_limited());
        assert!(matches!(
            TaskError::from(TransportError::Authentication { status: 403 }),
            TaskError::Authentication(_)
        ));
        assert!(matches!(
            TaskError::from(TransportError::Timeout),
            TaskError::Transport(TransportError::Timeout)
        ));
    }

    #[test]
    fn test_transient_classification() {
        assert!(TransportError::Timeout.is_transient());
        assert!(TransportError::Connection("refused".into()).is_transient());
        assert!(TransportError::Server { status: 502, body: String::new() }.is_transient());
        assert!(!TransportError::Authentication { status: 401 }.is_transient());
        assert!(!TransportError::BadRequest(String::new()).is_transient());
    }

    #[test]
    fn test_retryable_errors() {
        assert!(TaskError::RateLimited("quota".into()).is_retryable());
        assert!(TaskError::Transport(TransportError::Timeout).is_retryable());
        assert!(!TaskError::PollTimeout { task_id: TaskId(1), attempts: 60 }.is_retryable());
        assert!(!TaskError::Timeout(Duration::from_secs(5)).is_retryable());
        assert!(!TaskError::InvalidRequest("bad".into()).is_retryable());
        assert!(!TaskError::Transport(TransportError::Authentication { status: 401 }).is_retryable());
    }

    #[test]
    fn test_poll_timeout_message() {
        let err = TaskError::PollTimeout {
            task_id: TaskId(42),
            attempts: 60,
        };
        assert_eq!(err.to_string(), "Task 42 did not finish after 60 poll attempts");
    }
}
