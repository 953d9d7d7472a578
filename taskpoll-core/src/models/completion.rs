//! The completion returned to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Finish reason for every assembled completion.
pub const FINISH_REASON_STOP: &str = "stop";

/// Final result of a completed task, independent of the backend schema observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    /// Task id as a string.
    pub id: String,
    /// Object type, always `chat.completion`.
    pub object: String,
    /// Model name the caller asked for.
    pub model: String,
    /// When the completion was assembled.
    pub created_at: DateTime<Utc>,
    /// Answer text.
    pub content: String,
    /// Always `stop`.
    pub finish_reason: String,
}
