//! Classified poll results.

use serde::{Deserialize, Serialize};

/// Minimum trimmed answer length (exclusive) for an answer to count as a result.
pub const MIN_ANSWER_CHARS: usize = 10;

/// Returns true if `answer` is non-empty and longer than [`MIN_ANSWER_CHARS`]
/// characters after trimming whitespace.
pub fn is_valid_answer(answer: &str) -> bool {
    answer.trim().chars().count() > MIN_ANSWER_CHARS
}

/// Why a task failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Quota or throttling; worth retrying later.
    RateLimited,
    /// Anything else.
    Fatal,
}

/// Status of a task as seen in one poll response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "failure")]
pub enum PollStatus {
    /// Not finished yet.
    Pending,
    /// Finished with a usable answer.
    Completed,
    /// Finished with an error.
    Failed(FailureKind),
    /// Response did not match any known status.
    Unknown,
}

impl PollStatus {
    /// Returns a short label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed(FailureKind::RateLimited) => "rate_limited",
            Self::Failed(FailureKind::Fatal) => "failed",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for PollStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Result of classifying one poll response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollOutcome {
    /// Classification.
    pub status: PollStatus,
    /// Extracted answer text, or failure text for failed tasks.
    pub answer: Option<String>,
    /// Status message as sent by the remote system.
    pub raw_message: String,
}

impl PollOutcome {
    /// Creates an outcome.
    pub fn new(status: PollStatus, answer: Option<String>, raw_message: impl Into<String>) -> Self {
        Self {
            status,
            answer,
            raw_message: raw_message.into(),
        }
    }

    /// Failure text for a failed outcome, with a generic fallback.
    pub fn failure_message(&self) -> String {
        self.answer
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map_or_else(|| "task execution failed".to_string(), str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_validity_boundary() {
        assert!(!is_valid_answer(""));
        assert!(!is_valid_answer("   \n\t "));
        assert!(!is_valid_answer("0123456789"));
        assert!(!is_valid_answer("   0123456789   "));
        assert!(is_valid_answer("0123456789a"));
    }

    #[test]
    fn test_answer_validity_counts_characters() {
        // 10 CJK characters are 30 bytes but still too short.
        assert!(!is_valid_answer("一二三四五六七八九十"));
        assert!(is_valid_answer("这是一个完整的回答内容"));
    }

    #[test]
    fn test_failure_message_fallback() {
        let outcome = PollOutcome::new(PollStatus::Failed(FailureKind::Fatal), None, "x");
        assert_eq!(outcome.failure_message(), "task execution failed");

        let outcome = PollOutcome::new(
            PollStatus::Failed(FailureKind::Fatal),
            Some(" boom ".to_string()),
            "x",
        );
        assert_eq!(outcome.failure_message(), "boom");
    }
}
