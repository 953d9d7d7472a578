//! Status classification.
//!
//! Maps a normalized [`PollSnapshot`] to a [`PollOutcome`]. All backend
//! phrasing lives in [`STATUS_RULES`] and [`RATE_LIMIT_PHRASES`]; supporting
//! a new status string means adding a row, not a branch.

use tracing::trace;

use crate::models::{is_valid_answer, FailureKind, PollOutcome, PollStatus};
use crate::schema::PollSnapshot;

// ============================================================================
// Rule Table
// ============================================================================

/// What a status string says about the task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusMarker {
    /// The backend says the task finished.
    Completed,
    /// The backend says the task failed.
    Failed,
    /// Queued or running.
    InProgress,
}

/// How a rule's pattern is compared with the status text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Whole string, case-insensitive, ignoring surrounding whitespace.
    Exact,
    /// Substring, case-insensitive.
    Contains,
}

/// One row of the status table.
#[derive(Debug, Clone, Copy)]
pub struct StatusRule {
    /// Pattern to look for.
    pub pattern: &'static str,
    /// Comparison mode.
    pub mode: MatchMode,
    /// Marker when the rule matches.
    pub marker: StatusMarker,
}

impl StatusRule {
    const fn exact(pattern: &'static str, marker: StatusMarker) -> Self {
        Self {
            pattern,
            mode: MatchMode::Exact,
            marker,
        }
    }

    const fn contains(pattern: &'static str, marker: StatusMarker) -> Self {
        Self {
            pattern,
            mode: MatchMode::Contains,
            marker,
        }
    }

    fn matches(&self, normalized: &str) -> bool {
        match self.mode {
            MatchMode::Exact => normalized == self.pattern,
            MatchMode::Contains => normalized.contains(self.pattern),
        }
    }
}

/// Status rules, checked in order; the first match wins.
///
/// Patterns are lowercase.
pub const STATUS_RULES: &[StatusRule] = &[
    // Flat schema: top-level message.
    StatusRule::exact("ai任务处理完成", StatusMarker::Completed),
    StatusRule::exact("ai任务处理失败", StatusMarker::Failed),
    StatusRule::contains("处理中", StatusMarker::InProgress),
    StatusRule::contains("待处理", StatusMarker::InProgress),
    // Nested schema: data.status.
    StatusRule::exact("completed", StatusMarker::Completed),
    StatusRule::exact("2", StatusMarker::Completed),
    StatusRule::exact("failed", StatusMarker::Failed),
    StatusRule::exact("3", StatusMarker::Failed),
    StatusRule::exact("pending", StatusMarker::InProgress),
    StatusRule::exact("processing", StatusMarker::InProgress),
    StatusRule::exact("running", StatusMarker::InProgress),
    StatusRule::exact("0", StatusMarker::InProgress),
    StatusRule::exact("1", StatusMarker::InProgress),
];

/// Lowercase phrases in failure text that mean the account is throttled.
pub const RATE_LIMIT_PHRASES: &[&str] = &["quota", "配额", "rate limit", "限流", "账号达到使用限制"];

/// Looks up the marker for a status string.
pub fn status_marker(status_text: &str) -> Option<StatusMarker> {
    let normalized = status_text.trim().to_lowercase();
    if normalized.is_empty() {
        return None;
    }
    STATUS_RULES
        .iter()
        .find(|rule| rule.matches(&normalized))
        .map(|rule| rule.marker)
}

/// Returns true if failure text indicates rate limiting.
pub fn is_rate_limit_text(text: &str) -> bool {
    let normalized = text.to_lowercase();
    RATE_LIMIT_PHRASES.iter().any(|p| normalized.contains(p))
}

// ============================================================================
// Classifier
// ============================================================================

/// Classifies a poll response. Pure and deterministic.
///
/// - Non-zero `code`: the status call itself failed, so `Unknown`.
/// - Failure marker: `Failed`, sub-classified by [`is_rate_limit_text`].
/// - Completion marker with a valid answer: `Completed`; with a short or
///   missing answer: `Pending`, since the backend may still be filling it in.
/// - In-progress marker: `Pending`.
/// - No marker but a valid answer: `Completed`.
/// - Anything else: `Unknown`.
pub fn classify(snapshot: &PollSnapshot) -> PollOutcome {
    let raw_message = if snapshot.status_text.is_empty() {
        snapshot.message.clone()
    } else {
        snapshot.status_text.clone()
    };
    let valid_answer = snapshot.answer.as_deref().filter(|a| is_valid_answer(a));

    if snapshot.code != 0 {
        return PollOutcome::new(PollStatus::Unknown, None, raw_message);
    }

    let outcome = match status_marker(&snapshot.status_text) {
        Some(StatusMarker::Failed) => {
            let text = snapshot.failure_text();
            let kind = if is_rate_limit_text(text) {
                FailureKind::RateLimited
            } else {
                FailureKind::Fatal
            };
            let detail = Some(text.to_string()).filter(|t| !t.trim().is_empty());
            PollOutcome::new(PollStatus::Failed(kind), detail, raw_message)
        }
        Some(StatusMarker::Completed) => match valid_answer {
            Some(answer) => {
                PollOutcome::new(PollStatus::Completed, Some(answer.to_string()), raw_message)
            }
            None => PollOutcome::new(PollStatus::Pending, snapshot.answer.clone(), raw_message),
        },
        Some(StatusMarker::InProgress) => {
            PollOutcome::new(PollStatus::Pending, None, raw_message)
        }
        None => match valid_answer {
            Some(answer) => {
                PollOutcome::new(PollStatus::Completed, Some(answer.to_string()), raw_message)
            }
            None => PollOutcome::new(PollStatus::Unknown, None, raw_message),
        },
    };

    trace!(status = %outcome.status, message = %outcome.raw_message, "Classified poll response");
    outcome
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::WireSchema;

    fn flat(message: &str, answer: Option<&str>) -> PollSnapshot {
        PollSnapshot {
            code: 0,
            schema: WireSchema::Flat,
            status_text: message.to_string(),
            message: message.to_string(),
            answer: answer.map(str::to_string),
            error: None,
        }
    }

    fn nested(status: &str, answer: Option<&str>, error: Option<&str>) -> PollSnapshot {
        PollSnapshot {
            code: 0,
            schema: WireSchema::Nested,
            status_text: status.to_string(),
            message: "success".to_string(),
            answer: answer.map(str::to_string),
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn test_status_table_lookup() {
        assert_eq!(status_marker("AI任务处理完成"), Some(StatusMarker::Completed));
        assert_eq!(status_marker("AI任务处理失败"), Some(StatusMarker::Failed));
        assert_eq!(status_marker("AI任务处理中"), Some(StatusMarker::InProgress));
        assert_eq!(status_marker("AI任务待处理"), Some(StatusMarker::InProgress));
        assert_eq!(status_marker("COMPLETED"), Some(StatusMarker::Completed));
        assert_eq!(status_marker(" running "), Some(StatusMarker::InProgress));
        assert_eq!(status_marker("2"), Some(StatusMarker::Completed));
        assert_eq!(status_marker("3"), Some(StatusMarker::Failed));
        assert_eq!(status_marker("0"), Some(StatusMarker::InProgress));
        assert_eq!(status_marker("something new"), None);
        assert_eq!(status_marker(""), None);
    }

    #[test]
    fn test_numeric_codes_match_exactly() {
        // "12" must not match "1" or "2".
        assert_eq!(status_marker("12"), None);
    }

    #[test]
    fn test_completed_with_valid_answer() {
        let outcome = classify(&flat("AI任务处理完成", Some("这是一个完整的回答内容")));
        assert_eq!(outcome.status, PollStatus::Completed);
        assert_eq!(outcome.answer.as_deref(), Some("这是一个完整的回答内容"));
        assert_eq!(outcome.raw_message, "AI任务处理完成");
    }

    #[test]
    fn test_completed_with_short_answer_is_pending() {
        let outcome = classify(&flat("AI任务处理完成", Some("太短了")));
        assert_eq!(outcome.status, PollStatus::Pending);

        let outcome = classify(&flat("AI任务处理完成", None));
        assert_eq!(outcome.status, PollStatus::Pending);
    }

    #[test]
    fn test_failed_rate_limited() {
        let outcome = classify(&flat("AI任务处理失败", Some("账号达到使用限制")));
        assert_eq!(outcome.status, PollStatus::Failed(FailureKind::RateLimited));

        let outcome = classify(&nested("failed", None, Some("Daily QUOTA exceeded")));
        assert_eq!(outcome.status, PollStatus::Failed(FailureKind::RateLimited));

        let outcome = classify(&nested("3", None, Some("Rate Limit hit")));
        assert_eq!(outcome.status, PollStatus::Failed(FailureKind::RateLimited));
    }

    #[test]
    fn test_failed_fatal() {
        let outcome = classify(&flat("AI任务处理失败", Some("内容违规")));
        assert_eq!(outcome.status, PollStatus::Failed(FailureKind::Fatal));
        assert_eq!(outcome.answer.as_deref(), Some("内容违规"));
    }

    #[test]
    fn test_pending_markers() {
        assert_eq!(classify(&flat("AI任务处理中", None)).status, PollStatus::Pending);
        assert_eq!(classify(&flat("AI任务待处理", None)).status, PollStatus::Pending);
        assert_eq!(classify(&nested("processing", None, None)).status, PollStatus::Pending);
    }

    #[test]
    fn test_unknown_message_with_answer_is_implicit_success() {
        let outcome = classify(&flat("done-ish", Some("a perfectly long answer")));
        assert_eq!(outcome.status, PollStatus::Completed);
    }

    #[test]
    fn test_unknown_message_without_answer() {
        let outcome = classify(&flat("done-ish", Some("short")));
        assert_eq!(outcome.status, PollStatus::Unknown);
        assert_eq!(outcome.raw_message, "done-ish");
    }

    #[test]
    fn test_nonzero_code_is_unknown_even_with_answer() {
        let mut snap = flat("AI任务处理完成", Some("这是一个完整的回答内容"));
        snap.code = 500;
        assert_eq!(classify(&snap).status, PollStatus::Unknown);
    }

    #[test]
    fn test_nested_completed() {
        let outcome = classify(&nested("completed", Some("a long enough nested answer"), None));
        assert_eq!(outcome.status, PollStatus::Completed);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let snap = flat("AI任务处理失败", Some("quota exhausted"));
        assert_eq!(classify(&snap), classify(&snap));
    }
}
