//! Builds the caller-facing [`Completion`] from a completed poll outcome.

use chrono::{DateTime, Utc};

use crate::error::CoreError;
use crate::models::{Completion, PollOutcome, PollStatus, Task, FINISH_REASON_STOP};

/// Object type stamped on every completion.
const OBJECT_CHAT_COMPLETION: &str = "chat.completion";

/// Assembles a completion.
///
/// Only `Completed` outcomes carrying an answer are accepted; the poller
/// has already enforced the answer-length rule.
pub fn assemble(
    task: &Task,
    outcome: &PollOutcome,
    created_at: DateTime<Utc>,
) -> Result<Completion, CoreError> {
    if outcome.status != PollStatus::Completed {
        return Err(CoreError::InvalidData(format!(
            "cannot assemble a completion from a {} outcome",
            outcome.status
        )));
    }

    let content = outcome.answer.clone().ok_or_else(|| {
        CoreError::InvalidData("completed outcome carries no answer".to_string())
    })?;

    Ok(Completion {
        id: task.id.to_string(),
        object: OBJECT_CHAT_COMPLETION.to_string(),
        model: task.model.clone(),
        created_at,
        content,
        finish_reason: FINISH_REASON_STOP.to_string(),
    })
}
