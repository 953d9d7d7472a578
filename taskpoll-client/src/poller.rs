//! Result polling.
//!
//! [`ResultPoller`] drives one poll cycle for a task: an optional warm-up
//! wait, then up to `max_attempts` polls spaced by the cadence interval.
//! Every response goes through [`classify`]; only terminal classifications
//! end the cycle early.
//!
//! Cancellation is cooperative. The token is checked before each poll and
//! raced against every wait, but an HTTP call already in flight runs to
//! completion.

use std::sync::Arc;
use std::time::Duration;
use taskpoll_core::{
    FailureKind, PollCadence, PollOutcome, PollSnapshot, PollStatus, Task, TaskId, classify,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::api::TaskApi;
use crate::error::TaskError;

/// Waits for `duration`, or returns [`TaskError::Cancelled`] if `cancel` fires first.
pub async fn pause(duration: Duration, cancel: &CancellationToken) -> Result<(), TaskError> {
    tokio::select! {
        () = cancel.cancelled() => Err(TaskError::Cancelled),
        () = tokio::time::sleep(duration) => Ok(()),
    }
}

// ============================================================================
// Result Poller
// ============================================================================

/// Polls a task until it reaches a terminal state or the attempt budget runs out.
#[derive(Clone)]
pub struct ResultPoller {
    api: Arc<dyn TaskApi>,
}

impl ResultPoller {
    /// Creates a poller over `api`.
    pub fn new(api: Arc<dyn TaskApi>) -> Self {
        Self { api }
    }

    /// Polls once and classifies the response.
    pub async fn poll_once(&self, task_id: TaskId) -> Result<(PollSnapshot, PollOutcome), TaskError> {
        let body = self.api.poll(task_id).await?;
        let snapshot = PollSnapshot::from_json(&body)?;
        let outcome = classify(&snapshot);
        Ok((snapshot, outcome))
    }

    /// Runs one full poll cycle.
    ///
    /// Returns the `Completed` outcome, or:
    /// - [`TaskError::InvalidRequest`] when the task failed for a non-rate-limit reason
    /// - [`TaskError::RateLimited`] when it failed on quota or throttling
    /// - [`TaskError::PollTimeout`] when the budget ran out
    /// - the transport error, when one occurs on the final attempt
    #[instrument(skip(self, cadence, cancel), fields(task_id = %task.id, kind = ?task.kind))]
    pub async fn poll_until_done(
        &self,
        task: &Task,
        cadence: PollCadence,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome, TaskError> {
        if !cadence.initial_delay.is_zero() {
            debug!(delay_ms = cadence.initial_delay.as_millis(), "Waiting before first poll");
            pause(cadence.initial_delay, cancel).await?;
        }

        for attempt in 0..cadence.max_attempts {
            if cancel.is_cancelled() {
                return Err(TaskError::Cancelled);
            }
            let last = attempt + 1 == cadence.max_attempts;

            let outcome = match self.api.poll(task.id).await {
                Ok(body) => match PollSnapshot::from_json(&body) {
                    Ok(snapshot) => classify(&snapshot),
                    Err(e) => PollOutcome::new(PollStatus::Unknown, None, e.to_string()),
                },
                Err(err) if err.is_transient() && !last => {
                    warn!(attempt, error = %err, "Poll request failed, retrying");
                    pause(cadence.interval, cancel).await?;
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            match outcome.status {
                PollStatus::Completed => {
                    info!(attempt, "Task completed");
                    return Ok(outcome);
                }
                PollStatus::Failed(FailureKind::RateLimited) => {
                    warn!(attempt, message = %outcome.raw_message, "Task rate limited");
                    return Err(TaskError::RateLimited(outcome.failure_message()));
                }
                PollStatus::Failed(FailureKind::Fatal) => {
                    warn!(attempt, message = %outcome.raw_message, "Task failed");
                    return Err(TaskError::InvalidRequest(format!(
                        "task {} failed: {}",
                        task.id,
                        outcome.failure_message()
                    )));
                }
                PollStatus::Pending => {
                    debug!(attempt, message = %outcome.raw_message, "Task pending");
                }
                PollStatus::Unknown => {
                    warn!(attempt, message = %outcome.raw_message, "Unrecognized task status");
                }
            }

            if !last {
                pause(cadence.interval, cancel).await?;
            }
        }

        Err(TaskError::PollTimeout {
            task_id: task.id,
            attempts: cadence.max_attempts,
        })
    }
}

impl std::fmt::Debug for ResultPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultPoller").finish_non_exhaustive()
    }
}
