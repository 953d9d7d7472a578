//! Outer retry across whole poll cycles.
//!
//! Only [`TaskError::RateLimited`] is retried here. Each retry starts a
//! fresh poll cycle after a backoff of `base_delay * 2^attempt`.

use chrono::Utc;
use taskpoll_core::{Completion, PollCadence, RetryPolicy, Task, assemble};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::error::TaskError;
use crate::poller::{ResultPoller, pause};

/// Wraps a [`ResultPoller`] with rate-limit backoff.
#[derive(Debug, Clone)]
pub struct RetryCoordinator {
    poller: ResultPoller,
    policy: RetryPolicy,
}

impl RetryCoordinator {
    /// Creates a coordinator.
    pub fn new(poller: ResultPoller, policy: RetryPolicy) -> Self {
        Self { poller, policy }
    }

    /// Polls `task` to completion, retrying rate-limited cycles.
    #[instrument(skip(self, cadence, cancel), fields(task_id = %task.id))]
    pub async fn run_with_retry(
        &self,
        task: &Task,
        cadence: PollCadence,
        cancel: &CancellationToken,
    ) -> Result<Completion, TaskError> {
        let max = self.policy.max_outer_attempts;

        for attempt in 0..=max {
            match self.poller.poll_until_done(task, cadence, cancel).await {
                Ok(outcome) => return Ok(assemble(task, &outcome, Utc::now())?),
                Err(TaskError::RateLimited(message)) => {
                    if !self.policy.enable_rate_limit_retry || attempt >= max {
                        return Err(TaskError::RateLimited(message));
                    }

                    let delay = self.policy.delay_for_attempt(attempt);
                    warn!(
                        attempt = attempt + 1,
                        max_attempts = max,
                        delay_ms = delay.as_millis(),
                        message = %message,
                        "Rate limited, backing off"
                    );
                    pause(delay, cancel).await?;
                    info!(attempt = attempt + 1, "Restarting poll cycle");
                }
                Err(other) => return Err(other),
            }
        }

        error!(attempts = max, "Retry loop ended without a result");
        Err(TaskError::RateLimited("retry budget exhausted".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTaskApi;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use taskpoll_core::{TaskId, TaskKind};

    const QUOTA: &str = "quota exceeded for this account";

    fn cadence() -> PollCadence {
        PollCadence {
            initial_delay: Duration::ZERO,
            interval: Duration::from_secs(1),
            max_attempts: 3,
        }
    }

    fn task() -> Task {
        Task::new(TaskId(7), TaskKind::Normal, "yuanbao")
    }

    fn coordinator(api: Arc<ScriptedTaskApi>, policy: RetryPolicy) -> RetryCoordinator {
        RetryCoordinator::new(ResultPoller::new(api), policy)
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_backoff() {
        let api = Arc::new(ScriptedTaskApi::new().with_polls([
            json!({"message": "AI任务处理失败", "answer": QUOTA}),
            json!({"message": "AI任务处理完成", "answer": "finally a real answer"}),
        ]));
        let policy = RetryPolicy::new(2).with_base_delay(Duration::from_secs(3));

        let start = tokio::time::Instant::now();
        let completion = coordinator(api.clone(), policy)
            .run_with_retry(&task(), cadence(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(completion.content, "finally a real answer");
        assert_eq!(completion.id, "7");
        assert_eq!(completion.finish_reason, "stop");
        assert_eq!(start.elapsed(), Duration::from_secs(3));
        assert_eq!(api.poll_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_retry_fails_immediately() {
        let api = Arc::new(
            ScriptedTaskApi::new().with_polls([json!({"message": "AI任务处理失败", "answer": QUOTA})]),
        );
        let policy = RetryPolicy::new(5).with_rate_limit_retry(false);

        let start = tokio::time::Instant::now();
        let err = coordinator(api.clone(), policy)
            .run_with_retry(&task(), cadence(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(err.is_rate_limited());
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(api.poll_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_timeout_is_not_retried() {
        let api = Arc::new(ScriptedTaskApi::new().with_polls([json!({"message": "AI任务待处理"})]));
        let policy = RetryPolicy::new(3).with_base_delay(Duration::from_secs(1));

        let err = coordinator(api.clone(), policy)
            .run_with_retry(&task(), cadence(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, TaskError::PollTimeout { attempts: 3, .. }));
        assert_eq!(api.poll_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff() {
        let api = Arc::new(
            ScriptedTaskApi::new().with_polls([json!({"message": "AI任务处理失败", "answer": QUOTA})]),
        );
        let policy = RetryPolicy::new(3).with_base_delay(Duration::from_secs(60));
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(10)).await;
            trigger.cancel();
        });

        let err = coordinator(api.clone(), policy)
            .run_with_retry(&task(), cadence(), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::Cancelled));
        assert_eq!(api.poll_count(), 1);
    }
}
