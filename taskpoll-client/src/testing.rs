//! Scripted [`TaskApi`] for tests and offline use.
//!
//! Responses are queued up front. The last queued poll response repeats
//! forever, so a single "still processing" body is enough to drive a poll
//! loop to its budget.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use taskpoll_core::TaskId;
use tokio::time::Instant;

use crate::api::{SubmitPayload, TaskApi};
use crate::error::TransportError;

type Scripted = Result<Value, TransportError>;

#[derive(Debug, Default)]
struct Script {
    submits: VecDeque<Scripted>,
    polls: VecDeque<Scripted>,
    submissions: Vec<SubmitPayload>,
    polled: Vec<(TaskId, Instant)>,
}

/// A [`TaskApi`] that replays queued responses and records every call.
#[derive(Debug, Default)]
pub struct ScriptedTaskApi {
    script: Mutex<Script>,
}

impl ScriptedTaskApi {
    /// Creates an API with nothing queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a submit response.
    pub fn with_submit(self, response: Scripted) -> Self {
        self.lock().submits.push_back(response);
        self
    }

    /// Queues a successful submit returning `task_id`.
    pub fn with_task_id(self, task_id: i64) -> Self {
        self.with_submit(Ok(json!({"success": true, "taskId": task_id.to_string()})))
    }

    /// Queues a poll response.
    pub fn with_poll(self, response: Scripted) -> Self {
        self.lock().polls.push_back(response);
        self
    }

    /// Queues several successful poll bodies.
    pub fn with_polls(self, bodies: impl IntoIterator<Item = Value>) -> Self {
        {
            let mut script = self.lock();
            script.polls.extend(bodies.into_iter().map(Ok));
        }
        self
    }

    /// Number of submit calls made.
    pub fn submit_count(&self) -> usize {
        self.lock().submissions.len()
    }

    /// Payloads submitted so far.
    pub fn submissions(&self) -> Vec<SubmitPayload> {
        self.lock().submissions.clone()
    }

    /// Number of poll calls made.
    pub fn poll_count(&self) -> usize {
        self.lock().polled.len()
    }

    /// When each poll happened, in order.
    pub fn poll_times(&self) -> Vec<Instant> {
        self.lock().polled.iter().map(|(_, at)| *at).collect()
    }

    /// Task ids polled, in order.
    pub fn polled_ids(&self) -> Vec<TaskId> {
        self.lock().polled.iter().map(|(id, _)| *id).collect()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl TaskApi for ScriptedTaskApi {
    async fn submit(&self, payload: &SubmitPayload) -> Result<Value, TransportError> {
        let mut script = self.lock();
        script.submissions.push(payload.clone());
        script
            .submits
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Http("no scripted submit response".to_string())))
    }

    async fn poll(&self, task_id: TaskId) -> Result<Value, TransportError> {
        let mut script = self.lock();
        script.polled.push((task_id, Instant::now()));
        let next = if script.polls.len() > 1 {
            script.polls.pop_front()
        } else {
            script.polls.front().cloned()
        };
        next.unwrap_or_else(|| Err(TransportError::Http("no scripted poll response".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_last_poll_repeats() {
        let api = ScriptedTaskApi::new().with_polls([json!({"message": "a"}), json!({"message": "b"})]);

        assert_eq!(api.poll(TaskId(1)).await.unwrap()["message"], "a");
        assert_eq!(api.poll(TaskId(1)).await.unwrap()["message"], "b");
        assert_eq!(api.poll(TaskId(1)).await.unwrap()["message"], "b");
        assert_eq!(api.poll_count(), 3);
    }

    #[tokio::test]
    async fn test_empty_script_errors() {
        let api = ScriptedTaskApi::new();
        assert!(api.poll(TaskId(1)).await.is_err());
        assert!(api.submit(&crate::CompletionRequest::new("m", Vec::new()).to_payload()).await.is_err());
        assert_eq!(api.submit_count(), 1);
    }
}
