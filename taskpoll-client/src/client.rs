//! High-level client.

use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use taskpoll_core::{
    ChatMessage, Completion, ModelKind, PollCadence, PollOutcome, PollSnapshot, TaskId,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::api::TaskApi;
use crate::config::ClientConfig;
use crate::error::TaskError;
use crate::http::HttpTaskApi;
use crate::poller::ResultPoller;
use crate::retry::RetryCoordinator;
use crate::submitter::{CompletionRequest, TaskSubmitter};

/// System prompt added for Gemini when the caller gives none.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

// ============================================================================
// Task Client
// ============================================================================

/// Submits requests and polls them to completion.
///
/// Cloning is cheap; clones share the transport and its connection pool.
#[derive(Clone)]
pub struct TaskClient {
    api: Arc<dyn TaskApi>,
    config: Arc<ClientConfig>,
}

impl TaskClient {
    /// Creates a client over HTTP.
    pub fn new(config: ClientConfig) -> Result<Self, TaskError> {
        let api = HttpTaskApi::new(&config)?;
        Ok(Self::with_api(Arc::new(api), config))
    }

    /// Creates a client from the config file and environment.
    pub fn from_env() -> Result<Self, TaskError> {
        Self::new(ClientConfig::load()?)
    }

    /// Creates a client over any transport.
    pub fn with_api(api: Arc<dyn TaskApi>, config: ClientConfig) -> Self {
        Self {
            api,
            config: Arc::new(config),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Starts a request for the default model with the configured priority.
    pub fn request(&self, messages: Vec<ChatMessage>) -> CompletionRequest {
        CompletionRequest::new(self.config.default_model.clone(), messages)
            .with_priority(self.config.priority)
    }

    /// Submits a request and waits for its completion.
    pub async fn create_completion(
        &self,
        request: CompletionRequest,
    ) -> Result<Completion, TaskError> {
        self.run(&request, &CancellationToken::new()).await
    }

    /// Like [`Self::create_completion`], bounded by an overall wall-clock timeout.
    ///
    /// On expiry, local polling is cancelled and [`TaskError::Timeout`] is
    /// returned. The remote task is not cancelled.
    pub async fn create_completion_with_timeout(
        &self,
        request: CompletionRequest,
        timeout: Duration,
    ) -> Result<Completion, TaskError> {
        let handle = self.spawn_completion(request);
        let cancel = handle.cancel_token();

        match tokio::time::timeout(timeout, handle.join()).await {
            Ok(result) => result,
            Err(_) => {
                cancel.cancel();
                warn!(
                    timeout_ms = timeout.as_millis(),
                    "Completion timed out, remote task left running"
                );
                Err(TaskError::Timeout(timeout))
            }
        }
    }

    /// Runs a completion on a background task.
    pub fn spawn_completion(&self, request: CompletionRequest) -> CompletionHandle {
        let cancel = CancellationToken::new();
        let client = self.clone();
        let token = cancel.clone();
        let join = tokio::spawn(async move { client.run(&request, &token).await });
        CompletionHandle { join, cancel }
    }

    /// Builds a single-turn conversation for `model`.
    ///
    /// An empty `system` prompt is replaced with [`DEFAULT_SYSTEM_PROMPT`]
    /// for any model whose name contains `gemini` when `auto_system_prompt`
    /// is enabled.
    pub fn messages_for(&self, model: &str, system: &str, user: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2);
        if !system.trim().is_empty() {
            messages.push(ChatMessage::system(system));
        } else if self.config.auto_system_prompt
            && model.to_lowercase().contains(ModelKind::Gemini.name())
        {
            messages.push(ChatMessage::system(DEFAULT_SYSTEM_PROMPT));
        }
        messages.push(ChatMessage::user(user));
        messages
    }

    /// Sends a single-turn prompt to the default model and returns the answer text.
    pub async fn generate(&self, system: &str, user: &str) -> Result<String, TaskError> {
        let messages = self.messages_for(&self.config.default_model, system, user);
        let completion = self.create_completion(self.request(messages)).await?;
        Ok(completion.content)
    }

    /// Polls a task once and returns its current state.
    #[instrument(skip(self))]
    pub async fn retrieve_task(&self, task_id: &str) -> Result<TaskRecord, TaskError> {
        let trimmed = task_id.trim();
        if trimmed.is_empty() {
            return Err(TaskError::InvalidRequest("task id must not be empty".to_string()));
        }
        let id: TaskId = trimmed
            .parse()
            .map_err(|_| TaskError::InvalidRequest(format!("task id is not an integer: {trimmed}")))?;

        let (snapshot, outcome) = ResultPoller::new(self.api.clone()).poll_once(id).await?;
        debug!(task_id = %id, status = %outcome.status, "Retrieved task");

        Ok(TaskRecord {
            task_id: id,
            snapshot,
            outcome,
        })
    }

    /// Retrieves several tasks concurrently. Per-task failures do not abort the batch.
    pub async fn batch_retrieve(&self, task_ids: &[String]) -> Result<Vec<BatchEntry>, TaskError> {
        if task_ids.is_empty() {
            return Err(TaskError::InvalidRequest("no task ids given".to_string()));
        }

        let entries = join_all(task_ids.iter().map(|id| async move {
            BatchEntry {
                task_id: id.clone(),
                result: self.retrieve_task(id).await,
            }
        }))
        .await;

        Ok(entries)
    }

    async fn run(
        &self,
        request: &CompletionRequest,
        cancel: &CancellationToken,
    ) -> Result<Completion, TaskError> {
        let task = TaskSubmitter::new(self.api.clone()).submit(request).await?;
        let cadence = PollCadence::for_kind(task.kind);
        let coordinator = RetryCoordinator::new(ResultPoller::new(self.api.clone()), self.config.retry);
        coordinator.run_with_retry(&task, cadence, cancel).await
    }
}

impl std::fmt::Debug for TaskClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Completion Handle
// ============================================================================

/// A completion running on a background task.
#[derive(Debug)]
pub struct CompletionHandle {
    join: JoinHandle<Result<Completion, TaskError>>,
    cancel: CancellationToken,
}

impl CompletionHandle {
    /// Stops local polling at the next wait or before the next poll.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns a token that cancels this completion.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Waits for the result.
    pub async fn join(self) -> Result<Completion, TaskError> {
        match self.join.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(TaskError::Cancelled),
            Err(e) => Err(TaskError::Join(e.to_string())),
        }
    }
}

// ============================================================================
// Task Records
// ============================================================================

/// Current state of a task, from a single poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    /// Task id.
    pub task_id: TaskId,
    /// Normalized response.
    pub snapshot: PollSnapshot,
    /// Classification.
    pub outcome: PollOutcome,
}

/// One entry of a batch retrieval.
#[derive(Debug)]
pub struct BatchEntry {
    /// The id as given.
    pub task_id: String,
    /// Record or error for this id.
    pub result: Result<TaskRecord, TaskError>,
}
