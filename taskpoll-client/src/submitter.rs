//! Task submission.

use std::sync::Arc;
use taskpoll_core::{ChatMessage, ModelKind, SubmitAck, Task, TaskKind, flatten_messages};
use tracing::{debug, info, instrument, warn};

use crate::api::{SubmitPayload, TaskApi};
use crate::config::DEFAULT_PRIORITY;
use crate::error::TaskError;

// ============================================================================
// Completion Request
// ============================================================================

/// What the caller wants generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// Model name. Unknown names are submitted as the default model.
    pub model: String,
    /// Conversation, in order.
    pub messages: Vec<ChatMessage>,
    /// Image to analyze, by URL.
    pub image_url: Option<String>,
    /// Image to analyze, base64 encoded.
    pub image_data: Option<String>,
    /// Request deep research.
    pub deep_research: bool,
    /// Request image generation. Selects the image polling cadence.
    pub generate_image: bool,
    /// Scheduling priority.
    pub priority: i32,
}

impl CompletionRequest {
    /// Creates a request for `model` with the given messages.
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            image_url: None,
            image_data: None,
            deep_research: false,
            generate_image: false,
            priority: DEFAULT_PRIORITY,
        }
    }

    /// Attaches an image URL.
    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    /// Attaches base64 image data.
    pub fn with_image_data(mut self, data: impl Into<String>) -> Self {
        self.image_data = Some(data.into());
        self
    }

    /// Enables deep research.
    pub fn with_deep_research(mut self, enabled: bool) -> Self {
        self.deep_research = enabled;
        self
    }

    /// Enables image generation.
    pub fn with_generate_image(mut self, enabled: bool) -> Self {
        self.generate_image = enabled;
        self
    }

    /// Sets the priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Task kind this request produces.
    pub fn task_kind(&self) -> TaskKind {
        TaskKind::from_generate_image(self.generate_image)
    }

    /// Rejects requests the remote system would never accept.
    pub fn validate(&self) -> Result<(), TaskError> {
        if self.messages.is_empty() {
            return Err(TaskError::InvalidRequest(
                "messages must not be empty".to_string(),
            ));
        }

        let present = |field: &Option<String>| field.as_deref().is_some_and(|v| !v.is_empty());
        if present(&self.image_url) && present(&self.image_data) {
            return Err(TaskError::InvalidRequest(
                "image_url and image_data are mutually exclusive".to_string(),
            ));
        }

        Ok(())
    }

    /// Builds the wire payload.
    pub fn to_payload(&self) -> SubmitPayload {
        SubmitPayload {
            type_code: ModelKind::from_name(&self.model).type_code(),
            question: flatten_messages(&self.messages),
            image_url: self.image_url.clone().unwrap_or_default(),
            image_data: self.image_data.clone().unwrap_or_default(),
            deep_research: u8::from(self.deep_research),
            generate_image: u8::from(self.generate_image),
            priority: self.priority,
        }
    }
}

// ============================================================================
// Task Submitter
// ============================================================================

/// Validates requests and submits them. Submission is never retried.
#[derive(Clone)]
pub struct TaskSubmitter {
    api: Arc<dyn TaskApi>,
}

impl TaskSubmitter {
    /// Creates a submitter over `api`.
    pub fn new(api: Arc<dyn TaskApi>) -> Self {
        Self { api }
    }

    /// Validates and submits a request, returning the created task.
    #[instrument(skip(self, request), fields(model = %request.model))]
    pub async fn submit(&self, request: &CompletionRequest) -> Result<Task, TaskError> {
        request.validate()?;

        let payload = request.to_payload();
        debug!(
            type_code = payload.type_code,
            generate_image = payload.generate_image,
            "Submitting task"
        );

        let body = self.api.submit(&payload).await?;
        let ack = SubmitAck::from_json(&body)
            .map_err(|e| TaskError::InvalidRequest(format!("unreadable submit response: {e}")))?;

        if !ack.accepted {
            warn!(message = %ack.message, "Submission rejected");
            let reason = if ack.message.is_empty() {
                "submission rejected".to_string()
            } else {
                format!("submission rejected: {}", ack.message)
            };
            return Err(TaskError::InvalidRequest(reason));
        }

        let id = ack
            .task_id()
            .map_err(|e| TaskError::InvalidRequest(e.to_string()))?;

        info!(task_id = %id, "Task submitted");
        Ok(Task::new(id, request.task_kind(), request.model.clone()))
    }
}

impl std::fmt::Debug for TaskSubmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskSubmitter").finish_non_exhaustive()
    }
}
