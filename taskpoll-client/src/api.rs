//! The two remote operations this crate consumes.
//!
//! [`TaskApi`] is the seam between the polling machinery and the network.
//! [`crate::http::HttpTaskApi`] is the production implementation;
//! [`crate::testing::ScriptedTaskApi`] replays canned responses.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use taskpoll_core::TaskId;

use crate::error::TransportError;

/// Body of a task submission, with the remote API's field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPayload {
    /// Model type code.
    #[serde(rename = "type")]
    pub type_code: i32,
    /// Flattened prompt.
    pub question: String,
    /// Image URL, or empty.
    pub image_url: String,
    /// Base64 image data, or empty.
    pub image_data: String,
    /// 1 to request deep research.
    pub deep_research: u8,
    /// 1 to request image generation.
    pub generate_image: u8,
    /// Scheduling priority.
    pub priority: i32,
}

/// Remote task API.
///
/// Implementations return raw JSON bodies; schema detection happens in
/// [`taskpoll_core::schema`]. Implementations must be safe to share across
/// concurrent polls.
#[async_trait]
pub trait TaskApi: Send + Sync {
    /// Submits a task. Called exactly once per completion.
    async fn submit(&self, payload: &SubmitPayload) -> Result<Value, TransportError>;

    /// Fetches the current status of a task.
    async fn poll(&self, task_id: TaskId) -> Result<Value, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_wire_names() {
        let payload = SubmitPayload {
            type_code: 2,
            question: "hi".to_string(),
            image_url: String::new(),
            image_data: String::new(),
            deep_research: 0,
            generate_image: 1,
            priority: 50,
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], 2);
        assert_eq!(json["imageUrl"], "");
        assert_eq!(json["imageData"], "");
        assert_eq!(json["deepResearch"], 0);
        assert_eq!(json["generateImage"], 1);
        assert_eq!(json["priority"], 50);
    }
}
