//! Wire-schema adapter.
//!
//! The remote API has shipped more than one response shape. Everything
//! here turns a raw JSON body into a schema-independent value so the rest
//! of the crate never looks at wire fields directly.
//!
//! Poll responses come in two shapes:
//!
//! - **Flat**: `{"code": 0, "message": "AI任务处理完成", "answer": "..."}`
//! - **Nested**: `{"code": 0, "data": {"status": "completed", "answer": "...", "error": null}}`
//!
//! `data` is sometimes a bare task id, or an object with only an id, rather
//! than a status payload; both are read as flat responses.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::CoreError;
use crate::models::TaskId;

// ============================================================================
// Value Helpers
// ============================================================================

/// Reads a string or number as text. Empty strings count as absent.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Returns the first key present with a usable scalar value.
fn first_text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| obj.get(*k).and_then(scalar_text))
}

/// Reads the envelope `code`, accepting numbers and numeric strings.
fn read_code(obj: &Map<String, Value>) -> Option<i64> {
    match obj.get("code")? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Keys that mark a `data` object as a nested status payload.
const NESTED_KEYS: &[&str] = &[
    "status",
    "state",
    "answer",
    "result",
    "content",
    "error",
    "errorMessage",
    "error_message",
];

/// Returns true if `data` carries any nested status field.
fn is_nested_payload(data: &Map<String, Value>) -> bool {
    NESTED_KEYS.iter().any(|k| data.contains_key(*k))
}

fn as_object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>, CoreError> {
    value
        .as_object()
        .ok_or_else(|| CoreError::InvalidData(format!("{what} is not a JSON object")))
}

// ============================================================================
// Submit Acknowledgement
// ============================================================================

/// Normalized response to a task submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAck {
    /// Whether the remote system accepted the task.
    pub accepted: bool,
    /// Raw task identifier, not yet validated.
    pub task_id: Option<String>,
    /// Remote message, if any.
    pub message: String,
}

impl SubmitAck {
    /// Parses a submission response body.
    ///
    /// The success indicator is `success` when present, otherwise `code == 0`;
    /// a body with neither counts as accepted. The task id is read from
    /// `taskId`, a scalar `data`, or `data.taskId` / `data.id`.
    pub fn from_json(value: &Value) -> Result<Self, CoreError> {
        let obj = as_object(value, "submit response")?;

        let accepted = match obj.get("success").and_then(Value::as_bool) {
            Some(success) => success,
            None => read_code(obj).is_none_or(|code| code == 0),
        };

        let task_id = first_text(obj, &["taskId", "task_id"]).or_else(|| match obj.get("data") {
            Some(Value::Object(data)) => first_text(data, &["taskId", "task_id", "id"]),
            Some(other) => scalar_text(other),
            None => None,
        });

        let message = first_text(obj, &["message", "msg"]).unwrap_or_default();

        debug!(accepted, task_id = ?task_id, "Parsed submit response");

        Ok(Self {
            accepted,
            task_id,
            message,
        })
    }

    /// Parses the task id as an integer.
    pub fn task_id(&self) -> Result<TaskId, CoreError> {
        let raw = self
            .task_id
            .as_deref()
            .ok_or_else(|| CoreError::InvalidData("response carries no task id".to_string()))?;
        raw.parse()
            .map_err(|_| CoreError::InvalidData(format!("task id is not an integer: {raw}")))
    }
}

// ============================================================================
// Poll Snapshot
// ============================================================================

/// Which response shape a poll body used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WireSchema {
    /// Top-level `message` / `answer`.
    Flat,
    /// `data.status` / `data.answer` / `data.error`.
    Nested,
}

/// Normalized poll response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollSnapshot {
    /// Envelope code. Absent codes read as 0.
    pub code: i64,
    /// Detected response shape.
    pub schema: WireSchema,
    /// The status signal to classify: `message` for flat bodies, `data.status` for nested ones.
    pub status_text: String,
    /// Top-level envelope message.
    pub message: String,
    /// Answer text, if any.
    pub answer: Option<String>,
    /// Error text, if any.
    pub error: Option<String>,
}

impl PollSnapshot {
    /// Parses a poll response body, detecting its schema.
    pub fn from_json(value: &Value) -> Result<Self, CoreError> {
        let obj = as_object(value, "poll response")?;

        let code = read_code(obj).unwrap_or(0);
        let message = first_text(obj, &["message", "msg"]).unwrap_or_default();

        let snapshot = match obj.get("data") {
            Some(Value::Object(data)) if is_nested_payload(data) => Self {
                code,
                schema: WireSchema::Nested,
                status_text: first_text(data, &["status", "state"]).unwrap_or_default(),
                message,
                answer: first_text(data, &["answer", "result", "content"]),
                error: first_text(data, &["error", "errorMessage", "error_message"]),
            },
            _ => Self {
                code,
                schema: WireSchema::Flat,
                status_text: message.clone(),
                message,
                answer: first_text(obj, &["answer"]),
                error: first_text(obj, &["error"]),
            },
        };

        debug!(
            schema = ?snapshot.schema,
            code = snapshot.code,
            status = %snapshot.status_text,
            "Parsed poll response"
        );

        Ok(snapshot)
    }

    /// Text explaining a failure: error, else answer, else message.
    pub fn failure_text(&self) -> &str {
        self.error
            .as_deref()
            .or(self.answer.as_deref())
            .unwrap_or(&self.message)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_data_object_without_status_fields_is_flat() {
        let snapshot = PollSnapshot::from_json(&json!({
            "code": 0,
            "message": "AI任务处理完成",
            "answer": "这是一个完整的回答内容",
            "data": {"id": 42}
        }))
        .unwrap();

        assert_eq!(snapshot.schema, WireSchema::Flat);
        assert_eq!(snapshot.status_text, "AI任务处理完成");
        assert_eq!(snapshot.answer.as_deref(), Some("这是一个完整的回答内容"));

        let snapshot =
            PollSnapshot::from_json(&json!({"message": "AI任务处理失败", "data": {}})).unwrap();
        assert_eq!(snapshot.schema, WireSchema::Flat);
        assert_eq!(snapshot.status_text, "AI任务处理失败");
    }

    #[test]
    fn test_data_object_with_any_status_field_is_nested() {
        let snapshot =
            PollSnapshot::from_json(&json!({"message": "ok", "data": {"error": "boom"}})).unwrap();
        assert_eq!(snapshot.schema, WireSchema::Nested);
        assert_eq!(snapshot.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_submit_task_id_parsing() {
        let ack = SubmitAck::from_json(&json!({"success": true, "taskId": " 42 "})).unwrap();
        assert_eq!(ack.task_id().unwrap(), TaskId(42));

        let ack = SubmitAck::from_json(&json!({"success": true, "taskId": "abc"})).unwrap();
        assert!(matches!(ack.task_id(), Err(CoreError::InvalidData(_))));

        let ack = SubmitAck::from_json(&json!({"success": true})).unwrap();
        assert!(matches!(ack.task_id(), Err(CoreError::InvalidData(_))));
    }

    #[test]
    fn test_submit_code_envelope_with_scalar_data() {
        let ack = SubmitAck::from_json(&json!({"code": 0, "message": "ok", "data": "42"})).unwrap();
        assert!(ack.accepted);
        assert_eq!(ack.task_id.as_deref(), Some("42"));
        assert_eq!(ack.message, "ok");

        let ack = SubmitAck::from_json(&json!({"code": 0, "data": 42})).unwrap();
        assert_eq!(ack.task_id.as_deref(), Some("42"));
    }

    #[test]
    fn test_submit_success_flag() {
        let ack = SubmitAck::from_json(&json!({"success": true, "taskId": "7"})).unwrap();
        assert!(ack.accepted);
        assert_eq!(ack.task_id.as_deref(), Some("7"));

        let ack = SubmitAck::from_json(&json!({"success": false, "message": "bad"})).unwrap();
        assert!(!ack.accepted);
        assert!(ack.task_id.is_none());
    }

    #[test]
    fn test_submit_nonzero_code_rejected() {
        let ack = SubmitAck::from_json(&json!({"code": 500, "message": "busy"})).unwrap();
        assert!(!ack.accepted);

        let ack = SubmitAck::from_json(&json!({"code": "1", "data": 3})).unwrap();
        assert!(!ack.accepted);
    }

    #[test]
    fn test_submit_nested_data_object() {
        let ack = SubmitAck::from_json(&json!({"code": 0, "data": {"taskId": 99}})).unwrap();
        assert_eq!(ack.task_id.as_deref(), Some("99"));
    }

    #[test]
    fn test_submit_empty_data_is_missing() {
        let ack = SubmitAck::from_json(&json!({"code": 0, "data": ""})).unwrap();
        assert!(ack.task_id.is_none());
    }

    #[test]
    fn test_submit_non_object_rejected() {
        assert!(SubmitAck::from_json(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_poll_flat_schema() {
        let snap = PollSnapshot::from_json(&json!({
            "code": 0,
            "message": "AI任务处理完成",
            "answer": "这是一个完整的回答内容"
        }))
        .unwrap();

        assert_eq!(snap.schema, WireSchema::Flat);
        assert_eq!(snap.status_text, "AI任务处理完成");
        assert_eq!(snap.answer.as_deref(), Some("这是一个完整的回答内容"));
    }

    #[test]
    fn test_poll_nested_schema_numeric_status() {
        let snap = PollSnapshot::from_json(&json!({
            "code": 0,
            "message": "success",
            "data": {"status": 3, "error": "quota exceeded"}
        }))
        .unwrap();

        assert_eq!(snap.schema, WireSchema::Nested);
        assert_eq!(snap.status_text, "3");
        assert_eq!(snap.message, "success");
        assert_eq!(snap.failure_text(), "quota exceeded");
    }

    #[test]
    fn test_poll_scalar_data_reads_as_flat() {
        let snap = PollSnapshot::from_json(&json!({"code": 0, "message": "AI任务待处理", "data": 42}))
            .unwrap();
        assert_eq!(snap.schema, WireSchema::Flat);
        assert!(snap.answer.is_none());
    }

    #[test]
    fn test_poll_missing_code_defaults_to_zero() {
        let snap = PollSnapshot::from_json(&json!({"message": "AI任务处理中"})).unwrap();
        assert_eq!(snap.code, 0);
    }

    #[test]
    fn test_poll_non_object_rejected() {
        assert!(PollSnapshot::from_json(&json!("AI任务处理完成")).is_err());
        assert!(PollSnapshot::from_json(&Value::Null).is_err());
    }
}
