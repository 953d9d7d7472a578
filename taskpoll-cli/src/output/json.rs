//! JSON output formatting.

use anyhow::Result;
use serde::Serialize;
use taskpoll_client::{BatchEntry, ClientConfig, TaskRecord};

use super::mask_token;

// ============================================================================
// Output Types
// ============================================================================

/// JSON output for one entry of a batch lookup.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemOutput<'a> {
    pub task_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<&'a TaskRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Effective configuration, token masked.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOutput<'a> {
    pub api_token: String,
    pub base_url: &'a str,
    pub timeout_secs: u64,
    pub retry_on_rate_limit: bool,
    pub max_retries: u32,
    pub retry_delay_secs: f64,
    pub default_model: &'a str,
    pub auto_system_prompt: bool,
    pub priority: i32,
}

impl<'a> From<&'a ClientConfig> for ConfigOutput<'a> {
    fn from(config: &'a ClientConfig) -> Self {
        Self {
            api_token: mask_token(&config.api_token),
            base_url: &config.base_url,
            timeout_secs: config.timeout.as_secs(),
            retry_on_rate_limit: config.retry.enable_rate_limit_retry,
            max_retries: config.retry.max_outer_attempts,
            retry_delay_secs: config.retry.base_delay.as_secs_f64(),
            default_model: &config.default_model,
            auto_system_prompt: config.auto_system_prompt,
            priority: config.priority,
        }
    }
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }

    /// Formats batch lookup results as an array.
    pub fn format_batch(&self, entries: &[BatchEntry]) -> Result<String> {
        let outputs: Vec<BatchItemOutput<'_>> = entries
            .iter()
            .map(|entry| match &entry.result {
                Ok(record) => BatchItemOutput {
                    task_id: &entry.task_id,
                    status: Some(record.outcome.status.label()),
                    record: Some(record),
                    error: None,
                },
                Err(e) => BatchItemOutput {
                    task_id: &entry.task_id,
                    status: None,
                    record: None,
                    error: Some(e.to_string()),
                },
            })
            .collect();

        self.format(&outputs)
    }

    /// Formats the effective configuration.
    pub fn format_config(&self, config: &ClientConfig) -> Result<String> {
        self.format(&ConfigOutput::from(config))
    }
}
