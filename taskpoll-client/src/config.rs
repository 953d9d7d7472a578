//! Client configuration.
//!
//! Configuration is an explicit [`ClientConfig`] handed to constructors.
//! It can be resolved from three layers, highest precedence first:
//!
//! 1. Environment variables (`AI_API_TOKEN`, `AI_API_BASE_URL`, ...)
//! 2. The JSON config file ([`ConfigFile::default_path`])
//! 3. Built-in defaults

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use taskpoll_core::{ModelKind, RetryPolicy};
use tracing::{debug, info};
use url::Url;

use crate::error::TaskError;

// ============================================================================
// Constants
// ============================================================================

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "http://156.254.5.245:8088/api/v1";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default task priority.
pub const DEFAULT_PRIORITY: i32 = 50;

/// Environment variable names.
pub mod env {
    /// API token.
    pub const API_TOKEN: &str = "AI_API_TOKEN";
    /// Base URL.
    pub const BASE_URL: &str = "AI_API_BASE_URL";
    /// Per-request timeout, seconds.
    pub const TIMEOUT: &str = "AI_API_TIMEOUT";
    /// Enable rate-limit retries (`true`/`1`).
    pub const RETRY_ON_RATE_LIMIT: &str = "AI_API_RETRY_ON_RATE_LIMIT";
    /// Outer retry budget.
    pub const MAX_RETRIES: &str = "AI_API_MAX_RETRIES";
    /// Base backoff delay, seconds.
    pub const RETRY_DELAY: &str = "AI_API_RETRY_DELAY";
    /// Default model name.
    pub const MODEL: &str = "AI_API_MODEL";
}

// ============================================================================
// Client Config
// ============================================================================

/// Settings for a [`crate::TaskClient`].
#[derive(Clone)]
pub struct ClientConfig {
    /// Token sent as `x-custom-token`.
    pub api_token: String,
    /// API base URL without trailing slash.
    pub base_url: String,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
    /// Outer retry policy for rate-limited tasks.
    pub retry: RetryPolicy,
    /// Model used by [`crate::TaskClient::generate`].
    pub default_model: String,
    /// Add a default system prompt for Gemini when none is given.
    pub auto_system_prompt: bool,
    /// Priority sent with every submission.
    pub priority: i32,
}

impl ClientConfig {
    /// Creates a config with the given token and defaults for everything else.
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
            default_model: ModelKind::Gemini.name().to_string(),
            auto_system_prompt: true,
            priority: DEFAULT_PRIORITY,
        }
    }

    /// Sets the base URL. A trailing slash is removed.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the outer retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the default model.
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Enables or disables the automatic Gemini system prompt.
    pub fn with_auto_system_prompt(mut self, enabled: bool) -> Self {
        self.auto_system_prompt = enabled;
        self
    }

    /// Sets the submission priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Resolves configuration from the process environment only.
    pub fn from_env() -> Result<Self, TaskError> {
        Self::resolve(&ConfigFile::default(), |key| std::env::var(key).ok())
    }

    /// Resolves configuration from the default config file and the environment.
    pub fn load() -> Result<Self, TaskError> {
        let file = ConfigFile::load_from(&ConfigFile::default_path())?;
        Self::resolve(&file, |key| std::env::var(key).ok())
    }

    /// Layers `lookup` (environment) over `file` over defaults, then validates.
    pub fn resolve<F>(file: &ConfigFile, lookup: F) -> Result<Self, TaskError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let token = var(env::API_TOKEN)
            .or_else(|| file.api_token.clone())
            .ok_or_else(|| {
                TaskError::Authentication(format!(
                    "API token not provided, set {} or add apiToken to {}",
                    env::API_TOKEN,
                    ConfigFile::default_path().display()
                ))
            })?;

        let mut config = Self::new(token);

        if let Some(url) = var(env::BASE_URL).or_else(|| file.base_url.clone()) {
            config = config.with_base_url(url);
        }

        let timeout_secs = match var(env::TIMEOUT) {
            Some(raw) => Some(parse_number::<u64>(env::TIMEOUT, &raw)?),
            None => file.timeout_secs,
        };
        if let Some(secs) = timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }

        if let Some(raw) = var(env::RETRY_ON_RATE_LIMIT) {
            config.retry.enable_rate_limit_retry = parse_bool(env::RETRY_ON_RATE_LIMIT, &raw)?;
        } else if let Some(enabled) = file.retry_on_rate_limit {
            config.retry.enable_rate_limit_retry = enabled;
        }

        let max_retries = match var(env::MAX_RETRIES) {
            Some(raw) => Some(parse_number::<u32>(env::MAX_RETRIES, &raw)?),
            None => file.max_retries,
        };
        if let Some(max) = max_retries {
            config.retry.max_outer_attempts = max;
        }

        let delay_secs = match var(env::RETRY_DELAY) {
            Some(raw) => Some(parse_number::<f64>(env::RETRY_DELAY, &raw)?),
            None => file.retry_delay_secs,
        };
        if let Some(secs) = delay_secs {
            config.retry.base_delay = Duration::try_from_secs_f64(secs)
                .map_err(|e| TaskError::Config(format!("invalid retry delay {secs}: {e}")))?;
        }

        if let Some(model) = var(env::MODEL).or_else(|| file.default_model.clone()) {
            config.default_model = model;
        }
        if let Some(enabled) = file.auto_system_prompt {
            config.auto_system_prompt = enabled;
        }
        if let Some(priority) = file.priority {
            config.priority = priority;
        }

        config.validate()?;
        debug!(base_url = %config.base_url, "Resolved client configuration");
        Ok(config)
    }

    /// Checks the token and base URL.
    pub fn validate(&self) -> Result<(), TaskError> {
        if self.api_token.trim().is_empty() {
            return Err(TaskError::Authentication("API token is empty".to_string()));
        }

        let parsed = Url::parse(&self.base_url)
            .map_err(|e| TaskError::Config(format!("invalid base URL {}: {e}", self.base_url)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(TaskError::Config(format!(
                "unsupported URL scheme: {}",
                parsed.scheme()
            )));
        }

        if self.timeout.is_zero() {
            return Err(TaskError::Config("timeout must be greater than zero".to_string()));
        }

        Ok(())
    }

    /// Full URL for an endpoint path such as `/chatResult`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .field("default_model", &self.default_model)
            .field("auto_system_prompt", &self.auto_system_prompt)
            .field("priority", &self.priority)
            .finish()
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, TaskError> {
    raw.trim()
        .parse()
        .map_err(|_| TaskError::Config(format!("{key} is not a valid number: {raw}")))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, TaskError> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(TaskError::Config(format!("{key} is not a valid boolean: {raw}"))),
    }
}

// ============================================================================
// Config File
// ============================================================================

/// On-disk configuration. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    /// API token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    /// Base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Per-request timeout, seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Enable rate-limit retries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_on_rate_limit: Option<bool>,
    /// Outer retry budget.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    /// Base backoff delay, seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_delay_secs: Option<f64>,
    /// Default model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
    /// Automatic Gemini system prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_system_prompt: Option<bool>,
    /// Submission priority.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
}

impl ConfigFile {
    /// Returns the default configuration file path.
    ///
    /// - Linux: `~/.config/taskpoll/config.json`
    /// - macOS: `~/Library/Application Support/taskpoll/config.json`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("taskpoll")
            .join("config.json")
    }

    /// Loads a config file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, TaskError> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| TaskError::Config(format!("cannot read {}: {e}", path.display())))?;
        let file: Self = serde_json::from_str(&content)
            .map_err(|e| TaskError::Config(format!("cannot parse {}: {e}", path.display())))?;

        info!(path = %path.display(), "Loaded configuration");
        Ok(file)
    }

    /// Saves the config file, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), TaskError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| TaskError::Config(format!("cannot create {}: {e}", parent.display())))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| TaskError::Config(e.to_string()))?;
        std::fs::write(path, content)
            .map_err(|e| TaskError::Config(format!("cannot write {}: {e}", path.display())))?;

        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
