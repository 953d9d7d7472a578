//! Polling cadence and outer retry policy.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::task::TaskKind;

// ============================================================================
// Poll Cadence
// ============================================================================

/// How a task kind is polled: initial warm-up, interval, and attempt budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollCadence {
    /// Wait before the first poll.
    pub initial_delay: Duration,
    /// Wait between polls.
    pub interval: Duration,
    /// Maximum number of polls in one cycle.
    pub max_attempts: u32,
}

impl PollCadence {
    /// Cadence for text tasks: no warm-up, every 2s, 60 attempts.
    pub const NORMAL: Self = Self {
        initial_delay: Duration::ZERO,
        interval: Duration::from_secs(2),
        max_attempts: 60,
    };

    /// Cadence for image tasks: 30s warm-up, every 10s, 100 attempts.
    pub const IMAGE_GENERATION: Self = Self {
        initial_delay: Duration::from_secs(30),
        interval: Duration::from_secs(10),
        max_attempts: 100,
    };

    /// Selects the cadence for a task kind.
    pub fn for_kind(kind: TaskKind) -> Self {
        match kind {
            TaskKind::Normal => Self::NORMAL,
            TaskKind::ImageGeneration => Self::IMAGE_GENERATION,
        }
    }
}

// ============================================================================
// Retry Policy
// ============================================================================

/// Outer retry policy for rate-limited poll cycles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    /// Number of outer retries after the first cycle.
    pub max_outer_attempts: u32,
    /// Base backoff delay.
    #[serde(with = "duration_secs")]
    pub base_delay: Duration,
    /// Whether rate-limit failures are retried at all.
    pub enable_rate_limit_retry: bool,
}

impl RetryPolicy {
    /// Creates an enabled policy with the given number of outer retries.
    pub fn new(max_outer_attempts: u32) -> Self {
        Self {
            max_outer_attempts,
            enable_rate_limit_retry: true,
            ..Self::default()
        }
    }

    /// Disables rate-limit retries.
    pub fn no_retry() -> Self {
        Self {
            max_outer_attempts: 0,
            base_delay: Duration::ZERO,
            enable_rate_limit_retry: false,
        }
    }

    /// Sets the base delay.
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Enables or disables rate-limit retries.
    pub fn with_rate_limit_retry(mut self, enabled: bool) -> Self {
        self.enable_rate_limit_retry = enabled;
        self
    }

    /// Backoff before retry number `attempt` (counted from 0): `base * 2^attempt`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_outer_attempts: 0,
            base_delay: Duration::from_secs(5),
            enable_rate_limit_retry: false,
        }
    }
}

/// Serializes a `Duration` as fractional seconds.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Tests
// ============================================================================
