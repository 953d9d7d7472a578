//! Task identity and model selection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Model Kind
// ============================================================================

/// Backend model family, as understood by the remote API's `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Yuanbao (type 1). Also the fallback for unknown names.
    #[default]
    Yuanbao,
    /// Gemini (type 2).
    Gemini,
}

impl ModelKind {
    /// Maps a model name to a kind. Unrecognized names fall back to Yuanbao.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "gemini" => Self::Gemini,
            _ => Self::Yuanbao,
        }
    }

    /// Numeric code sent as the submission `type`.
    pub fn type_code(&self) -> i32 {
        match self {
            Self::Yuanbao => 1,
            Self::Gemini => 2,
        }
    }

    /// Canonical lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Yuanbao => "yuanbao",
            Self::Gemini => "gemini",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Task Id
// ============================================================================

/// Opaque integer identifier the remote API assigns to a submitted task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub i64);

impl TaskId {
    /// Returns the raw integer.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<i64> for TaskId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

// ============================================================================
// Task
// ============================================================================

/// What kind of work a task performs. Selects the polling cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Text generation.
    #[default]
    Normal,
    /// Image generation, which needs warm-up before status is meaningful.
    ImageGeneration,
}

impl TaskKind {
    /// Derives the kind from the submission's `generateImage` flag.
    pub fn from_generate_image(generate_image: bool) -> Self {
        if generate_image {
            Self::ImageGeneration
        } else {
            Self::Normal
        }
    }
}

/// A submitted remote task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Remote identifier.
    pub id: TaskId,
    /// Task kind.
    pub kind: TaskKind,
    /// Model name as supplied by the caller.
    pub model: String,
}

impl Task {
    /// Creates a new task handle.
    pub fn new(id: TaskId, kind: TaskKind, model: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            model: model.into(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_type_codes() {
        assert_eq!(ModelKind::from_name("yuanbao").type_code(), 1);
        assert_eq!(ModelKind::from_name("Gemini").type_code(), 2);
    }

    #[test]
    fn test_unknown_model_defaults_to_yuanbao() {
        assert_eq!(ModelKind::from_name("gpt-4o"), ModelKind::Yuanbao);
        assert_eq!(ModelKind::from_name(""), ModelKind::Yuanbao);
    }

    #[test]
    fn test_task_id_parse() {
        assert_eq!(" 42 ".parse::<TaskId>().unwrap(), TaskId(42));
        assert!("abc".parse::<TaskId>().is_err());
        assert_eq!(TaskId(7).to_string(), "7");
    }

    #[test]
    fn test_task_kind_from_flag() {
        assert_eq!(TaskKind::from_generate_image(true), TaskKind::ImageGeneration);
        assert_eq!(TaskKind::from_generate_image(false), TaskKind::Normal);
    }
}
