//! Chat message types and prompt flattening.

use serde::{Deserialize, Serialize};

// ============================================================================
// Role
// ============================================================================

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions.
    System,
    /// End-user input.
    User,
    /// Earlier model output.
    Assistant,
}

impl Role {
    /// Marker prepended to this role's content when flattening a conversation.
    ///
    /// User messages are sent unprefixed.
    pub fn marker(&self) -> Option<&'static str> {
        match self {
            Self::System => Some("[System]"),
            Self::User => None,
            Self::Assistant => Some("[Assistant]"),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        };
        write!(f, "{name}")
    }
}

// ============================================================================
// Chat Message
// ============================================================================

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who wrote the message.
    pub role: Role,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Creates a message with the given role.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Flattens a conversation into the single `question` string the remote API takes.
///
/// Order is preserved and messages are joined with newlines.
pub fn flatten_messages(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|msg| match msg.role.marker() {
            Some(marker) => format!("{marker}: {}", msg.content),
            None => msg.content.clone(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// Tests
// ============================================================================
