//! Shared types for the parley chat core.
//!
//! This crate provides the foundational types used across all other parley
//! crates:
//! - `Role` / `Message`: one turn of a conversation transcript
//! - `ChatError`: unified error taxonomy
//! - `Result`: convenience alias

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ChatError
// ---------------------------------------------------------------------------

/// Unified error type for all parley subsystems.
///
/// Display strings matter here: at the adapter boundary a failed completion
/// is rendered as `"Error: {err}"` and stored in the transcript, so each
/// variant's message is user-facing text.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    // === Provider request errors ===
    #[error("provider {provider} returned HTTP {status}: {message}")]
    Provider {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("rate limited by {provider}")]
    RateLimited { provider: String },

    #[error("authentication failed for provider {provider}")]
    Auth { provider: String },

    #[error("request to {provider} timed out after {timeout_ms}ms")]
    Timeout { provider: String, timeout_ms: u64 },

    #[error("could not connect to {provider}: {message}")]
    Connection { provider: String, message: String },

    #[error("malformed response from {provider}: {message}")]
    MalformedResponse { provider: String, message: String },

    // === Session errors ===
    #[error("conversation {id} already has a request in flight")]
    ConversationBusy { id: u64 },

    #[error("conversation {id} has no provider and model selected")]
    ConversationNotStarted { id: u64 },

    #[error("no conversation with id {id}")]
    UnknownConversation { id: u64 },

    #[error("no provider named '{0}' is registered")]
    UnknownProvider(String),

    // === Generic ===
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// A convenience alias for `Result<T, ChatError>`.
pub type Result<T> = std::result::Result<T, ChatError>;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// One turn of a conversation transcript.
///
/// The serde representation (`{"role": "user", "content": "..."}`) doubles
/// as the chat-completions wire shape, so adapters can serialize transcripts
/// directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// System messages are forwarded to providers but never rendered.
    pub fn is_system(&self) -> bool {
        self.role == Role::System
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
