//! Domain model structs persisted in the local SQLite database.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to the UI layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

/// A chat conversation and its ordered message history.
///
/// `created_at` is assigned on first write and never changes afterwards;
/// `updated_at` is bumped on every persisted write.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Conversation {
    /// Unique conversation identifier.
    pub id: Uuid,
    /// Human-readable title.
    pub title: String,
    /// When the conversation was first persisted.
    pub created_at: DateTime<Utc>,
    /// When the conversation was last written.
    pub updated_at: DateTime<Utc>,
    /// Messages in insertion order.  Append-only.
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Create a new, empty conversation with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            created_at: now,
            updated_at: now,
            messages: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// Who authored a message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Stable string form used in the database and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }
}

/// A single chat message.  Immutable once appended: messages are never
/// edited or reordered, only added at the end of their conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Unique within the parent conversation.
    pub id: Uuid,
    /// Author role.
    pub role: Role,
    /// Message text.
    pub content: String,
    /// When the message was created.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Setting
// ---------------------------------------------------------------------------

/// A caller-defined key/value setting.  Values are opaque JSON blobs;
/// conflicting writes to the same key are last-write-wins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Setting {
    /// Caller-defined key, e.g. `training_settings`.
    pub key: String,
    /// Opaque JSON value.
    pub value: serde_json::Value,
    /// When this key was last written.
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// ModelMetadata
// ---------------------------------------------------------------------------

/// Metadata for a locally downloaded model.
///
/// Written only by a completed download or sync job; read by the chat and
/// training paths to decide whether inference is possible at all.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelMetadata {
    /// Model identifier, e.g. `gpt2-haven-small`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Approximate size in megabytes.
    pub size_mb: f64,
    /// Where the model weights live on disk.  A simulated download writes a
    /// clearly-labelled placeholder here, never a real path.
    pub path: String,
    /// When the metadata was last written.
    pub last_updated: DateTime<Utc>,
}
