//! Wire types for the append-only session journal.
//!
//! Grounded on `sage-core::session::types::unified::{record, message,
//! message_types, tool_types}` — a tagged-union record envelope wrapping a
//! message model whose content is itself either a plain string or a list of
//! typed parts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::history::Snapshot;

/// One line of the session journal. Tagged on `type` so a reader can parse a
/// line without knowing in advance whether it holds a message, a snapshot,
/// or a config record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum JournalRecord {
    Message(JournalMessage),
    Snapshot(Snapshot),
    Config(JournalConfig),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    Tool,
}

/// A single turn in the conversation, as persisted to the journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalMessage {
    pub uuid: String,

    #[serde(rename = "parentUuid")]
    pub parent_uuid: Option<String>,

    pub role: MessageRole,

    pub content: MessageContent,

    pub timestamp: DateTime<Utc>,
}

/// A message's content is either a plain string (the common case for user
/// turns) or a list of typed parts (assistant turns that invoke tools).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: Value,
    },
    ToolResult {
        #[serde(rename = "tool_use_id")]
        tool_use_id: String,
        #[serde(default)]
        content: Value,
    },
}

/// Engine configuration snapshotted at session start, so a reader that
/// rehydrates a journal without access to the live `EngineConfig` still
/// knows whether checkpoints were enabled for this session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct JournalConfig {
    pub checkpoints: bool,
}
