//! Journal reader: tolerant line parsing, active-path filtering, and
//! tool-use cleanup.
//!
//! Grounded on `sage-core::session::jsonl_storage::storage::read_ops`
//! (line-by-line parse with per-line error tolerance) and
//! `branching::tree::get_ancestry` (walk a parent-linked chain back to its
//! root, then reverse for chronological order).

use std::collections::{HashMap, HashSet};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::error::EngineResult;
use crate::history::Snapshot;

use super::types::{ContentPart, JournalConfig, JournalMessage, JournalRecord, MessageContent};

/// Everything rehydrated from one session's journal, after active-path
/// filtering and tool-use cleanup have been applied to the message list.
#[derive(Debug, Clone, Default)]
pub struct LoadedSession {
    pub messages: Vec<JournalMessage>,
    pub snapshots: Vec<Snapshot>,
    pub config: Option<JournalConfig>,
}

/// Parse and rehydrate a session journal.
///
/// A missing file yields an empty `LoadedSession` rather than an error — a
/// brand-new session has no journal yet. Lines that fail to parse are
/// logged and skipped; this tolerates a trailing partial line left by a
/// process that crashed mid-write, since `serde_json::from_str` simply
/// rejects the truncated JSON rather than panicking.
pub async fn load(path: &Path) -> EngineResult<LoadedSession> {
    if tokio::fs::metadata(path).await.is_err() {
        return Ok(LoadedSession::default());
    }

    let file = File::open(path)
        .await
        .map_err(|e| crate::error::RewindError::io_at(format!("failed to open journal: {e}"), path))?;

    let reader = BufReader::new(file);
    let mut lines = reader.lines();

    let mut messages = Vec::new();
    let mut snapshots = Vec::new();
    let mut config = None;

    loop {
        let line = lines
            .next_line()
            .await
            .map_err(|e| crate::error::RewindError::io_at(format!("failed to read journal line: {e}"), path))?;
        let Some(line) = line else { break };

        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<JournalRecord>(&line) {
            Ok(JournalRecord::Message(m)) => messages.push(m),
            Ok(JournalRecord::Snapshot(s)) => snapshots.push(s),
            Ok(JournalRecord::Config(c)) => config = Some(c),
            Err(e) => {
                tracing::warn!(
                    target: "checkpoint",
                    "skipping malformed journal line in {}: {e}",
                    path.display()
                );
            }
        }
    }

    let messages = active_path(messages);
    let messages = drop_unmatched_tool_use(messages);

    Ok(LoadedSession { messages, snapshots, config })
}

/// Keep only the linear path from the most recently appended message back
/// to its root, discarding any off-path branches left by earlier forks
/// (e.g. from a prior rewind that re-created history from a point in the
/// middle of the tree).
fn active_path(messages: Vec<JournalMessage>) -> Vec<JournalMessage> {
    let Some(tip) = messages.last().map(|m| m.uuid.clone()) else {
        return Vec::new();
    };

    let by_uuid: HashMap<&str, &JournalMessage> = messages.iter().map(|m| (m.uuid.as_str(), m)).collect();

    let mut path = Vec::new();
    let mut current = Some(tip.as_str());
    while let Some(uuid) = current {
        let Some(message) = by_uuid.get(uuid) else { break };
        path.push((*message).clone());
        current = message.parent_uuid.as_deref();
    }

    path.reverse();
    path
}

/// Drop assistant messages that invoke a tool whose result never arrived —
/// e.g. the process was killed between the tool-use record and its result.
/// Replaying such a message would leave the conversation waiting on a tool
/// call nothing will ever answer.
fn drop_unmatched_tool_use(messages: Vec<JournalMessage>) -> Vec<JournalMessage> {
    let mut satisfied_tool_use_ids: HashSet<&str> = HashSet::new();
    for message in &messages {
        if let MessageContent::Parts(parts) = &message.content {
            for part in parts {
                if let ContentPart::ToolResult { tool_use_id, .. } = part {
                    satisfied_tool_use_ids.insert(tool_use_id.as_str());
                }
            }
        }
    }

    messages
        .into_iter()
        .filter(|message| match &message.content {
            MessageContent::Parts(parts) => parts.iter().all(|part| match part {
                ContentPart::ToolUse { id, .. } => satisfied_tool_use_ids.contains(id.as_str()),
                _ => true,
            }),
            MessageContent::Text(_) => true,
        })
        .collect()
}
