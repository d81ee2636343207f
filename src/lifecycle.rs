//! Lifecycle Binder (C6): wires tool calls and turn completion into the
//! File History component, for a host that owns the actual tool-execution
//! runtime.
//!
//! Grounded on `sage-core::agent::lifecycle::hooks::builtin::logging::LoggingHook`
//! for shape (a struct the host calls at fixed points, doing its own thing
//! and returning quietly) and `session::file_tracking` for the specific
//! pre-tool / post-turn split.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::history::Snapshot;
use crate::journal::{JournalMessage, JournalWriter, MessageContent, MessageRole};
use crate::manager::HistoryManager;

/// Whether the assistant turn that just finished actually completed. A
/// failed or cancelled turn must leave the pending backup set alone so a
/// retry can still snapshot it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Completed,
    Failed,
    Cancelled,
}

/// Binds the File History engine to a host's tool-execution and turn
/// lifecycle. The host calls `before_tool_use` immediately before running a
/// tool that may write to disk, and `after_turn` once an assistant turn has
/// finished.
pub struct RewindLifecycle {
    manager: Arc<HistoryManager>,
    config: EngineConfig,
}

impl RewindLifecycle {
    pub fn new(manager: Arc<HistoryManager>, config: EngineConfig) -> Self {
        Self { manager, config }
    }

    /// Track whatever file a tool is about to modify, if any.
    ///
    /// No-op when checkpoints are disabled, when `tool_name` is not a
    /// file-writer (`write` or `edit`), or when `tool_input` carries neither
    /// a `file_path` nor a `filePath` key.
    pub async fn before_tool_use(
        &self,
        session_id: &str,
        cwd: impl Into<PathBuf>,
        tool_name: &str,
        tool_input: &serde_json::Value,
    ) -> EngineResult<()> {
        if !self.config.checkpoints {
            return Ok(());
        }

        if !is_file_writer(tool_name) {
            return Ok(());
        }

        let Some(path) = extract_file_path(tool_input) else {
            return Ok(());
        };

        let cwd = cwd.into();
        let handle = self.manager.get_or_create(session_id, &cwd).await?;
        let mut history = handle.write().await;

        let absolute = cwd.join(&path);
        if fs::metadata(&absolute).await.is_ok() {
            history.track_file(&path).await;
        } else {
            history.track_new_file(&path);
        }

        Ok(())
    }

    /// Commit any pending backups into a snapshot for `message_id` and
    /// persist it to the journal.
    ///
    /// Returns `None` (and writes nothing) when checkpoints are disabled,
    /// the turn did not complete (`turn_outcome != Completed`, preserving
    /// the pending set for a retry), the last message in history is not an
    /// assistant message, no file was modified this turn, or a snapshot for
    /// this message already exists — the latter guards against a host that
    /// calls this twice for the same turn. A journal-append failure is
    /// logged, not propagated: the snapshot already lives in memory and the
    /// turn must not fail because of it.
    pub async fn after_turn(
        &self,
        session_id: &str,
        cwd: impl Into<PathBuf>,
        message_id: &str,
        turn_outcome: TurnOutcome,
        last_message_role: MessageRole,
    ) -> EngineResult<Option<Snapshot>> {
        if !self.config.checkpoints {
            return Ok(None);
        }

        if turn_outcome != TurnOutcome::Completed {
            return Ok(None);
        }

        if last_message_role != MessageRole::Assistant {
            return Ok(None);
        }

        let handle = self.manager.get_or_create(session_id, cwd).await?;
        let mut history = handle.write().await;

        if !history.has_pending_backups() || history.has_snapshot(message_id) {
            return Ok(None);
        }

        let snapshot = history.create_snapshot(message_id);
        if let Some(snapshot) = &snapshot {
            let writer = JournalWriter::new(self.config.session_journal_path(session_id));
            if let Err(e) = writer.append_snapshot(snapshot.clone()).await {
                tracing::warn!(
                    target: "checkpoint",
                    session_id,
                    message_id,
                    "failed to persist snapshot to journal: {e}"
                );
            }
        }

        Ok(snapshot)
    }

    /// Persist a conversation message to the session journal. The File
    /// History engine does not interpret message content; it only needs the
    /// journal to hold the full message stream so `journal::load` can
    /// rebuild active-path and tool-use state on resume.
    pub async fn append_message(
        &self,
        session_id: &str,
        uuid: impl Into<String>,
        parent_uuid: Option<String>,
        role: MessageRole,
        content: MessageContent,
    ) -> EngineResult<()> {
        let writer = JournalWriter::new(self.config.session_journal_path(session_id));
        writer
            .append_message(JournalMessage {
                uuid: uuid.into(),
                parent_uuid,
                role,
                content,
                timestamp: chrono::Utc::now(),
            })
            .await
    }
}

/// Whether `tool_name` names one of the two file-writing tools the binder
/// tracks ahead of (`write`, `edit`); everything else (shell, search,
/// read-only tools) is left untouched even if its input happens to carry a
/// `file_path`-shaped argument.
fn is_file_writer(tool_name: &str) -> bool {
    tool_name.eq_ignore_ascii_case("write") || tool_name.eq_ignore_ascii_case("edit")
}

/// Extract a `file_path` (or camelCase `filePath`) string argument from a
/// tool's JSON input, if present.
fn extract_file_path(tool_input: &serde_json::Value) -> Option<String> {
    tool_input
        .get("file_path")
        .or_else(|| tool_input.get("filePath"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}
