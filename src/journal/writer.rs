//! Append-only writer for the session journal.
//!
//! Grounded on `sage-core::session::jsonl_storage::storage::write_ops` —
//! open-append-write-newline, one record per call, no batching.

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::error::{EngineResult, RewindError};
use crate::history::Snapshot;

use super::types::{JournalConfig, JournalMessage, JournalRecord};

/// Handle to a single session's journal file. Cheap to construct; holds no
/// open file descriptor between calls.
pub struct JournalWriter {
    path: std::path::PathBuf,
}

impl JournalWriter {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    async fn append_line(&self, record: &JournalRecord) -> EngineResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RewindError::persistence(format!("failed to create journal directory: {e}")))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| RewindError::persistence(format!("failed to open journal: {e}")))?;

        let mut line = serde_json::to_string(record)
            .map_err(|e| RewindError::persistence(format!("failed to serialize journal record: {e}")))?;
        line.push('\n');

        file.write_all(line.as_bytes())
            .await
            .map_err(|e| RewindError::persistence(format!("failed to append journal record: {e}")))?;

        Ok(())
    }

    pub async fn append_message(&self, message: JournalMessage) -> EngineResult<()> {
        self.append_line(&JournalRecord::Message(message)).await
    }

    pub async fn append_snapshot(&self, snapshot: Snapshot) -> EngineResult<()> {
        self.append_line(&JournalRecord::Snapshot(snapshot)).await
    }

    pub async fn append_config(&self, config: JournalConfig) -> EngineResult<()> {
        self.append_line(&JournalRecord::Config(config)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn sample_message(uuid: &str, parent: Option<&str>) -> JournalMessage {
        JournalMessage {
            uuid: uuid.to_string(),
            parent_uuid: parent.map(str::to_string),
            role: super::super::types::MessageRole::User,
            content: super::super::types::MessageContent::Text("hello".into()),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn append_message_creates_journal_and_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/session.jsonl");
        let writer = JournalWriter::new(&path);
        writer.append_message(sample_message("m1", None)).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn append_message_appends_not_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.jsonl");
        let writer = JournalWriter::new(&path);
        writer.append_message(sample_message("m1", None)).await.unwrap();
        writer.append_message(sample_message("m2", Some("m1"))).await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(content.lines().count(), 2);
    }
}
