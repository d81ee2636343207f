//! Wire types for the file history / snapshot data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-path backup metadata recorded in a snapshot.
///
/// Invariant: for any `(path, version)`, if `backup_file_name` is `Some`,
/// the corresponding blob exists in the backup store under that name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileBackupMeta {
    /// Stable filename inside the session's backup directory, or `None`
    /// meaning "this path did not exist at this snapshot".
    #[serde(rename = "backupFileName")]
    pub backup_file_name: Option<String>,

    /// Strictly increasing per tracked path; starts at 1.
    pub version: u32,

    /// Wall-clock timestamp of the backup operation.
    #[serde(rename = "backupTime")]
    pub backup_time: DateTime<Utc>,
}

/// A snapshot produced by one completed assistant turn.
///
/// Contains only paths modified during that turn; paths unchanged since the
/// prior snapshot are implicitly carried over by whichever earlier snapshot
/// last recorded them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "messageId")]
    pub message_id: String,

    pub timestamp: DateTime<Utc>,

    #[serde(rename = "trackedFileBackups")]
    pub tracked_file_backups: HashMap<String, FileBackupMeta>,
}

/// Per-snapshot summary for UI consumption (`getSnapshotPreviews`).
///
/// Insertion/deletion counts are intentionally absent here — line deltas are
/// computed on demand by `rewind`/`preview_rewind`, not precomputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotPreview {
    #[serde(rename = "messageId")]
    pub message_id: String,

    pub timestamp: DateTime<Utc>,

    #[serde(rename = "fileCount")]
    pub file_count: usize,

    /// Number of paths whose `backup_file_name` differs from the prior
    /// snapshot's. `None` for the first snapshot in the list.
    #[serde(rename = "changeCount")]
    pub change_count: Option<usize>,
}

/// Outcome of a rewind or preview-rewind operation.
///
/// On failure, `filesChanged`/`insertions`/`deletions` retain whatever
/// partial progress was made before the error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewindOutcome {
    pub success: bool,

    #[serde(rename = "filesChanged")]
    pub files_changed: Vec<String>,

    pub insertions: u32,
    pub deletions: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RewindOutcome {
    pub fn success(files_changed: Vec<String>, insertions: u32, deletions: u32) -> Self {
        Self {
            success: true,
            files_changed,
            insertions,
            deletions,
            error: None,
        }
    }

    pub fn failure(
        error: impl Into<String>,
        files_changed: Vec<String>,
        insertions: u32,
        deletions: u32,
    ) -> Self {
        Self {
            success: false,
            files_changed,
            insertions,
            deletions,
            error: Some(error.into()),
        }
    }
}
