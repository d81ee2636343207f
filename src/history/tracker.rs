//! File History (C3): per-session tracking, snapshot creation, and preview.
//!
//! Grounded on `sage-core::session::file_tracker::FileSnapshotTracker`'s
//! track/snapshot lifecycle, generalized from a single in-flight undo buffer
//! into an ordered snapshot list.

use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::backup::BackupStore;
use crate::path_util::{normalize_relative, to_absolute};

use super::types::{FileBackupMeta, Snapshot, SnapshotPreview};

/// The state machine for a single session's tracking, snapshotting, and
/// rewind (rewind lives in `super::rewind`, implemented on this type).
pub struct FileHistory {
    pub(crate) cwd: PathBuf,
    pub(crate) session_id: String,
    pub(crate) store: BackupStore,
    pub(crate) snapshots: Vec<Snapshot>,
    tracked_files: HashSet<String>,
    pending_backups: HashMap<String, FileBackupMeta>,
}

impl FileHistory {
    /// Construct a File History, optionally seeded with prior snapshots
    /// (e.g. rehydrated from the session journal). Rebuilds `tracked_files`
    /// as the union of paths across the seed snapshots and ensures the
    /// backup directory exists.
    pub async fn new(
        cwd: impl Into<PathBuf>,
        session_id: impl Into<String>,
        backup_dir: impl Into<PathBuf>,
        seed_snapshots: Vec<Snapshot>,
    ) -> Self {
        let store = BackupStore::new(backup_dir);
        if let Err(e) = fs::create_dir_all(store.session_dir()).await {
            tracing::warn!(target: "checkpoint", "failed to create backup directory: {e}");
        }

        let mut tracked_files = HashSet::new();
        for snapshot in &seed_snapshots {
            for path in snapshot.tracked_file_backups.keys() {
                tracked_files.insert(path.clone());
            }
        }

        Self {
            cwd: cwd.into(),
            session_id: session_id.into(),
            store,
            snapshots: seed_snapshots,
            tracked_files,
            pending_backups: HashMap::new(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn tracked_files(&self) -> impl Iterator<Item = &str> {
        self.tracked_files.iter().map(String::as_str)
    }

    /// Latest backup meta recorded for `relative_path` across the snapshot
    /// list, searched from the most recent snapshot backward.
    fn latest_backup(&self, relative_path: &str) -> Option<&FileBackupMeta> {
        self.snapshots
            .iter()
            .rev()
            .find_map(|s| s.tracked_file_backups.get(relative_path))
    }

    /// Record intent to snapshot `path`'s current state before an imminent
    /// modification. Never fails the caller's tool invocation: I/O errors
    /// are logged and swallowed, leaving no pending entry for this path.
    pub async fn track_file(&mut self, path: impl AsRef<Path>) {
        let relative = normalize_relative(&self.cwd, path.as_ref());
        self.tracked_files.insert(relative.clone());

        let absolute = to_absolute(&self.cwd, &relative);
        let reference = self.latest_backup(&relative).cloned();

        if !self.has_changed_since(&absolute, reference.as_ref()).await {
            return;
        }

        let version = reference.as_ref().map(|m| m.version + 1).unwrap_or(1);

        match self.store.copy_in(&absolute, &relative, version).await {
            Ok(backup_file_name) => {
                self.pending_backups.insert(
                    relative,
                    FileBackupMeta {
                        backup_file_name,
                        version,
                        backup_time: Utc::now(),
                    },
                );
            }
            Err(e) => {
                tracing::warn!(target: "checkpoint", path = %absolute.display(), "tracking failed: {e}");
            }
        }
    }

    /// Metadata fast-path change check: file present + backup present +
    /// equal size + equal mtime ⇒ unchanged. Mismatched presence ⇒ changed.
    /// Neither present ⇒ unchanged.
    async fn has_changed_since(&self, absolute_path: &Path, reference: Option<&FileBackupMeta>) -> bool {
        let file_metadata = fs::metadata(absolute_path).await.ok();

        let backup_stat = match reference.and_then(|m| m.backup_file_name.as_deref()) {
            Some(name) => self.store.stat(name).await,
            None => None,
        };

        match (file_metadata, backup_stat) {
            (None, None) => false,
            (None, Some(_)) => true,
            (Some(_), None) => true,
            (Some(file), Some(backup)) => {
                let file_mtime = file
                    .modified()
                    .ok()
                    .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                    .map(|d| d.as_secs())
                    .unwrap_or(0);
                file.len() != backup.size || file_mtime != backup.mtime_secs
            }
        }
    }

    /// Record a file that is about to be created. No I/O on the working
    /// file; the pending entry records `backup_file_name = None`.
    pub fn track_new_file(&mut self, path: impl AsRef<Path>) {
        let relative = normalize_relative(&self.cwd, path.as_ref());
        self.tracked_files.insert(relative.clone());

        let version = self.latest_backup(&relative).map(|m| m.version + 1).unwrap_or(1);

        self.pending_backups.insert(
            relative,
            FileBackupMeta {
                backup_file_name: None,
                version,
                backup_time: Utc::now(),
            },
        );
    }

    pub fn has_pending_backups(&self) -> bool {
        !self.pending_backups.is_empty()
    }

    pub fn has_snapshot(&self, message_id: &str) -> bool {
        self.snapshots.iter().any(|s| s.message_id == message_id)
    }

    /// Create a snapshot from the current pending backups, keyed to
    /// `message_id`. Returns `None` (and writes nothing) if there are no
    /// pending backups to commit.
    pub fn create_snapshot(&mut self, message_id: impl Into<String>) -> Option<Snapshot> {
        if self.pending_backups.is_empty() {
            return None;
        }

        let snapshot = Snapshot {
            message_id: message_id.into(),
            timestamp: Utc::now(),
            tracked_file_backups: std::mem::take(&mut self.pending_backups),
        };

        self.snapshots.push(snapshot.clone());
        Some(snapshot)
    }

    /// Per-snapshot summary for UI display.
    pub fn snapshot_previews(&self) -> Vec<SnapshotPreview> {
        let mut previews = Vec::with_capacity(self.snapshots.len());

        for (index, snapshot) in self.snapshots.iter().enumerate() {
            let change_count = if index == 0 {
                None
            } else {
                let prior = &self.snapshots[index - 1];
                Some(changed_path_count(&prior.tracked_file_backups, &snapshot.tracked_file_backups))
            };

            previews.push(SnapshotPreview {
                message_id: snapshot.message_id.clone(),
                timestamp: snapshot.timestamp,
                file_count: snapshot.tracked_file_backups.len(),
                change_count,
            });
        }

        previews
    }
}

/// Number of paths whose `backup_file_name` differs between two tracked-file
/// maps; a path present in only one of the two counts as changed.
fn changed_path_count(
    prior: &HashMap<String, FileBackupMeta>,
    current: &HashMap<String, FileBackupMeta>,
) -> usize {
    let mut paths: HashSet<&str> = HashSet::new();
    paths.extend(prior.keys().map(String::as_str));
    paths.extend(current.keys().map(String::as_str));

    paths
        .into_iter()
        .filter(|p| {
            prior.get(*p).map(|m| &m.backup_file_name) != current.get(*p).map(|m| &m.backup_file_name)
        })
        .count()
}
