//! Cumulative rewind: `rewind_to_message` and `preview_rewind`.
//!
//! Grounded on `sage-core::checkpoints::restore` — same "walk the suffix,
//! keep the earliest reference per path, copy it back" shape, generalized
//! from checkpoint-manager's single-step undo to a cumulative multi-
//! snapshot suffix.

use std::collections::HashSet;
use std::path::Path;
use tokio::fs;

use crate::diff::diff_paths;
use crate::error::RewindError;
use crate::path_util::to_absolute;

use super::tracker::FileHistory;
use super::types::RewindOutcome;

impl FileHistory {
    fn snapshot_index(&self, message_id: &str) -> Result<usize, RewindError> {
        self.snapshots
            .iter()
            .position(|s| s.message_id == message_id)
            .ok_or_else(|| RewindError::snapshot_missing(message_id))
    }

    /// Paths affected by a rewind to `index`: the union of every path
    /// touched from `index` onward (cumulative) or within `index` alone
    /// (non-cumulative).
    ///
    /// Per spec.md §4.3 step 3a, the restore target for each affected path
    /// is looked up *only* in the target snapshot's own map
    /// (`snapshots[index].trackedFileBackups[relPath]`), never a later
    /// snapshot — a path touched after `index` but absent from `index`'s own
    /// map was not yet tracked at the rewind point, so it is deleted (or
    /// left alone), not rolled back to some later pre-state.
    fn affected_paths(&self, index: usize, cumulative: bool) -> HashSet<String> {
        let mut paths = HashSet::new();

        if cumulative {
            for snapshot in &self.snapshots[index..] {
                paths.extend(snapshot.tracked_file_backups.keys().cloned());
            }
        } else {
            paths.extend(self.snapshots[index].tracked_file_backups.keys().cloned());
        }

        paths
    }

    /// Rewind the working tree to the state immediately before `message_id`'s
    /// snapshot, reverting every modification recorded from that snapshot to
    /// the end of the list.
    ///
    /// Does not mutate the snapshot list — rewind is a pure working-tree
    /// operation, so calling this twice in a row without intermediate edits
    /// yields `filesChanged = []` the second time (the working tree already
    /// matches the target, so the diff sees no changes), not a
    /// `SnapshotMissing` error.
    pub async fn rewind_to_message(&mut self, message_id: &str) -> RewindOutcome {
        let index = match self.snapshot_index(message_id) {
            Ok(i) => i,
            Err(e) => return RewindOutcome::failure(e.to_string(), Vec::new(), 0, 0),
        };

        let paths = self.affected_paths(index, true);
        self.apply_restore(index, paths, true).await
    }

    /// Compute what a rewind to `message_id` would change without touching
    /// the working tree.
    ///
    /// `cumulative = true` mirrors `rewind_to_message`'s suffix union;
    /// `cumulative = false` diffs only the target snapshot's own recorded
    /// backups against the current working tree.
    pub async fn preview_rewind(&self, message_id: &str, cumulative: bool) -> RewindOutcome {
        let index = match self.snapshot_index(message_id) {
            Ok(i) => i,
            Err(e) => return RewindOutcome::failure(e.to_string(), Vec::new(), 0, 0),
        };

        let paths = self.affected_paths(index, cumulative);
        self.apply_restore(index, paths, false).await
    }

    /// Shared walk over affected paths: diff each path's current state
    /// against the reference recorded in `snapshots[index]`'s own map
    /// (`None` if the path isn't in that map at all), then (if `write`)
    /// perform the restore. Diffing happens before any write so counts
    /// reflect the change a restore would make, not the post-restore no-op.
    async fn apply_restore(&self, index: usize, affected: HashSet<String>, write: bool) -> RewindOutcome {
        let mut files_changed = Vec::new();
        let mut insertions = 0u32;
        let mut deletions = 0u32;
        let mut first_error: Option<String> = None;

        let mut paths: Vec<String> = affected.into_iter().collect();
        paths.sort();

        let target_backups = &self.snapshots[index].tracked_file_backups;

        for path in paths {
            let absolute = to_absolute(&self.cwd, &path);
            let target_name = target_backups.get(&path).and_then(|m| m.backup_file_name.as_deref());
            let backup_path = target_name.map(|name| self.store.blob_path(name));

            let working_ref = existing(&absolute).await;
            let counts = diff_paths(working_ref.as_deref(), backup_path.as_deref()).await;

            if counts.has_changes() {
                files_changed.push(path.clone());
            }
            insertions += counts.insertions;
            deletions += counts.deletions;

            if write {
                let result = match target_name {
                    Some(name) => self.store.copy_out(name, &absolute).await,
                    None => self.store.delete(&absolute).await,
                };
                if let Err(e) = result {
                    first_error.get_or_insert(e.to_string());
                }
            }
        }

        match first_error {
            None => RewindOutcome::success(files_changed, insertions, deletions),
            Some(e) => RewindOutcome::failure(e, files_changed, insertions, deletions),
        }
    }
}

async fn existing(path: &Path) -> Option<std::path::PathBuf> {
    if fs::metadata(path).await.is_ok() {
        Some(path.to_path_buf())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::fs;

    async fn write(path: &Path, content: &str) {
        fs::write(path, content).await.unwrap();
    }

    #[tokio::test]
    async fn rewind_to_unknown_message_fails_without_side_effects() {
        let dir = TempDir::new().unwrap();
        let mut history = FileHistory::new(dir.path(), "sess", dir.path().join("backups"), Vec::new()).await;
        let outcome = history.rewind_to_message("nope").await;
        assert!(!outcome.success);
        assert!(outcome.error.is_some());
    }

    #[tokio::test]
    async fn rewind_restores_single_snapshot_edit() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.txt");
        write(&file, "original\n").await;

        let mut history = FileHistory::new(dir.path(), "sess", dir.path().join("backups"), Vec::new()).await;
        history.track_file("a.txt").await;
        history.create_snapshot("m1");

        write(&file, "modified\n").await;

        let outcome = history.rewind_to_message("m1").await;
        assert!(outcome.success);
        assert_eq!(outcome.files_changed, vec!["a.txt".to_string()]);

        let content = fs::read_to_string(&file).await.unwrap();
        assert_eq!(content, "original\n");
        assert_eq!(history.snapshots().len(), 1);
    }

    #[tokio::test]
    async fn rewind_deletes_file_created_after_the_rewind_point() {
        let dir = TempDir::new().unwrap();
        let mut history = FileHistory::new(dir.path(), "sess", dir.path().join("backups"), Vec::new()).await;

        history.track_new_file("new.txt");
        history.create_snapshot("m1");

        let file = dir.path().join("new.txt");
        write(&file, "created after snapshot\n").await;

        let outcome = history.rewind_to_message("m1").await;
        assert!(outcome.success);
        assert!(!file.exists());
    }

    #[tokio::test]
    async fn cumulative_rewind_unions_paths_across_suffix() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        write(&a, "a1\n").await;
        write(&b, "b1\n").await;

        let mut history = FileHistory::new(dir.path(), "sess", dir.path().join("backups"), Vec::new()).await;
        history.track_file("a.txt").await;
        history.track_file("b.txt").await;
        history.create_snapshot("m1");

        write(&a, "a2\n").await;
        history.track_file("a.txt").await;
        write(&b, "b2\n").await;
        history.track_file("b.txt").await;
        history.create_snapshot("m2");

        write(&a, "a3\n").await;
        write(&b, "b3\n").await;

        let outcome = history.rewind_to_message("m1").await;
        assert!(outcome.success);
        assert_eq!(fs::read_to_string(&a).await.unwrap(), "a1\n");
        assert_eq!(fs::read_to_string(&b).await.unwrap(), "b1\n");
    }

    /// spec.md §4.3 step 3a: the restore target for an affected path is
    /// looked up only in the *target* snapshot's own map, never a later
    /// one. P is backed up at m1, left untouched at m2, then backed up
    /// again at m3; rewinding to m2 must delete P (absent from m2's own
    /// map), not roll it back to its m3 pre-state.
    #[tokio::test]
    async fn rewind_deletes_path_absent_from_target_snapshot_even_if_present_later() {
        let dir = TempDir::new().unwrap();
        let p = dir.path().join("p.txt");
        let q = dir.path().join("q.txt");
        write(&p, "p-at-m1\n").await;
        write(&q, "q1\n").await;

        let mut history = FileHistory::new(dir.path(), "sess", dir.path().join("backups"), Vec::new()).await;

        // Turn 1: only p.txt is touched; its pre-turn content becomes m1's backup.
        history.track_file("p.txt").await;
        history.create_snapshot("m1");

        // Turn 2: only q.txt is touched; p.txt is absent from m2's map entirely.
        history.track_file("q.txt").await;
        write(&q, "q2\n").await;
        history.create_snapshot("m2");

        // Turn 3: p.txt is touched again, so a *later* snapshot does record it.
        history.track_file("p.txt").await;
        write(&p, "p-at-m3\n").await;
        history.create_snapshot("m3");

        write(&p, "p-after-m3\n").await;

        let outcome = history.rewind_to_message("m2").await;
        assert!(outcome.success);
        assert!(!p.exists());
        assert_eq!(fs::read_to_string(&q).await.unwrap(), "q1\n");
    }

    #[tokio::test]
    async fn preview_rewind_does_not_touch_disk() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.txt");
        write(&file, "original\n").await;

        let mut history = FileHistory::new(dir.path(), "sess", dir.path().join("backups"), Vec::new()).await;
        history.track_file("a.txt").await;
        history.create_snapshot("m1");
        write(&file, "modified\n").await;

        let outcome = history.preview_rewind("m1", true).await;
        assert!(outcome.success);
        assert_eq!(outcome.files_changed, vec!["a.txt".to_string()]);
        assert_eq!(fs::read_to_string(&file).await.unwrap(), "modified\n");
        assert_eq!(history.snapshots().len(), 1);
    }

    #[tokio::test]
    async fn double_rewind_to_same_message_is_a_no_op_second_time() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.txt");
        write(&file, "original\n").await;

        let mut history = FileHistory::new(dir.path(), "sess", dir.path().join("backups"), Vec::new()).await;
        history.track_file("a.txt").await;
        history.create_snapshot("m1");
        write(&file, "modified\n").await;

        let first = history.rewind_to_message("m1").await;
        assert!(first.success);
        assert_eq!(first.files_changed, vec!["a.txt".to_string()]);

        let second = history.rewind_to_message("m1").await;
        assert!(second.success);
        assert_eq!(second.files_changed, Vec::<String>::new());
    }

    #[tokio::test]
    async fn non_cumulative_preview_diffs_only_target_snapshot() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        write(&a, "a1\n").await;
        write(&b, "b1\n").await;

        let mut history = FileHistory::new(dir.path(), "sess", dir.path().join("backups"), Vec::new()).await;
        history.track_file("a.txt").await;
        history.create_snapshot("m1");

        write(&b, "b2\n").await;
        history.track_file("b.txt").await;
        history.create_snapshot("m2");

        let outcome = history.preview_rewind("m1", false).await;
        assert_eq!(outcome.files_changed, Vec::<String>::new());
    }
}
