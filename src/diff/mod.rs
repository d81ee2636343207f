//! Line-granularity diff engine (C2)
//!
//! Computes insertion/deletion counts between a working file and a backup
//! blob (or the empty document, when the backup records non-existence).
//! Uses `similar`'s Myers-variant line diff rather than hand-rolling one —
//! Any correct line-diff implementation satisfies the contract here, so this
//! reaches for an off-the-shelf crate rather than hand-rolling Myers.

use similar::{ChangeTag, TextDiff};
use std::path::Path;
use tokio::fs;

/// Insertion/deletion line counts between two file states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffCounts {
    pub insertions: u32,
    pub deletions: u32,
}

impl DiffCounts {
    pub fn has_changes(&self) -> bool {
        self.insertions > 0 || self.deletions > 0
    }
}

/// Diff a working file against a backup blob, both addressed by absolute
/// path. Either side may be `None`, meaning "did not exist at this point".
///
/// Read errors on either side collapse to `(0, 0)` — the caller distinguishes
/// "no measurable change" from "not present" by consulting the snapshot's
/// tracked set directly, not this function's return value.
pub async fn diff_paths(working: Option<&Path>, backup: Option<&Path>) -> DiffCounts {
    let working_text = match working {
        Some(path) => match fs::read_to_string(path).await {
            Ok(text) => Some(text),
            Err(_) => return DiffCounts::default(),
        },
        None => None,
    };

    let backup_text = match backup {
        Some(path) => match fs::read_to_string(path).await {
            Ok(text) => Some(text),
            Err(_) => return DiffCounts::default(),
        },
        None => None,
    };

    diff_text(backup_text.as_deref().unwrap_or(""), working_text.as_deref().unwrap_or(""))
}

/// Diff two in-memory strings directly (old/backup vs new/working).
pub fn diff_text(old: &str, new: &str) -> DiffCounts {
    if old.is_empty() && new.is_empty() {
        return DiffCounts::default();
    }

    let diff = TextDiff::from_lines(old, new);
    let mut insertions = 0u32;
    let mut deletions = 0u32;

    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Insert => insertions += 1,
            ChangeTag::Delete => deletions += 1,
            ChangeTag::Equal => {}
        }
    }

    DiffCounts { insertions, deletions }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_empty_yields_zero() {
        let counts = diff_text("", "");
        assert_eq!(counts, DiffCounts::default());
    }

    #[test]
    fn backup_absent_counts_all_insertions() {
        let counts = diff_text("", "line one\nline two\n");
        assert_eq!(counts.insertions, 2);
        assert_eq!(counts.deletions, 0);
    }

    #[test]
    fn working_absent_counts_all_deletions() {
        let counts = diff_text("line one\nline two\n", "");
        assert_eq!(counts.insertions, 0);
        assert_eq!(counts.deletions, 2);
    }

    #[test]
    fn identical_text_has_no_changes() {
        let counts = diff_text("same\ntext\n", "same\ntext\n");
        assert!(!counts.has_changes());
    }

    #[test]
    fn single_line_change_counts_one_each() {
        let counts = diff_text("hello\n", "goodbye\n");
        assert_eq!(counts.insertions, 1);
        assert_eq!(counts.deletions, 1);
    }

    #[tokio::test]
    async fn diff_paths_missing_files_yields_zero() {
        let counts = diff_paths(None, None).await;
        assert_eq!(counts, DiffCounts::default());
    }
}
