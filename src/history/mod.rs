//! File History component (C3): per-session tracking, snapshotting, and
//! cumulative rewind over a content-addressed backup store.

mod rewind;
mod tracker;
mod types;

pub use tracker::FileHistory;
pub use types::{FileBackupMeta, RewindOutcome, Snapshot, SnapshotPreview};
