//! Error types for the rewind engine
//!
//! Mirrors the shape of a typical agent-core error enum: one variant per
//! failure origin, each carrying a human-readable message and, where it
//! helps diagnosis, the path involved.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias used throughout the crate.
///
/// Named `EngineResult` rather than `RewindResult` so it doesn't read like
/// the `RewindOutcome` struct the `history` module returns from
/// `rewind_to_message` / `preview_rewind` — that struct reports partial
/// success with structured fields rather than propagating via `?`.
pub type EngineResult<T> = Result<T, RewindError>;

/// Errors the engine can surface to a caller.
///
/// Most engine operations swallow their own errors (tracking and
/// persistence failures are logged, not propagated); this enum exists for
/// the operations that *do* have a natural error channel: restoring a
/// backup blob, and rewinding to an unknown snapshot.
#[derive(Error, Debug, Clone)]
pub enum RewindError {
    /// Filesystem I/O failure
    #[error("I/O error: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
    },

    /// Failure while backing up a tracked file
    #[error("Tracking failure: {message}")]
    Tracking {
        message: String,
        path: Option<PathBuf>,
    },

    /// Failure while appending to the session journal
    #[error("Persistence failure: {message}")]
    Persistence { message: String },

    /// `rewindToMessage` / `previewRewind` given an unknown messageId
    #[error("Snapshot not found: {message_id}")]
    SnapshotMissing { message_id: String },

    /// Failure while restoring a backup blob onto the working tree
    #[error("Restore failure: {message}")]
    Restore {
        message: String,
        path: Option<PathBuf>,
    },

    /// A journal line could not be parsed
    #[error("Malformed journal line: {message}")]
    ReaderCorruption { message: String },
}

impl RewindError {
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            path: None,
        }
    }

    pub fn io_at(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::Io {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    pub fn tracking(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::Tracking {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    pub fn snapshot_missing(message_id: impl Into<String>) -> Self {
        Self::SnapshotMissing {
            message_id: message_id.into(),
        }
    }

    pub fn restore(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::Restore {
            message: message.into(),
            path: Some(path.into()),
        }
    }
}
