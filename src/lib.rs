//! File History & Rewind Engine
//!
//! Tracks file modifications made during an AI coding assistant's turns,
//! backs up pre-modification content to a content-addressed store, and can
//! cumulatively rewind the working tree back to the state before any given
//! turn. See the individual modules for the six components:
//!
//! - [`backup`]   — C1: content-addressed backup store
//! - [`diff`]     — C2: line-granularity diff engine
//! - [`history`]  — C3: per-session tracking, snapshotting, rewind
//! - [`journal`]  — C4: append-only session journal
//! - [`manager`]  — C5: session-keyed `FileHistory` registry
//! - [`lifecycle`]: C6: binds tool calls and turn completion to the rest

pub mod backup;
pub mod config;
pub mod diff;
pub mod error;
pub mod history;
pub mod journal;
pub mod lifecycle;
pub mod manager;
mod path_util;

pub use config::EngineConfig;
pub use error::{EngineResult, RewindError};
pub use history::{FileBackupMeta, FileHistory, RewindOutcome, Snapshot, SnapshotPreview};
pub use lifecycle::{RewindLifecycle, TurnOutcome};
pub use manager::HistoryManager;
