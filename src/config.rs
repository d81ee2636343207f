//! Engine configuration
//!
//! Recognized options per the external interface table: `checkpoints`
//! (master switch for the Lifecycle Binder) and `backupRoot` (root of
//! backup storage).

use std::path::PathBuf;

/// Product name used to derive the default backup root
/// (`<home>/.<productName>/file-history`).
const DEFAULT_PRODUCT_NAME: &str = "rewind-engine";

/// Engine-wide configuration, analogous to `sage-core`'s
/// `CheckpointManagerConfig`.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Master switch for the Lifecycle Binder. When `false`, no tracking or
    /// snapshot creation is performed.
    pub checkpoints: bool,

    /// Root of backup storage. Defaults to `<home>/.<productName>/file-history`.
    pub backup_root: PathBuf,

    /// Root directory session journals are written under.
    pub session_log_root: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        let product_dir = home.join(format!(".{DEFAULT_PRODUCT_NAME}"));
        Self {
            checkpoints: true,
            backup_root: product_dir.join("file-history"),
            session_log_root: product_dir.join("sessions"),
        }
    }
}

impl EngineConfig {
    /// Disable the master checkpoints switch.
    pub fn without_checkpoints(mut self) -> Self {
        self.checkpoints = false;
        self
    }

    /// Override the backup root.
    pub fn with_backup_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.backup_root = path.into();
        self
    }

    /// Override the session journal root.
    pub fn with_session_log_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_log_root = path.into();
        self
    }

    /// Backup directory for a specific session: `<backupRoot>/<sessionId>`.
    pub fn session_backup_dir(&self, session_id: &str) -> PathBuf {
        self.backup_root.join(session_id)
    }

    /// Journal path for a specific session: `<sessionLogRoot>/<sessionId>.jsonl`.
    pub fn session_journal_path(&self, session_id: &str) -> PathBuf {
        self.session_log_root.join(format!("{session_id}.jsonl"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_checkpoints_enabled() {
        assert!(EngineConfig::default().checkpoints);
    }

    #[test]
    fn without_checkpoints_disables() {
        let config = EngineConfig::default().without_checkpoints();
        assert!(!config.checkpoints);
    }

    #[test]
    fn session_paths_are_scoped() {
        let config = EngineConfig::default().with_backup_root("/tmp/backups");
        assert_eq!(
            config.session_backup_dir("abc"),
            PathBuf::from("/tmp/backups/abc")
        );
    }
}
