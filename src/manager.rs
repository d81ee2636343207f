//! History Manager (C5): session-keyed registry of `FileHistory` instances.
//!
//! Grounded on `sage-core::session::session_cache::manager::SessionCache` —
//! an `Arc<RwLock<_>>`-guarded map the host looks up by key, lazily
//! populated from disk on first access.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::history::FileHistory;
use crate::journal;

/// Registry of `FileHistory` instances, one per active session.
///
/// Each session's history is wrapped in its own `Arc<RwLock<_>>` so callers
/// can hold a handle and lock it independently of the registry lock —
/// looking up a session never blocks on another session's I/O.
pub struct HistoryManager {
    config: EngineConfig,
    sessions: RwLock<HashMap<String, Arc<RwLock<FileHistory>>>>,
}

impl HistoryManager {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Mint a fresh session id for a host that doesn't already have one of
    /// its own (e.g. a new interactive session with no resumed state).
    pub fn generate_session_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Return the session's `FileHistory`, creating and rehydrating it from
    /// the journal on first access.
    pub async fn get_or_create(
        &self,
        session_id: &str,
        cwd: impl Into<PathBuf>,
    ) -> EngineResult<Arc<RwLock<FileHistory>>> {
        if let Some(existing) = self.sessions.read().await.get(session_id) {
            return Ok(existing.clone());
        }

        let mut sessions = self.sessions.write().await;
        if let Some(existing) = sessions.get(session_id) {
            return Ok(existing.clone());
        }

        let journal_path = self.config.session_journal_path(session_id);
        let seed_snapshots = match journal::load(&journal_path).await {
            Ok(loaded) => loaded.snapshots,
            Err(e) => {
                tracing::warn!(
                    target: "session",
                    session_id,
                    "failed to load journal, starting from a blank history: {e}"
                );
                Vec::new()
            }
        };
        let backup_dir = self.config.session_backup_dir(session_id);

        let history = FileHistory::new(cwd, session_id, backup_dir, seed_snapshots).await;
        let handle = Arc::new(RwLock::new(history));
        sessions.insert(session_id.to_string(), handle.clone());
        Ok(handle)
    }

    /// Install a pre-built `FileHistory` under `session_id`, replacing
    /// whatever was there.
    pub async fn set(&self, session_id: impl Into<String>, history: FileHistory) {
        self.sessions
            .write()
            .await
            .insert(session_id.into(), Arc::new(RwLock::new(history)));
    }

    pub async fn get(&self, session_id: &str) -> Option<Arc<RwLock<FileHistory>>> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Evict one session (`Some(session_id)`) or every session (`None`)
    /// from the cache. Leaves journals and backup blobs on disk.
    pub async fn clear(&self, session_id: Option<&str>) {
        match session_id {
            Some(id) => {
                self.sessions.write().await.remove(id);
            }
            None => {
                self.sessions.write().await.clear();
            }
        }
    }

    /// Evict every session. Called once, at the end of the owning
    /// workspace context's lifetime.
    pub async fn destroy(&self) {
        self.sessions.write().await.clear();
    }
}
