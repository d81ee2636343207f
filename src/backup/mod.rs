//! Content-addressed backup store (C1)
//!
//! Persists byte-identical copies of tracked files under
//! `<backupRoot>/<sessionId>/<backupFileName>`, preserving POSIX mode bits
//! and modification time so the history tracker can use file metadata as a
//! fast-path change check.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{RewindError, EngineResult};

/// Metadata and byte size of a backup blob, as reported by `stat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackupStat {
    pub size: u64,
    pub mtime_secs: u64,
}

/// Derive the stable backup filename for a (relative path, version) pair.
///
/// `hex(sha256(relativePath))[0..16] + "@v" + version`. Deterministic and
/// computed from the path only, never from file content — two sessions
/// tracking the same relative path independently get the same prefix, which
/// is fine because backups live under a session-scoped directory.
pub fn backup_file_name(relative_path: &str, version: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(relative_path.as_bytes());
    let digest = hasher.finalize();
    let hex = digest.iter().map(|b| format!("{b:02x}")).collect::<String>();
    format!("{}@v{}", &hex[..16], version)
}

/// Passive filesystem subtree shared by a session's reader/writer, scoped
/// to one `<backupRoot>/<sessionId>/` directory.
pub struct BackupStore {
    session_dir: PathBuf,
}

impl BackupStore {
    pub fn new(session_dir: impl Into<PathBuf>) -> Self {
        Self {
            session_dir: session_dir.into(),
        }
    }

    pub fn session_dir(&self) -> &Path {
        &self.session_dir
    }

    async fn ensure_dir(&self) -> EngineResult<()> {
        fs::create_dir_all(&self.session_dir).await.map_err(|e| {
            RewindError::io_at(
                format!("failed to create backup directory: {e}"),
                &self.session_dir,
            )
        })
    }

    /// Copy `absolute_path`'s current bytes (and mode/mtime) into the store
    /// under `backup_file_name(relative_path, version)`.
    ///
    /// If the source file is absent, returns `None` — the caller records
    /// this as "did not exist at this snapshot" without touching disk.
    ///
    /// A symlink is backed up as a symlink (same target), not dereferenced
    /// into a copy of whatever it points to — otherwise the tracked path's
    /// identity as a link is lost and `copy_out` would materialize a plain
    /// file in its place.
    pub async fn copy_in(
        &self,
        absolute_path: &Path,
        relative_path: &str,
        version: u32,
    ) -> EngineResult<Option<String>> {
        let link_metadata = match fs::symlink_metadata(absolute_path).await {
            Ok(m) => m,
            Err(_) => return Ok(None),
        };

        self.ensure_dir().await?;

        let name = backup_file_name(relative_path, version);
        let dest = self.session_dir.join(&name);

        if link_metadata.file_type().is_symlink() {
            let target = fs::read_link(absolute_path).await.map_err(|e| {
                RewindError::tracking(format!("failed to read symlink target: {e}"), absolute_path)
            })?;
            create_symlink(&target, &dest).await.map_err(|e| {
                RewindError::tracking(format!("failed to create backup symlink: {e}"), absolute_path)
            })?;
            return Ok(Some(name));
        }

        fs::copy(absolute_path, &dest).await.map_err(|e| {
            RewindError::tracking(format!("failed to copy file into backup store: {e}"), absolute_path)
        })?;

        let metadata = fs::metadata(absolute_path).await.map_err(|e| {
            RewindError::tracking(format!("failed to stat source file: {e}"), absolute_path)
        })?;

        fs::set_permissions(&dest, metadata.permissions())
            .await
            .map_err(|e| RewindError::tracking(format!("failed to set backup mode bits: {e}"), &dest))?;

        set_mtime(&dest, &metadata).await?;

        Ok(Some(name))
    }

    /// Restore a backup blob onto `target_absolute_path`, creating missing
    /// parent directories. Mode bits are restored best-effort.
    ///
    /// If the backup blob is itself a symlink, restores a symlink to the
    /// same target rather than copying whatever the link points to.
    pub async fn copy_out(&self, backup_file_name: &str, target_absolute_path: &Path) -> EngineResult<()> {
        let src = self.session_dir.join(backup_file_name);

        if let Some(parent) = target_absolute_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                RewindError::restore(format!("failed to create parent directory: {e}"), parent)
            })?;
        }

        let src_is_symlink = fs::symlink_metadata(&src)
            .await
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false);

        if src_is_symlink {
            let target = fs::read_link(&src).await.map_err(|e| {
                RewindError::restore(format!("failed to read backup symlink target: {e}"), &src)
            })?;
            let _ = fs::remove_file(target_absolute_path).await;
            create_symlink(&target, target_absolute_path).await.map_err(|e| {
                RewindError::restore(format!("failed to restore backup symlink: {e}"), target_absolute_path)
            })?;
            return Ok(());
        }

        fs::copy(&src, target_absolute_path).await.map_err(|e| {
            RewindError::restore(format!("failed to restore backup blob: {e}"), target_absolute_path)
        })?;

        if let Ok(metadata) = fs::metadata(&src).await {
            let _ = fs::set_permissions(target_absolute_path, metadata.permissions()).await;
        }

        Ok(())
    }

    /// Remove `target_absolute_path` if it exists (used to restore a
    /// "not-existed" state).
    pub async fn delete(&self, target_absolute_path: &Path) -> EngineResult<()> {
        match fs::remove_file(target_absolute_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RewindError::restore(
                format!("failed to delete file: {e}"),
                target_absolute_path,
            )),
        }
    }

    /// Size and mtime of a backup blob, or `None` if it is gone.
    pub async fn stat(&self, backup_file_name: &str) -> Option<BackupStat> {
        let path = self.session_dir.join(backup_file_name);
        let metadata = fs::metadata(&path).await.ok()?;
        let mtime_secs = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Some(BackupStat {
            size: metadata.len(),
            mtime_secs,
        })
    }

    /// Absolute path of a backup blob, for the diff engine to read.
    pub fn blob_path(&self, backup_file_name: &str) -> PathBuf {
        self.session_dir.join(backup_file_name)
    }
}

#[cfg(unix)]
async fn set_mtime(dest: &Path, source_metadata: &std::fs::Metadata) -> EngineResult<()> {
    use std::os::unix::fs::MetadataExt;
    let mtime = libc::timeval {
        tv_sec: source_metadata.mtime(),
        tv_usec: 0,
    };
    let times = [mtime, mtime];
    let dest = dest.to_path_buf();
    let c_path = std::ffi::CString::new(dest.as_os_str().as_encoded_bytes())
        .map_err(|e| RewindError::tracking(format!("invalid backup path: {e}"), &dest))?;
    let rc = unsafe { libc::utimes(c_path.as_ptr(), times.as_ptr()) };
    if rc != 0 {
        return Err(RewindError::tracking(
            format!("failed to set backup mtime: {}", std::io::Error::last_os_error()),
            &dest,
        ));
    }
    Ok(())
}

#[cfg(not(unix))]
async fn set_mtime(_dest: &Path, _source_metadata: &std::fs::Metadata) -> EngineResult<()> {
    Ok(())
}

/// Create a symlink at `dest` pointing at `target`, used to back up and
/// restore a tracked path that is itself a symlink rather than a regular
/// file.
#[cfg(unix)]
async fn create_symlink(target: &Path, dest: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, dest)
}

/// Non-Unix platforms split symlink creation into `symlink_file`/
/// `symlink_dir`, and this crate's other platform-specific bits (mode bits,
/// mtime) are already Unix-only, so symlink backup/restore is left
/// unsupported there rather than guessing which call applies.
#[cfg(not(unix))]
async fn create_symlink(_target: &Path, _dest: &Path) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "symlink backups are not supported on this platform",
    ))
}
