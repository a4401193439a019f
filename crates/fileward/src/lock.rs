//! Single-instance pass locking.
//!
//! Two passes over the same quarantine directory must not interleave. A pass
//! holds an exclusive `fs2` lock on `<quarantine_dir>.lock` for its whole
//! duration; a second invocation fails fast with `PassLocked`.

use chrono::Utc;
use fs2::FileExt;
use serde::Serialize;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{CleanerError, Result};

/// Held for the duration of a pass. Dropping it releases the lock.
pub struct PassLock {
    _file: File,
    lock_path: PathBuf,
    sidecar_path: Option<PathBuf>,
}

impl PassLock {
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }
}

impl std::fmt::Debug for PassLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassLock")
            .field("lock_path", &self.lock_path)
            .finish()
    }
}

impl Drop for PassLock {
    fn drop(&mut self) {
        debug!(path = %self.lock_path.display(), "Releasing pass lock");
        if let Some(path) = &self.sidecar_path {
            if let Err(e) = fs::remove_file(path) {
                debug!(path = %path.display(), error = %e, "Failed to remove lock sidecar");
            }
        }
    }
}

#[derive(Serialize)]
struct LockSidecar {
    pid: u32,
    exe: Option<String>,
    timestamp: String,
    command: String,
}

/// Lock file guarding a quarantine directory.
///
/// - `/srv/quarantine` -> `/srv/quarantine.lock`
/// - `/srv/quarantine/` -> `/srv/quarantine.lock`
pub fn lock_path_for(quarantine_dir: &Path) -> PathBuf {
    let trimmed: PathBuf = quarantine_dir.components().collect();
    let mut name = OsString::from(trimmed.as_os_str());
    name.push(".lock");
    PathBuf::from(name)
}

fn sidecar_path_for(lock_path: &Path) -> PathBuf {
    let mut name = OsString::from(lock_path.as_os_str());
    name.push(".json");
    PathBuf::from(name)
}

fn write_lock_sidecar(lock_path: &Path, command: &str) -> Option<PathBuf> {
    let sidecar = LockSidecar {
        pid: std::process::id(),
        exe: std::env::current_exe().ok().map(|p| p.display().to_string()),
        timestamp: Utc::now().to_rfc3339(),
        command: command.to_string(),
    };
    let sidecar_path = sidecar_path_for(lock_path);
    match serde_json::to_vec_pretty(&sidecar)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
        .and_then(|payload| fs::write(&sidecar_path, payload))
    {
        Ok(()) => Some(sidecar_path),
        Err(e) => {
            warn!(path = %sidecar_path.display(), error = %e, "Failed to write lock sidecar");
            None
        }
    }
}

/// Try to take the pass lock for `quarantine_dir` without blocking.
pub fn try_lock_pass(quarantine_dir: &Path, command: &str) -> Result<PassLock> {
    let lock_path = lock_path_for(quarantine_dir);
    let lock_err = |source| CleanerError::Lock {
        path: lock_path.clone(),
        source,
    };

    if let Some(parent) = lock_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(lock_err)?;
        }
    }

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .map_err(lock_err)?;

    // Fully qualified: newer std has an inherent File::try_lock_exclusive.
    match FileExt::try_lock_exclusive(&file) {
        Ok(()) => {
            info!(path = %lock_path.display(), "Acquired pass lock");
            let sidecar_path = write_lock_sidecar(&lock_path, command);
            Ok(PassLock {
                _file: file,
                lock_path,
                sidecar_path,
            })
        }
        Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
            Err(CleanerError::PassLocked { path: lock_path })
        }
        Err(e) if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => {
            Err(CleanerError::PassLocked { path: lock_path })
        }
        Err(e) => Err(lock_err(e)),
    }
}
