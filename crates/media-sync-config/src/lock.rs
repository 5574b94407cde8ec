use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum LockError {
    #[error("another run holds the lock at {0}; wait for it to finish or clear a stale lock with `watchsync clear --lock`")]
    AlreadyLocked(PathBuf),
    #[error("failed to create lock file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Process-wide run lock.
///
/// The lock file is created with `create_new`, so only one process can hold
/// it. Dropping the guard removes the file, including on early returns.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self, LockError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| LockError::Io {
                path: path.clone(),
                source,
            })?;
        }

        let mut file = match std::fs::OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(LockError::AlreadyLocked(path));
            }
            Err(source) => return Err(LockError::Io { path, source }),
        };

        // Owner pid, for humans inspecting a stale lock
        if let Err(e) = writeln!(file, "{}", std::process::id()) {
            debug!(path = %path.display(), error = %e, "Failed to record owner pid in lock file");
        }
        debug!(path = %path.display(), "Run lock acquired");
        Ok(Self { path })
    }

    pub fn is_locked(path: &Path) -> bool {
        path.exists()
    }

    /// Remove a lock left behind by a crashed run
    pub fn force_release(path: &Path) -> std::io::Result<bool> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "Failed to release run lock");
        } else {
            debug!(path = %self.path.display(), "Run lock released");
        }
    }
}
