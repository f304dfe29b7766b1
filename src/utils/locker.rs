//! File-based locking to prevent overlapping runs

use anyhow::{Context, Result};
use fd_lock::{RwLock, RwLockWriteGuard};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Lock file shared by every invocation using the same configuration
pub struct RunLock {
    lock: RwLock<File>,
    lock_path: PathBuf,
}

/// Held for the duration of a run; releases the lock on drop.
///
/// The lock file itself stays in place so every run locks the same inode.
pub struct RunLockGuard<'a> {
    _guard: RwLockWriteGuard<'a, File>,
    lock_path: &'a Path,
}

impl RunLock {
    /// Open (or create) the lock file
    pub fn open(lock_path: &Path) -> Result<Self> {
        debug!("Opening run lock: {:?}", lock_path);

        // Create parent directory if it doesn't exist
        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create lock directory")?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(lock_path)
            .context(format!("Failed to open lock file: {:?}", lock_path))?;

        Ok(Self {
            lock: RwLock::new(file),
            lock_path: lock_path.to_path_buf(),
        })
    }

    /// Take the exclusive lock without blocking.
    /// Fails if another run currently holds it.
    pub fn try_acquire(&mut self) -> Result<RunLockGuard<'_>> {
        let guard = self.lock.try_write().context(format!(
            "Another backup run is already in progress (lock held: {:?})",
            self.lock_path
        ))?;

        info!("Acquired run lock: {:?}", self.lock_path);

        Ok(RunLockGuard {
            _guard: guard,
            lock_path: &self.lock_path,
        })
    }

    /// Get the lock file path
    pub fn path(&self) -> &Path {
        &self.lock_path
    }
}

impl Drop for RunLockGuard<'_> {
    fn drop(&mut self) {
        info!("Released run lock: {:?}", self.lock_path);
    }
}
