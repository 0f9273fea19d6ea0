//! Filesystem-based locking for cross-process coordination
//!
//! Every process that reads, rewrites or clears an index file holds an
//! exclusive flock() on a lock file derived from the index path, so two CLI
//! runs never interleave a load with a save.

use anyhow::{Context, Result};
use fs2::FileExt;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::paths::PlatformPaths;

/// Get the lock file path for a given index file
fn lock_file_path(index_path: &Path) -> PathBuf {
    let mut hasher = Sha256::new();
    hasher.update(index_path.to_string_lossy().as_bytes());
    let hash = format!("{:x}", hasher.finalize());
    PlatformPaths::locks_dir().join(format!("{}.lock", &hash[..16]))
}

/// Guard that holds an exclusive filesystem lock
///
/// The lock is released when this guard is dropped. If the process crashes,
/// the OS releases the flock.
pub struct FsLockGuard {
    _file: File,
    path: PathBuf,
}

impl FsLockGuard {
    /// Try to acquire an exclusive filesystem lock, non-blocking
    ///
    /// Returns:
    /// - `Ok(Some(guard))` if the lock was acquired
    /// - `Ok(None)` if another process holds the lock
    /// - `Err(...)` on IO errors
    pub fn try_acquire(index_path: &Path) -> Result<Option<Self>> {
        let lock_path = lock_file_path(index_path);

        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent).context("Failed to create lock directory")?;
        }

        let file = File::create(&lock_path).context("Failed to create lock file")?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                tracing::debug!(
                    "Acquired index lock for {:?} (lock_file={:?})",
                    index_path,
                    lock_path
                );
                Ok(Some(Self {
                    _file: file,
                    path: lock_path,
                }))
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                tracing::debug!("Index lock for {:?} is held elsewhere", index_path);
                Ok(None)
            }
            Err(e) => Err(e).context("Failed to acquire filesystem lock"),
        }
    }

    /// Acquire lock, polling until available or until `timeout` expires
    /// (`Ok(None)`)
    pub fn acquire_blocking(index_path: &Path, timeout: Duration) -> Result<Option<Self>> {
        let start = Instant::now();
        let sleep_interval = Duration::from_millis(50);

        loop {
            if let Some(guard) = Self::try_acquire(index_path)? {
                if start.elapsed() > sleep_interval {
                    tracing::info!("Acquired index lock after {:?}", start.elapsed());
                }
                return Ok(Some(guard));
            }
            if start.elapsed() >= timeout {
                tracing::warn!(
                    "Timeout waiting for index lock on {:?} after {:?}",
                    index_path,
                    timeout
                );
                return Ok(None);
            }
            std::thread::sleep(sleep_interval);
        }
    }
}

impl Drop for FsLockGuard {
    fn drop(&mut self) {
        // The lock file is kept for reuse
        tracing::debug!("Releasing index lock {:?}", self.path);
    }
}
