// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Advisory append lock backed by an exclusively-created marker file
//!
//! The marker's existence is the whole protocol: whoever creates it owns
//! the journal's append critical section until the marker is removed.
//! Readers do not take the lock; they only check for its presence.

use dj_core::{Corruption, JournalError, Op, RetryPolicy};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};

/// Acquires append locks with a bounded retry policy
#[derive(Clone, Debug)]
pub struct LockManager {
    policy: RetryPolicy,
}

impl LockManager {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Create the lock marker, retrying while another holder owns it
    ///
    /// Fails with `LockBusy` once every attempt found the marker present.
    /// Any other I/O error aborts immediately.
    pub async fn acquire(
        &self,
        op: Op,
        file: &str,
        lock_path: &Path,
    ) -> Result<FileLock, JournalError> {
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| JournalError::io(op, file, "create directory", parent, e))?;
        }

        let attempts = self.policy.max_attempts;
        for attempt in 1..=attempts {
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(lock_path)
                .await
            {
                Ok(handle) => {
                    tracing::debug!(file, attempt, "lock acquired");
                    return Ok(FileLock {
                        path: lock_path.to_path_buf(),
                        handle: Some(handle),
                        released: false,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    tracing::debug!(file, attempt, attempts, "lock busy");
                    if attempt < attempts {
                        tokio::time::sleep(self.policy.delay).await;
                    }
                }
                Err(e) => return Err(JournalError::io(op, file, "create lock", lock_path, e)),
            }
        }

        Err(JournalError::corrupted(
            op,
            file,
            Corruption::LockBusy {
                lock: lock_path.to_path_buf(),
                attempts,
            },
        ))
    }
}

/// A held append lock
///
/// Call [`FileLock::release`] to surface removal errors. If the lock is
/// dropped without being released (e.g. the owning future was cancelled),
/// the marker is removed on a best-effort basis.
#[derive(Debug)]
pub struct FileLock {
    path: PathBuf,
    handle: Option<fs::File>,
    released: bool,
}

impl FileLock {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close the handle and remove the marker
    ///
    /// A marker that is already gone counts as released.
    pub async fn release(mut self, op: Op, file: &str) -> Result<(), JournalError> {
        drop(self.handle.take());
        self.released = true;

        match fs::remove_file(&self.path).await {
            Ok(()) => {
                tracing::debug!(file, "lock released");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(file, "lock marker already removed");
                Ok(())
            }
            Err(e) => Err(JournalError::io(op, file, "remove lock", &self.path, e)),
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if !self.released {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// Point-in-time check that no append currently holds the lock
///
/// This is not mutual exclusion: an append may start right after the
/// check returns. It only keeps readers from replaying a journal that is
/// visibly mid-append.
pub async fn ensure_no_append(op: Op, file: &str, lock_path: &Path) -> Result<(), JournalError> {
    match fs::try_exists(lock_path).await {
        Ok(false) => Ok(()),
        Ok(true) => Err(JournalError::corrupted(
            op,
            file,
            Corruption::AppendInProgress {
                lock: lock_path.to_path_buf(),
            },
        )),
        Err(e) => Err(JournalError::io(op, file, "check lock", lock_path, e)),
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
