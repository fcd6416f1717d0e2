// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshots of a materialized target taken before it is overwritten
//!
//! A snapshot is a byte-for-byte copy written next to the target as
//! `<target>.<timestamp>.bak`. Snapshots are created exclusively and never
//! overwritten or read back.

use crate::paths::with_suffix;
use chrono::{DateTime, Utc};
use dj_core::{Clock, Corruption, JournalError, Op};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Extension marking snapshot files
pub const SNAPSHOT_EXTENSION: &str = "bak";

/// Upper bound on name collisions tried for a single timestamp
const MAX_NAME_COLLISIONS: u32 = 1000;

/// Creates snapshots stamped with the given clock
#[derive(Clone, Debug)]
pub struct SnapshotManager<C: Clock> {
    clock: C,
}

impl<C: Clock> SnapshotManager<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    /// Filesystem-safe timestamp used in snapshot names
    pub fn timestamp(instant: DateTime<Utc>) -> String {
        instant.format("%Y-%m-%dT%H-%M-%S-%3fZ").to_string()
    }

    /// Snapshot path for a target at a given timestamp
    pub fn snapshot_path(target: &Path, timestamp: &str) -> PathBuf {
        with_suffix(target, &format!(".{timestamp}.{SNAPSHOT_EXTENSION}"))
    }

    /// Copy the current target aside, if it exists
    ///
    /// Returns the snapshot path, or `None` when there was nothing to
    /// preserve. Any failure aborts with a `Snapshot` corruption naming
    /// both paths.
    pub async fn snapshot(
        &self,
        op: Op,
        file: &str,
        target: &Path,
    ) -> Result<Option<PathBuf>, JournalError> {
        let stamp = Self::timestamp(self.clock.now());
        let base = Self::snapshot_path(target, &stamp);
        let failed = |snapshot: &Path, source: std::io::Error| JournalError::CorruptedJournal {
            op,
            file: file.to_string(),
            corruption: Corruption::Snapshot {
                target: target.to_path_buf(),
                snapshot: snapshot.to_path_buf(),
            },
            source: Some(source),
        };

        let content = match fs::read(target).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(file, "no existing target to snapshot");
                return Ok(None);
            }
            Err(e) => return Err(failed(&base, e)),
        };

        let mut collision = 0;
        loop {
            let path = if collision == 0 {
                base.clone()
            } else {
                Self::snapshot_path(target, &format!("{stamp}-{collision}"))
            };

            let mut out = match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(out) => out,
                Err(e) if e.kind() == ErrorKind::AlreadyExists && collision < MAX_NAME_COLLISIONS => {
                    collision += 1;
                    continue;
                }
                Err(e) => return Err(failed(&path, e)),
            };

            let written = async {
                out.write_all(&content).await?;
                out.sync_all().await
            }
            .await;
            if let Err(e) = written {
                drop(out);
                let _ = fs::remove_file(&path).await;
                return Err(failed(&path, e));
            }

            tracing::info!(file, snapshot = %path.display(), bytes = content.len(), "snapshot written");
            return Ok(Some(path));
        }
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
