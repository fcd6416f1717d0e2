// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Diff journal facade
//!
//! ```text
//! append:       guard → lock → codec.diff → next_seq → store.append → cache → unlock
//! materialize:  guard → lock check → store.read → replay → snapshot → write target
//! ```
//!
//! Readers never take the append lock. They refuse to run while a lock
//! marker is present, which is a point-in-time check and not mutual
//! exclusion: an append that starts right after the check can still race
//! a replay.

use crate::lock::{ensure_no_append, LockManager};
use crate::paths::{with_suffix, JournalPaths};
use crate::sequence;
use crate::snapshot::SnapshotManager;
use crate::store::{JournalStore, JournalSummary};
use chrono::SecondsFormat;
use dj_core::{
    content_hash, guard, replay, Change, Clock, JournalConfig, JournalEntry, JournalError, Op,
    PatchCodec, ReplayEngine, Replayed, SystemClock, UnifiedDiff,
};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::Instrument;

/// Outcome of writing reconstructed content to a target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Materialized {
    /// Target file that was written
    pub path: PathBuf,
    /// Seq of the last entry replayed
    pub seq: u64,
    pub bytes: usize,
    /// Snapshot of the previous target content, if one was taken
    pub snapshot: Option<PathBuf>,
}

/// Result of a forced hash-chain verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub seq: u64,
    /// Digest of the fully reconstructed content
    pub digest: String,
}

/// Per-file change journals rooted at one directory
pub struct DiffJournal<P: PatchCodec = UnifiedDiff, C: Clock = SystemClock> {
    config: JournalConfig,
    codec: P,
    clock: C,
    locks: LockManager,
    snapshots: SnapshotManager<C>,
}

impl DiffJournal {
    /// Open a journal with the default codec and system clock
    ///
    /// Validates the configuration; performs no I/O.
    pub fn open(config: JournalConfig) -> Result<Self, JournalError> {
        Self::with_parts(config, UnifiedDiff, SystemClock)
    }
}

impl<P: PatchCodec, C: Clock> DiffJournal<P, C> {
    /// Open a journal with an explicit codec and clock
    pub fn with_parts(config: JournalConfig, codec: P, clock: C) -> Result<Self, JournalError> {
        config.validate()?;
        Ok(Self {
            locks: LockManager::new(config.lock_retry),
            snapshots: SnapshotManager::new(clock.clone()),
            config,
            codec,
            clock,
        })
    }

    pub fn config(&self) -> &JournalConfig {
        &self.config
    }

    /// Guard a caller-supplied path and derive its on-disk layout
    pub fn paths(&self, op: Op, file: &str) -> Result<JournalPaths, JournalError> {
        let normalized = guard::check_file(op, &self.config.journal_dir, file)?;
        Ok(JournalPaths::new(&self.config, normalized))
    }

    /// Record one change as the next entry of the file's journal
    pub async fn append(&self, change: Change) -> Result<JournalEntry, JournalError> {
        let op = Op::Append;
        let span = tracing::info_span!("journal.append", file = %change.file, actor = %change.actor);
        async move {
            change.validate(op)?;
            let paths = self.paths(op, &change.file)?;

            let lock = self.locks.acquire(op, &paths.file, &paths.lock).await?;
            let outcome = self.append_locked(op, &paths, &change).await;
            let released = lock.release(op, &paths.file).await;
            let entry = settle(outcome, released)?;

            tracing::info!(seq = entry.seq, intent = %entry.intent, "change recorded");
            Ok(entry)
        }
        .instrument(span)
        .await
    }

    async fn append_locked(
        &self,
        op: Op,
        paths: &JournalPaths,
        change: &Change,
    ) -> Result<JournalEntry, JournalError> {
        let diff = self.codec.diff(&change.before, &change.after);
        let base_hash = content_hash(&change.before);
        let seq = sequence::next_seq(op, paths).await?;

        let entry = JournalEntry {
            seq: i64::try_from(seq)
                .map_err(|_| JournalError::invalid(op, format!("seq {seq} out of range")))?,
            ts: self.clock.now().to_rfc3339_opts(SecondsFormat::Millis, true),
            file: paths.file.clone(),
            actor: change.actor.clone(),
            intent: change.intent.clone(),
            base_hash,
            diff,
        };

        JournalStore::new(paths).append(op, &entry).await?;
        sequence::record(paths, seq).await;
        Ok(entry)
    }

    /// Replay the whole journal and write the result to the target file
    pub async fn materialize(&self, file: &str) -> Result<Materialized, JournalError> {
        let op = Op::Materialize;
        let span = tracing::info_span!("journal.materialize", file);
        async move {
            let paths = self.paths(op, file)?;
            self.restore(op, &paths, None).await
        }
        .instrument(span)
        .await
    }

    /// Replay up to `seq` and write the result to the target file
    ///
    /// The journal is left untouched, so later entries stay reachable.
    pub async fn rollback(&self, file: &str, seq: u64) -> Result<Materialized, JournalError> {
        let op = Op::Rollback;
        let span = tracing::info_span!("journal.rollback", file, seq);
        async move {
            let paths = self.paths(op, file)?;
            check_target_seq(op, seq)?;
            self.restore(op, &paths, Some(seq)).await
        }
        .instrument(span)
        .await
    }

    async fn restore(
        &self,
        op: Op,
        paths: &JournalPaths,
        up_to: Option<u64>,
    ) -> Result<Materialized, JournalError> {
        let replayed = self.replay(op, paths, up_to, self.config.strict_replay).await?;

        let snapshot = if self.config.snapshots {
            self.snapshots.snapshot(op, &paths.file, &paths.target).await?
        } else {
            None
        };

        self.write_target(op, paths, &replayed.content).await?;
        tracing::info!(seq = replayed.seq, bytes = replayed.content.len(), "target written");

        Ok(Materialized {
            path: paths.target.clone(),
            seq: replayed.seq,
            bytes: replayed.content.len(),
            snapshot,
        })
    }

    async fn replay(
        &self,
        op: Op,
        paths: &JournalPaths,
        up_to: Option<u64>,
        strict: bool,
    ) -> Result<Replayed, JournalError> {
        ensure_no_append(op, &paths.file, &paths.lock).await?;
        let entries = JournalStore::new(paths).read(op).await?;
        tracing::debug!(entries = entries.len(), strict, "replaying");
        ReplayEngine::new(&self.codec, strict).apply(op, &paths.file, entries, up_to)
    }

    /// Write through a temporary sibling so the target is never half-written
    async fn write_target(
        &self,
        op: Op,
        paths: &JournalPaths,
        content: &str,
    ) -> Result<(), JournalError> {
        let io = |action: &'static str, path: &Path, e: std::io::Error| {
            JournalError::io(op, &paths.file, action, path, e)
        };

        if let Some(parent) = paths.target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| io("create directory", parent, e))?;
        }

        let tmp = with_suffix(&paths.target, &format!(".{}.tmp", std::process::id()));
        if let Err(e) = fs::write(&tmp, content).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(io("write", tmp.as_path(), e));
        }
        if let Err(e) = fs::rename(&tmp, &paths.target).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(io("replace", paths.target.as_path(), e));
        }
        Ok(())
    }

    /// Whether a journal exists for `file`
    pub async fn exists(&self, file: &str) -> Result<bool, JournalError> {
        let op = Op::Exists;
        let paths = self.paths(op, file)?;
        JournalStore::new(&paths).exists(op).await
    }

    /// Diagnostic record count and seq range; never validates
    pub async fn inspect(&self, file: &str) -> Result<JournalSummary, JournalError> {
        let op = Op::Inspect;
        let paths = self.paths(op, file)?;
        JournalStore::new(&paths).inspect(op).await
    }

    /// Validated entries in seq order; empty if the file is untracked
    pub async fn history(&self, file: &str) -> Result<Vec<JournalEntry>, JournalError> {
        let op = Op::History;
        let span = tracing::info_span!("journal.history", file);
        async move {
            let paths = self.paths(op, file)?;
            ensure_no_append(op, &paths.file, &paths.lock).await?;
            let entries = JournalStore::new(&paths).read(op).await?;
            if entries.is_empty() {
                return Ok(entries);
            }
            replay::ordered(op, &paths.file, entries, None)
        }
        .instrument(span)
        .await
    }

    /// Replay the full journal with hash-chain checking forced on
    ///
    /// Nothing is written.
    pub async fn verify(&self, file: &str) -> Result<Verification, JournalError> {
        let op = Op::Verify;
        let span = tracing::info_span!("journal.verify", file);
        async move {
            let paths = self.paths(op, file)?;
            let replayed = self.replay(op, &paths, None, true).await?;
            tracing::info!(seq = replayed.seq, "hash chain verified");
            Ok(Verification {
                seq: replayed.seq,
                digest: content_hash(&replayed.content),
            })
        }
        .instrument(span)
        .await
    }

    /// Reconstruct content at `at` (or the latest entry) without writing it
    pub async fn read(&self, file: &str, at: Option<u64>) -> Result<String, JournalError> {
        let op = Op::Read;
        let span = tracing::info_span!("journal.read", file, at);
        async move {
            let paths = self.paths(op, file)?;
            if let Some(seq) = at {
                check_target_seq(op, seq)?;
            }
            let replayed = self.replay(op, &paths, at, self.config.strict_replay).await?;
            Ok(replayed.content)
        }
        .instrument(span)
        .await
    }
}

/// Merge the outcome of a locked operation with its lock release
///
/// The operation's own error wins; a release error is only surfaced when
/// the operation succeeded.
fn settle<T>(
    outcome: Result<T, JournalError>,
    released: Result<(), JournalError>,
) -> Result<T, JournalError> {
    match (outcome, released) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(release_err)) => Err(release_err),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(release_err)) => {
            tracing::warn!(error = %release_err, "lock release failed after append error");
            Err(e)
        }
    }
}

fn check_target_seq(op: Op, seq: u64) -> Result<(), JournalError> {
    if seq == 0 {
        return Err(JournalError::invalid(op, "seq must be a positive integer"));
    }
    if i64::try_from(seq).is_err() {
        return Err(JournalError::invalid(op, format!("seq {seq} out of range")));
    }
    Ok(())
}

#[cfg(test)]
#[path = "journal_tests.rs"]
mod tests;
