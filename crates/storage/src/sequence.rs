// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sequence allocation for appends
//!
//! The journal itself is the only authority on ordering. The `.seq` cache
//! next to it merely saves a full scan; it is trusted only when it parses
//! and is strictly newer than the journal, and any read problem is treated
//! as a cache miss. Equal mtimes count as stale: on coarse timestamps an
//! append that committed in the same tick as the last cache write, then
//! crashed before updating the cache, is indistinguishable otherwise.

use crate::paths::{with_suffix, JournalPaths};
use dj_core::{JournalEntry, JournalError, Op};
use std::io::ErrorKind;
use tokio::fs;

/// Seq to assign to the next appended entry
///
/// Must be called while holding the journal's append lock.
pub async fn next_seq(op: Op, paths: &JournalPaths) -> Result<u64, JournalError> {
    if let Some(cached) = read_cache(paths).await {
        tracing::debug!(file = %paths.file, cached, "sequence cache hit");
        return Ok(cached + 1);
    }
    let max = scan_max_seq(op, paths).await?;
    tracing::debug!(file = %paths.file, max, "sequence from journal scan");
    Ok(max + 1)
}

async fn read_cache(paths: &JournalPaths) -> Option<u64> {
    let text = fs::read_to_string(&paths.seq_cache).await.ok()?;
    let cached = text.trim().parse::<u64>().ok().filter(|seq| *seq > 0)?;

    let cache_modified = fs::metadata(&paths.seq_cache).await.ok()?.modified().ok()?;
    let journal_modified = fs::metadata(&paths.journal).await.ok()?.modified().ok()?;
    if journal_modified >= cache_modified {
        tracing::debug!(file = %paths.file, cached, "sequence cache is stale");
        return None;
    }
    Some(cached)
}

/// Highest positive seq among parseable records, or 0 for no journal
///
/// Malformed records are skipped: this is a hint for allocation, not a
/// validator. Replay performs the real validation.
pub async fn scan_max_seq(op: Op, paths: &JournalPaths) -> Result<u64, JournalError> {
    let text = match fs::read_to_string(&paths.journal).await {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(JournalError::io(op, &paths.file, "read", &paths.journal, e)),
    };

    Ok(text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(JournalEntry::scan_seq)
        .max()
        .unwrap_or(0))
}

/// Remember `seq` as the last appended entry
///
/// The cache is advisory, so failures are logged and the stale cache is
/// removed rather than failing an append that already committed.
pub async fn record(paths: &JournalPaths, seq: u64) {
    let tmp = with_suffix(&paths.seq_cache, ".tmp");
    let result = async {
        fs::write(&tmp, format!("{seq}\n")).await?;
        fs::rename(&tmp, &paths.seq_cache).await
    }
    .await;

    if let Err(e) = result {
        tracing::warn!(file = %paths.file, seq, error = %e, "failed to update sequence cache");
        let _ = fs::remove_file(&tmp).await;
        let _ = fs::remove_file(&paths.seq_cache).await;
    }
}

#[cfg(test)]
#[path = "sequence_tests.rs"]
mod tests;
