// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Replay engine: reconstructs file content from journal entries
//!
//! Replay never trusts the order entries were read in. Entries are
//! filtered to the requested prefix, checked for positive unique seqs,
//! sorted, and required to form exactly `1..=k` before any diff is
//! applied. A requested target that was never recorded is rejected
//! rather than silently truncated.

use crate::codec::PatchCodec;
use crate::digest::content_hash;
use crate::entry::JournalEntry;
use crate::error::{Corruption, JournalError, Op};
use std::collections::HashSet;

/// Result of a successful replay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replayed {
    /// Reconstructed content after the last applied entry
    pub content: String,
    /// Seq of the last applied entry
    pub seq: u64,
}

/// Filter, validate and order entries for replay up to `up_to`
///
/// `None` selects every entry. The returned entries are exactly seqs
/// `1..=k`, where `k == up_to` when a target was given.
///
/// A full replay of zero entries is refused with `Corruption::Empty`
/// instead of folding to empty content, so an untracked file never
/// blanks its target.
pub fn ordered(
    op: Op,
    file: &str,
    entries: Vec<JournalEntry>,
    up_to: Option<u64>,
) -> Result<Vec<JournalEntry>, JournalError> {
    let corrupted = |corruption: Corruption| JournalError::corrupted(op, file, corruption);

    let limit = up_to.map(|seq| i64::try_from(seq).unwrap_or(i64::MAX));
    let mut selected: Vec<(u64, JournalEntry)> = Vec::with_capacity(entries.len());
    let mut seen = HashSet::new();

    for entry in entries {
        if limit.is_some_and(|limit| entry.seq > limit) {
            continue;
        }
        let seq = u64::try_from(entry.seq)
            .ok()
            .filter(|seq| *seq > 0)
            .ok_or_else(|| corrupted(Corruption::InvalidSeq { seq: entry.seq }))?;
        if !seen.insert(seq) {
            return Err(corrupted(Corruption::DuplicateSeq { seq }));
        }
        selected.push((seq, entry));
    }

    selected.sort_by_key(|(seq, _)| *seq);

    for (expected, (seq, entry)) in (1u64..).zip(&selected) {
        if *seq != expected {
            return Err(corrupted(Corruption::SeqGap {
                expected,
                found: *seq,
            }));
        }
        if entry.file != file {
            return Err(corrupted(Corruption::ForeignRecord {
                seq: *seq,
                found: entry.file.clone(),
            }));
        }
    }

    let last = selected.last().map(|(seq, _)| *seq).unwrap_or(0);
    match up_to {
        Some(requested) if requested != last => {
            return Err(corrupted(Corruption::MissingSeq { requested, last }));
        }
        None if selected.is_empty() => return Err(corrupted(Corruption::Empty)),
        _ => {}
    }

    Ok(selected.into_iter().map(|(_, entry)| entry).collect())
}

/// Applies ordered entries through a patch codec
pub struct ReplayEngine<'a, P: PatchCodec + ?Sized> {
    codec: &'a P,
    strict: bool,
}

impl<'a, P: PatchCodec + ?Sized> ReplayEngine<'a, P> {
    pub fn new(codec: &'a P, strict: bool) -> Self {
        Self { codec, strict }
    }

    /// Validate `entries` and fold them into content, starting from empty
    pub fn apply(
        &self,
        op: Op,
        file: &str,
        entries: Vec<JournalEntry>,
        up_to: Option<u64>,
    ) -> Result<Replayed, JournalError> {
        let entries = ordered(op, file, entries, up_to)?;

        let mut content = String::new();
        let mut last = 0;
        for entry in &entries {
            // ordered() guarantees a positive seq
            let seq = entry.seq.unsigned_abs();

            if self.strict {
                let actual = content_hash(&content);
                if actual != entry.base_hash {
                    tracing::warn!(file, seq, "base hash mismatch");
                    return Err(JournalError::StrictReplayMismatch {
                        op,
                        file: file.to_string(),
                        seq,
                        expected: entry.base_hash.clone(),
                        actual,
                    });
                }
            }

            content = self.codec.apply(&content, &entry.diff).map_err(|e| {
                JournalError::PatchApplication {
                    op,
                    file: file.to_string(),
                    seq,
                    reason: e.to_string(),
                }
            })?;
            tracing::trace!(file, seq, len = content.len(), "applied entry");
            last = seq;
        }

        Ok(Replayed { content, seq: last })
    }
}

#[cfg(test)]
#[path = "replay_tests.rs"]
mod tests;
