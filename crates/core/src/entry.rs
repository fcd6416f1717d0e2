// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Journal entry structure
//!
//! Each entry is one self-contained JSON line recording a single change:
//! its position in the journal, who made it and why, a digest of the
//! content it was applied to, and the patch itself.

use crate::error::{JournalError, Op};
use serde::{Deserialize, Serialize};

/// One recorded change to a tracked file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Position in the journal, as recorded. Replay rejects values below 1.
    pub seq: i64,
    /// Creation time (RFC 3339), advisory only
    pub ts: String,
    /// Normalized relative path of the tracked file
    pub file: String,
    pub actor: String,
    pub intent: String,
    /// Digest of the content this entry's diff was computed against
    pub base_hash: String,
    /// Patch text produced by the patch codec
    pub diff: String,
}

impl JournalEntry {
    /// Serialize to newline-delimited JSON (one line, no terminator)
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse from a single line of JSON
    pub fn from_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    /// Best-effort extraction of a positive `seq` from a raw record
    ///
    /// Used by diagnostic scans that must tolerate malformed records.
    pub fn scan_seq(line: &str) -> Option<u64> {
        let value: serde_json::Value = serde_json::from_str(line).ok()?;
        value.get("seq")?.as_u64().filter(|seq| *seq > 0)
    }
}

/// A change submitted for recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub file: String,
    pub actor: String,
    pub intent: String,
    pub before: String,
    pub after: String,
}

impl Change {
    pub fn new(
        file: impl Into<String>,
        actor: impl Into<String>,
        intent: impl Into<String>,
        before: impl Into<String>,
        after: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            actor: actor.into(),
            intent: intent.into(),
            before: before.into(),
            after: after.into(),
        }
    }

    /// Check the free-text attribution fields
    ///
    /// `file` is checked separately by the path guard.
    pub fn validate(&self, op: Op) -> Result<(), JournalError> {
        if self.actor.trim().is_empty() {
            return Err(JournalError::invalid(op, "actor must be a non-empty string"));
        }
        if self.intent.trim().is_empty() {
            return Err(JournalError::invalid(op, "intent must be a non-empty string"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "entry_tests.rs"]
mod tests;
