// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for journal operations
//!
//! Every failure surfaced by the journal is one of four kinds. Each carries
//! the public operation that failed plus enough structured context to
//! diagnose it without parsing the message.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Public operation that produced an error
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Op {
    Open,
    Append,
    Materialize,
    Rollback,
    Exists,
    Inspect,
    History,
    Verify,
    Read,
}

impl Op {
    pub fn as_str(&self) -> &'static str {
        match self {
            Op::Open => "open",
            Op::Append => "append",
            Op::Materialize => "materialize",
            Op::Rollback => "rollback",
            Op::Exists => "exists",
            Op::Inspect => "inspect",
            Op::History => "history",
            Op::Verify => "verify",
            Op::Read => "read",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a journal (or one of its side files) is considered corrupted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Corruption {
    #[error("malformed record at line {line}: {detail}")]
    MalformedRecord { line: usize, detail: String },
    #[error("seq {seq} is not a positive integer")]
    InvalidSeq { seq: i64 },
    #[error("duplicate seq {seq}")]
    DuplicateSeq { seq: u64 },
    #[error("seq gap: expected {expected}, found {found}")]
    SeqGap { expected: u64, found: u64 },
    #[error("seq {requested} was never recorded (last seq is {last})")]
    MissingSeq { requested: u64, last: u64 },
    #[error("journal has no entries")]
    Empty,
    #[error("record at seq {seq} belongs to {found}")]
    ForeignRecord { seq: u64, found: String },
    #[error("append in progress (lock held at {})", lock.display())]
    AppendInProgress { lock: PathBuf },
    #[error("lock {} still held after {attempts} attempts", lock.display())]
    LockBusy { lock: PathBuf, attempts: u32 },
    #[error("could not snapshot {} to {}", target.display(), snapshot.display())]
    Snapshot { target: PathBuf, snapshot: PathBuf },
    #[error("{} is not a regular file", path.display())]
    NotAFile { path: PathBuf },
    #[error("failed to {action} {}", path.display())]
    Io { action: &'static str, path: PathBuf },
}

/// Errors returned by every journal operation
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("{op}: invalid input: {reason}")]
    InvalidInput { op: Op, reason: String },

    #[error("{op}: corrupted journal for {file}: {corruption}")]
    CorruptedJournal {
        op: Op,
        file: String,
        corruption: Corruption,
        #[source]
        source: Option<io::Error>,
    },

    #[error("{op}: patch for {file} at seq {seq} does not apply: {reason}")]
    PatchApplication {
        op: Op,
        file: String,
        seq: u64,
        reason: String,
    },

    #[error("{op}: strict replay mismatch for {file} at seq {seq}: expected {expected}, actual {actual}")]
    StrictReplayMismatch {
        op: Op,
        file: String,
        seq: u64,
        expected: String,
        actual: String,
    },
}

impl JournalError {
    pub fn invalid(op: Op, reason: impl Into<String>) -> Self {
        JournalError::InvalidInput {
            op,
            reason: reason.into(),
        }
    }

    pub fn corrupted(op: Op, file: impl Into<String>, corruption: Corruption) -> Self {
        JournalError::CorruptedJournal {
            op,
            file: file.into(),
            corruption,
            source: None,
        }
    }

    /// An I/O failure on a journal-owned path
    pub fn io(
        op: Op,
        file: impl Into<String>,
        action: &'static str,
        path: impl Into<PathBuf>,
        source: io::Error,
    ) -> Self {
        JournalError::CorruptedJournal {
            op,
            file: file.into(),
            corruption: Corruption::Io {
                action,
                path: path.into(),
            },
            source: Some(source),
        }
    }

    /// The operation that failed
    pub fn op(&self) -> Op {
        match self {
            JournalError::InvalidInput { op, .. }
            | JournalError::CorruptedJournal { op, .. }
            | JournalError::PatchApplication { op, .. }
            | JournalError::StrictReplayMismatch { op, .. } => *op,
        }
    }

    /// The corruption reason, if this is a `CorruptedJournal` error
    pub fn corruption(&self) -> Option<&Corruption> {
        match self {
            JournalError::CorruptedJournal { corruption, .. } => Some(corruption),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
