// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dj-storage: on-disk diff journals
//!
//! Every tracked file gets an append-only JSONL journal under the journal
//! root. Appends are serialized by a per-file lock marker; reads replay the
//! journal to reconstruct content at any recorded seq.

pub mod journal;
pub mod lock;
pub mod paths;
pub mod sequence;
pub mod snapshot;
pub mod store;

pub use journal::{DiffJournal, Materialized, Verification};
pub use lock::{FileLock, LockManager};
pub use paths::JournalPaths;
pub use snapshot::{SnapshotManager, SNAPSHOT_EXTENSION};
pub use store::{JournalStore, JournalSummary};
