// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dj-core: filesystem-free building blocks of the diff journal
//!
//! This crate provides:
//! - The journal entry model and its line encoding
//! - The error taxonomy shared by every journal operation
//! - Configuration and the path guard
//! - The patch codec seam and content digests
//! - The replay engine that turns entries back into content

pub mod clock;
pub mod codec;
pub mod config;
pub mod digest;
pub mod entry;
pub mod error;
pub mod guard;
pub mod replay;

pub use clock::{Clock, FakeClock, SystemClock};
pub use codec::{PatchCodec, PatchError, UnifiedDiff};
pub use config::{JournalConfig, RetryPolicy, DEFAULT_JOURNAL_DIR};
pub use digest::content_hash;
pub use entry::{Change, JournalEntry};
pub use error::{Corruption, JournalError, Op};
pub use replay::{ReplayEngine, Replayed};
