// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Journal configuration
//!
//! A `JournalConfig` is validated once when a journal is opened and is
//! immutable for the lifetime of the handle.

use crate::error::{JournalError, Op};
use crate::guard;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default journal directory, relative to the root
pub const DEFAULT_JOURNAL_DIR: &str = ".journal";

/// Bounded retry policy for acquiring an append lock
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RetryPolicy {
    /// Total number of create attempts before giving up
    pub max_attempts: u32,
    /// Pause between consecutive attempts
    #[serde(with = "humantime_serde")]
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Upper bound on the time spent waiting for a lock
    pub fn max_wait(&self) -> Duration {
        self.delay * self.max_attempts.saturating_sub(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 50,
            delay: Duration::from_millis(50),
        }
    }
}

/// Options accepted when opening a journal
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JournalConfig {
    /// Directory that tracked file paths are relative to
    pub root_dir: PathBuf,
    /// Journal directory, relative to `root_dir`
    #[serde(default = "default_journal_dir")]
    pub journal_dir: PathBuf,
    /// Re-verify every entry's `base_hash` during replay
    #[serde(default)]
    pub strict_replay: bool,
    /// Copy the current target aside before overwriting it
    #[serde(default)]
    pub snapshots: bool,
    #[serde(default)]
    pub lock_retry: RetryPolicy,
}

fn default_journal_dir() -> PathBuf {
    PathBuf::from(DEFAULT_JOURNAL_DIR)
}

impl JournalConfig {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            journal_dir: default_journal_dir(),
            strict_replay: false,
            snapshots: false,
            lock_retry: RetryPolicy::default(),
        }
    }

    pub fn with_journal_dir(mut self, journal_dir: impl Into<PathBuf>) -> Self {
        self.journal_dir = journal_dir.into();
        self
    }

    pub fn with_strict_replay(mut self, strict: bool) -> Self {
        self.strict_replay = strict;
        self
    }

    pub fn with_snapshots(mut self, snapshots: bool) -> Self {
        self.snapshots = snapshots;
        self
    }

    pub fn with_lock_retry(mut self, policy: RetryPolicy) -> Self {
        self.lock_retry = policy;
        self
    }

    /// Parse a configuration from TOML
    ///
    /// Unknown keys, wrong value types and a missing `root_dir` are all
    /// rejected as invalid input. The result is validated before returning.
    pub fn from_toml_str(text: &str) -> Result<Self, JournalError> {
        let config: JournalConfig = toml::from_str(text)
            .map_err(|e| JournalError::invalid(Op::Open, e.message().to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every option without touching the filesystem
    pub fn validate(&self) -> Result<(), JournalError> {
        if self.root_dir.as_os_str().is_empty() {
            return Err(JournalError::invalid(Op::Open, "root_dir is required"));
        }
        guard::check_journal_dir(&self.journal_dir)?;
        if self.lock_retry.max_attempts == 0 {
            return Err(JournalError::invalid(
                Op::Open,
                "lock_retry.max_attempts must be at least 1",
            ));
        }
        Ok(())
    }

    /// Absolute-or-root-relative location of the journal directory
    pub fn journal_root(&self) -> PathBuf {
        self.root_dir.join(guard::normalize(&self.journal_dir))
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
