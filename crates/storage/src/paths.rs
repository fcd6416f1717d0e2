// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk layout for one tracked file
//!
//! ```text
//! <root>/<file>                          materialized target
//! <root>/<file>.<timestamp>.bak          snapshots of the target
//! <root>/<journal_dir>/<file>.log        journal (one JSON record per line)
//! <root>/<journal_dir>/<file>.log.lock   append lock marker
//! <root>/<journal_dir>/<file>.log.seq    sequence cache
//! ```

use dj_core::JournalConfig;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Paths derived for one tracked file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalPaths {
    /// Normalized relative file name, as recorded in entries
    pub file: String,
    pub target: PathBuf,
    pub journal: PathBuf,
    pub lock: PathBuf,
    pub seq_cache: PathBuf,
}

impl JournalPaths {
    /// Derive paths for an already-guarded, normalized file name
    pub fn new(config: &JournalConfig, file: String) -> Self {
        let target = config.root().join(&file);
        let journal = with_suffix(&config.journal_root().join(&file), ".log");
        let lock = with_suffix(&journal, ".lock");
        let seq_cache = with_suffix(&journal, ".seq");
        Self {
            file,
            target,
            journal,
            lock,
            seq_cache,
        }
    }
}

/// Append `suffix` to the final component without touching existing extensions
pub(crate) fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}
