// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only journal file for one tracked file
//!
//! Records are newline-delimited JSON objects. A real read is strict: one
//! malformed record invalidates the whole journal. The diagnostic summary
//! is tolerant and must never drive replay.

use crate::paths::JournalPaths;
use dj_core::{Corruption, JournalEntry, JournalError, Op};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Tolerant summary of a journal's records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JournalSummary {
    pub exists: bool,
    /// Records with a positive integer seq
    pub count: u64,
    pub min_seq: Option<u64>,
    pub max_seq: Option<u64>,
}

/// Journal file access for one tracked file
#[derive(Debug, Clone)]
pub struct JournalStore {
    file: String,
    path: PathBuf,
}

impl JournalStore {
    pub fn new(paths: &JournalPaths) -> Self {
        Self {
            file: paths.file.clone(),
            path: paths.journal.clone(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record, durably
    ///
    /// Must only be called while holding the journal's append lock. The
    /// record is written with a single `write_all` and fsync'd; if the
    /// write fails the file is truncated back to its previous length.
    pub async fn append(&self, op: Op, entry: &JournalEntry) -> Result<(), JournalError> {
        let mut line = entry.to_line().map_err(|e| {
            JournalError::invalid(op, format!("entry cannot be serialized: {e}"))
        })?;
        line.push('\n');

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(op, "create directory", parent, e))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.io_error(op, "open", &self.path, e))?;
        let previous_len = file
            .metadata()
            .await
            .map_err(|e| self.io_error(op, "stat", &self.path, e))?
            .len();

        let written = async {
            file.write_all(line.as_bytes()).await?;
            file.sync_all().await
        }
        .await;

        if let Err(e) = written {
            if let Err(truncate) = file.set_len(previous_len).await {
                tracing::error!(
                    file = %self.file,
                    error = %truncate,
                    "failed to roll back partial journal write"
                );
            }
            return Err(self.io_error(op, "append to", &self.path, e));
        }

        Ok(())
    }

    /// Read and parse every record, in file order
    ///
    /// A missing journal reads as empty. Blank lines are ignored; any other
    /// record that is not a well-formed entry is a `MalformedRecord`.
    pub async fn read(&self, op: Op) -> Result<Vec<JournalEntry>, JournalError> {
        let Some(text) = self.read_text(op).await? else {
            return Ok(Vec::new());
        };

        let mut entries = Vec::new();
        for (index, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let entry = JournalEntry::from_line(trimmed).map_err(|e| {
                JournalError::corrupted(
                    op,
                    &self.file,
                    Corruption::MalformedRecord {
                        line: index + 1,
                        detail: e.to_string(),
                    },
                )
            })?;
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Whether a journal file is present
    pub async fn exists(&self, op: Op) -> Result<bool, JournalError> {
        match fs::metadata(&self.path).await {
            Ok(meta) if meta.is_file() => Ok(true),
            Ok(_) => Err(JournalError::corrupted(
                op,
                &self.file,
                Corruption::NotAFile {
                    path: self.path.clone(),
                },
            )),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(self.io_error(op, "stat", &self.path, e)),
        }
    }

    /// Count records and their seq range, skipping anything malformed
    pub async fn inspect(&self, op: Op) -> Result<JournalSummary, JournalError> {
        let Some(text) = self.read_text(op).await? else {
            return Ok(JournalSummary::default());
        };

        let mut summary = JournalSummary {
            exists: true,
            ..JournalSummary::default()
        };
        for seq in text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(JournalEntry::scan_seq)
        {
            summary.count += 1;
            summary.min_seq = Some(summary.min_seq.map_or(seq, |min| min.min(seq)));
            summary.max_seq = Some(summary.max_seq.map_or(seq, |max| max.max(seq)));
        }
        Ok(summary)
    }

    async fn read_text(&self, op: Op) -> Result<Option<String>, JournalError> {
        match fs::read_to_string(&self.path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(op, "read", &self.path, e)),
        }
    }

    fn io_error(&self, op: Op, action: &'static str, path: &Path, e: std::io::Error) -> JournalError {
        JournalError::io(op, &self.file, action, path, e)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
