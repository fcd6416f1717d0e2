// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Path guard for caller-supplied file paths
//!
//! Checks are purely lexical: they run before any filesystem access, so a
//! rejected path never causes I/O.

use crate::error::{JournalError, Op};
use std::path::{Component, Path, PathBuf};

/// Drop `.` components and repeated separators
pub fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

fn is_absolute(path: &Path) -> bool {
    path.has_root()
        || path
            .components()
            .any(|c| matches!(c, Component::Prefix(_) | Component::RootDir))
}

fn has_traversal(path: &Path) -> bool {
    path.components().any(|c| matches!(c, Component::ParentDir))
}

/// Validate the configured journal directory
pub fn check_journal_dir(journal_dir: &Path) -> Result<(), JournalError> {
    if is_absolute(journal_dir) {
        return Err(JournalError::invalid(
            Op::Open,
            format!("journal_dir must be relative: {}", journal_dir.display()),
        ));
    }
    if has_traversal(journal_dir) {
        return Err(JournalError::invalid(
            Op::Open,
            format!(
                "journal_dir must not contain '..': {}",
                journal_dir.display()
            ),
        ));
    }
    if normalize(journal_dir).as_os_str().is_empty() {
        return Err(JournalError::invalid(
            Op::Open,
            "journal_dir must name a subdirectory of root_dir",
        ));
    }
    Ok(())
}

/// Validate a tracked file path and return its normalized form
///
/// The normalized form uses `/` separators and is what gets recorded in
/// every journal entry for the file.
pub fn check_file(op: Op, journal_dir: &Path, file: &str) -> Result<String, JournalError> {
    if file.trim().is_empty() {
        return Err(JournalError::invalid(op, "file must be a non-empty path"));
    }

    let path = Path::new(file);
    if is_absolute(path) {
        return Err(JournalError::invalid(
            op,
            format!("file must be a relative path: {file}"),
        ));
    }
    if has_traversal(path) {
        return Err(JournalError::invalid(
            op,
            format!("file must not contain '..': {file}"),
        ));
    }

    let normalized = normalize(path);
    if normalized.as_os_str().is_empty() {
        return Err(JournalError::invalid(
            op,
            format!("file must name a file below root_dir: {file}"),
        ));
    }
    if normalized.starts_with(normalize(journal_dir)) {
        return Err(JournalError::invalid(
            op,
            format!("file must not be inside the journal directory: {file}"),
        ));
    }

    let parts: Vec<String> = normalized
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("/"))
}

#[cfg(test)]
#[path = "guard_tests.rs"]
mod tests;
