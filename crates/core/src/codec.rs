// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Patch codec: computes and applies textual patches
//!
//! The journal treats patches as opaque text. The only contract is that
//! `apply(before, diff(before, after))` reproduces `after` exactly, and
//! that applying a patch to a base it was not computed from fails instead
//! of guessing.

use thiserror::Error;

/// A patch that could not be parsed or did not apply cleanly
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct PatchError(pub String);

/// Computes and applies textual patches
pub trait PatchCodec: Send + Sync {
    /// Produce a patch turning `before` into `after`
    fn diff(&self, before: &str, after: &str) -> String;

    /// Apply `patch` to `base`
    fn apply(&self, base: &str, patch: &str) -> Result<String, PatchError>;
}

/// Unified-diff codec backed by `diffy`
#[derive(Clone, Copy, Debug, Default)]
pub struct UnifiedDiff;

impl PatchCodec for UnifiedDiff {
    fn diff(&self, before: &str, after: &str) -> String {
        diffy::create_patch(before, after).to_string()
    }

    fn apply(&self, base: &str, patch: &str) -> Result<String, PatchError> {
        let patch = diffy::Patch::from_str(patch)
            .map_err(|e| PatchError(format!("unparseable patch: {e}")))?;
        diffy::apply(base, &patch).map_err(|e| PatchError(e.to_string()))
    }
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
