// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Content digests used as `base_hash` checkpoints

use sha2::{Digest, Sha256};

/// SHA-256 of the UTF-8 bytes of `content`, lowercase hex
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
