//! SHA-256 content addressing.
//!
//! Used for `ContentChunk.hash`, `ModRecipe.recipe_hash`, and the truncated
//! per-frame dedup hash in the message protocol (C4).

use sha2::{Digest, Sha256};

/// Compute the SHA-256 digest of `data`.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute the SHA-256 digest of `data`, truncated to its first 16 bytes.
///
/// Used as the per-session dedup key for message frames (§4.4): cheap enough
/// to hash every frame, wide enough to make accidental collisions within a
/// 1024-entry LRU window negligible.
pub fn sha256_truncated_16(data: &[u8]) -> [u8; 16] {
    let full = sha256(data);
    let mut out = [0u8; 16];
    out.copy_from_slice(&full[..16]);
    out
}
