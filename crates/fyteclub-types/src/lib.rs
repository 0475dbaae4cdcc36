//! # fyteclub-types
//!
//! Shared domain types used across the syncshell workspace (§3 of the spec).

pub mod content;
pub mod identity;
pub mod phonebook;

/// A peer's textual identifier: lowercase hex of its Ed25519 public key.
pub type PeerId = String;

/// A syncshell's 128-bit random identifier.
pub type GroupId = [u8; 16];

/// A SHA-256 content hash (chunk hash or recipe hash).
pub type Hash = [u8; 32];

/// Default membership token lifetime: 30 days.
pub const TOKEN_DEFAULT_TTL_SECS: u64 = 30 * 24 * 3600;

/// Default live-invite lifetime: 24 hours.
pub const INVITE_DEFAULT_TTL_SECS: u64 = 24 * 3600;

/// Phonebook Active-entry TTL before demotion to Stale: 24 hours.
pub const PHONEBOOK_ACTIVE_TTL_SECS: u64 = 24 * 3600;

/// Phonebook Tombstoned-entry TTL before purge: 90 days.
pub const PHONEBOOK_TOMBSTONE_TTL_SECS: u64 = 90 * 24 * 3600;

/// Days since last successful sync after which a syncshell is "stale".
pub const STALE_GROUP_THRESHOLD_SECS: u64 = 30 * 24 * 3600;

/// Maximum chunk size: 1 MiB.
pub const MAX_CHUNK_SIZE: usize = 1024 * 1024;

/// Default content-store capacity: 2 GiB.
pub const DEFAULT_STORE_CAPACITY_BYTES: u64 = 2 * 1024 * 1024 * 1024;

/// Recipe/PlayerCache TTL: 48 hours.
pub const RECIPE_CACHE_TTL_SECS: u64 = 48 * 3600;

/// Get the current Unix timestamp in seconds.
pub fn now_unix() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
