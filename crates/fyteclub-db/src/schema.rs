//! SQL schema definitions (§6).

/// Complete schema for the syncshell index database, v1.
pub const SCHEMA_V1: &str = r#"
-- ============================================================
-- Syncshells
-- ============================================================

CREATE TABLE IF NOT EXISTS syncshells (
    group_id BLOB PRIMARY KEY,
    name TEXT NOT NULL,
    group_secret BLOB NOT NULL,
    owner_peer_id TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    is_owner INTEGER NOT NULL DEFAULT 0,
    is_active INTEGER NOT NULL DEFAULT 1,
    last_sync_at INTEGER NOT NULL DEFAULT 0,
    enable_relay INTEGER NOT NULL DEFAULT 0
);

-- ============================================================
-- Phonebook
-- ============================================================

CREATE TABLE IF NOT EXISTS phonebook_entries (
    group_id BLOB NOT NULL REFERENCES syncshells(group_id) ON DELETE CASCADE,
    member_peer_id TEXT NOT NULL,
    display_name TEXT NOT NULL,
    joined_at INTEGER NOT NULL,
    last_seen_at INTEGER NOT NULL,
    status TEXT NOT NULL,
    tombstone_reason TEXT,
    sequence INTEGER NOT NULL,
    author_peer_id TEXT NOT NULL,
    signature BLOB NOT NULL,
    PRIMARY KEY (group_id, member_peer_id)
);

CREATE INDEX IF NOT EXISTS idx_phonebook_group ON phonebook_entries(group_id);
CREATE INDEX IF NOT EXISTS idx_phonebook_status ON phonebook_entries(group_id, status);

-- ============================================================
-- Tokens
-- ============================================================

CREATE TABLE IF NOT EXISTS tokens (
    group_id BLOB NOT NULL REFERENCES syncshells(group_id) ON DELETE CASCADE,
    member_peer_id TEXT NOT NULL,
    issued_at INTEGER NOT NULL,
    expires_at INTEGER NOT NULL,
    capabilities TEXT NOT NULL,
    issuer_signature BLOB NOT NULL,
    encrypted_blob BLOB NOT NULL,
    PRIMARY KEY (group_id, member_peer_id)
);

CREATE INDEX IF NOT EXISTS idx_tokens_expiry ON tokens(expires_at);

-- ============================================================
-- Content store index
-- ============================================================

CREATE TABLE IF NOT EXISTS chunks (
    chunk_hash BLOB PRIMARY KEY,
    refcount INTEGER NOT NULL DEFAULT 0,
    size_bytes INTEGER NOT NULL,
    last_access_at INTEGER NOT NULL,
    file_path TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chunks_eviction ON chunks(refcount, last_access_at);

CREATE TABLE IF NOT EXISTS recipes (
    recipe_hash BLOB PRIMARY KEY,
    group_id BLOB NOT NULL,
    author_peer_id TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    last_access_at INTEGER NOT NULL,
    blob BLOB NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_recipes_group ON recipes(group_id);

CREATE TABLE IF NOT EXISTS player_cache (
    group_id BLOB NOT NULL,
    peer_id TEXT NOT NULL,
    recipe_hash BLOB NOT NULL,
    last_applied_at INTEGER NOT NULL,
    PRIMARY KEY (group_id, peer_id)
);

-- ============================================================
-- Membership control
-- ============================================================

CREATE TABLE IF NOT EXISTS block_list (
    peer_id TEXT PRIMARY KEY,
    blocked_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS reconnect_backoff (
    group_id BLOB PRIMARY KEY,
    consecutive_failures INTEGER NOT NULL DEFAULT 0,
    next_retry_at INTEGER NOT NULL DEFAULT 0,
    requires_fresh_invite INTEGER NOT NULL DEFAULT 0
);
"#;
