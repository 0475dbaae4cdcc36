//! # fyteclub-store
//!
//! Local content-addressed mod store (§4.8): chunks, recipes, and the
//! per-peer applied-recipe cache, indexed in `fyteclub-db` and backed by
//! sharded files on disk.
//!
//! Chunk bytes live on disk rather than in the SQLite index, the same split
//! the index schema already assumes (`chunks.file_path`). This stays
//! nearer the teacher's note that an in-memory chunk store "would persist
//! to disk" in production, trimmed of its erasure coding and LFU-DA scoring:
//! capacity pressure here is relieved with a plain LRU among refcount-0
//! chunks, since the spec names no earning model or redundancy scheme.

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::Connection;

use fyteclub_crypto::hash::sha256;
use fyteclub_db::queries::content;
use fyteclub_types::content::ModRecipe;
use fyteclub_types::{Hash, PeerId, DEFAULT_STORE_CAPACITY_BYTES, MAX_CHUNK_SIZE, RECIPE_CACHE_TTL_SECS};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("chunk exceeds max size of {MAX_CHUNK_SIZE} bytes")]
    ChunkTooLarge,

    #[error("chunk bytes do not hash to the claimed key")]
    HashMismatch,

    #[error("recipe references chunk {0:?} which is not in the store")]
    MissingChunk(Hash),

    #[error("store is at capacity and every chunk is pinned by a live recipe")]
    CapacityExceeded,

    #[error(transparent)]
    Db(#[from] fyteclub_db::DbError),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("recipe blob is not valid JSON")]
    Corrupt,
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// A local content-addressed store for one peer process, shared across every
/// syncshell it has joined.
pub struct ContentStore {
    conn: Connection,
    base_dir: PathBuf,
    capacity_bytes: u64,
}

impl ContentStore {
    pub fn open(conn: Connection, base_dir: PathBuf, capacity_bytes: u64) -> Result<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self {
            conn,
            base_dir,
            capacity_bytes,
        })
    }

    pub fn open_default(conn: Connection, base_dir: PathBuf) -> Result<Self> {
        Self::open(conn, base_dir, DEFAULT_STORE_CAPACITY_BYTES)
    }

    fn chunk_path(&self, hash: &Hash) -> PathBuf {
        let hex = hex::encode(hash);
        self.base_dir.join(&hex[0..2]).join(&hex[2..])
    }

    /// Store a chunk, deduplicating against an existing entry with the same
    /// hash. Returns the chunk's hash.
    ///
    /// A brand-new chunk is admitted only if it fits under `capacity_bytes`
    /// once LRU-evictable (refcount-0) chunks are reclaimed; if every chunk
    /// is pinned by a live recipe this fails with [`StoreError::CapacityExceeded`]
    /// rather than growing past capacity.
    pub fn put_chunk(&mut self, bytes: &[u8], now: u64) -> Result<Hash> {
        if bytes.len() > MAX_CHUNK_SIZE {
            return Err(StoreError::ChunkTooLarge);
        }
        let hash = sha256(bytes);
        let path = self.chunk_path(&hash);
        if path.exists() {
            content::chunk_incref(&self.conn, &hash, bytes.len() as u64, now, &path.to_string_lossy())?;
            self.gc(now)?;
            return Ok(hash);
        }

        self.gc(now)?;
        self.make_room_for(bytes.len() as u64)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        content::chunk_incref(&self.conn, &hash, bytes.len() as u64, now, &path.to_string_lossy())?;
        Ok(hash)
    }

    fn used_bytes(&self) -> Result<u64> {
        let used: i64 = self
            .conn
            .query_row("SELECT COALESCE(SUM(size_bytes), 0) FROM chunks", [], |row| row.get(0))?;
        Ok(used as u64)
    }

    /// Evict the single least-recently-used refcount-0 chunk, if any.
    /// Returns the bytes freed, or `None` if nothing is evictable.
    fn evict_lru_chunk(&mut self) -> Result<Option<u64>> {
        let evictable = content::chunks_evictable(&self.conn, 1)?;
        let Some(row) = evictable.into_iter().next() else {
            return Ok(None);
        };
        let hash: Hash = row.chunk_hash.clone().try_into().unwrap_or([0u8; 32]);
        fs::remove_file(&row.file_path).ok();
        content::chunk_delete(&self.conn, &hash)?;
        Ok(Some(row.size_bytes))
    }

    /// Evict LRU refcount-0 chunks until `additional_bytes` more would fit
    /// under capacity. Fails with [`StoreError::CapacityExceeded`] if every
    /// chunk is pinned before there is enough room.
    fn make_room_for(&mut self, additional_bytes: u64) -> Result<()> {
        loop {
            if self.used_bytes()? + additional_bytes <= self.capacity_bytes {
                return Ok(());
            }
            if self.evict_lru_chunk()?.is_none() {
                return Err(StoreError::CapacityExceeded);
            }
        }
    }

    /// Fetch a chunk's bytes, verifying its content hash (§4.8 invariant b).
    pub fn get_chunk(&self, hash: &Hash, now: u64) -> Result<Option<Vec<u8>>> {
        let Some(row) = content::chunk_get(&self.conn, hash)? else {
            return Ok(None);
        };
        let bytes = fs::read(Path::new(&row.file_path))?;
        if sha256(&bytes) != *hash {
            return Err(StoreError::HashMismatch);
        }
        content::chunk_touch(&self.conn, hash, now)?;
        Ok(Some(bytes))
    }

    /// Drop one reference to a chunk, e.g. when a recipe referencing it is
    /// purged. Does not evict immediately: eviction is LRU-driven in [`gc`].
    pub fn release_chunk(&self, hash: &Hash) -> Result<()> {
        content::chunk_decref(&self.conn, hash)?;
        Ok(())
    }

    /// Store a recipe descriptor and bump the refcount of every chunk it
    /// references. Every referenced chunk must already be present.
    pub fn put_recipe(&mut self, group_id: &[u8; 16], recipe: &ModRecipe, now: u64) -> Result<()> {
        for chunk_hash in recipe.referenced_chunk_hashes() {
            if content::chunk_get(&self.conn, &chunk_hash)?.is_none() {
                return Err(StoreError::MissingChunk(chunk_hash));
            }
        }
        let blob = serde_json::to_vec(recipe).expect("ModRecipe always serializes");
        content::recipe_upsert(
            &self.conn,
            &recipe.recipe_hash,
            group_id,
            &recipe.author_peer_id,
            recipe.created_at,
            now,
            &blob,
        )?;
        for chunk_hash in recipe.referenced_chunk_hashes() {
            self.conn.execute(
                "UPDATE chunks SET refcount = refcount + 1 WHERE chunk_hash = ?1",
                [chunk_hash.as_slice()],
            )?;
        }
        Ok(())
    }

    pub fn get_recipe(&self, recipe_hash: &Hash, now: u64) -> Result<Option<ModRecipe>> {
        let Some(row) = content::recipe_get(&self.conn, recipe_hash)? else {
            return Ok(None);
        };
        content::recipe_touch(&self.conn, recipe_hash, now)?;
        let recipe: ModRecipe = serde_json::from_slice(&row.blob).map_err(|_| StoreError::Corrupt)?;
        Ok(Some(recipe))
    }

    /// Record that `peer_id`'s current recipe is `recipe_hash`, for
    /// short-circuiting re-transfer of an already-synced peer.
    pub fn remember(&self, group_id: &[u8; 16], peer_id: &str, recipe_hash: &Hash, now: u64) -> Result<()> {
        content::player_cache_upsert(&self.conn, group_id, peer_id, recipe_hash, now)?;
        Ok(())
    }

    pub fn recall(&self, group_id: &[u8; 16], peer_id: &PeerId) -> Result<Option<Hash>> {
        let row = content::player_cache_get(&self.conn, group_id, peer_id)?;
        Ok(row.and_then(|r| r.recipe_hash.try_into().ok()))
    }

    /// Evict LRU refcount-0 chunks while over capacity, purge recipes past
    /// the 48h TTL (releasing their chunk references and any player-cache
    /// entries pointing at them), and drop expired player-cache rows.
    pub fn gc(&mut self, now: u64) -> Result<()> {
        let mut used = self.used_bytes()?;
        while used > self.capacity_bytes {
            match self.evict_lru_chunk()? {
                Some(freed) => used = used.saturating_sub(freed),
                None => break,
            }
        }

        let recipe_cutoff = now.saturating_sub(RECIPE_CACHE_TTL_SECS);
        for recipe_row in content::recipes_older_than(&self.conn, recipe_cutoff)? {
            let hash: Hash = recipe_row.recipe_hash.clone().try_into().unwrap_or([0u8; 32]);
            if let Ok(recipe) = serde_json::from_slice::<ModRecipe>(&recipe_row.blob) {
                for chunk_hash in recipe.referenced_chunk_hashes() {
                    content::chunk_decref(&self.conn, &chunk_hash)?;
                }
            }
            content::player_cache_delete_by_recipe(&self.conn, &hash)?;
            content::recipe_delete(&self.conn, &hash)?;
        }

        let player_cache_cutoff = now.saturating_sub(RECIPE_CACHE_TTL_SECS);
        self.conn.execute(
            "DELETE FROM player_cache WHERE last_applied_at < ?1",
            [player_cache_cutoff as i64],
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fyteclub_types::content::FileEntry;

    fn store() -> (ContentStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let conn = fyteclub_db::open_memory().expect("open db");
        let store = ContentStore::open(conn, dir.path().join("content"), DEFAULT_STORE_CAPACITY_BYTES)
            .expect("open store");
        (store, dir)
    }

    #[test]
    fn test_put_and_get_chunk_roundtrip() {
        let (mut store, _dir) = store();
        let hash = store.put_chunk(b"mod-bytes", 100).expect("put");
        let bytes = store.get_chunk(&hash, 200).expect("get").expect("present");
        assert_eq!(bytes, b"mod-bytes");
    }

    #[test]
    fn test_put_chunk_dedups_identical_bytes() {
        let (mut store, _dir) = store();
        let a = store.put_chunk(b"same", 100).expect("put a");
        let b = store.put_chunk(b"same", 200).expect("put b");
        assert_eq!(a, b);
        let row = content::chunk_get(&store.conn, &a).expect("get").expect("present");
        assert_eq!(row.refcount, 2);
    }

    #[test]
    fn test_put_recipe_requires_chunks_present() {
        let (mut store, _dir) = store();
        let recipe = ModRecipe {
            recipe_hash: [9u8; 32],
            files: vec![FileEntry {
                game_path: "p".into(),
                chunk_hash: [1u8; 32],
            }],
            appearance_blob_hash: [2u8; 32],
            body_scale_blob_hash: [3u8; 32],
            author_peer_id: "alice".into(),
            created_at: 0,
        };
        let err = store.put_recipe(&[1u8; 16], &recipe, 100).expect_err("expected error");
        assert!(matches!(err, StoreError::MissingChunk(_)));
    }

    #[test]
    fn test_put_recipe_pins_referenced_chunks() {
        let (mut store, _dir) = store();
        let a = store.put_chunk(b"file", 100).expect("put");
        let b = store.put_chunk(b"appearance", 100).expect("put");
        let c = store.put_chunk(b"body-scale", 100).expect("put");
        // the initial put_chunk calls already leave each at refcount 1.
        let recipe = ModRecipe {
            recipe_hash: [9u8; 32],
            files: vec![FileEntry {
                game_path: "p".into(),
                chunk_hash: a,
            }],
            appearance_blob_hash: b,
            body_scale_blob_hash: c,
            author_peer_id: "alice".into(),
            created_at: 0,
        };
        store.put_recipe(&[1u8; 16], &recipe, 100).expect("put recipe");
        let row = content::chunk_get(&store.conn, &a).expect("get").expect("present");
        assert_eq!(row.refcount, 2, "recipe reference pins the chunk");
    }

    #[test]
    fn test_remember_and_recall_roundtrip() {
        let (store, _dir) = store();
        let group_id = [1u8; 16];
        store.remember(&group_id, "bob", &[7u8; 32], 100).expect("remember");
        let recalled = store.recall(&group_id, &"bob".to_string()).expect("recall");
        assert_eq!(recalled, Some([7u8; 32]));
    }

    #[test]
    fn test_gc_evicts_lru_refcount_zero_chunks_over_capacity() {
        let dir = tempfile::tempdir().expect("tempdir");
        let conn = fyteclub_db::open_memory().expect("open db");
        let mut store = ContentStore::open(conn, dir.path().join("content"), 10).expect("open store");
        let old = store.put_chunk(b"0123456789", 100).expect("put old, exactly fills capacity");
        store.release_chunk(&old).expect("release");
        let new = store
            .put_chunk(b"abcdefghij", 200)
            .expect("admitting a same-size chunk evicts the now-pinless old one to make room");
        assert!(store.get_chunk(&old, 300).expect("get").is_none(), "evicted to make room");
        assert!(store.get_chunk(&new, 300).expect("get").is_some());
    }

    #[test]
    fn test_put_chunk_capacity_exceeded_does_not_evict_pinned_chunk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let conn = fyteclub_db::open_memory().expect("open db");
        let mut store = ContentStore::open(conn, dir.path().join("content"), 10).expect("open store");
        let pinned = store.put_chunk(b"0123456789", 100).expect("put pinned, exactly fills capacity");
        let err = store.put_chunk(b"abcdefghij", 200).expect_err("nothing evictable, must not grow past capacity");
        assert!(matches!(err, StoreError::CapacityExceeded));
        assert!(store.get_chunk(&pinned, 300).expect("get").is_some(), "pinned chunk was never evicted");
    }

    #[test]
    fn test_put_chunk_fails_with_capacity_exceeded_when_all_pinned() {
        let dir = tempfile::tempdir().expect("tempdir");
        let conn = fyteclub_db::open_memory().expect("open db");
        let mut store = ContentStore::open(conn, dir.path().join("content"), 10).expect("open store");
        store.put_chunk(b"0123456789", 100).expect("fills capacity exactly, stays pinned at refcount 1");
        let err = store.put_chunk(b"overflow-bytes", 200).expect_err("no room and nothing evictable");
        assert!(matches!(err, StoreError::CapacityExceeded));
    }

    #[test]
    fn test_gc_purges_expired_recipe_and_its_player_cache_entry() {
        let (mut store, _dir) = store();
        let hash = store.put_chunk(b"file", 0).expect("put");
        let recipe = ModRecipe {
            recipe_hash: [9u8; 32],
            files: vec![],
            appearance_blob_hash: hash,
            body_scale_blob_hash: hash,
            author_peer_id: "alice".into(),
            created_at: 0,
        };
        store.put_recipe(&[1u8; 16], &recipe, 0).expect("put recipe");
        store.remember(&[1u8; 16], "bob", &recipe.recipe_hash, 0).expect("remember");

        store.gc(RECIPE_CACHE_TTL_SECS + 1).expect("gc");

        assert!(store.get_recipe(&recipe.recipe_hash, RECIPE_CACHE_TTL_SECS + 1).expect("get").is_none());
        assert!(store.recall(&[1u8; 16], &"bob".to_string()).expect("recall").is_none());
    }
}
