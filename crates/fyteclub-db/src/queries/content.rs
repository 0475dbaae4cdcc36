//! Content store index: chunks, recipes, and the per-group applied-recipe
//! cache (§6, `fyteclub-store`'s backing index).

use rusqlite::Connection;

use crate::{DbError, Result};

/// Record a newly stored chunk, or bump the refcount of one already known.
pub fn chunk_incref(
    conn: &Connection,
    chunk_hash: &[u8; 32],
    size_bytes: u64,
    last_access_at: u64,
    file_path: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO chunks (chunk_hash, refcount, size_bytes, last_access_at, file_path)
         VALUES (?1, 1, ?2, ?3, ?4)
         ON CONFLICT(chunk_hash) DO UPDATE SET
             refcount = refcount + 1,
             last_access_at = excluded.last_access_at",
        rusqlite::params![
            chunk_hash.as_slice(),
            size_bytes as i64,
            last_access_at as i64,
            file_path,
        ],
    )?;
    Ok(())
}

/// Drop one reference to a chunk. Does not delete the row at refcount 0;
/// eviction is a separate, LRU-driven decision.
pub fn chunk_decref(conn: &Connection, chunk_hash: &[u8; 32]) -> Result<()> {
    conn.execute(
        "UPDATE chunks SET refcount = MAX(refcount - 1, 0) WHERE chunk_hash = ?1",
        [chunk_hash.as_slice()],
    )?;
    Ok(())
}

pub fn chunk_touch(conn: &Connection, chunk_hash: &[u8; 32], accessed_at: u64) -> Result<()> {
    conn.execute(
        "UPDATE chunks SET last_access_at = ?1 WHERE chunk_hash = ?2",
        rusqlite::params![accessed_at as i64, chunk_hash.as_slice()],
    )?;
    Ok(())
}

pub fn chunk_get(conn: &Connection, chunk_hash: &[u8; 32]) -> Result<Option<ChunkRow>> {
    conn.query_row(
        "SELECT chunk_hash, refcount, size_bytes, last_access_at, file_path
         FROM chunks WHERE chunk_hash = ?1",
        [chunk_hash.as_slice()],
        row_to_chunk,
    )
    .map(Some)
    .or_else(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => Ok(None),
        other => Err(DbError::Sqlite(other)),
    })
}

/// Refcount-0 chunks ordered oldest-accessed-first: the LRU eviction order.
pub fn chunks_evictable(conn: &Connection, limit: usize) -> Result<Vec<ChunkRow>> {
    let mut stmt = conn.prepare(
        "SELECT chunk_hash, refcount, size_bytes, last_access_at, file_path
         FROM chunks WHERE refcount = 0 ORDER BY last_access_at ASC LIMIT ?1",
    )?;

    let rows = stmt
        .query_map([limit as i64], row_to_chunk)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

pub fn chunk_delete(conn: &Connection, chunk_hash: &[u8; 32]) -> Result<()> {
    conn.execute("DELETE FROM chunks WHERE chunk_hash = ?1", [chunk_hash.as_slice()])?;
    Ok(())
}

fn row_to_chunk(row: &rusqlite::Row) -> rusqlite::Result<ChunkRow> {
    Ok(ChunkRow {
        chunk_hash: row.get(0)?,
        refcount: row.get::<_, i64>(1)? as u32,
        size_bytes: row.get::<_, i64>(2)? as u64,
        last_access_at: row.get::<_, i64>(3)? as u64,
        file_path: row.get(4)?,
    })
}

#[derive(Debug, Clone)]
pub struct ChunkRow {
    pub chunk_hash: Vec<u8>,
    pub refcount: u32,
    pub size_bytes: u64,
    pub last_access_at: u64,
    pub file_path: String,
}

/// Insert or refresh a recipe descriptor.
pub fn recipe_upsert(
    conn: &Connection,
    recipe_hash: &[u8; 32],
    group_id: &[u8; 16],
    author_peer_id: &str,
    created_at: u64,
    last_access_at: u64,
    blob: &[u8],
) -> Result<()> {
    conn.execute(
        "INSERT INTO recipes (recipe_hash, group_id, author_peer_id, created_at, last_access_at, blob)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(recipe_hash) DO UPDATE SET last_access_at = excluded.last_access_at",
        rusqlite::params![
            recipe_hash.as_slice(),
            group_id.as_slice(),
            author_peer_id,
            created_at as i64,
            last_access_at as i64,
            blob,
        ],
    )?;
    Ok(())
}

pub fn recipe_get(conn: &Connection, recipe_hash: &[u8; 32]) -> Result<Option<RecipeRow>> {
    conn.query_row(
        "SELECT recipe_hash, group_id, author_peer_id, created_at, last_access_at, blob
         FROM recipes WHERE recipe_hash = ?1",
        [recipe_hash.as_slice()],
        row_to_recipe,
    )
    .map(Some)
    .or_else(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => Ok(None),
        other => Err(DbError::Sqlite(other)),
    })
}

fn row_to_recipe(row: &rusqlite::Row) -> rusqlite::Result<RecipeRow> {
    Ok(RecipeRow {
        recipe_hash: row.get(0)?,
        group_id: row.get(1)?,
        author_peer_id: row.get(2)?,
        created_at: row.get::<_, i64>(3)? as u64,
        last_access_at: row.get::<_, i64>(4)? as u64,
        blob: row.get(5)?,
    })
}

#[derive(Debug, Clone)]
pub struct RecipeRow {
    pub recipe_hash: Vec<u8>,
    pub group_id: Vec<u8>,
    pub author_peer_id: String,
    pub created_at: u64,
    pub last_access_at: u64,
    pub blob: Vec<u8>,
}

/// Recipes whose `last_access_at` predates `cutoff` (§4.8: 48h TTL).
pub fn recipes_older_than(conn: &Connection, cutoff: u64) -> Result<Vec<RecipeRow>> {
    let mut stmt = conn.prepare(
        "SELECT recipe_hash, group_id, author_peer_id, created_at, last_access_at, blob
         FROM recipes WHERE last_access_at < ?1",
    )?;
    let rows = stmt
        .query_map([cutoff as i64], row_to_recipe)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn recipe_touch(conn: &Connection, recipe_hash: &[u8; 32], accessed_at: u64) -> Result<()> {
    conn.execute(
        "UPDATE recipes SET last_access_at = ?1 WHERE recipe_hash = ?2",
        rusqlite::params![accessed_at as i64, recipe_hash.as_slice()],
    )?;
    Ok(())
}

pub fn recipe_delete(conn: &Connection, recipe_hash: &[u8; 32]) -> Result<()> {
    conn.execute("DELETE FROM recipes WHERE recipe_hash = ?1", [recipe_hash.as_slice()])?;
    Ok(())
}

/// Drop any player_cache rows pointing at a recipe that no longer exists
/// (§4.8 invariant c: PlayerCache never references a missing recipe).
pub fn player_cache_delete_by_recipe(conn: &Connection, recipe_hash: &[u8; 32]) -> Result<()> {
    conn.execute(
        "DELETE FROM player_cache WHERE recipe_hash = ?1",
        [recipe_hash.as_slice()],
    )?;
    Ok(())
}

/// Record the recipe a peer was last observed applying, for proximity-sync
/// cache hits (§4.9/C10).
pub fn player_cache_upsert(
    conn: &Connection,
    group_id: &[u8; 16],
    peer_id: &str,
    recipe_hash: &[u8; 32],
    last_applied_at: u64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO player_cache (group_id, peer_id, recipe_hash, last_applied_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(group_id, peer_id) DO UPDATE SET
             recipe_hash = excluded.recipe_hash,
             last_applied_at = excluded.last_applied_at",
        rusqlite::params![
            group_id.as_slice(),
            peer_id,
            recipe_hash.as_slice(),
            last_applied_at as i64,
        ],
    )?;
    Ok(())
}

pub fn player_cache_get(
    conn: &Connection,
    group_id: &[u8; 16],
    peer_id: &str,
) -> Result<Option<PlayerCacheRow>> {
    conn.query_row(
        "SELECT peer_id, recipe_hash, last_applied_at FROM player_cache
         WHERE group_id = ?1 AND peer_id = ?2",
        rusqlite::params![group_id.as_slice(), peer_id],
        |row| {
            Ok(PlayerCacheRow {
                peer_id: row.get(0)?,
                recipe_hash: row.get(1)?,
                last_applied_at: row.get::<_, i64>(2)? as u64,
            })
        },
    )
    .map(Some)
    .or_else(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => Ok(None),
        other => Err(DbError::Sqlite(other)),
    })
}

#[derive(Debug, Clone)]
pub struct PlayerCacheRow {
    pub peer_id: String,
    pub recipe_hash: Vec<u8>,
    pub last_applied_at: u64,
}
