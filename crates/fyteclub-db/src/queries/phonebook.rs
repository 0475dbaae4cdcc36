//! Phonebook entry queries (§4.6).
//!
//! This layer is a plain keyed store; the tombstone-wins merge rule and
//! Active→Stale→Tombstoned lifecycle are applied by the caller before
//! writing, not by the SQL here.

use rusqlite::Connection;

use crate::Result;

/// Insert or overwrite the entry for `(group_id, member_peer_id)`.
#[allow(clippy::too_many_arguments)]
pub fn upsert(
    conn: &Connection,
    group_id: &[u8; 16],
    member_peer_id: &str,
    display_name: &str,
    joined_at: u64,
    last_seen_at: u64,
    status: &str,
    tombstone_reason: Option<&str>,
    sequence: u64,
    author_peer_id: &str,
    signature: &[u8; 64],
) -> Result<()> {
    conn.execute(
        "INSERT INTO phonebook_entries
         (group_id, member_peer_id, display_name, joined_at, last_seen_at,
          status, tombstone_reason, sequence, author_peer_id, signature)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
         ON CONFLICT(group_id, member_peer_id) DO UPDATE SET
             display_name = excluded.display_name,
             joined_at = excluded.joined_at,
             last_seen_at = excluded.last_seen_at,
             status = excluded.status,
             tombstone_reason = excluded.tombstone_reason,
             sequence = excluded.sequence,
             author_peer_id = excluded.author_peer_id,
             signature = excluded.signature",
        rusqlite::params![
            group_id.as_slice(),
            member_peer_id,
            display_name,
            joined_at as i64,
            last_seen_at as i64,
            status,
            tombstone_reason,
            sequence as i64,
            author_peer_id,
            signature.as_slice(),
        ],
    )?;
    Ok(())
}

/// All entries for a syncshell.
pub fn list(conn: &Connection, group_id: &[u8; 16]) -> Result<Vec<PhonebookRow>> {
    let mut stmt = conn.prepare(
        "SELECT member_peer_id, display_name, joined_at, last_seen_at, status,
                tombstone_reason, sequence, author_peer_id, signature
         FROM phonebook_entries WHERE group_id = ?1",
    )?;

    let rows = stmt
        .query_map([group_id.as_slice()], row_to_entry)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// The single current entry for one member, if present.
pub fn get(
    conn: &Connection,
    group_id: &[u8; 16],
    member_peer_id: &str,
) -> Result<Option<PhonebookRow>> {
    conn.query_row(
        "SELECT member_peer_id, display_name, joined_at, last_seen_at, status,
                tombstone_reason, sequence, author_peer_id, signature
         FROM phonebook_entries WHERE group_id = ?1 AND member_peer_id = ?2",
        rusqlite::params![group_id.as_slice(), member_peer_id],
        row_to_entry,
    )
    .map(Some)
    .or_else(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => Ok(None),
        other => Err(other.into()),
    })
}

/// Purge tombstoned entries whose `last_seen_at` (the time the tombstone
/// was written) is older than `cutoff`.
pub fn purge_tombstones_older_than(
    conn: &Connection,
    group_id: &[u8; 16],
    cutoff: u64,
) -> Result<usize> {
    let affected = conn.execute(
        "DELETE FROM phonebook_entries
         WHERE group_id = ?1 AND status = 'tombstoned' AND last_seen_at < ?2",
        rusqlite::params![group_id.as_slice(), cutoff as i64],
    )?;
    Ok(affected)
}

fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<PhonebookRow> {
    Ok(PhonebookRow {
        member_peer_id: row.get(0)?,
        display_name: row.get(1)?,
        joined_at: row.get::<_, i64>(2)? as u64,
        last_seen_at: row.get::<_, i64>(3)? as u64,
        status: row.get(4)?,
        tombstone_reason: row.get(5)?,
        sequence: row.get::<_, i64>(6)? as u64,
        author_peer_id: row.get(7)?,
        signature: row.get(8)?,
    })
}

#[derive(Debug, Clone)]
pub struct PhonebookRow {
    pub member_peer_id: String,
    pub display_name: String,
    pub joined_at: u64,
    pub last_seen_at: u64,
    pub status: String,
    pub tombstone_reason: Option<String>,
    pub sequence: u64,
    pub author_peer_id: String,
    pub signature: Vec<u8>,
}
