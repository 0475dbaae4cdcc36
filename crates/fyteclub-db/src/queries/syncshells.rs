//! Syncshell row queries.

use rusqlite::Connection;

use crate::Result;

/// Insert a newly created or newly joined syncshell.
pub fn insert(
    conn: &Connection,
    group_id: &[u8; 16],
    name: &str,
    group_secret: &[u8; 32],
    owner_peer_id: &str,
    created_at: u64,
    is_owner: bool,
) -> Result<()> {
    conn.execute(
        "INSERT INTO syncshells
         (group_id, name, group_secret, owner_peer_id, created_at, is_owner, is_active, last_sync_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, 0)",
        rusqlite::params![
            group_id.as_slice(),
            name,
            group_secret.as_slice(),
            owner_peer_id,
            created_at as i64,
            is_owner,
        ],
    )?;
    Ok(())
}

/// List all syncshells, most recently synced first.
pub fn list(conn: &Connection) -> Result<Vec<SyncshellRow>> {
    let mut stmt = conn.prepare(
        "SELECT group_id, name, group_secret, owner_peer_id, created_at,
                is_owner, is_active, last_sync_at, enable_relay
         FROM syncshells ORDER BY last_sync_at DESC",
    )?;

    let rows = stmt
        .query_map([], row_to_syncshell)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Fetch one syncshell by `group_id`.
pub fn get(conn: &Connection, group_id: &[u8; 16]) -> Result<Option<SyncshellRow>> {
    conn.query_row(
        "SELECT group_id, name, group_secret, owner_peer_id, created_at,
                is_owner, is_active, last_sync_at, enable_relay
         FROM syncshells WHERE group_id = ?1",
        [group_id.as_slice()],
        row_to_syncshell,
    )
    .map(Some)
    .or_else(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => Ok(None),
        other => Err(other.into()),
    })
}

/// Record a successful sync.
pub fn touch_last_sync(conn: &Connection, group_id: &[u8; 16], last_sync_at: u64) -> Result<()> {
    conn.execute(
        "UPDATE syncshells SET last_sync_at = ?1 WHERE group_id = ?2",
        rusqlite::params![last_sync_at as i64, group_id.as_slice()],
    )?;
    Ok(())
}

/// Leave a syncshell: drops the row (and, via `ON DELETE CASCADE`, its
/// phonebook entries and tokens).
pub fn delete(conn: &Connection, group_id: &[u8; 16]) -> Result<()> {
    conn.execute(
        "DELETE FROM syncshells WHERE group_id = ?1",
        [group_id.as_slice()],
    )?;
    Ok(())
}

fn row_to_syncshell(row: &rusqlite::Row) -> rusqlite::Result<SyncshellRow> {
    Ok(SyncshellRow {
        group_id: row.get(0)?,
        name: row.get(1)?,
        group_secret: row.get(2)?,
        owner_peer_id: row.get(3)?,
        created_at: row.get::<_, i64>(4)? as u64,
        is_owner: row.get(5)?,
        is_active: row.get(6)?,
        last_sync_at: row.get::<_, i64>(7)? as u64,
        enable_relay: row.get(8)?,
    })
}

#[derive(Debug, Clone)]
pub struct SyncshellRow {
    pub group_id: Vec<u8>,
    pub name: String,
    pub group_secret: Vec<u8>,
    pub owner_peer_id: String,
    pub created_at: u64,
    pub is_owner: bool,
    pub is_active: bool,
    pub last_sync_at: u64,
    pub enable_relay: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Connection {
        crate::open_memory().expect("open test db")
    }

    #[test]
    fn test_insert_and_get() {
        let conn = test_db();
        insert(&conn, &[1u8; 16], "Raid Team", &[2u8; 32], "owner", 1000, true).expect("insert");

        let row = get(&conn, &[1u8; 16]).expect("get").expect("present");
        assert_eq!(row.name, "Raid Team");
        assert!(row.is_owner);
        assert!(row.is_active);
    }

    #[test]
    fn test_touch_last_sync() {
        let conn = test_db();
        insert(&conn, &[1u8; 16], "Raid Team", &[2u8; 32], "owner", 1000, false).expect("insert");
        touch_last_sync(&conn, &[1u8; 16], 5000).expect("touch");

        let row = get(&conn, &[1u8; 16]).expect("get").expect("present");
        assert_eq!(row.last_sync_at, 5000);
    }

    #[test]
    fn test_get_missing_returns_none() {
        let conn = test_db();
        assert!(get(&conn, &[9u8; 16]).expect("get").is_none());
    }

    #[test]
    fn test_delete() {
        let conn = test_db();
        insert(&conn, &[1u8; 16], "Raid Team", &[2u8; 32], "owner", 1000, false).expect("insert");
        delete(&conn, &[1u8; 16]).expect("delete");
        assert!(get(&conn, &[1u8; 16]).expect("get").is_none());
    }
}
