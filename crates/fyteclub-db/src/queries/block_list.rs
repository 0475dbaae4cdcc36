//! Process-wide blocked-peer list (blocking is local, not group-scoped).

use rusqlite::Connection;

use crate::Result;

pub fn block(conn: &Connection, peer_id: &str, blocked_at: u64) -> Result<()> {
    conn.execute(
        "INSERT INTO block_list (peer_id, blocked_at) VALUES (?1, ?2)
         ON CONFLICT(peer_id) DO UPDATE SET blocked_at = excluded.blocked_at",
        rusqlite::params![peer_id, blocked_at as i64],
    )?;
    Ok(())
}

pub fn unblock(conn: &Connection, peer_id: &str) -> Result<()> {
    conn.execute("DELETE FROM block_list WHERE peer_id = ?1", [peer_id])?;
    Ok(())
}

pub fn is_blocked(conn: &Connection, peer_id: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM block_list WHERE peer_id = ?1",
        [peer_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn list(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT peer_id FROM block_list ORDER BY blocked_at DESC")?;
    let rows = stmt
        .query_map([], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Connection {
        crate::open_memory().expect("open test db")
    }

    #[test]
    fn test_block_and_check() {
        let conn = test_db();
        assert!(!is_blocked(&conn, "mallory").expect("check"));
        block(&conn, "mallory", 1000).expect("block");
        assert!(is_blocked(&conn, "mallory").expect("check"));
    }

    #[test]
    fn test_unblock() {
        let conn = test_db();
        block(&conn, "mallory", 1000).expect("block");
        unblock(&conn, "mallory").expect("unblock");
        assert!(!is_blocked(&conn, "mallory").expect("check"));
    }

    #[test]
    fn test_list() {
        let conn = test_db();
        block(&conn, "mallory", 1000).expect("block");
        block(&conn, "eve", 2000).expect("block");
        assert_eq!(list(&conn).expect("list"), vec!["eve", "mallory"]);
    }
}
