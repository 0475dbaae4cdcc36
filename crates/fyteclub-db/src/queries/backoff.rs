//! Per-group reconnect backoff state (§4.5): 30s × 2^(n-1), capped at 1h;
//! 6 consecutive failures require a fresh invite.

use rusqlite::Connection;

use crate::{DbError, Result};

const BASE_DELAY_SECS: u64 = 30;
const MAX_DELAY_SECS: u64 = 3600;
const MAX_CONSECUTIVE_FAILURES: u32 = 6;

/// The delay before the next reconnect attempt after `consecutive_failures`
/// (0 means "never failed yet", so the first failure yields the base delay).
pub fn delay_for(consecutive_failures: u32) -> u64 {
    if consecutive_failures == 0 {
        return 0;
    }
    let shift = (consecutive_failures - 1).min(63);
    BASE_DELAY_SECS
        .saturating_mul(1u64 << shift)
        .min(MAX_DELAY_SECS)
}

pub fn get(conn: &Connection, group_id: &[u8; 16]) -> Result<Option<BackoffRow>> {
    conn.query_row(
        "SELECT consecutive_failures, next_retry_at, requires_fresh_invite
         FROM reconnect_backoff WHERE group_id = ?1",
        [group_id.as_slice()],
        |row| {
            Ok(BackoffRow {
                consecutive_failures: row.get::<_, i64>(0)? as u32,
                next_retry_at: row.get::<_, i64>(1)? as u64,
                requires_fresh_invite: row.get(2)?,
            })
        },
    )
    .map(Some)
    .or_else(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => Ok(None),
        other => Err(DbError::Sqlite(other)),
    })
}

/// Record a failed reconnect attempt at `now`, advancing the backoff state.
pub fn record_failure(conn: &Connection, group_id: &[u8; 16], now: u64) -> Result<BackoffRow> {
    let current = get(conn, group_id)?.unwrap_or(BackoffRow {
        consecutive_failures: 0,
        next_retry_at: 0,
        requires_fresh_invite: false,
    });

    let consecutive_failures = current.consecutive_failures + 1;
    let requires_fresh_invite = consecutive_failures >= MAX_CONSECUTIVE_FAILURES;
    let next_retry_at = now + delay_for(consecutive_failures);

    conn.execute(
        "INSERT INTO reconnect_backoff (group_id, consecutive_failures, next_retry_at, requires_fresh_invite)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(group_id) DO UPDATE SET
             consecutive_failures = excluded.consecutive_failures,
             next_retry_at = excluded.next_retry_at,
             requires_fresh_invite = excluded.requires_fresh_invite",
        rusqlite::params![
            group_id.as_slice(),
            consecutive_failures,
            next_retry_at as i64,
            requires_fresh_invite,
        ],
    )?;

    Ok(BackoffRow {
        consecutive_failures,
        next_retry_at,
        requires_fresh_invite,
    })
}

/// Reset backoff state after a successful reconnect or a fresh invite redemption.
pub fn reset(conn: &Connection, group_id: &[u8; 16]) -> Result<()> {
    conn.execute(
        "INSERT INTO reconnect_backoff (group_id, consecutive_failures, next_retry_at, requires_fresh_invite)
         VALUES (?1, 0, 0, 0)
         ON CONFLICT(group_id) DO UPDATE SET
             consecutive_failures = 0, next_retry_at = 0, requires_fresh_invite = 0",
        [group_id.as_slice()],
    )?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffRow {
    pub consecutive_failures: u32,
    pub next_retry_at: u64,
    pub requires_fresh_invite: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Connection {
        crate::open_memory().expect("open test db")
    }

    #[test]
    fn test_delay_progression() {
        assert_eq!(delay_for(0), 0);
        assert_eq!(delay_for(1), 30);
        assert_eq!(delay_for(2), 60);
        assert_eq!(delay_for(3), 120);
        assert_eq!(delay_for(10), 3600, "caps at 1 hour");
    }

    #[test]
    fn test_record_failure_accumulates() {
        let conn = test_db();
        let row = record_failure(&conn, &[1u8; 16], 0).expect("fail 1");
        assert_eq!(row.consecutive_failures, 1);
        assert_eq!(row.next_retry_at, 30);
        assert!(!row.requires_fresh_invite);
    }

    #[test]
    fn test_six_failures_requires_fresh_invite() {
        let conn = test_db();
        let mut row = record_failure(&conn, &[1u8; 16], 0).expect("fail");
        for i in 1..6 {
            row = record_failure(&conn, &[1u8; 16], i * 100).expect("fail");
        }
        assert!(row.requires_fresh_invite);
    }

    #[test]
    fn test_reset_clears_state() {
        let conn = test_db();
        record_failure(&conn, &[1u8; 16], 0).expect("fail");
        reset(&conn, &[1u8; 16]).expect("reset");
        let row = get(&conn, &[1u8; 16]).expect("get").expect("present");
        assert_eq!(row.consecutive_failures, 0);
        assert!(!row.requires_fresh_invite);
    }
}
