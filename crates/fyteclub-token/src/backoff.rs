//! Reconnect backoff policy on top of `fyteclub-db`'s persisted state
//! (§4.5). The database layer stores the counters; this module answers
//! "is a reconnect allowed right now" and advances state on outcome.

use rusqlite::Connection;

use fyteclub_db::queries::backoff as db_backoff;
use fyteclub_types::GroupId;

/// Whether a reconnect attempt for a group may proceed right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Proceed with the reconnect attempt.
    Allowed,
    /// Wait until `retry_at` before attempting again.
    Wait { retry_at: u64 },
    /// Too many consecutive failures; a fresh invite must be redeemed
    /// before any further reconnect attempt.
    RequiresFreshInvite,
}

/// Decide whether a reconnect attempt for `group_id` is allowed at `now`.
pub fn check(conn: &Connection, group_id: &GroupId, now: u64) -> fyteclub_db::Result<Gate> {
    let Some(state) = db_backoff::get(conn, group_id)? else {
        return Ok(Gate::Allowed);
    };
    if state.requires_fresh_invite {
        return Ok(Gate::RequiresFreshInvite);
    }
    if now < state.next_retry_at {
        return Ok(Gate::Wait {
            retry_at: state.next_retry_at,
        });
    }
    Ok(Gate::Allowed)
}

/// Record a failed reconnect attempt, advancing the backoff counter.
pub fn record_failure(conn: &Connection, group_id: &GroupId, now: u64) -> fyteclub_db::Result<Gate> {
    let row = db_backoff::record_failure(conn, group_id, now)?;
    if row.requires_fresh_invite {
        return Ok(Gate::RequiresFreshInvite);
    }
    Ok(Gate::Wait {
        retry_at: row.next_retry_at,
    })
}

/// Record a successful reconnect (or a freshly redeemed invite), clearing
/// the backoff state entirely.
pub fn record_success(conn: &Connection, group_id: &GroupId) -> fyteclub_db::Result<()> {
    db_backoff::reset(conn, group_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Connection {
        fyteclub_db::open_memory().expect("open test db")
    }

    #[test]
    fn test_allowed_with_no_prior_failures() {
        let conn = test_db();
        assert_eq!(check(&conn, &[1u8; 16], 0).expect("check"), Gate::Allowed);
    }

    #[test]
    fn test_wait_after_one_failure() {
        let conn = test_db();
        record_failure(&conn, &[1u8; 16], 0).expect("fail");
        assert_eq!(
            check(&conn, &[1u8; 16], 10).expect("check"),
            Gate::Wait { retry_at: 30 }
        );
        assert_eq!(check(&conn, &[1u8; 16], 30).expect("check"), Gate::Allowed);
    }

    #[test]
    fn test_requires_fresh_invite_after_six_failures() {
        let conn = test_db();
        for i in 0..6 {
            record_failure(&conn, &[1u8; 16], i * 100).expect("fail");
        }
        assert_eq!(
            check(&conn, &[1u8; 16], 999_999).expect("check"),
            Gate::RequiresFreshInvite
        );
    }

    #[test]
    fn test_success_resets_state() {
        let conn = test_db();
        record_failure(&conn, &[1u8; 16], 0).expect("fail");
        record_success(&conn, &[1u8; 16]).expect("success");
        assert_eq!(check(&conn, &[1u8; 16], 0).expect("check"), Gate::Allowed);
    }
}
