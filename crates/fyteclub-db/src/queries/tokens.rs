//! Membership token queries (§4.5).
//!
//! `capabilities` is stored as a JSON-encoded `TokenCapabilities`; this
//! crate does not depend on `fyteclub-types`' capability type directly so
//! the column stays a plain string at the SQL boundary.

use rusqlite::Connection;

use crate::{DbError, Result};

/// Insert or overwrite the token held for one member of a group.
#[allow(clippy::too_many_arguments)]
pub fn upsert(
    conn: &Connection,
    group_id: &[u8; 16],
    member_peer_id: &str,
    issued_at: u64,
    expires_at: u64,
    capabilities_json: &str,
    issuer_signature: &[u8; 64],
    encrypted_blob: &[u8],
) -> Result<()> {
    conn.execute(
        "INSERT INTO tokens
         (group_id, member_peer_id, issued_at, expires_at, capabilities,
          issuer_signature, encrypted_blob)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(group_id, member_peer_id) DO UPDATE SET
             issued_at = excluded.issued_at,
             expires_at = excluded.expires_at,
             capabilities = excluded.capabilities,
             issuer_signature = excluded.issuer_signature,
             encrypted_blob = excluded.encrypted_blob",
        rusqlite::params![
            group_id.as_slice(),
            member_peer_id,
            issued_at as i64,
            expires_at as i64,
            capabilities_json,
            issuer_signature.as_slice(),
            encrypted_blob,
        ],
    )?;
    Ok(())
}

pub fn get(
    conn: &Connection,
    group_id: &[u8; 16],
    member_peer_id: &str,
) -> Result<Option<TokenRow>> {
    conn.query_row(
        "SELECT member_peer_id, issued_at, expires_at, capabilities,
                issuer_signature, encrypted_blob
         FROM tokens WHERE group_id = ?1 AND member_peer_id = ?2",
        rusqlite::params![group_id.as_slice(), member_peer_id],
        row_to_token,
    )
    .map(Some)
    .or_else(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => Ok(None),
        other => Err(DbError::Sqlite(other)),
    })
}

pub fn delete(conn: &Connection, group_id: &[u8; 16], member_peer_id: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM tokens WHERE group_id = ?1 AND member_peer_id = ?2",
        rusqlite::params![group_id.as_slice(), member_peer_id],
    )?;
    Ok(())
}

/// Tokens for a group expiring at or before `cutoff`.
pub fn list_expiring(conn: &Connection, group_id: &[u8; 16], cutoff: u64) -> Result<Vec<TokenRow>> {
    let mut stmt = conn.prepare(
        "SELECT member_peer_id, issued_at, expires_at, capabilities,
                issuer_signature, encrypted_blob
         FROM tokens WHERE group_id = ?1 AND expires_at <= ?2",
    )?;

    let rows = stmt
        .query_map(rusqlite::params![group_id.as_slice(), cutoff as i64], row_to_token)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn row_to_token(row: &rusqlite::Row) -> rusqlite::Result<TokenRow> {
    Ok(TokenRow {
        member_peer_id: row.get(0)?,
        issued_at: row.get::<_, i64>(1)? as u64,
        expires_at: row.get::<_, i64>(2)? as u64,
        capabilities_json: row.get(3)?,
        issuer_signature: row.get(4)?,
        encrypted_blob: row.get(5)?,
    })
}

#[derive(Debug, Clone)]
pub struct TokenRow {
    pub member_peer_id: String,
    pub issued_at: u64,
    pub expires_at: u64,
    pub capabilities_json: String,
    pub issuer_signature: Vec<u8>,
    pub encrypted_blob: Vec<u8>,
}
