//! `create`, `join`, `leave`, and `resync` (§6).

use rand_core::RngCore;

use fyteclub_crypto::ed25519::VerifyingKey;
use fyteclub_db::queries::{phonebook, syncshells};
use fyteclub_types::PHONEBOOK_TOMBSTONE_TTL_SECS;

use crate::{DaemonContext, DaemonError, Result};

/// Create a new syncshell, with this profile as owner and host.
pub fn create(ctx: &DaemonContext, name: &str, now: u64) -> Result<String> {
    if name.trim().is_empty() {
        return Err(DaemonError::InvalidArgument("syncshell name must not be empty".into()));
    }

    let mut group_id = [0u8; 16];
    let mut group_secret = [0u8; 32];
    rand_core::OsRng.fill_bytes(&mut group_id);
    rand_core::OsRng.fill_bytes(&mut group_secret);

    syncshells::insert(&ctx.conn, &group_id, name, &group_secret, &ctx.identity.peer_id, now, true)?;
    Ok(hex::encode(group_id))
}

/// Join a syncshell by redeeming an invite link.
///
/// The issuer's verifying key is not carried out-of-band: it is recovered
/// directly from the envelope's `issuer_peer_id`, which is itself the hex
/// encoding of that key (the same self-certifying identifier scheme used
/// throughout this codebase). Only after that recovery is the envelope's
/// signature actually checked, so a tampered `issuer_peer_id` simply fails
/// verification against the wrong key rather than being trusted blind.
pub fn join(ctx: &DaemonContext, invite_text: &str, now: u64) -> Result<String> {
    let issuer_peer_id = peek_issuer_peer_id(invite_text)?;
    let issuer_key_bytes: [u8; 32] = hex::decode(&issuer_peer_id)
        .map_err(|e| DaemonError::InvalidArgument(format!("invite issuer id is not hex: {e}")))?
        .try_into()
        .map_err(|_| DaemonError::InvalidArgument("invite issuer id is not 32 bytes".into()))?;
    let issuer_verifying_key = VerifyingKey::from_bytes(issuer_key_bytes);

    let redeemed = fyteclub_invite::decode_invite(invite_text, &issuer_verifying_key, now)
        .map_err(|e| DaemonError::Crypto(e.to_string()))?;

    if syncshells::get(&ctx.conn, &redeemed.group_id)?.is_some() {
        return Err(DaemonError::InvalidArgument("already a member of this syncshell".into()));
    }

    let name = format!("syncshell-{}", &hex::encode(redeemed.group_id)[..8]);
    syncshells::insert(
        &ctx.conn,
        &redeemed.group_id,
        &name,
        &redeemed.group_secret,
        &redeemed.issuer_peer_id,
        now,
        false,
    )?;
    Ok(hex::encode(redeemed.group_id))
}

/// Parse just enough of an invite to recover its claimed issuer, without
/// yet trusting anything it says.
fn peek_issuer_peer_id(text: &str) -> Result<String> {
    use base64::Engine;

    let payload = text
        .strip_prefix("NOSTR:")
        .or_else(|| text.strip_prefix("BOOTSTRAP:"))
        .ok_or_else(|| DaemonError::InvalidArgument("invite must start with NOSTR: or BOOTSTRAP:".into()))?;
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| DaemonError::InvalidArgument(format!("invite is not valid base64url: {e}")))?;
    let envelope: fyteclub_invite::InviteEnvelope =
        serde_json::from_slice(&bytes).map_err(|e| DaemonError::InvalidArgument(format!("malformed invite: {e}")))?;
    Ok(envelope.issuer_peer_id)
}

/// Leave a syncshell: drops its row, cascading to phonebook entries and
/// tokens via the schema's foreign keys.
pub fn leave(ctx: &DaemonContext, group_id_hex: &str) -> Result<()> {
    let group_id = parse_group_id(group_id_hex)?;
    if syncshells::get(&ctx.conn, &group_id)?.is_none() {
        return Err(DaemonError::NotFound(format!("no such syncshell: {group_id_hex}")));
    }
    syncshells::delete(&ctx.conn, &group_id)?;
    Ok(())
}

/// Run the plugin-wide recovery plan once, across every syncshell (§4.11).
pub fn resync(ctx: &mut DaemonContext, now: u64) -> Result<String> {
    let plan = fyteclub_recovery::recovery_plan();
    let groups = syncshells::list(&ctx.conn)?;

    let mut purged = 0usize;
    for step in plan {
        match step {
            fyteclub_recovery::RecoveryStep::PurgeExpiredPhonebookEntries => {
                let cutoff = now.saturating_sub(PHONEBOOK_TOMBSTONE_TTL_SECS);
                for row in &groups {
                    let group_id: [u8; 16] = row.group_id.clone().try_into().unwrap_or([0u8; 16]);
                    purged += phonebook::purge_tombstones_older_than(&ctx.conn, &group_id, cutoff)?;
                }
            }
            fyteclub_recovery::RecoveryStep::ReinitContentStore => {
                let mut store = ctx.open_store()?;
                store.gc(now)?;
            }
            fyteclub_recovery::RecoveryStep::RetryTransport | fyteclub_recovery::RecoveryStep::RerunProximityOnce => {
                // Both steps belong to the external transport/scanner
                // collaborators (§6); this profile only records intent by
                // touching `last_sync_at` below.
            }
        }
    }

    for row in &groups {
        let group_id: [u8; 16] = row.group_id.clone().try_into().unwrap_or([0u8; 16]);
        syncshells::touch_last_sync(&ctx.conn, &group_id, now)?;
    }

    Ok(format!(
        "resynced {} syncshell(s), purged {purged} stale phonebook entr{}",
        groups.len(),
        if purged == 1 { "y" } else { "ies" }
    ))
}

fn parse_group_id(hex_str: &str) -> Result<[u8; 16]> {
    hex::decode(hex_str)
        .map_err(|e| DaemonError::InvalidArgument(format!("group id is not hex: {e}")))?
        .try_into()
        .map_err(|_| DaemonError::InvalidArgument("group id must be 16 bytes".into()))
}
