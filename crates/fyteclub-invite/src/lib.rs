//! # fyteclub-invite
//!
//! Invite encoding and redemption for syncshells (C2).
//!
//! An invite is a single textual token: `NOSTR:<base64url>` for a live
//! invite (carries a session offer, usable immediately) or
//! `BOOTSTRAP:<base64url>` for a stale group (no session offer; the
//! consumer must re-establish signaling out of band). The base64url
//! payload is the deterministic-JSON encoding of an [`InviteEnvelope`].

use base64::Engine;
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use fyteclub_crypto::ed25519::{SigningKey, VerifyingKey};
use fyteclub_crypto::{aead, kdf};
use fyteclub_types::{now_unix, GroupId, PeerId};

const NOSTR_PREFIX: &str = "NOSTR:";
const BOOTSTRAP_PREFIX: &str = "BOOTSTRAP:";

/// Default lifetime of a live invite (§4.2).
pub const LIVE_INVITE_DEFAULT_TTL_SECS: u64 = 24 * 3600;
/// Hard ceiling the producer enforces on live invites.
pub const LIVE_INVITE_MAX_TTL_SECS: u64 = 24 * 3600;

#[derive(Debug, thiserror::Error)]
pub enum InviteError {
    #[error("unrecognized invite prefix (expected NOSTR: or BOOTSTRAP:)")]
    UnknownPrefix,

    #[error("base64url decode error: {0}")]
    InvalidEncoding(String),

    #[error("malformed invite payload: {0}")]
    Malformed(String),

    #[error("invite expired at {expires_at}, now is {now}")]
    Expired { expires_at: u64, now: u64 },

    #[error("issuer signature did not verify")]
    InvalidSignature,

    #[error("live invite requested a TTL of {requested}s, exceeding the {max}s maximum")]
    TtlTooLong { requested: u64, max: u64 },

    #[error(transparent)]
    Crypto(#[from] fyteclub_crypto::CryptoError),
}

pub type Result<T> = std::result::Result<T, InviteError>;

/// The signed, partly-encrypted payload carried by an invite link.
///
/// `group_secret` never appears in the clear: it is AES-256-GCM-sealed
/// under a key derived (HKDF-SHA256, label [`kdf::LABEL_INVITE`]) from a
/// fresh `ephemeral_secret` minted for this invite alone, so a relay or
/// log that captures the envelope's other fields independently of the
/// full link never observes the group secret.
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InviteEnvelope {
    pub group_id: GroupId,
    pub ephemeral_secret: [u8; 32],
    pub group_secret_nonce: [u8; aead::NONCE_SIZE],
    pub group_secret_ciphertext: Vec<u8>,
    /// SDP offer or equivalent handshake blob. `None` for bootstrap invites.
    pub session_offer: Option<String>,
    pub relay_hints: Vec<String>,
    pub issuer_peer_id: PeerId,
    pub issued_at: u64,
    pub expires_at: u64,
    #[serde_as(as = "serde_with::Bytes")]
    pub issuer_signature: [u8; 64],
}

impl InviteEnvelope {
    /// Canonical bytes the issuer signs: every field but the signature,
    /// serialized with stable (declaration-order) key ordering.
    fn signed_bytes(&self) -> Vec<u8> {
        #[derive(Serialize)]
        struct Canonical<'a> {
            group_id: &'a GroupId,
            ephemeral_secret: &'a [u8; 32],
            group_secret_nonce: &'a [u8; aead::NONCE_SIZE],
            group_secret_ciphertext: &'a [u8],
            session_offer: &'a Option<String>,
            relay_hints: &'a [String],
            issuer_peer_id: &'a str,
            issued_at: u64,
            expires_at: u64,
        }
        serde_json::to_vec(&Canonical {
            group_id: &self.group_id,
            ephemeral_secret: &self.ephemeral_secret,
            group_secret_nonce: &self.group_secret_nonce,
            group_secret_ciphertext: &self.group_secret_ciphertext,
            session_offer: &self.session_offer,
            relay_hints: &self.relay_hints,
            issuer_peer_id: &self.issuer_peer_id,
            issued_at: self.issued_at,
            expires_at: self.expires_at,
        })
        .expect("InviteEnvelope fields are always JSON-serializable")
    }
}

/// A redeemed invite: the decrypted group secret plus the metadata needed
/// to either join signaling immediately (live) or re-bootstrap (stale).
pub struct RedeemedInvite {
    pub group_id: GroupId,
    pub group_secret: [u8; 32],
    pub session_offer: Option<String>,
    pub relay_hints: Vec<String>,
    pub issuer_peer_id: PeerId,
    pub issued_at: u64,
    pub expires_at: u64,
}

fn seal_group_secret(
    group_secret: &[u8; 32],
    group_id: &GroupId,
) -> Result<([u8; 32], [u8; aead::NONCE_SIZE], Vec<u8>)> {
    let mut ephemeral_secret = [0u8; 32];
    OsRng.fill_bytes(&mut ephemeral_secret);
    let invite_key = kdf::derive_group_key(&ephemeral_secret, kdf::LABEL_INVITE)?;
    let (nonce, ciphertext) = aead::seal(&invite_key, group_secret, group_id);
    Ok((ephemeral_secret, nonce, ciphertext))
}

fn open_group_secret(envelope: &InviteEnvelope) -> Result<[u8; 32]> {
    let invite_key = kdf::derive_group_key(&envelope.ephemeral_secret, kdf::LABEL_INVITE)?;
    let plaintext = aead::open(
        &invite_key,
        &envelope.group_secret_nonce,
        &envelope.group_secret_ciphertext,
        &envelope.group_id,
    )?;
    plaintext.try_into().map_err(|_| {
        InviteError::Malformed("group_secret ciphertext did not decrypt to 32 bytes".into())
    })
}

fn encode_envelope(prefix: &str, envelope: &InviteEnvelope) -> String {
    let json = serde_json::to_vec(envelope).expect("InviteEnvelope is always JSON-serializable");
    let b64 = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(json);
    format!("{prefix}{b64}")
}

fn decode_envelope(text: &str) -> Result<InviteEnvelope> {
    let payload = text
        .strip_prefix(NOSTR_PREFIX)
        .or_else(|| text.strip_prefix(BOOTSTRAP_PREFIX))
        .ok_or(InviteError::UnknownPrefix)?;
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| InviteError::InvalidEncoding(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| InviteError::Malformed(e.to_string()))
}

/// Create a live invite (`NOSTR:...`), carrying a session offer so the
/// consumer can begin signaling immediately. `ttl_secs` must not exceed
/// [`LIVE_INVITE_MAX_TTL_SECS`].
#[allow(clippy::too_many_arguments)]
pub fn create_live_invite(
    group_id: GroupId,
    group_secret: &[u8; 32],
    session_offer: String,
    relay_hints: Vec<String>,
    issuer_peer_id: PeerId,
    issuer_signing_key: &SigningKey,
    issued_at: u64,
    ttl_secs: u64,
) -> Result<String> {
    if ttl_secs > LIVE_INVITE_MAX_TTL_SECS {
        return Err(InviteError::TtlTooLong {
            requested: ttl_secs,
            max: LIVE_INVITE_MAX_TTL_SECS,
        });
    }
    let (ephemeral_secret, group_secret_nonce, group_secret_ciphertext) =
        seal_group_secret(group_secret, &group_id)?;
    let mut envelope = InviteEnvelope {
        group_id,
        ephemeral_secret,
        group_secret_nonce,
        group_secret_ciphertext,
        session_offer: Some(session_offer),
        relay_hints,
        issuer_peer_id,
        issued_at,
        expires_at: issued_at + ttl_secs,
        issuer_signature: [0u8; 64],
    };
    envelope.issuer_signature = issuer_signing_key.sign(&envelope.signed_bytes()).to_bytes();
    Ok(encode_envelope(NOSTR_PREFIX, &envelope))
}

/// Create a bootstrap invite (`BOOTSTRAP:...`) for a stale syncshell: no
/// session offer, so the consumer must initiate fresh signaling.
pub fn create_bootstrap_invite(
    group_id: GroupId,
    group_secret: &[u8; 32],
    relay_hints: Vec<String>,
    issuer_peer_id: PeerId,
    issuer_signing_key: &SigningKey,
    issued_at: u64,
    ttl_secs: u64,
) -> Result<String> {
    let (ephemeral_secret, group_secret_nonce, group_secret_ciphertext) =
        seal_group_secret(group_secret, &group_id)?;
    let mut envelope = InviteEnvelope {
        group_id,
        ephemeral_secret,
        group_secret_nonce,
        group_secret_ciphertext,
        session_offer: None,
        relay_hints,
        issuer_peer_id,
        issued_at,
        expires_at: issued_at + ttl_secs,
        issuer_signature: [0u8; 64],
    };
    envelope.issuer_signature = issuer_signing_key.sign(&envelope.signed_bytes()).to_bytes();
    Ok(encode_envelope(BOOTSTRAP_PREFIX, &envelope))
}

/// Decode and validate an invite link: checks the issuer signature and
/// expiry (`expires_at` itself is rejected, not just times after it), then
/// decrypts the group secret.
pub fn decode_invite(
    text: &str,
    issuer_verifying_key: &VerifyingKey,
    now: u64,
) -> Result<RedeemedInvite> {
    let envelope = decode_envelope(text)?;

    let sig = fyteclub_crypto::ed25519::Signature::from_bytes(envelope.issuer_signature);
    issuer_verifying_key
        .verify(&envelope.signed_bytes(), &sig)
        .map_err(|_| InviteError::InvalidSignature)?;

    if now >= envelope.expires_at {
        return Err(InviteError::Expired {
            expires_at: envelope.expires_at,
            now,
        });
    }

    let group_secret = open_group_secret(&envelope)?;

    Ok(RedeemedInvite {
        group_id: envelope.group_id,
        group_secret,
        session_offer: envelope.session_offer,
        relay_hints: envelope.relay_hints,
        issuer_peer_id: envelope.issuer_peer_id,
        issued_at: envelope.issued_at,
        expires_at: envelope.expires_at,
    })
}

/// Whether `last_sync_at` makes a syncshell stale enough that a live invite
/// must be refused in favor of a bootstrap invite (§4.2, S6).
pub fn is_stale(last_sync_at: u64, now: u64) -> bool {
    now.saturating_sub(last_sync_at) > fyteclub_types::STALE_GROUP_THRESHOLD_SECS
}

/// Convenience wrapper: stamps `issued_at` with the current wall clock.
pub fn create_live_invite_now(
    group_id: GroupId,
    group_secret: &[u8; 32],
    session_offer: String,
    relay_hints: Vec<String>,
    issuer_peer_id: PeerId,
    issuer_signing_key: &SigningKey,
) -> Result<String> {
    create_live_invite(
        group_id,
        group_secret,
        session_offer,
        relay_hints,
        issuer_peer_id,
        issuer_signing_key,
        now_unix(),
        LIVE_INVITE_DEFAULT_TTL_SECS,
    )
}
