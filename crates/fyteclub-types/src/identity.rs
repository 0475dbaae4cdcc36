//! Identity, syncshell, and membership token types (§3).

use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::{GroupId, PeerId};

/// A local process's Ed25519 public identity.
///
/// Exactly one per process; persists for the plugin's lifetime. The secret
/// key itself lives in `fyteclub-crypto::ed25519::SigningKey` and is never
/// part of this type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerIdentity {
    /// 32-byte Ed25519 public key.
    pub public_key: [u8; 32],
    /// Lowercase hex of `public_key`.
    pub peer_id: PeerId,
}

impl PeerIdentity {
    pub fn new(public_key: [u8; 32]) -> Self {
        Self {
            public_key,
            peer_id: hex::encode(public_key),
        }
    }
}

/// An invitation-only peer group.
///
/// Immutable once created: `group_id` and `group_secret` are fixed at
/// creation/join time and never rotate within the group's lifetime.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Syncshell {
    pub group_id: GroupId,
    pub name: String,
    pub group_secret: [u8; 32],
    pub owner_peer_id: PeerId,
    pub created_at: u64,
}

/// Member-local mutable state for a joined syncshell, held alongside the
/// immutable [`Syncshell`] tuple.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncshellMemberState {
    pub is_owner: bool,
    pub is_active: bool,
    pub last_sync_at: u64,
    pub enable_relay: bool,
}

impl Default for SyncshellMemberState {
    fn default() -> Self {
        Self {
            is_owner: false,
            is_active: true,
            last_sync_at: 0,
            enable_relay: false,
        }
    }
}

/// Capabilities a [`MemberToken`] grants its holder.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCapabilities {
    /// May issue tokens and tombstones (i.e. currently acting as host).
    pub can_host: bool,
    /// May relay mod content on behalf of other members (disabled by default;
    /// the spec's non-goals exclude transitive relay for non-members, but a
    /// member relaying for fellow members is in scope).
    pub can_relay: bool,
}

/// A signed membership credential (§4.5).
///
/// Signed by the issuer's Ed25519 secret key over every other field.
/// Never transmitted to non-issuers unencrypted.
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MemberToken {
    pub group_id: GroupId,
    pub member_peer_id: PeerId,
    pub issued_at: u64,
    pub expires_at: u64,
    pub capabilities: TokenCapabilities,
    pub issuer_peer_id: PeerId,
    #[serde_as(as = "serde_with::Bytes")]
    pub issuer_signature: [u8; 64],
}

impl MemberToken {
    /// The canonical byte sequence the issuer signs over: every field except
    /// the signature itself, in a fixed order.
    pub fn signed_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&self.group_id);
        buf.extend_from_slice(self.member_peer_id.as_bytes());
        buf.extend_from_slice(&self.issued_at.to_be_bytes());
        buf.extend_from_slice(&self.expires_at.to_be_bytes());
        buf.push(u8::from(self.capabilities.can_host));
        buf.push(u8::from(self.capabilities.can_relay));
        buf.extend_from_slice(self.issuer_peer_id.as_bytes());
        buf
    }

    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.expires_at
    }
}
