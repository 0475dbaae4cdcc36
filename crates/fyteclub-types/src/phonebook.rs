//! Phonebook entry types (§3, §4.6).

use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::PeerId;

/// Lifecycle state of a [`PhonebookEntry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    Active,
    /// Active but past the 24h `last_seen_at` TTL; not forwarded in gossip
    /// but kept for reconnect hints (§4.6 Eviction).
    Stale,
    Tombstoned,
}

/// A signed, replicated directory entry for one member of a syncshell.
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PhonebookEntry {
    pub member_peer_id: PeerId,
    pub display_name: String,
    pub joined_at: u64,
    pub last_seen_at: u64,
    pub status: MemberStatus,
    pub tombstone_reason: Option<String>,
    /// Monotonic per-author sequence number.
    pub sequence: u64,
    /// Who authored this entry: the member itself for Active entries, the
    /// acting host for Tombstones.
    pub author_peer_id: PeerId,
    #[serde_as(as = "serde_with::Bytes")]
    pub signature: [u8; 64],
}

impl PhonebookEntry {
    /// The canonical byte sequence the author signs over.
    pub fn signed_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(self.member_peer_id.as_bytes());
        buf.extend_from_slice(self.display_name.as_bytes());
        buf.extend_from_slice(&self.joined_at.to_be_bytes());
        buf.extend_from_slice(&self.last_seen_at.to_be_bytes());
        buf.push(match self.status {
            MemberStatus::Active => 0,
            MemberStatus::Stale => 1,
            MemberStatus::Tombstoned => 2,
        });
        if let Some(reason) = &self.tombstone_reason {
            buf.extend_from_slice(reason.as_bytes());
        }
        buf.extend_from_slice(&self.sequence.to_be_bytes());
        buf.extend_from_slice(self.author_peer_id.as_bytes());
        buf
    }

    pub fn is_tombstone(&self) -> bool {
        self.status == MemberStatus::Tombstoned
    }
}
