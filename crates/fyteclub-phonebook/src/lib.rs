//! # fyteclub-phonebook
//!
//! The replicated, signed member directory for one syncshell (§4.6).
//!
//! Grounded on the same mutable, sequence-numbered, signature-verified
//! record shape used for anti-replay elsewhere in this codebase, here
//! specialized to a tombstone-wins merge rule instead of plain sequence
//! supremacy.

pub mod debounce;
pub mod snapshot;

use std::collections::HashMap;

use fyteclub_crypto::ed25519::{Signature, VerifyingKey};
use fyteclub_types::phonebook::{MemberStatus, PhonebookEntry};
use fyteclub_types::{PeerId, PHONEBOOK_ACTIVE_TTL_SECS, PHONEBOOK_TOMBSTONE_TTL_SECS};

#[derive(Debug, thiserror::Error)]
pub enum PhonebookError {
    #[error("entry signature failed to verify")]
    InvalidSignature,

    #[error("tombstone author {author_peer_id} is not a current or historical host")]
    TombstoneAuthorNotHost { author_peer_id: PeerId },
}

pub type Result<T> = std::result::Result<T, PhonebookError>;

/// Bound on the number of entries exchanged in a full snapshot gossip
/// (§4.6: "bounded to the latest 500 entries").
pub const SNAPSHOT_MAX_ENTRIES: usize = 500;

/// Members must re-publish their own entry at least this often.
pub const ENTRY_REFRESH_INTERVAL_SECS: u64 = 600;

/// The replicated directory for a single syncshell.
#[derive(Default)]
pub struct Phonebook {
    entries: HashMap<PeerId, PhonebookEntry>,
}

impl Phonebook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an incoming entry under the §4.6 merge rules. `is_host` reports
    /// whether `entry.author_peer_id` is a current or historical host of
    /// this syncshell, required before a tombstone is honored.
    ///
    /// Returns `true` if the incoming entry replaced the local one.
    pub fn merge(
        &mut self,
        entry: PhonebookEntry,
        author_verifying_key: &VerifyingKey,
        is_host: impl Fn(&PeerId) -> bool,
    ) -> Result<bool> {
        let sig = Signature::from_bytes(entry.signature);
        author_verifying_key
            .verify(&entry.signed_bytes(), &sig)
            .map_err(|_| PhonebookError::InvalidSignature)?;

        if entry.is_tombstone() && !is_host(&entry.author_peer_id) {
            return Err(PhonebookError::TombstoneAuthorNotHost {
                author_peer_id: entry.author_peer_id,
            });
        }

        let Some(local) = self.entries.get(&entry.member_peer_id) else {
            self.entries.insert(entry.member_peer_id.clone(), entry);
            return Ok(true);
        };

        if entry.is_tombstone() {
            if entry.sequence >= local.sequence {
                self.entries.insert(entry.member_peer_id.clone(), entry);
                return Ok(true);
            }
            return Ok(false);
        }

        if should_replace(local, &entry) {
            self.entries.insert(entry.member_peer_id.clone(), entry);
            return Ok(true);
        }

        Ok(false)
    }

    pub fn get(&self, member_peer_id: &str) -> Option<&PhonebookEntry> {
        self.entries.get(member_peer_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Demote stale Active entries and purge old Tombstones (§4.6 Eviction).
    pub fn evict(&mut self, now: u64) {
        for entry in self.entries.values_mut() {
            if entry.status == MemberStatus::Active
                && now.saturating_sub(entry.last_seen_at) > PHONEBOOK_ACTIVE_TTL_SECS
            {
                entry.status = MemberStatus::Stale;
            }
        }
        self.entries.retain(|_, entry| {
            !(entry.status == MemberStatus::Tombstoned
                && now.saturating_sub(entry.last_seen_at) > PHONEBOOK_TOMBSTONE_TTL_SECS)
        });
    }

    /// All entries except Stale ones, newest-`last_seen_at`-first, bounded to
    /// [`SNAPSHOT_MAX_ENTRIES`] (§4.6: gossip does not forward Stale entries).
    pub fn gossip_snapshot(&self) -> Vec<PhonebookEntry> {
        let mut entries: Vec<PhonebookEntry> = self
            .entries
            .values()
            .filter(|e| e.status != MemberStatus::Stale)
            .cloned()
            .collect();
        entries.sort_by_key(|e| std::cmp::Reverse(e.last_seen_at));
        entries.truncate(SNAPSHOT_MAX_ENTRIES);
        entries
    }
}

/// Tie-break order for two non-tombstone candidate entries (§4.6 rule 3):
/// greater `sequence` wins; tie-break by greater `last_seen_at`; further
/// tie-break by lexicographically smaller `author_peer_id`.
fn should_replace(local: &PhonebookEntry, incoming: &PhonebookEntry) -> bool {
    match incoming.sequence.cmp(&local.sequence) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => match incoming.last_seen_at.cmp(&local.last_seen_at) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Less => false,
            std::cmp::Ordering::Equal => incoming.author_peer_id < local.author_peer_id,
        },
    }
}
