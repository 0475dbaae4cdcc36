//! The `ProtocolMessage` frame envelope, content-hash dedup, and per-author
//! sequence ordering (§4.4).
//!
//! ## Wire format
//!
//! ```text
//! ProtocolMessage {
//!     kind:            u8,        // message kind (1-13)
//!     group_id:        [u8; 16],
//!     author_peer_id:  String,
//!     sequence:        u64,       // monotonic per (group_id, author, kind)
//!     timestamp:       u64,       // unix seconds
//!     payload:         Vec<u8>,   // CBOR-encoded TypedMessage
//! }
//! ```

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use fyteclub_crypto::hash::sha256_truncated_16;
use fyteclub_types::{now_unix, GroupId, PeerId};

use crate::cbor;
use crate::messages::TypedMessage;
use crate::TransportError;

/// Per §4.4: dedup set capacity and gap-buffer bounds.
pub const DEDUP_CACHE_CAPACITY: usize = 1024;
pub const SEQUENCE_GAP_BUFFER_MAX_FRAMES: usize = 64;
pub const SEQUENCE_GAP_BUFFER_MAX_AGE_SECS: u64 = 5;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProtocolMessage {
    pub kind: u8,
    pub group_id: GroupId,
    pub author_peer_id: PeerId,
    pub sequence: u64,
    pub timestamp: u64,
    pub payload: Vec<u8>,
}

impl ProtocolMessage {
    /// Build a frame from a typed payload, stamping the current wall clock.
    pub fn new(
        group_id: GroupId,
        author_peer_id: PeerId,
        sequence: u64,
        msg: &TypedMessage,
    ) -> Result<Self, TransportError> {
        let payload = cbor::to_vec(msg)?;
        Ok(Self {
            kind: msg.kind(),
            group_id,
            author_peer_id,
            sequence,
            timestamp: now_unix(),
            payload,
        })
    }

    pub fn decode_payload(&self) -> Result<TypedMessage, TransportError> {
        cbor::from_slice(&self.payload)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, TransportError> {
        cbor::to_vec(self)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, TransportError> {
        cbor::from_slice(data)
    }

    /// SHA-256 of the whole frame, truncated to 16 bytes (§4.4 dedup hash).
    pub fn dedup_hash(&self) -> [u8; 16] {
        let bytes = self.to_bytes().expect("a constructed ProtocolMessage always serializes");
        sha256_truncated_16(&bytes)
    }
}

/// Per-session dedup set bounded to [`DEDUP_CACHE_CAPACITY`] entries,
/// evicting the oldest admitted hash once full.
#[derive(Default)]
pub struct DedupCache {
    order: VecDeque<[u8; 16]>,
    seen: HashSet<[u8; 16]>,
}

impl DedupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `hash` was newly admitted (not a duplicate).
    pub fn admit(&mut self, hash: [u8; 16]) -> bool {
        if !self.seen.insert(hash) {
            return false;
        }
        self.order.push_back(hash);
        if self.order.len() > DEDUP_CACHE_CAPACITY {
            if let Some(evicted) = self.order.pop_front() {
                self.seen.remove(&evicted);
            }
        }
        true
    }
}

type SequenceKey = (GroupId, PeerId, u8);

/// A buffered frame awaiting an earlier gap: (sequence, buffered-at, frame).
type PendingFrame = (u64, u64, ProtocolMessage);

/// Tracks the next-expected `sequence` per `(group_id, author_peer_id, kind)`
/// and buffers out-of-order frames up to the §4.4 gap bounds, holding onto
/// the buffered frames themselves so a gap-filling delivery can release them.
#[derive(Default)]
pub struct SequenceTracker {
    next_expected: std::collections::HashMap<SequenceKey, u64>,
    pending: std::collections::HashMap<SequenceKey, Vec<PendingFrame>>,
}

/// Outcome of admitting a frame through the sequence tracker.
#[derive(Debug)]
pub enum Admission {
    /// Deliver immediately, in `sequence` order: the admitted frame followed
    /// by any previously-buffered frames this one made contiguous.
    Deliver(Vec<ProtocolMessage>),
    /// Buffered pending an earlier gap; not yet deliverable.
    Buffered,
    /// The gap exceeded the buffer bound; the tracker has skipped ahead.
    GapDropped,
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a frame, returning it (and any now-contiguous buffered frames)
    /// for delivery, or `Buffered`/`GapDropped` if it is not yet deliverable.
    pub fn admit(&mut self, msg: ProtocolMessage, now: u64) -> Admission {
        let key = (msg.group_id, msg.author_peer_id.clone(), msg.kind);
        let expected = *self.next_expected.get(&key).unwrap_or(&0);

        if msg.sequence < expected {
            return Admission::GapDropped;
        }

        if msg.sequence == expected {
            let mut deliverable = vec![msg];
            let mut next = expected + 1;
            if let Some(pending) = self.pending.get_mut(&key) {
                while let Some(pos) = pending.iter().position(|(seq, _, _)| *seq == next) {
                    let (_, _, frame) = pending.remove(pos);
                    deliverable.push(frame);
                    next += 1;
                }
                if pending.is_empty() {
                    self.pending.remove(&key);
                }
            }
            self.next_expected.insert(key, next);
            return Admission::Deliver(deliverable);
        }

        let pending = self.pending.entry(key.clone()).or_default();
        pending.push((msg.sequence, now, msg));

        if pending.len() >= SEQUENCE_GAP_BUFFER_MAX_FRAMES
            || pending
                .iter()
                .any(|(_, buffered_at, _)| now.saturating_sub(*buffered_at) > SEQUENCE_GAP_BUFFER_MAX_AGE_SECS)
        {
            let max_seen = pending.iter().map(|(seq, _, _)| *seq).max().unwrap_or(expected);
            self.pending.remove(&key);
            self.next_expected.insert(key, max_seen + 1);
            return Admission::GapDropped;
        }

        Admission::Buffered
    }
}
