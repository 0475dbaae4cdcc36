//! Mod transfer (§4.9): outbound announce/deliver decisions, inbound
//! recipe-then-chunks fetch with backpressure, and per-peer rate shaping.

use std::collections::{HashSet, VecDeque};

use fyteclub_types::{Hash, PeerId};

/// Outstanding-chunks window per inbound transfer (§4.9).
pub const OUTSTANDING_CHUNK_WINDOW: usize = 16;

/// Cooldown applied to a peer after a chunk verification failure aborts
/// its transfer.
pub const COOLDOWN_SECS: u64 = 60;

/// Default outbound bandwidth cap per peer session.
pub const OUTBOUND_BANDWIDTH_CAP_BYTES_PER_SEC: u64 = 8 * 1024 * 1024;

/// Global cap on concurrent inbound recipe transfers.
pub const MAX_CONCURRENT_INBOUND_TRANSFERS: usize = 4;

/// What the outbound side should send for one peer this sync pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutboundPlan {
    /// A `RecipeAnnounce` is always sent, as a liveness signal the peer can
    /// use to refresh its own recall cache.
    pub send_announce: bool,
    /// Whether we expect (and should be ready to serve) a follow-up
    /// `RecipeRequest`/`ChunkRequest` exchange.
    pub expect_followup: bool,
}

/// Decide what to send a peer given what we last successfully delivered to
/// them (our own `recall(peer_id)`) and our current recipe hash.
pub fn plan_outbound(remembered: Option<Hash>, current_recipe_hash: Hash) -> OutboundPlan {
    OutboundPlan {
        send_announce: true,
        expect_followup: remembered != Some(current_recipe_hash),
    }
}

/// Token-bucket limiter for the 8 MiB/s outbound cap, one per peer session.
pub struct OutboundRateLimiter {
    cap_bytes_per_sec: u64,
    window_start: u64,
    bytes_in_window: u64,
}

impl OutboundRateLimiter {
    pub fn new(cap_bytes_per_sec: u64) -> Self {
        Self {
            cap_bytes_per_sec,
            window_start: 0,
            bytes_in_window: 0,
        }
    }

    pub fn default_cap() -> Self {
        Self::new(OUTBOUND_BANDWIDTH_CAP_BYTES_PER_SEC)
    }

    /// Whether `bytes` may be sent now without exceeding the per-second cap.
    /// Consumes the budget if allowed.
    pub fn try_consume(&mut self, bytes: u64, now: u64) -> bool {
        if now != self.window_start {
            self.window_start = now;
            self.bytes_in_window = 0;
        }
        if self.bytes_in_window + bytes > self.cap_bytes_per_sec {
            return false;
        }
        self.bytes_in_window += bytes;
        true
    }
}

/// Result of delivering one chunk to an in-progress inbound transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// More chunks to request, up to the outstanding window.
    RequestMore(Vec<Hash>),
    /// Every chunk has arrived; hand the recipe to the mod applier.
    Complete,
    /// Verification failed; the whole transfer is abandoned and the peer
    /// should be cooled down until `cooldown_until`.
    Aborted { cooldown_until: u64 },
}

#[derive(Debug)]
enum State {
    AwaitingAnnounce,
    AwaitingDeliver { recipe_hash: Hash },
    FetchingChunks {
        recipe_hash: Hash,
        missing: VecDeque<Hash>,
        in_flight: HashSet<Hash>,
    },
    Complete { recipe_hash: Hash },
    Aborted { cooldown_until: u64 },
}

/// One peer's inbound transfer: recipe announce → request → chunk fetch →
/// completion, with a bounded outstanding-chunks window (§4.9).
pub struct InboundTransfer {
    peer_id: PeerId,
    state: State,
}

impl InboundTransfer {
    pub fn new(peer_id: PeerId) -> Self {
        Self {
            peer_id,
            state: State::AwaitingAnnounce,
        }
    }

    pub fn peer_id(&self) -> &str {
        &self.peer_id
    }

    pub fn is_aborted_until(&self, now: u64) -> Option<u64> {
        match self.state {
            State::Aborted { cooldown_until } if now < cooldown_until => Some(cooldown_until),
            _ => None,
        }
    }

    /// The recipe hash currently being awaited or fetched, if any.
    pub fn recipe_hash(&self) -> Option<Hash> {
        match &self.state {
            State::AwaitingDeliver { recipe_hash }
            | State::FetchingChunks { recipe_hash, .. }
            | State::Complete { recipe_hash } => Some(*recipe_hash),
            State::AwaitingAnnounce | State::Aborted { .. } => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.state, State::Complete { .. })
    }

    /// A `RecipeAnnounce` arrived. Returns `true` if a `RecipeRequest`
    /// should be sent (i.e. our recall cache doesn't already match).
    pub fn on_recipe_announce(&mut self, announced_hash: Hash, recalled: Option<Hash>) -> bool {
        if recalled == Some(announced_hash) {
            self.state = State::Complete {
                recipe_hash: announced_hash,
            };
            return false;
        }
        self.state = State::AwaitingDeliver {
            recipe_hash: announced_hash,
        };
        true
    }

    /// `RecipeDeliver` arrived with the chunk hashes it references. Returns
    /// the first batch of chunks to request, bounded by
    /// [`OUTSTANDING_CHUNK_WINDOW`].
    pub fn on_recipe_deliver(
        &mut self,
        recipe_hash: Hash,
        referenced_chunks: &[Hash],
        have_chunk: impl Fn(&Hash) -> bool,
    ) -> Vec<Hash> {
        let mut missing: VecDeque<Hash> = referenced_chunks
            .iter()
            .copied()
            .filter(|h| !have_chunk(h))
            .collect();

        if missing.is_empty() {
            self.state = State::Complete { recipe_hash };
            return Vec::new();
        }

        let mut in_flight = HashSet::new();
        let mut batch = Vec::new();
        while in_flight.len() < OUTSTANDING_CHUNK_WINDOW {
            let Some(hash) = missing.pop_front() else {
                break;
            };
            in_flight.insert(hash);
            batch.push(hash);
        }

        self.state = State::FetchingChunks {
            recipe_hash,
            missing,
            in_flight,
        };
        batch
    }

    /// A chunk arrived. `verified` is whether `SHA-256(bytes) == chunk_hash`
    /// held (§4.8 invariant b, checked by the content store on `put_chunk`).
    pub fn on_chunk_delivered(&mut self, chunk_hash: Hash, verified: bool, now: u64) -> ChunkOutcome {
        if !verified {
            let cooldown_until = now + COOLDOWN_SECS;
            self.state = State::Aborted { cooldown_until };
            return ChunkOutcome::Aborted { cooldown_until };
        }

        let State::FetchingChunks {
            recipe_hash,
            missing,
            in_flight,
        } = &mut self.state
        else {
            return ChunkOutcome::RequestMore(Vec::new());
        };

        in_flight.remove(&chunk_hash);

        let mut newly_requested = Vec::new();
        while in_flight.len() < OUTSTANDING_CHUNK_WINDOW {
            let Some(hash) = missing.pop_front() else {
                break;
            };
            in_flight.insert(hash);
            newly_requested.push(hash);
        }

        if missing.is_empty() && in_flight.is_empty() {
            let recipe_hash = *recipe_hash;
            self.state = State::Complete { recipe_hash };
            return ChunkOutcome::Complete;
        }

        ChunkOutcome::RequestMore(newly_requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_outbound_skips_followup_when_already_synced() {
        let plan = plan_outbound(Some([1u8; 32]), [1u8; 32]);
        assert!(plan.send_announce);
        assert!(!plan.expect_followup);
    }

    #[test]
    fn test_plan_outbound_expects_followup_on_mismatch() {
        let plan = plan_outbound(Some([1u8; 32]), [2u8; 32]);
        assert!(plan.expect_followup);
    }

    #[test]
    fn test_rate_limiter_rejects_over_cap_within_same_second() {
        let mut limiter = OutboundRateLimiter::new(100);
        assert!(limiter.try_consume(80, 1));
        assert!(!limiter.try_consume(30, 1));
        assert!(limiter.try_consume(20, 1));
    }

    #[test]
    fn test_rate_limiter_resets_each_second() {
        let mut limiter = OutboundRateLimiter::new(100);
        assert!(limiter.try_consume(100, 1));
        assert!(limiter.try_consume(100, 2));
    }

    #[test]
    fn test_announce_skipped_when_recall_matches() {
        let mut transfer = InboundTransfer::new("bob".to_string());
        let should_request = transfer.on_recipe_announce([1u8; 32], Some([1u8; 32]));
        assert!(!should_request);
    }

    #[test]
    fn test_announce_requests_on_mismatch() {
        let mut transfer = InboundTransfer::new("bob".to_string());
        let should_request = transfer.on_recipe_announce([1u8; 32], None);
        assert!(should_request);
    }

    #[test]
    fn test_deliver_batches_requests_within_window() {
        let mut transfer = InboundTransfer::new("bob".to_string());
        transfer.on_recipe_announce([9u8; 32], None);
        let chunks: Vec<Hash> = (0..20u8).map(|i| [i; 32]).collect();
        let batch = transfer.on_recipe_deliver([9u8; 32], &chunks, |_| false);
        assert_eq!(batch.len(), OUTSTANDING_CHUNK_WINDOW);
    }

    #[test]
    fn test_deliver_completes_immediately_when_all_chunks_already_present() {
        let mut transfer = InboundTransfer::new("bob".to_string());
        transfer.on_recipe_announce([9u8; 32], None);
        let chunks = vec![[1u8; 32], [2u8; 32]];
        let batch = transfer.on_recipe_deliver([9u8; 32], &chunks, |_| true);
        assert!(batch.is_empty());
    }

    #[test]
    fn test_chunk_delivery_drains_window_and_completes() {
        let mut transfer = InboundTransfer::new("bob".to_string());
        transfer.on_recipe_announce([9u8; 32], None);
        let chunks = vec![[1u8; 32], [2u8; 32]];
        transfer.on_recipe_deliver([9u8; 32], &chunks, |_| false);

        // window (16) exceeds the 2-chunk recipe, so both are already
        // in-flight after delivery; the first arrival requests nothing more.
        let outcome = transfer.on_chunk_delivered([1u8; 32], true, 100);
        assert_eq!(outcome, ChunkOutcome::RequestMore(vec![]));

        let outcome = transfer.on_chunk_delivered([2u8; 32], true, 100);
        assert_eq!(outcome, ChunkOutcome::Complete);
    }

    #[test]
    fn test_chunk_delivery_refills_window_from_overflow() {
        let mut transfer = InboundTransfer::new("bob".to_string());
        transfer.on_recipe_announce([9u8; 32], None);
        let chunks: Vec<Hash> = (0..17u8).map(|i| [i; 32]).collect();
        let batch = transfer.on_recipe_deliver([9u8; 32], &chunks, |_| false);
        assert_eq!(batch.len(), OUTSTANDING_CHUNK_WINDOW, "only the window's worth requested up front");

        let outcome = transfer.on_chunk_delivered(chunks[0], true, 100);
        assert_eq!(outcome, ChunkOutcome::RequestMore(vec![chunks[16]]), "the 17th chunk backfills the freed slot");
    }

    #[test]
    fn test_verification_failure_aborts_and_sets_cooldown() {
        let mut transfer = InboundTransfer::new("bob".to_string());
        transfer.on_recipe_announce([9u8; 32], None);
        let chunks = vec![[1u8; 32]];
        transfer.on_recipe_deliver([9u8; 32], &chunks, |_| false);

        let outcome = transfer.on_chunk_delivered([1u8; 32], false, 1_000);
        assert_eq!(
            outcome,
            ChunkOutcome::Aborted {
                cooldown_until: 1_000 + COOLDOWN_SECS
            }
        );
        assert_eq!(transfer.is_aborted_until(1_000 + COOLDOWN_SECS - 1), Some(1_000 + COOLDOWN_SECS));
        assert_eq!(transfer.is_aborted_until(1_000 + COOLDOWN_SECS), None);
    }
}
