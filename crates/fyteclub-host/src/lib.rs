//! # fyteclub-host
//!
//! Deterministic host election and rotation for a syncshell (§4.7). No
//! messages are sent here: this crate only tracks claims the transport
//! layer receives and decides who currently holds the issuing authority.

use std::collections::HashMap;

use fyteclub_types::identity::MemberToken;
use fyteclub_types::PeerId;

/// Grace period after a host's session terminates before the next-best
/// claim takes over.
pub const HOST_FAILOVER_SECS: u64 = 30;

/// Tokens expiring within this window of a host change are offered re-issue.
pub const TOKEN_REISSUE_WINDOW_SECS: u64 = 7 * 24 * 3600;

/// A peer's bid to act as host, as received in a [`fyteclub_types`]-typed
/// `HostClaim` message (carried by the transport crate; this crate only
/// needs the two fields it compares on).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Claim {
    pub uptime_seconds: u64,
}

/// Tracks every peer's most recent host claim and disconnect state for one
/// syncshell session.
///
/// Election rule: greatest `uptime_seconds` wins; ties broken by
/// lexicographically smallest `peer_id`. A disconnected peer's claim is
/// ignored once [`HOST_FAILOVER_SECS`] has elapsed without reconnection.
#[derive(Default)]
pub struct HostElection {
    claims: HashMap<PeerId, Claim>,
    disconnected_at: HashMap<PeerId, u64>,
}

impl HostElection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record or refresh a peer's claim. Reconnecting clears any pending
    /// disconnect grace period.
    pub fn record_claim(&mut self, peer_id: PeerId, uptime_seconds: u64) {
        self.disconnected_at.remove(&peer_id);
        self.claims.insert(peer_id, Claim { uptime_seconds });
    }

    /// Mark a peer's session as terminated at `now`. Its claim still counts
    /// toward election until [`HOST_FAILOVER_SECS`] elapses.
    pub fn mark_disconnected(&mut self, peer_id: &str, now: u64) {
        if self.claims.contains_key(peer_id) {
            self.disconnected_at.insert(peer_id.to_string(), now);
        }
    }

    /// Drop a peer's claim entirely, e.g. once it has been tombstoned.
    pub fn remove(&mut self, peer_id: &str) {
        self.claims.remove(peer_id);
        self.disconnected_at.remove(peer_id);
    }

    /// The peer currently holding host authority, or `None` if no claims are
    /// known.
    pub fn current_host(&self, now: u64) -> Option<PeerId> {
        self.claims
            .iter()
            .filter(|(peer_id, _)| self.is_within_grace(peer_id, now))
            .max_by(|(a_id, a), (b_id, b)| {
                a.uptime_seconds
                    .cmp(&b.uptime_seconds)
                    .then_with(|| b_id.cmp(a_id))
            })
            .map(|(peer_id, _)| peer_id.clone())
    }

    pub fn is_host(&self, peer_id: &str, now: u64) -> bool {
        self.current_host(now).as_deref() == Some(peer_id)
    }

    fn is_within_grace(&self, peer_id: &str, now: u64) -> bool {
        match self.disconnected_at.get(peer_id) {
            None => true,
            Some(since) => now.saturating_sub(*since) < HOST_FAILOVER_SECS,
        }
    }
}

/// Whether `token` should be offered re-issue after a host change
/// (§4.7: "within 7 days of expiry").
pub fn needs_reissue(token: &MemberToken, now: u64) -> bool {
    token.expires_at.saturating_sub(now) <= TOKEN_REISSUE_WINDOW_SECS
}
