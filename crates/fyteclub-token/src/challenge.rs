//! Reconnect challenge nonce registry (§4.5): each nonce is random, 32
//! bytes, single-use, and valid for 30 seconds.

use std::collections::HashMap;

use rand_core::{OsRng, RngCore};

use crate::{Result, TokenError};

/// Validity window for an issued challenge nonce.
pub const CHALLENGE_TTL_SECS: u64 = 30;

/// Tracks outstanding challenge nonces issued to initiators, keyed by the
/// nonce itself. One registry per responder process; not persisted, since
/// a restart invalidates all outstanding challenges harmlessly.
#[derive(Default)]
pub struct ChallengeRegistry {
    issued_at: HashMap<[u8; 32], u64>,
}

impl ChallengeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh nonce at `now`.
    pub fn issue(&mut self, now: u64) -> [u8; 32] {
        let mut nonce = [0u8; 32];
        OsRng.fill_bytes(&mut nonce);
        self.issued_at.insert(nonce, now);
        nonce
    }

    /// Consume `nonce` at `now`. Single-use: a nonce is removed whether or
    /// not it was still valid, so a replayed response always fails.
    pub fn consume(&mut self, nonce: &[u8; 32], now: u64) -> Result<()> {
        let issued_at = self
            .issued_at
            .remove(nonce)
            .ok_or(TokenError::UnknownChallenge)?;
        if now.saturating_sub(issued_at) > CHALLENGE_TTL_SECS {
            return Err(TokenError::ChallengeExpired);
        }
        Ok(())
    }

    /// Drop nonces older than [`CHALLENGE_TTL_SECS`], bounding registry growth
    /// for responders that never receive a reply.
    pub fn sweep_expired(&mut self, now: u64) {
        self.issued_at
            .retain(|_, issued_at| now.saturating_sub(*issued_at) <= CHALLENGE_TTL_SECS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_consume() {
        let mut registry = ChallengeRegistry::new();
        let nonce = registry.issue(1_000);
        registry.consume(&nonce, 1_010).expect("consume within ttl");
    }

    #[test]
    fn test_consume_is_single_use() {
        let mut registry = ChallengeRegistry::new();
        let nonce = registry.issue(1_000);
        registry.consume(&nonce, 1_010).expect("first consume");
        let err = registry.consume(&nonce, 1_011).expect_err("expected error");
        assert!(matches!(err, TokenError::UnknownChallenge));
    }

    #[test]
    fn test_consume_after_ttl_rejected() {
        let mut registry = ChallengeRegistry::new();
        let nonce = registry.issue(1_000);
        let err = registry
            .consume(&nonce, 1_000 + CHALLENGE_TTL_SECS + 1)
            .expect_err("expected error");
        assert!(matches!(err, TokenError::ChallengeExpired));
    }

    #[test]
    fn test_unknown_nonce_rejected() {
        let mut registry = ChallengeRegistry::new();
        let err = registry.consume(&[1u8; 32], 1_000).expect_err("expected error");
        assert!(matches!(err, TokenError::UnknownChallenge));
    }

    #[test]
    fn test_sweep_expired_removes_stale_entries() {
        let mut registry = ChallengeRegistry::new();
        let nonce = registry.issue(1_000);
        registry.sweep_expired(1_000 + CHALLENGE_TTL_SECS + 1);
        let err = registry.consume(&nonce, 1_000 + CHALLENGE_TTL_SECS + 1).expect_err("expected error");
        assert!(matches!(err, TokenError::UnknownChallenge));
    }
}
