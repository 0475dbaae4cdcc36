//! # fyteclub-token
//!
//! Membership token issuance and verification, and the reconnect
//! challenge/response handshake (§4.5).
//!
//! Wire framing for the handshake (`Hello`, `AuthChallenge`, `AuthResponse`)
//! lives in `fyteclub-transport`; this crate works in terms of raw
//! nonces, signatures, and tokens so it has no transport dependency.

pub mod backoff;
pub mod challenge;

use std::collections::HashMap;

use fyteclub_crypto::ed25519::{Signature, SigningKey, VerifyingKey};
use fyteclub_types::identity::{MemberToken, TokenCapabilities};
use fyteclub_types::{GroupId, PeerId};

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token expired at {expires_at}, now is {now}")]
    Expired { expires_at: u64, now: u64 },

    #[error("token signature failed to verify")]
    InvalidSignature,

    #[error("issuer {issuer_peer_id} is not a current or historical host for this group")]
    IssuerNotHost { issuer_peer_id: PeerId },

    #[error("challenge nonce unknown or already consumed")]
    UnknownChallenge,

    #[error("challenge nonce expired")]
    ChallengeExpired,

    #[error(transparent)]
    Crypto(#[from] fyteclub_crypto::CryptoError),
}

pub type Result<T> = std::result::Result<T, TokenError>;

/// Issue a signed `MemberToken` upon a successful join handshake.
///
/// Called by the current host; never embedded in the invite itself, only
/// transmitted over the already-established session.
pub fn issue_token(
    issuer_signing_key: &SigningKey,
    group_id: GroupId,
    member_peer_id: PeerId,
    issuer_peer_id: PeerId,
    issued_at: u64,
    ttl_secs: u64,
    capabilities: TokenCapabilities,
) -> MemberToken {
    let mut token = MemberToken {
        group_id,
        member_peer_id,
        issued_at,
        expires_at: issued_at + ttl_secs,
        capabilities,
        issuer_peer_id,
        issuer_signature: [0u8; 64],
    };
    token.issuer_signature = issuer_signing_key.sign(&token.signed_bytes()).to_bytes();
    token
}

/// Verify a token's signature and expiry. Does not check that the issuer is
/// a current/historical host; callers cross-reference the phonebook for that
/// (§4.5: "issuer is a current or historical host as recorded in the phonebook").
pub fn verify_token(token: &MemberToken, issuer_verifying_key: &VerifyingKey, now: u64) -> Result<()> {
    if token.is_expired(now) {
        return Err(TokenError::Expired {
            expires_at: token.expires_at,
            now,
        });
    }
    let sig = Signature::from_bytes(token.issuer_signature);
    issuer_verifying_key
        .verify(&token.signed_bytes(), &sig)
        .map_err(|_| TokenError::InvalidSignature)
}

/// Sign a reconnect challenge nonce, for the `AuthResponse.signature` field.
pub fn sign_challenge_nonce(signing_key: &SigningKey, nonce: &[u8; 32]) -> [u8; 64] {
    signing_key.sign(nonce).to_bytes()
}

/// Verify a reconnect challenge response: the signature must be over `nonce`
/// under the key belonging to `token.member_peer_id`.
pub fn verify_challenge_response(
    member_verifying_key: &VerifyingKey,
    nonce: &[u8; 32],
    signature: &[u8; 64],
) -> bool {
    member_verifying_key
        .verify(nonce, &Signature::from_bytes(*signature))
        .is_ok()
}

/// Known historical and current hosts for a group, used to validate that a
/// token's issuer was entitled to issue it (§4.5).
pub fn issuer_is_host(known_hosts: &HashMap<GroupId, Vec<PeerId>>, group_id: &GroupId, issuer_peer_id: &PeerId) -> bool {
    known_hosts
        .get(group_id)
        .is_some_and(|hosts| hosts.contains(issuer_peer_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fyteclub_crypto::ed25519::generate_identity;

    #[test]
    fn test_issue_and_verify_token() {
        let host = generate_identity();
        let token = issue_token(
            &host.signing_key,
            [1u8; 16],
            "member".into(),
            "host".into(),
            1_000,
            3600,
            TokenCapabilities::default(),
        );
        verify_token(&token, &host.verifying_key, 1_500).expect("verify");
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        let host = generate_identity();
        let token = issue_token(
            &host.signing_key,
            [1u8; 16],
            "member".into(),
            "host".into(),
            1_000,
            3600,
            TokenCapabilities::default(),
        );
        let err = verify_token(&token, &host.verifying_key, 10_000).expect_err("expected error");
        assert!(matches!(err, TokenError::Expired { .. }));
    }

    #[test]
    fn test_verify_rejects_wrong_issuer_key() {
        let host = generate_identity();
        let impostor = generate_identity();
        let token = issue_token(
            &host.signing_key,
            [1u8; 16],
            "member".into(),
            "host".into(),
            1_000,
            3600,
            TokenCapabilities::default(),
        );
        let err = verify_token(&token, &impostor.verifying_key, 1_500).expect_err("expected error");
        assert!(matches!(err, TokenError::InvalidSignature));
    }

    #[test]
    fn test_challenge_roundtrip() {
        let member = generate_identity();
        let nonce = [7u8; 32];
        let sig = sign_challenge_nonce(&member.signing_key, &nonce);
        assert!(verify_challenge_response(&member.verifying_key, &nonce, &sig));
    }

    #[test]
    fn test_challenge_rejects_wrong_key() {
        let member = generate_identity();
        let impostor = generate_identity();
        let nonce = [7u8; 32];
        let sig = sign_challenge_nonce(&impostor.signing_key, &nonce);
        assert!(!verify_challenge_response(&member.verifying_key, &nonce, &sig));
    }

    #[test]
    fn test_issuer_is_host() {
        let mut hosts = HashMap::new();
        hosts.insert([1u8; 16], vec!["alice".to_string(), "bob".to_string()]);
        assert!(issuer_is_host(&hosts, &[1u8; 16], &"bob".to_string()));
        assert!(!issuer_is_host(&hosts, &[1u8; 16], &"mallory".to_string()));
        assert!(!issuer_is_host(&hosts, &[2u8; 16], &"alice".to_string()));
    }
}
