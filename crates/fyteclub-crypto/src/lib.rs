//! # fyteclub-crypto
//!
//! Identity and cryptographic primitives underlying every other syncshell
//! component (C1).
//!
//! - [`ed25519`]: keypair generation, signing, verification, `peer_id` derivation.
//! - [`hash`]: SHA-256 content addressing.
//! - [`kdf`]: HKDF-SHA256 key derivation with per-purpose labels.
//! - [`aead`]: AES-256-GCM sealing/opening.
//! - [`frame`]: fixed-size streaming frame sealing with reorder-resistant nonces.

pub mod aead;
pub mod ed25519;
pub mod frame;
pub mod hash;
pub mod kdf;

/// Errors raised by the crypto layer.
///
/// All verification failures collapse to [`CryptoError::AuthFail`]; per §4.1
/// of the spec this is non-recoverable for the affected frame or message.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("signature or AEAD tag verification failed")]
    AuthFail,

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("invalid key length: expected {expected}, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
