//! Ed25519 keypairs, signing, and verification.
//!
//! `peer_id` is the lowercase-hex encoding of the public key, matching the
//! textual form carried in invites, phonebook entries, and tokens.

use ed25519_dalek::{Signer, Verifier};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use zeroize::Zeroize;

use crate::{CryptoError, Result};

/// An Ed25519 signing (secret) key. Zeroized on drop; never `Debug`/`Display`.
pub struct SigningKey {
    inner: ed25519_dalek::SigningKey,
}

impl Clone for SigningKey {
    fn clone(&self) -> Self {
        Self {
            inner: ed25519_dalek::SigningKey::from_bytes(&self.inner.to_bytes()),
        }
    }
}

impl Drop for SigningKey {
    fn drop(&mut self) {
        let mut bytes = self.inner.to_bytes();
        bytes.zeroize();
    }
}

/// An Ed25519 verifying (public) key, 32 bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyingKey {
    bytes: [u8; 32],
}

/// An Ed25519 signature, 64 bytes.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    #[serde_as(as = "serde_with::Bytes")]
    bytes: [u8; 64],
}

/// A generated identity: a signing key plus its public key.
pub struct KeyPair {
    pub signing_key: SigningKey,
    pub verifying_key: VerifyingKey,
}

/// Generate a fresh Ed25519 identity.
pub fn generate_identity() -> KeyPair {
    let inner = ed25519_dalek::SigningKey::generate(&mut OsRng);
    let verifying_key = VerifyingKey {
        bytes: inner.verifying_key().to_bytes(),
    };
    KeyPair {
        signing_key: SigningKey { inner },
        verifying_key,
    }
}

impl SigningKey {
    /// Restore a signing key from its 32-byte seed.
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self {
            inner: ed25519_dalek::SigningKey::from_bytes(bytes),
        }
    }

    /// Export the 32-byte seed. Callers are responsible for zeroizing the result.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.inner.to_bytes()
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey {
            bytes: self.inner.verifying_key().to_bytes(),
        }
    }

    /// Sign a message, producing a detached signature.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature {
            bytes: self.inner.sign(message).to_bytes(),
        }
    }
}

impl VerifyingKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.bytes
    }

    /// Derive this peer's textual identifier: lowercase hex of the public key.
    pub fn peer_id(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Verify a detached signature over `message`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::AuthFail`] if the signature does not verify.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<()> {
        let key = ed25519_dalek::VerifyingKey::from_bytes(&self.bytes)
            .map_err(|_| CryptoError::AuthFail)?;
        let sig = ed25519_dalek::Signature::from_bytes(&signature.bytes);
        key.verify(message, &sig).map_err(|_| CryptoError::AuthFail)
    }
}

impl Signature {
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self { bytes }
    }

    pub fn to_bytes(&self) -> [u8; 64] {
        self.bytes
    }
}

/// Sign `bytes` with `key`, a free function mirroring the spec's `sign(bytes) → sig`.
pub fn sign(key: &SigningKey, bytes: &[u8]) -> Signature {
    key.sign(bytes)
}

/// Verify `sig` over `bytes` under `pubkey`, mirroring `verify(pubkey, bytes, sig) → bool`.
pub fn verify(pubkey: &VerifyingKey, bytes: &[u8], sig: &Signature) -> bool {
    pubkey.verify(bytes, sig).is_ok()
}
