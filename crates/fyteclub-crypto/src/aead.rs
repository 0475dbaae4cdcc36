//! AES-256-GCM authenticated encryption.
//!
//! Mirrors `seal(key, plaintext) → (nonce, ciphertext, tag)` and
//! `open(key, nonce, ciphertext, tag) → plaintext | AuthFail` from §4.1.
//! Nonces are 96 bits and random by default; tags are 128 bits.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand_core::OsRng;

use crate::{CryptoError, Result};

pub const KEY_SIZE: usize = 32;
pub const NONCE_SIZE: usize = 12;
pub const TAG_SIZE: usize = 16;

/// Seal `plaintext` under `key`, with `aad` authenticated but not encrypted.
/// Returns `(nonce, ciphertext_with_tag)`.
pub fn seal(key: &[u8; 32], plaintext: &[u8], aad: &[u8]) -> ([u8; NONCE_SIZE], Vec<u8>) {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, Payload { msg: plaintext, aad })
        .expect("AES-256-GCM encryption with fixed-size key/nonce cannot fail");
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    nonce_bytes.copy_from_slice(nonce.as_slice());
    (nonce_bytes, ciphertext)
}

/// Seal with no associated data.
pub fn seal_no_aad(key: &[u8; 32], plaintext: &[u8]) -> ([u8; NONCE_SIZE], Vec<u8>) {
    seal(key, plaintext, &[])
}

/// Open a sealed value. `ciphertext` must include the trailing 16-byte tag.
///
/// # Errors
///
/// Returns [`CryptoError::AuthFail`] if the tag, key, nonce, or AAD do not match.
pub fn open(
    key: &[u8; 32],
    nonce: &[u8; NONCE_SIZE],
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Nonce::from_slice(nonce);
    cipher
        .decrypt(
            nonce,
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| CryptoError::AuthFail)
}

/// Open with no associated data.
pub fn open_no_aad(key: &[u8; 32], nonce: &[u8; NONCE_SIZE], ciphertext: &[u8]) -> Result<Vec<u8>> {
    open(key, nonce, ciphertext, &[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open_roundtrip() {
        let key = [9u8; 32];
        let (nonce, ct) = seal_no_aad(&key, b"chunk bytes");
        let pt = open_no_aad(&key, &nonce, &ct).expect("open");
        assert_eq!(pt, b"chunk bytes");
    }

    #[test]
    fn test_roundtrip_with_aad() {
        let key = [1u8; 32];
        let aad = b"frame-ordinal-3";
        let (nonce, ct) = seal(&key, b"payload", aad);
        let pt = open(&key, &nonce, &ct, aad).expect("open");
        assert_eq!(pt, b"payload");
    }

    #[test]
    fn test_wrong_key_fails() {
        let (nonce, ct) = seal_no_aad(&[1u8; 32], b"secret");
        let result = open_no_aad(&[2u8; 32], &nonce, &ct);
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_nonce_fails() {
        let key = [1u8; 32];
        let (mut nonce, ct) = seal_no_aad(&key, b"secret");
        nonce[0] ^= 0xFF;
        assert!(open_no_aad(&key, &nonce, &ct).is_err());
    }

    #[test]
    fn test_wrong_aad_fails() {
        let key = [1u8; 32];
        let (nonce, ct) = seal(&key, b"secret", b"aad-a");
        assert!(open(&key, &nonce, &ct, b"aad-b").is_err());
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = [1u8; 32];
        let (nonce, mut ct) = seal_no_aad(&key, b"secret payload");
        let last = ct.len() - 1;
        ct[last] ^= 0xFF;
        assert!(open_no_aad(&key, &nonce, &ct).is_err());
    }

    #[test]
    fn test_empty_plaintext_roundtrips() {
        let key = [4u8; 32];
        let (nonce, ct) = seal_no_aad(&key, b"");
        let pt = open_no_aad(&key, &nonce, &ct).expect("open");
        assert!(pt.is_empty());
    }
}
