//! Streaming frame sealing.
//!
//! Chunk and recipe transfer (C9) is sealed frame-by-frame rather than as one
//! large ciphertext. Each frame carries a 64-bit ordinal; the nonce is
//! derived deterministically from a per-session salt and that ordinal, so a
//! frame cannot be decrypted successfully at any ordinal other than the one
//! it was sealed for. This binds the cipher layer against reordering without
//! needing to transmit a nonce per frame.

use crate::aead::{self, NONCE_SIZE};
use crate::Result;

/// Default frame size for streaming seal/open (4 KiB).
pub const DEFAULT_FRAME_SIZE: usize = 4096;

/// A per-session random salt distinguishing this direction's nonce space
/// from the peer's, so inbound and outbound frame ordinals never collide.
pub type FrameSalt = [u8; 4];

fn frame_nonce(salt: FrameSalt, ordinal: u64) -> [u8; NONCE_SIZE] {
    let mut nonce = [0u8; NONCE_SIZE];
    nonce[..4].copy_from_slice(&salt);
    nonce[4..].copy_from_slice(&ordinal.to_be_bytes());
    nonce
}

/// Seal a single frame at `ordinal` under `key` and `salt`.
pub fn seal_frame(key: &[u8; 32], salt: FrameSalt, ordinal: u64, plaintext: &[u8]) -> Vec<u8> {
    let nonce = frame_nonce(salt, ordinal);
    aes_gcm_seal_with_nonce(key, &nonce, plaintext)
}

/// Open a single frame at `ordinal` under `key` and `salt`.
///
/// # Errors
///
/// Returns [`crate::CryptoError::AuthFail`] if the tag fails to verify, which
/// also happens if the frame was sealed for a different ordinal.
pub fn open_frame(key: &[u8; 32], salt: FrameSalt, ordinal: u64, ciphertext: &[u8]) -> Result<Vec<u8>> {
    let nonce = frame_nonce(salt, ordinal);
    aead::open_no_aad(key, &nonce, ciphertext)
}

fn aes_gcm_seal_with_nonce(key: &[u8; 32], nonce: &[u8; NONCE_SIZE], plaintext: &[u8]) -> Vec<u8> {
    use aes_gcm::aead::{Aead, KeyInit};
    use aes_gcm::{Aes256Gcm, Key, Nonce};
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .expect("AES-256-GCM encryption with fixed-size key/nonce cannot fail")
}
