//! HKDF-SHA256 key derivation with per-purpose domain separation.
//!
//! Every derived key is scoped by a fixed label so that a key derived for
//! one purpose (sealing mod chunks) can never be confused with a key
//! derived for another (encrypting the phonebook, or an invite payload).

use hkdf::Hkdf;
use sha2::Sha256;

use crate::{CryptoError, Result};

/// Label for keys derived to seal mod recipe/chunk transfer frames (C9).
pub const LABEL_MOD: &[u8] = b"FyteClubMod";
/// Label for keys derived to encrypt the at-rest phonebook (C6).
pub const LABEL_PHONEBOOK: &[u8] = b"FyteClubPhonebook";
/// Label for keys derived to seal invite payloads (C2).
pub const LABEL_INVITE: &[u8] = b"FyteClubInvite";
/// Label for keys derived to wrap the at-rest identity secret (daemon profile).
pub const LABEL_LOCAL_KEYSTORE: &[u8] = b"FyteClubLocalIdentity";

/// Derive a 32-byte key from `group_secret` using HKDF-SHA256 with `label`
/// as the `info` parameter, mirroring `derive_group_key(group_secret, label) → key32`.
pub fn derive_group_key(group_secret: &[u8; 32], label: &[u8]) -> Result<[u8; 32]> {
    let hk = Hkdf::<Sha256>::new(None, group_secret);
    let mut out = [0u8; 32];
    hk.expand(label, &mut out)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_is_deterministic() {
        let secret = [3u8; 32];
        let a = derive_group_key(&secret, LABEL_MOD).expect("derive");
        let b = derive_group_key(&secret, LABEL_MOD).expect("derive");
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_labels_produce_different_keys() {
        let secret = [3u8; 32];
        let mod_key = derive_group_key(&secret, LABEL_MOD).expect("derive");
        let phonebook_key = derive_group_key(&secret, LABEL_PHONEBOOK).expect("derive");
        let invite_key = derive_group_key(&secret, LABEL_INVITE).expect("derive");
        let keystore_key = derive_group_key(&secret, LABEL_LOCAL_KEYSTORE).expect("derive");
        assert_ne!(mod_key, phonebook_key);
        assert_ne!(phonebook_key, invite_key);
        assert_ne!(mod_key, invite_key);
        assert_ne!(invite_key, keystore_key);
    }

    #[test]
    fn test_different_secrets_produce_different_keys() {
        let a = derive_group_key(&[1u8; 32], LABEL_MOD).expect("derive");
        let b = derive_group_key(&[2u8; 32], LABEL_MOD).expect("derive");
        assert_ne!(a, b);
    }
}
