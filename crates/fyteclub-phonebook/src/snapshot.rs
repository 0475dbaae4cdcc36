//! At-rest encryption of a phonebook snapshot, keyed off the syncshell's
//! `group_secret` (§4.6: "encrypted at rest with a key derived from
//! `group_secret`"), written to `syncshells/<group_id>/phonebook.bin`.

use fyteclub_crypto::{aead, kdf};
use fyteclub_types::phonebook::PhonebookEntry;

use crate::{PhonebookError, Result};

/// Seal a snapshot for at-rest storage.
pub fn seal(group_secret: &[u8; 32], entries: &[PhonebookEntry]) -> Result<([u8; aead::NONCE_SIZE], Vec<u8>)> {
    let key = kdf::derive_group_key(group_secret, kdf::LABEL_PHONEBOOK)
        .map_err(|_| PhonebookError::InvalidSignature)?;
    let plaintext = serde_json::to_vec(entries).expect("PhonebookEntry always serializes");
    Ok(aead::seal_no_aad(&key, &plaintext))
}

/// Open a previously sealed snapshot.
pub fn open(
    group_secret: &[u8; 32],
    nonce: &[u8; aead::NONCE_SIZE],
    ciphertext: &[u8],
) -> Result<Vec<PhonebookEntry>> {
    let key = kdf::derive_group_key(group_secret, kdf::LABEL_PHONEBOOK)
        .map_err(|_| PhonebookError::InvalidSignature)?;
    let plaintext = aead::open_no_aad(&key, nonce, ciphertext)
        .map_err(|_| PhonebookError::InvalidSignature)?;
    serde_json::from_slice(&plaintext).map_err(|_| PhonebookError::InvalidSignature)
}
