//! Local process identity: load the at-rest `identity.key`, or mint a
//! fresh Ed25519 keypair on first run (§4.1, §6).

use std::path::Path;

use fyteclub_crypto::ed25519::{self, SigningKey};
use fyteclub_types::identity::PeerIdentity;

use crate::keystore::{self, LocalKeystore};

const IDENTITY_FILE: &str = "identity.key";

/// Load the profile's identity, creating one if this is the first run.
pub fn load_or_create(data_dir: &Path, keystore: &dyn LocalKeystore) -> anyhow::Result<(SigningKey, PeerIdentity)> {
    let path = data_dir.join(IDENTITY_FILE);
    let wrapping_key = keystore::wrapping_key(keystore)?;

    let signing_key = if path.exists() {
        let sealed = std::fs::read(&path)?;
        if sealed.len() < fyteclub_crypto::aead::NONCE_SIZE {
            anyhow::bail!("identity.key is truncated");
        }
        let (nonce, ciphertext) = sealed.split_at(fyteclub_crypto::aead::NONCE_SIZE);
        let nonce: [u8; 12] = nonce.try_into().expect("checked length above");
        let plaintext = fyteclub_crypto::aead::open_no_aad(&wrapping_key, &nonce, ciphertext)
            .map_err(|_| anyhow::anyhow!("identity.key failed to decrypt with the local keystore secret"))?;
        let bytes: [u8; 32] = plaintext
            .try_into()
            .map_err(|_| anyhow::anyhow!("identity.key did not decrypt to a 32-byte secret key"))?;
        SigningKey::from_bytes(&bytes)
    } else {
        let keypair = ed25519::generate_identity();
        let (nonce, ciphertext) = fyteclub_crypto::aead::seal_no_aad(&wrapping_key, &keypair.signing_key.to_bytes());
        let mut sealed = nonce.to_vec();
        sealed.extend_from_slice(&ciphertext);
        std::fs::write(&path, &sealed)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))?;
        }
        keypair.signing_key
    };

    let peer_identity = PeerIdentity::new(signing_key.verifying_key().to_bytes());
    Ok((signing_key, peer_identity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystore::FileKeystore;

    #[test]
    fn test_identity_persists_across_loads() {
        let dir = tempfile::tempdir().expect("tempdir");
        let keystore = FileKeystore::new(dir.path());

        let (key_a, id_a) = load_or_create(dir.path(), &keystore).expect("create");
        let (key_b, id_b) = load_or_create(dir.path(), &keystore).expect("reload");

        assert_eq!(id_a.peer_id, id_b.peer_id);
        assert_eq!(key_a.to_bytes(), key_b.to_bytes());
    }

    #[test]
    fn test_peer_id_matches_hex_of_public_key() {
        let dir = tempfile::tempdir().expect("tempdir");
        let keystore = FileKeystore::new(dir.path());
        let (_key, id) = load_or_create(dir.path(), &keystore).expect("create");
        assert_eq!(id.peer_id, hex::encode(id.public_key));
    }
}
