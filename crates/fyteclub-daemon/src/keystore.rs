//! Local keystore abstraction for at-rest identity protection (§4.1, §6).
//!
//! The spec treats OS-keychain integration as a pluggable concern: callers
//! depend on the [`LocalKeystore`] trait, and this crate supplies a
//! file-backed default so the daemon runs non-interactively and headless.

use std::fs;
use std::path::{Path, PathBuf};

use fyteclub_crypto::kdf;

/// Something that can produce the 32-byte secret used to wrap
/// `identity.key`. A real desktop build might back this with the OS
/// keychain; this is the default for non-interactive operation.
pub trait LocalKeystore {
    fn local_secret(&self) -> std::io::Result<[u8; 32]>;
}

/// Keeps a random 32-byte secret in a file under the profile directory,
/// generating it on first use.
pub struct FileKeystore {
    secret_path: PathBuf,
}

impl FileKeystore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            secret_path: data_dir.join(".keystore_secret"),
        }
    }
}

impl LocalKeystore for FileKeystore {
    fn local_secret(&self) -> std::io::Result<[u8; 32]> {
        if let Ok(bytes) = fs::read(&self.secret_path) {
            if let Ok(secret) = <[u8; 32]>::try_from(bytes.as_slice()) {
                return Ok(secret);
            }
        }
        let mut secret = [0u8; 32];
        getrandom(&mut secret);
        fs::write(&self.secret_path, secret)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.secret_path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(secret)
    }
}

fn getrandom(buf: &mut [u8; 32]) {
    use rand_core::RngCore;
    rand_core::OsRng.fill_bytes(buf);
}

/// Derive the at-rest wrapping key for `identity.key` from a keystore's
/// local secret.
pub fn wrapping_key(keystore: &dyn LocalKeystore) -> std::io::Result<[u8; 32]> {
    let secret = keystore.local_secret()?;
    kdf::derive_group_key(&secret, kdf::LABEL_LOCAL_KEYSTORE)
        .map_err(|e| std::io::Error::other(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_persists_across_instances() {
        let dir = tempfile::tempdir().expect("tempdir");
        let a = FileKeystore::new(dir.path()).local_secret().expect("first");
        let b = FileKeystore::new(dir.path()).local_secret().expect("second");
        assert_eq!(a, b);
    }

    #[test]
    fn test_wrapping_key_is_deterministic_for_same_secret() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ks = FileKeystore::new(dir.path());
        let k1 = wrapping_key(&ks).expect("derive");
        let k2 = wrapping_key(&ks).expect("derive");
        assert_eq!(k1, k2);
    }
}
