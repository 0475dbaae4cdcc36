//! Content-addressed mod data types (§3, §4.8, §4.9).

use serde::{Deserialize, Serialize};

use crate::{Hash, PeerId};

/// A content-addressed binary unit (at most 1 MiB), referenced by one or
/// more recipes. Invariant: `hash == SHA-256(bytes)` (§8 invariant 1).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContentChunk {
    pub hash: Hash,
    pub bytes: Vec<u8>,
    pub refcount: u32,
}

/// One overlay file entry within a [`ModRecipe`]: the in-game path the mod
/// occupies and the chunk holding its bytes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FileEntry {
    pub game_path: String,
    pub chunk_hash: Hash,
}

/// The canonical descriptor of a player's current mod set.
///
/// `recipe_hash` is the SHA-256 of this struct's canonical serialization
/// (deterministic-JSON, matching the invite codec's encoding discipline).
/// Two peers with identical mod sets produce identical `recipe_hash`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModRecipe {
    pub recipe_hash: Hash,
    pub files: Vec<FileEntry>,
    pub appearance_blob_hash: Hash,
    pub body_scale_blob_hash: Hash,
    pub author_peer_id: PeerId,
    pub created_at: u64,
}

impl ModRecipe {
    /// Canonical bytes used to compute `recipe_hash`: every field except the
    /// hash itself, serialized with stable key ordering.
    pub fn canonical_bytes(
        files: &[FileEntry],
        appearance_blob_hash: &Hash,
        body_scale_blob_hash: &Hash,
        author_peer_id: &str,
        created_at: u64,
    ) -> Vec<u8> {
        #[derive(Serialize)]
        struct Canonical<'a> {
            files: &'a [FileEntry],
            appearance_blob_hash: &'a Hash,
            body_scale_blob_hash: &'a Hash,
            author_peer_id: &'a str,
            created_at: u64,
        }
        serde_json::to_vec(&Canonical {
            files,
            appearance_blob_hash,
            body_scale_blob_hash,
            author_peer_id,
            created_at,
        })
        .expect("ModRecipe fields are always JSON-serializable")
    }

    /// All chunk hashes this recipe references, including the appearance and
    /// body-scale blobs (§8 invariant 2: every referenced chunk must exist
    /// with refcount ≥ 1).
    pub fn referenced_chunk_hashes(&self) -> Vec<Hash> {
        let mut hashes: Vec<Hash> = self.files.iter().map(|f| f.chunk_hash).collect();
        hashes.push(self.appearance_blob_hash);
        hashes.push(self.body_scale_blob_hash);
        hashes
    }
}

/// Cached per-peer pointer to short-circuit transfer when a peer's current
/// recipe is unchanged.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComponentRef {
    pub component_hash: Hash,
    pub owner_peer_id: PeerId,
    pub expires_at: u64,
}

/// Records that the external mod applier has been asked to realize a given
/// recipe for a given peer at least once.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerCacheEntry {
    pub peer_id: PeerId,
    pub recipe_hash: Hash,
    pub last_applied_at: u64,
}
