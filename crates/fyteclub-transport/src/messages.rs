//! The 13 message kinds carried in a `ProtocolMessage` payload (§4.4).

use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use fyteclub_types::identity::{MemberToken, TokenCapabilities};
use fyteclub_types::phonebook::PhonebookEntry;
use fyteclub_types::{Hash, PeerId};

pub const MSG_HELLO: u8 = 1;
pub const MSG_KEEPALIVE: u8 = 2;
pub const MSG_PHONEBOOK_GOSSIP: u8 = 3;
pub const MSG_PHONEBOOK_REQUEST: u8 = 4;
pub const MSG_RECIPE_ANNOUNCE: u8 = 5;
pub const MSG_RECIPE_REQUEST: u8 = 6;
pub const MSG_RECIPE_DELIVER: u8 = 7;
pub const MSG_CHUNK_REQUEST: u8 = 8;
pub const MSG_CHUNK_DELIVER: u8 = 9;
pub const MSG_TOMBSTONE: u8 = 10;
pub const MSG_HOST_CLAIM: u8 = 11;
pub const MSG_AUTH_CHALLENGE: u8 = 12;
pub const MSG_AUTH_RESPONSE: u8 = 13;

/// Session opener: announces capabilities and, on reconnect, the member's
/// existing token.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Hello {
    pub token: Option<MemberToken>,
    pub capabilities: TokenCapabilities,
}

/// Application-level liveness ping (§4.3: sent every 15 s).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Keepalive {}

/// Unsolicited or debounced push of phonebook entries.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PhonebookGossip {
    pub entries: Vec<PhonebookEntry>,
}

/// Request entries authored after `since_sequence` (per-author).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PhonebookRequest {
    pub since_sequence: u64,
}

/// Advertises a recipe without sending its full contents.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecipeAnnounce {
    pub recipe_hash: Hash,
    pub summary: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecipeRequest {
    pub recipe_hash: Hash,
}

/// The full `ModRecipe`, AES-256-GCM-sealed under the group's mod key
/// (HKDF-SHA256, label `FyteClubMod`).
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecipeDeliver {
    pub recipe_hash: Hash,
    pub nonce: [u8; 12],
    #[serde_as(as = "serde_with::Bytes")]
    pub ciphertext: Vec<u8>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChunkRequest {
    pub chunk_hashes: Vec<Hash>,
}

/// A single chunk's bytes, sealed the same way as [`RecipeDeliver`].
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChunkDeliver {
    pub chunk_hash: Hash,
    pub nonce: [u8; 12],
    #[serde_as(as = "serde_with::Bytes")]
    pub ciphertext: Vec<u8>,
}

/// Host-authored removal of a member, carrying the tombstoned entry itself
/// so recipients can merge it directly (§4.6 rule 2).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tombstone {
    pub entry: PhonebookEntry,
}

/// Host-election bid exchanged at session open (§4.7).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HostClaim {
    pub uptime_seconds: u64,
    pub peer_id: PeerId,
}

/// Single-use, 30-second-valid reconnect challenge (§4.5).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthChallenge {
    pub nonce: [u8; 32],
}

/// Reconnect response: a signature over the challenge nonce plus the
/// member's existing token, for the responder to verify.
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde_as(as = "serde_with::Bytes")]
    pub signature: [u8; 64],
    pub token: MemberToken,
}

/// Every message kind a peer may send, tagged by [`TypedMessage::kind`] for
/// the wire envelope's `kind` field.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum TypedMessage {
    Hello(Hello),
    Keepalive(Keepalive),
    PhonebookGossip(PhonebookGossip),
    PhonebookRequest(PhonebookRequest),
    RecipeAnnounce(RecipeAnnounce),
    RecipeRequest(RecipeRequest),
    RecipeDeliver(RecipeDeliver),
    ChunkRequest(ChunkRequest),
    ChunkDeliver(ChunkDeliver),
    Tombstone(Tombstone),
    HostClaim(HostClaim),
    AuthChallenge(AuthChallenge),
    AuthResponse(AuthResponse),
}

impl TypedMessage {
    pub fn kind(&self) -> u8 {
        match self {
            Self::Hello(_) => MSG_HELLO,
            Self::Keepalive(_) => MSG_KEEPALIVE,
            Self::PhonebookGossip(_) => MSG_PHONEBOOK_GOSSIP,
            Self::PhonebookRequest(_) => MSG_PHONEBOOK_REQUEST,
            Self::RecipeAnnounce(_) => MSG_RECIPE_ANNOUNCE,
            Self::RecipeRequest(_) => MSG_RECIPE_REQUEST,
            Self::RecipeDeliver(_) => MSG_RECIPE_DELIVER,
            Self::ChunkRequest(_) => MSG_CHUNK_REQUEST,
            Self::ChunkDeliver(_) => MSG_CHUNK_DELIVER,
            Self::Tombstone(_) => MSG_TOMBSTONE,
            Self::HostClaim(_) => MSG_HOST_CLAIM,
            Self::AuthChallenge(_) => MSG_AUTH_CHALLENGE,
            Self::AuthResponse(_) => MSG_AUTH_RESPONSE,
        }
    }
}
