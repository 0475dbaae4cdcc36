//! # fyteclub-daemon
//!
//! The standalone syncshell process: profile bootstrap (identity, config,
//! index database), and the minimal CLI surface over the component
//! library crates (§6).
//!
//! Everything networking-shaped (transport, proximity scanning, the mod
//! adapter) is an external collaborator per the component contracts; this
//! binary exercises the persisted-state half of the system so it is
//! independently runnable for development and testing.

pub mod commands;
pub mod config;
pub mod identity;
pub mod keystore;

use std::path::PathBuf;

use rusqlite::Connection;

use fyteclub_crypto::ed25519::SigningKey;
use fyteclub_types::identity::PeerIdentity;

/// Top-level daemon error. Maps to one of the five CLI exit codes in §6.
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("crypto failure: {0}")]
    Crypto(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error(transparent)]
    Db(#[from] fyteclub_db::DbError),

    #[error(transparent)]
    Store(#[from] fyteclub_store::StoreError),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DaemonError {
    /// The CLI exit code this error maps to (§6: 0 success, 2 invalid
    /// argument, 3 crypto failure, 4 not found, 5 transport failure).
    pub fn exit_code(&self) -> i32 {
        match self {
            DaemonError::InvalidArgument(_) => 2,
            DaemonError::Crypto(_) => 3,
            DaemonError::NotFound(_) => 4,
            DaemonError::Transport(_) => 5,
            // Structural storage errors surface as "not found" to the CLI
            // caller unless they are plainly a malformed request.
            DaemonError::Db(_) | DaemonError::Store(_) | DaemonError::Sqlite(_) | DaemonError::Io(_) => 4,
        }
    }
}

pub type Result<T> = std::result::Result<T, DaemonError>;

/// Everything a command handler needs: the open index database, the
/// profile's identity, and where its files live on disk.
pub struct DaemonContext {
    pub conn: Connection,
    pub data_dir: PathBuf,
    pub signing_key: SigningKey,
    pub identity: PeerIdentity,
    pub store_capacity_bytes: u64,
}

impl DaemonContext {
    /// Bootstrap a profile at `data_dir`: ensure the directory exists, load
    /// or create the local identity, and open the index database.
    pub fn bootstrap(data_dir: PathBuf, store_capacity_bytes: u64) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&data_dir)?;
        let content_dir = data_dir.join("content");
        std::fs::create_dir_all(&content_dir)?;

        let file_keystore = keystore::FileKeystore::new(&data_dir);
        let (signing_key, identity) = identity::load_or_create(&data_dir, &file_keystore)?;

        let db_path = content_dir.join("index.db");
        let conn = fyteclub_db::open(&db_path)?;

        Ok(Self {
            conn,
            data_dir,
            signing_key,
            identity,
            store_capacity_bytes,
        })
    }

    pub fn content_dir(&self) -> PathBuf {
        self.data_dir.join("content")
    }

    /// Open a second connection to the same index database, scoped to the
    /// content store (which owns its `Connection` outright).
    pub fn open_store(&self) -> Result<fyteclub_store::ContentStore> {
        let db_path = self.content_dir().join("index.db");
        let conn = fyteclub_db::open(&db_path)?;
        Ok(fyteclub_store::ContentStore::open(
            conn,
            self.content_dir().join("chunks"),
            self.store_capacity_bytes,
        )?)
    }
}
