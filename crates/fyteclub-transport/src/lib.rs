//! # fyteclub-transport
//!
//! Transport session (C3) and message protocol (C4) for syncshells.
//!
//! - [`session`]: the opaque `Session` contract peers exchange frames over,
//!   an in-process duplex implementation for tests, and a QUIC-backed
//!   implementation for standalone operation via [`quic`].
//! - [`wire`]: the `ProtocolMessage` frame envelope, content-hash dedup, and
//!   per-author sequence ordering.
//! - [`messages`]: the 13 message kinds carried inside a frame's payload.
//! - [`cbor`]: CBOR encode/decode helpers for payload bodies.

pub mod cbor;
pub mod messages;
pub mod quic;
pub mod session;
pub mod wire;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("session disconnected")]
    Disconnected,
}

pub type Result<T> = std::result::Result<T, TransportError>;
