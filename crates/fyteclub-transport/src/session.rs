//! The opaque transport session contract (C3).
//!
//! A session is a bidirectional, reliable, in-order byte channel between two
//! peers. The underlying ICE/STUN/TURN (or, for standalone operation, QUIC)
//! machinery is treated as opaque: this module only requires that an
//! established session preserve ordering and raise [`TransportError::Disconnected`]
//! once it can no longer make progress.

use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use crate::{Result, TransportError};

/// Application-level keepalive cadence (§4.3).
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(15);
/// Number of consecutive missed keepalives before a session is declared dead.
pub const MAX_MISSED_KEEPALIVES: u32 = 3;

/// A bidirectional, reliable, in-order byte channel to one peer.
#[allow(async_fn_in_trait)]
pub trait Session: Send {
    /// Send one complete frame.
    async fn send(&mut self, frame: &[u8]) -> Result<()>;

    /// Receive the next complete frame, or `Err(Disconnected)` once the
    /// session can no longer make progress.
    async fn recv(&mut self) -> Result<Vec<u8>>;

    /// Close the session. Idempotent.
    async fn close(&mut self);
}

/// Tracks keepalive liveness for one session direction (§4.3: every 15 s,
/// dead after 3 consecutive misses).
pub struct Liveness {
    last_sent: Instant,
    missed: u32,
}

impl Liveness {
    pub fn new(now: Instant) -> Self {
        Self {
            last_sent: now,
            missed: 0,
        }
    }

    /// Whether a keepalive is due to be sent.
    pub fn should_send(&self, now: Instant) -> bool {
        now.duration_since(self.last_sent) >= KEEPALIVE_INTERVAL
    }

    /// Record that a keepalive interval elapsed with no traffic from the
    /// peer since the previous one was sent.
    pub fn record_missed(&mut self, now: Instant) {
        self.missed += 1;
        self.last_sent = now;
    }

    /// Record that traffic arrived from the peer, resetting the miss count.
    pub fn record_received(&mut self, now: Instant) {
        self.last_sent = now;
        self.missed = 0;
    }

    pub fn is_dead(&self) -> bool {
        self.missed >= MAX_MISSED_KEEPALIVES
    }
}

/// An in-process, channel-backed [`Session`] for tests and same-process
/// development loops. [`duplex_pair`] returns two ends wired to each other.
pub struct DuplexSession {
    tx: mpsc::UnboundedSender<Vec<u8>>,
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
    closed: bool,
}

/// Create a connected pair of in-process sessions.
pub fn duplex_pair() -> (DuplexSession, DuplexSession) {
    let (tx_a, rx_b) = mpsc::unbounded_channel();
    let (tx_b, rx_a) = mpsc::unbounded_channel();
    (
        DuplexSession {
            tx: tx_a,
            rx: rx_a,
            closed: false,
        },
        DuplexSession {
            tx: tx_b,
            rx: rx_b,
            closed: false,
        },
    )
}

impl Session for DuplexSession {
    async fn send(&mut self, frame: &[u8]) -> Result<()> {
        if self.closed {
            return Err(TransportError::Disconnected);
        }
        self.tx
            .send(frame.to_vec())
            .map_err(|_| TransportError::Disconnected)
    }

    async fn recv(&mut self) -> Result<Vec<u8>> {
        if self.closed {
            return Err(TransportError::Disconnected);
        }
        self.rx.recv().await.ok_or(TransportError::Disconnected)
    }

    async fn close(&mut self) {
        self.closed = true;
    }
}
