//! # fyteclub-sync
//!
//! Mod transfer (§4.9) and the proximity-driven sync scheduler (§4.10).
//!
//! Both modules are pure decision state machines, the same split the
//! transport crate uses for keepalive liveness: no I/O happens here, only
//! "given this input, what should the caller do next."

pub mod proximity;
pub mod transfer;

pub use proximity::ProximityScheduler;
pub use transfer::{InboundTransfer, OutboundRateLimiter};
