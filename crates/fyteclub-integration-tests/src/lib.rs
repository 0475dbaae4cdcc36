//! End-to-end scenarios spanning multiple component crates at once.
//!
//! This crate has no library surface of its own: every test under `tests/`
//! drives the same component crates the daemon wires together, without
//! going through a running process.
