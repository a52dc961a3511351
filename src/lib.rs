//! Pricing and status-transition engine for cabinet proposals.
//!
//! The library owns the deterministic money math and the proposal lifecycle
//! state machine; persistence, authentication, and notification delivery are
//! injected collaborators. The binary in `main.rs` wires the engine to an
//! in-memory repository and serves it over HTTP.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
