//! # Relay Module
//!
//! A stateless fan-out hub. Clients connect over WebSocket; every frame any of
//! them sends is re-broadcast verbatim to all currently open connections.
//!
//! - [`registry`]: the broadcast membership set.
//! - [`server`]: the Axum router, socket handlers and static asset host.

pub mod registry;
pub mod server;

pub use registry::{ConnectionId, ConnectionRegistry, Fanout};
