//! Scanner wall: a photocopier installation.
//!
//! A control surface requests copies, a wall renders ever-more-degraded
//! generations of a source image, and a relay keeps the two in sync by
//! fanning out small JSON events.

pub mod client;
pub mod config;
pub mod control;
pub mod degrade;
pub mod protocol;
pub mod relay;
pub mod wall;

use tracing_subscriber::EnvFilter;

/// Installs the fmt subscriber, honouring `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
