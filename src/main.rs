//! Scanner wall relay (server binary entry point).
//!
//! Keeps this file minimal: configuration is parsed here and everything
//! else is delegated to the library crate.

use anyhow::Result;
use clap::Parser;
use scanner_wall_lib::config::ServerConfig;
use scanner_wall_lib::relay::server;

/// Parses `PORT`/`--port` and friends, then serves until the process exits.
#[tokio::main]
async fn main() -> Result<()> {
    scanner_wall_lib::init_tracing();
    let config = ServerConfig::parse();
    server::start_server(&config).await
}
