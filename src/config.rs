//! Command-line and environment configuration for the three binaries.
//!
//! Every option can also be supplied through the environment so the
//! installation can be started from a plain service unit.

use clap::{Args, Parser};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Default port shared by the relay and the client URLs.
pub const DEFAULT_PORT: u16 = 8080;

/// Relay server options.
#[derive(Debug, Clone, Parser)]
#[command(name = "scanner-relay")]
#[command(about = "Event relay and static asset host for the scanner wall")]
pub struct ServerConfig {
    /// Listening port.
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Interface to bind.
    #[arg(long, env = "BIND_ADDR", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind: IpAddr,

    /// Directory holding wall.html, control.html, scripts and the source image.
    #[arg(long, env = "PUBLIC_DIR", default_value = "public")]
    pub public_dir: PathBuf,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

/// Options shared by both client roles.
#[derive(Debug, Clone, Args)]
pub struct LinkConfig {
    /// Relay WebSocket URL.
    #[arg(long, env = "RELAY_URL", default_value = "ws://127.0.0.1:8080/")]
    pub url: String,

    /// Constant delay before each reconnect attempt, in milliseconds.
    #[arg(long, env = "RECONNECT_MS", default_value_t = 1000)]
    pub reconnect_ms: u64,
}

impl LinkConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_ms)
    }
}

/// Headless wall client options.
#[derive(Debug, Clone, Parser)]
#[command(name = "scanner-wall")]
#[command(about = "Renders ever-more-degraded copies of the source image")]
pub struct WallConfig {
    #[command(flatten)]
    pub link: LinkConfig,

    /// HTTP URL of the source image. A `t=<millis>` query is appended per fetch.
    #[arg(long, env = "SOURCE_IMAGE_URL", conflicts_with = "image_path")]
    pub image_url: Option<String>,

    /// Local path of the source image, used when no URL is given.
    #[arg(long, env = "SOURCE_IMAGE_PATH", default_value = "public/manual.png")]
    pub image_path: PathBuf,

    /// Where rendered copies are written as `copy-NNNN.png`.
    #[arg(long, env = "WALL_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Viewport width the card size is derived from.
    #[arg(long, env = "WALL_VIEWPORT_WIDTH", default_value_t = 1920.0)]
    pub viewport_width: f64,

    /// Overrides the sweep duration derived from the viewport, in milliseconds.
    #[arg(long, env = "WALL_SWEEP_MS")]
    pub sweep_ms: Option<u64>,
}

/// Terminal control client options.
#[derive(Debug, Clone, Parser)]
#[command(name = "scanner-control")]
#[command(about = "Press Enter to request a copy")]
pub struct ControlConfig {
    #[command(flatten)]
    pub link: LinkConfig,

    /// Watchdog that clears a stuck busy state, in milliseconds.
    #[arg(long, env = "BUSY_TIMEOUT_MS", default_value_t = 8000)]
    pub busy_timeout_ms: u64,
}

impl ControlConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_socket_addr_joins_bind_and_port() {
        let config = ServerConfig::parse_from([
            "scanner-relay",
            "--port",
            "9090",
            "--bind",
            "127.0.0.1",
        ]);
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:9090");
    }

    #[test]
    fn control_durations_convert_from_millis() {
        let config = ControlConfig::parse_from([
            "scanner-control",
            "--busy-timeout-ms",
            "8000",
            "--reconnect-ms",
            "1000",
        ]);
        assert_eq!(config.busy_timeout(), Duration::from_secs(8));
        assert_eq!(config.link.reconnect_delay(), Duration::from_secs(1));
    }

    #[test]
    fn wall_accepts_explicit_flags() {
        let config = WallConfig::parse_from([
            "scanner-wall",
            "--url",
            "ws://10.0.0.2:9000/",
            "--output-dir",
            "/tmp/copies",
            "--viewport-width",
            "1280",
        ]);
        assert_eq!(config.link.url, "ws://10.0.0.2:9000/");
        assert_eq!(config.output_dir, Some(PathBuf::from("/tmp/copies")));
        assert_eq!(config.viewport_width, 1280.0);
        assert!(config.image_url.is_none());
    }
}
