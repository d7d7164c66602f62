//! Headless wall client.
//!
//! Connects to the relay, places the original, then answers every `print`
//! with a sweep and a new degraded copy written to `--output-dir`.

use anyhow::Result;
use clap::Parser;
use scanner_wall_lib::client::spawn_session;
use scanner_wall_lib::config::WallConfig;
use scanner_wall_lib::wall::animation::{TimedAnimator, DEFAULT_BAR_WIDTH};
use scanner_wall_lib::wall::layout::{CardSize, SCREEN_WIDTH};
use scanner_wall_lib::wall::{FileImageSource, HttpImageSource, ImageSource, WallOrchestrator};
use std::time::Duration;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    scanner_wall_lib::init_tracing();
    let config = WallConfig::parse();

    if let Some(dir) = &config.output_dir {
        tokio::fs::create_dir_all(dir).await?;
    }

    match config.image_url.clone() {
        Some(url) => run(HttpImageSource::new(url), &config).await,
        None => run(FileImageSource::new(config.image_path.clone()), &config).await,
    }
}

async fn run<S>(source: S, config: &WallConfig) -> Result<()>
where
    S: ImageSource + Send + Sync + 'static,
{
    let (link, session) = spawn_session(config.link.url.clone(), config.link.reconnect_delay());

    let mut animator = TimedAnimator::for_screen(SCREEN_WIDTH, DEFAULT_BAR_WIDTH);
    if let Some(ms) = config.sweep_ms {
        animator.sweep = Duration::from_millis(ms);
    }

    let card = CardSize::for_viewport(config.viewport_width);
    let mut wall = WallOrchestrator::new(source, animator, card, link.outbound);
    if let Some(dir) = &config.output_dir {
        wall = wall.with_output_dir(dir.clone());
    }

    if let Err(e) = wall.place_original().await {
        warn!(error = %format!("{:#}", e), "could not place the original");
    }

    info!(url = %config.link.url, "wall ready");
    wall.run(link.inbound).await;
    session.abort();
    Ok(())
}
