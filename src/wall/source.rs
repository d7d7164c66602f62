//! Where the wall gets the current source image from.
//!
//! The image can change between prints, so every fetch goes back to the
//! source. HTTP fetches carry a `t=<millis>` query to defeat caches.

use anyhow::{Context, Result};
use image::RgbaImage;
use std::future::Future;
use std::path::PathBuf;

pub trait ImageSource {
    /// Loads and decodes the current source image.
    fn fetch(&self) -> impl Future<Output = Result<RgbaImage>> + Send;
}

/// Appends a cache-busting `t` query parameter.
pub fn cache_busted(url: &str, millis: i64) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}t={millis}")
}

fn decode(bytes: &[u8]) -> Result<RgbaImage> {
    Ok(image::load_from_memory(bytes)
        .context("failed to decode source image")?
        .to_rgba8())
}

/// Fetches the image from the static asset host.
#[derive(Debug, Clone)]
pub struct HttpImageSource {
    client: reqwest::Client,
    url: String,
}

impl HttpImageSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    /// The configured URL stamped with the current epoch milliseconds.
    pub fn request_url(&self) -> String {
        cache_busted(&self.url, chrono::Utc::now().timestamp_millis())
    }
}

impl ImageSource for HttpImageSource {
    async fn fetch(&self) -> Result<RgbaImage> {
        let url = self.request_url();
        let bytes = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .with_context(|| format!("failed to load {}", url))?
            .bytes()
            .await
            .with_context(|| format!("failed to read body of {}", url))?;
        decode(&bytes)
    }
}

/// Reads the image straight from disk.
#[derive(Debug, Clone)]
pub struct FileImageSource {
    path: PathBuf,
}

impl FileImageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ImageSource for FileImageSource {
    async fn fetch(&self) -> Result<RgbaImage> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("failed to load {}", self.path.display()))?;
        decode(&bytes)
    }
}
