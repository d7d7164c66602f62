//! # Tone Pipeline
//!
//! The photocopier look for the live preview: greyscale with contrast and
//! exposure, hard black/white threshold, then speckle noise.
//!
//! Independent of the resolution schedule. [`apply_scan`] composes the two in
//! the order the preview uses (tone first, pixelation last); other callers
//! may compose [`apply_tone`] and [`pixelate`](super::pixelate) either way.

use super::pixelate::pixelate;
use super::raster::{RasterSurface, CHANNELS};
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Luma midpoint contrast is applied around.
pub const CONTRAST_MIDPOINT: f32 = 128.0;

/// Chance that a noise-flipped pixel turns white rather than black.
pub const NOISE_WHITE_BIAS: f64 = 0.6;

/// Resolution bounds accepted by the live preview.
pub const PREVIEW_RESOLUTION_RANGE: (f64, f64) = (0.2, 1.0);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneParams {
    /// Multiplier around [`CONTRAST_MIDPOINT`]. 1.0 leaves luma unchanged.
    pub contrast: f32,
    /// Offset added to luma after contrast.
    pub exposure: f32,
    /// Luma strictly above this turns white, everything else black.
    pub threshold: f32,
    /// Per-pixel probability of a random black/white flip, in `[0, 1]`.
    pub noise: f64,
}

impl Default for ToneParams {
    fn default() -> Self {
        Self {
            contrast: 1.0,
            exposure: 0.0,
            threshold: 128.0,
            noise: 0.0,
        }
    }
}

/// Live preview parameters: tone settings plus a resolution scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanParams {
    #[serde(flatten)]
    pub tone: ToneParams,
    pub resolution: f64,
}

impl Default for ScanParams {
    fn default() -> Self {
        Self {
            tone: ToneParams::default(),
            resolution: 1.0,
        }
    }
}

/// Rec. 709 luma.
pub fn luma(r: u8, g: u8, b: u8) -> f32 {
    0.2126 * r as f32 + 0.7152 * g as f32 + 0.0722 * b as f32
}

fn set_grey(px: &mut [u8], value: u8) {
    px[0] = value;
    px[1] = value;
    px[2] = value;
}

/// Converts to greyscale, applying contrast and exposure. Alpha is untouched.
pub fn apply_contrast<R: RasterSurface>(image: &mut R, contrast: f32, exposure: f32) {
    image
        .pixels_mut()
        .par_chunks_exact_mut(CHANNELS)
        .for_each(|px| {
            let y = luma(px[0], px[1], px[2]);
            let y = (y - CONTRAST_MIDPOINT) * contrast + CONTRAST_MIDPOINT + exposure;
            set_grey(px, y.clamp(0.0, 255.0).round() as u8);
        });
}

/// Maps the red channel (grey after [`apply_contrast`]) to pure black or white.
pub fn apply_threshold<R: RasterSurface>(image: &mut R, threshold: f32) {
    image
        .pixels_mut()
        .par_chunks_exact_mut(CHANNELS)
        .for_each(|px| {
            let value = if px[0] as f32 > threshold { 255 } else { 0 };
            set_grey(px, value);
        });
}

/// Flips each pixel to black or white with probability `noise`.
///
/// Sequential so a seeded `rng` gives reproducible output.
pub fn apply_noise<R: RasterSurface, G: Rng + ?Sized>(image: &mut R, noise: f64, rng: &mut G) {
    if noise <= 0.0 {
        return;
    }
    for px in image.pixels_mut().chunks_exact_mut(CHANNELS) {
        if rng.gen::<f64>() < noise {
            let value = if rng.gen::<f64>() < NOISE_WHITE_BIAS { 255 } else { 0 };
            set_grey(px, value);
        }
    }
}

/// Contrast/exposure, threshold, then noise.
pub fn apply_tone<R: RasterSurface, G: Rng + ?Sized>(image: &mut R, params: &ToneParams, rng: &mut G) {
    apply_contrast(image, params.contrast, params.exposure);
    apply_threshold(image, params.threshold);
    apply_noise(image, params.noise, rng);
}

/// Live preview transform: [`apply_tone`] followed by pixelation at
/// `params.resolution` clamped to [`PREVIEW_RESOLUTION_RANGE`].
pub fn apply_scan<R, G>(input: &R, params: &ScanParams, rng: &mut G) -> R
where
    R: RasterSurface + Clone,
    G: Rng + ?Sized,
{
    let mut toned = input.clone();
    apply_tone(&mut toned, &params.tone, rng);
    let (lo, hi) = PREVIEW_RESOLUTION_RANGE;
    let resolution = if params.resolution.is_nan() { hi } else { params.resolution.clamp(lo, hi) };
    pixelate(&toned, resolution)
}
