//! # Degradation Engine
//!
//! Computes how generation *N* of a photocopy should look.
//!
//! ## Stages
//!
//! 1. [`schedule`]: generation -> resolution scale (a sawtooth with a period of
//!    [`CYCLE_LENGTH`] generations).
//! 2. [`pixelate`]: shrink to the scale and enlarge back, nearest-neighbour.
//! 3. [`tone`]: luma/contrast, threshold and noise, used by the live preview.
//!
//! Stages 1-2 are deterministic. The noise in stage 3 is random per call
//! unless the caller seeds the generator.

pub mod pixelate;
pub mod raster;
pub mod schedule;
pub mod tone;

pub use pixelate::{degrade, pixelate, reduced_dimensions};
pub use raster::RasterSurface;
pub use schedule::{resolution_scale, Generation, CYCLE_LENGTH, MIN_RESOLUTION, STEP_SIZE};
pub use tone::{apply_scan, apply_tone, ScanParams, ToneParams};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DegradeError {
    #[error("generation 0 is the pristine original and is never degraded")]
    ReservedGeneration,
    #[error("generation must be a non-negative integer, got {0}")]
    InvalidGeneration(f64),
    #[error("cannot degrade an image with a zero dimension")]
    EmptyImage,
}

/// Renders the image shown for `generation`: the original passes through
/// untouched, every later generation goes through [`degrade`].
pub fn render_generation<R>(image: &R, generation: Generation) -> Result<R, DegradeError>
where
    R: RasterSurface + Clone,
{
    if generation.is_original() {
        return Ok(image.clone());
    }
    degrade(image, generation)
}
