//! Shrink-then-enlarge pixelation.
//!
//! The only mechanism producing the blocky copy look: sample the surface down
//! to `scale` of its size and back up again, nearest-neighbour both ways.

use super::raster::RasterSurface;
use super::schedule::{resolution_scale, Generation};
use super::DegradeError;

/// Size of the intermediate surface, at least one pixel per side.
pub fn reduced_dimensions(width: u32, height: u32, scale: f64) -> (u32, u32) {
    let shrink = |side: u32| ((side as f64 * scale).round() as u32).max(1);
    (shrink(width), shrink(height))
}

/// Pixelates `image` at the given resolution scale. Output dimensions always
/// equal input dimensions.
pub fn pixelate<R: RasterSurface>(image: &R, scale: f64) -> R {
    let (width, height) = image.dimensions();
    let (small_w, small_h) = reduced_dimensions(width, height, scale);
    image
        .resample_nearest(small_w, small_h)
        .resample_nearest(width, height)
}

/// Renders generation `generation` of a degraded copy.
///
/// # Errors
///
/// * [`DegradeError::ReservedGeneration`] for generation 0.
/// * [`DegradeError::EmptyImage`] when either dimension is zero.
pub fn degrade<R: RasterSurface>(image: &R, generation: Generation) -> Result<R, DegradeError> {
    let scale = resolution_scale(generation)?;
    if image.is_empty() {
        return Err(DegradeError::EmptyImage);
    }
    Ok(pixelate(image, scale))
}
