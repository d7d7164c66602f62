//! Raster surface capability the degradation stages are written against.
//!
//! The engine only needs pixel access and a nearest-neighbour resample, so it
//! works on anything that provides those. [`image::RgbaImage`] is the
//! production surface.

use image::imageops::{self, FilterType};
use image::RgbaImage;

/// Bytes per pixel of the interleaved RGBA8 layout.
pub const CHANNELS: usize = 4;

pub trait RasterSurface {
    /// `(width, height)` in pixels.
    fn dimensions(&self) -> (u32, u32);

    /// Returns a new surface of the given size, sampled without interpolation.
    fn resample_nearest(&self, width: u32, height: u32) -> Self
    where
        Self: Sized;

    /// Interleaved RGBA8 pixels, row-major.
    fn pixels(&self) -> &[u8];

    fn pixels_mut(&mut self) -> &mut [u8];

    fn is_empty(&self) -> bool {
        let (width, height) = self.dimensions();
        width == 0 || height == 0
    }
}

impl RasterSurface for RgbaImage {
    fn dimensions(&self) -> (u32, u32) {
        RgbaImage::dimensions(self)
    }

    fn resample_nearest(&self, width: u32, height: u32) -> Self {
        imageops::resize(self, width, height, FilterType::Nearest)
    }

    fn pixels(&self) -> &[u8] {
        self.as_raw()
    }

    fn pixels_mut(&mut self) -> &mut [u8] {
        &mut **self
    }
}
