//! The in-memory raster every stage hands to the next.

use super::params::Dimensions;
use image::{Rgba, RgbaImage};

/// Straight-alpha RGBA8 raster, row-major, four bytes per pixel.
///
/// Backed by [`RgbaImage`], so `data.len() == width * height * 4` always
/// holds. Buffers are never mutated once built: each stage produces a new
/// one or passes ownership through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    image: RgbaImage,
}

impl PixelBuffer {
    /// Wrap raw RGBA bytes. Returns `None` if the length does not match.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        // `RgbaImage::from_raw` accepts oversized containers; we do not.
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(4)?;
        if data.len() != expected {
            return None;
        }
        RgbaImage::from_raw(width, height, data).map(|image| Self { image })
    }

    /// Build a buffer by evaluating `f` for every pixel.
    pub fn from_fn(width: u32, height: u32, f: impl FnMut(u32, u32) -> Rgba<u8>) -> Self {
        Self {
            image: RgbaImage::from_fn(width, height, f),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width(), self.height())
    }

    /// Pixel at `(x, y)`. Panics when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.image.get_pixel(x, y).0
    }

    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }
}

impl From<RgbaImage> for PixelBuffer {
    fn from(image: RgbaImage) -> Self {
        Self { image }
    }
}
