//! Shared test utilities: synthetic images and encoded fixtures.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let png = encoded(Format::Png, &gradient(300, 300));
//! let tmp = fixture_dir(&[("a/001-dawn.png", &png)]);
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::imaging::{CodecBackend, CodecRegistry, Format, PixelBuffer, Quality};
use image::Rgba;

// =========================================================================
// Synthetic pixel buffers
// =========================================================================

/// Every pixel set to `rgba`.
pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> PixelBuffer {
    PixelBuffer::from_fn(width, height, |_, _| Rgba(rgba))
}

/// Opaque gradient: red follows x, green follows y, blue fixed.
pub fn gradient(width: u32, height: u32) -> PixelBuffer {
    PixelBuffer::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
    })
}

/// Opaque one-pixel black/white checkerboard.
pub fn checkerboard(width: u32, height: u32) -> PixelBuffer {
    PixelBuffer::from_fn(width, height, |x, y| {
        let v = if (x + y) % 2 == 0 { 0 } else { 255 };
        Rgba([v, v, v, 255])
    })
}

// =========================================================================
// Encoded fixtures
// =========================================================================

/// Encode `image` with the production registry. Panics on failure.
pub fn encoded(format: Format, image: &PixelBuffer) -> Vec<u8> {
    CodecRegistry::new()
        .encode(format, image, Quality::default())
        .unwrap_or_else(|e| panic!("failed to encode {format}: {e}"))
}

/// Decode `bytes` with the production registry. Panics on failure.
pub fn decoded(format: Format, bytes: &[u8]) -> PixelBuffer {
    CodecRegistry::new()
        .decode(format, bytes)
        .unwrap_or_else(|e| panic!("failed to decode {format}: {e}"))
}

/// Write `(relative path, bytes)` pairs into a fresh temp directory.
pub fn fixture_dir(files: &[(&str, &[u8])]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for (rel, bytes) in files {
        let path = tmp.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, bytes).unwrap();
    }
    tmp
}

/// Read an image file, inferring its format from the extension.
pub fn read_image(path: &Path) -> PixelBuffer {
    let format = Format::from_path(path)
        .unwrap_or_else(|| panic!("no format for {}", path.display()));
    decoded(format, &std::fs::read(path).unwrap())
}
