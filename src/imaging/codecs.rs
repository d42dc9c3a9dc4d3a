//! Codec registry built on the `image` crate.
//!
//! ## Format mapping
//!
//! | Format | Decode | Encode |
//! |---|---|---|
//! | PNG | `ImageReader` (png) | `PngEncoder`, RGBA8, lossless |
//! | JPEG | `ImageReader` (jpeg) | `JpegEncoder` at the requested quality, alpha flattened onto black |
//! | GIF | `ImageReader` (gif), first frame | `GifEncoder`, one still frame, palette quantized by the encoder |
//!
//! The table is a plain array of function pointers indexed by [`Format`].
//! It is built once, never mutated, and shared by reference between
//! concurrent conversions.

use super::backend::{CodecBackend, CodecError};
use super::buffer::PixelBuffer;
use super::format::Format;
use super::params::Quality;
use super::resample::{OPAQUE_BLACK, composite_over, premultiply, to_straight};
use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, Frame, ImageEncoder, ImageFormat, ImageReader};
use std::io::Cursor;

type DecodeFn = fn(&[u8]) -> Result<PixelBuffer, CodecError>;
type EncodeFn = fn(&PixelBuffer, Quality) -> Result<Vec<u8>, CodecError>;

/// Decode/encode pair for one format.
#[derive(Debug, Clone, Copy)]
pub struct Codec {
    pub format: Format,
    decode: DecodeFn,
    encode: EncodeFn,
}

/// Immutable dispatch table from [`Format`] to its [`Codec`].
#[derive(Debug, Clone)]
pub struct CodecRegistry {
    codecs: [Codec; 3],
}

impl CodecRegistry {
    pub fn new() -> Self {
        let codecs = [
            Codec {
                format: Format::Png,
                decode: decode_png,
                encode: encode_png,
            },
            Codec {
                format: Format::Jpeg,
                decode: decode_jpeg,
                encode: encode_jpeg,
            },
            Codec {
                format: Format::Gif,
                decode: decode_gif,
                encode: encode_gif,
            },
        ];
        debug_assert!(codecs.iter().all(|c| codecs[c.format.index()].format == c.format));
        Self { codecs }
    }

    pub fn codec(&self, format: Format) -> &Codec {
        &self.codecs[format.index()]
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CodecBackend for CodecRegistry {
    fn decode(&self, format: Format, bytes: &[u8]) -> Result<PixelBuffer, CodecError> {
        (self.codec(format).decode)(bytes)
    }

    fn encode(
        &self,
        format: Format,
        image: &PixelBuffer,
        quality: Quality,
    ) -> Result<Vec<u8>, CodecError> {
        (self.codec(format).encode)(image, quality)
    }
}

// =============================================================================
// Decoders
// =============================================================================

fn decode_with(bytes: &[u8], format: ImageFormat) -> Result<PixelBuffer, CodecError> {
    let image = ImageReader::with_format(Cursor::new(bytes), format).decode()?;
    Ok(PixelBuffer::from(image.into_rgba8()))
}

fn decode_png(bytes: &[u8]) -> Result<PixelBuffer, CodecError> {
    decode_with(bytes, ImageFormat::Png)
}

fn decode_jpeg(bytes: &[u8]) -> Result<PixelBuffer, CodecError> {
    decode_with(bytes, ImageFormat::Jpeg)
}

fn decode_gif(bytes: &[u8]) -> Result<PixelBuffer, CodecError> {
    decode_with(bytes, ImageFormat::Gif)
}

// =============================================================================
// Encoders
// =============================================================================

fn encode_png(image: &PixelBuffer, _quality: Quality) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    PngEncoder::new(&mut out).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ExtendedColorType::Rgba8,
    )?;
    Ok(out)
}

fn encode_jpeg(image: &PixelBuffer, quality: Quality) -> Result<Vec<u8>, CodecError> {
    let rgb = flatten_onto_black(image);
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality.value()).write_image(
        &rgb,
        image.width(),
        image.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(out)
}

fn encode_gif(image: &PixelBuffer, _quality: Quality) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    {
        // The trailer is written when the encoder drops.
        let mut encoder = GifEncoder::new(&mut out);
        encoder.encode_frame(Frame::new(image.as_image().clone()))?;
    }
    Ok(out)
}

/// Drop the alpha channel by compositing every pixel onto opaque black.
fn flatten_onto_black(image: &PixelBuffer) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(image.as_raw().len() / 4 * 3);
    for px in image.as_raw().chunks_exact(4) {
        if px[3] == u8::MAX {
            rgb.extend_from_slice(&px[..3]);
        } else {
            let flat = composite_over(premultiply([px[0], px[1], px[2], px[3]]), OPAQUE_BLACK);
            rgb.extend_from_slice(&to_straight(flat)[..3]);
        }
    }
    rgb
}
