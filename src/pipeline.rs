//! The conversion pipeline: decode → resolve size → resample → encode.
//!
//! [`Pipeline::execute`] is the single entry point. It is synchronous,
//! owns every intermediate buffer, and returns the first error it hits:
//!
//! ```text
//! 1. source/destination MIME tags  →  Format      (UnsupportedFormat)
//! 2. read source + decode          →  PixelBuffer (DecodeFailed)
//! 3. resolve_dimensions            →  Dimensions
//! 4. resample::scale               →  PixelBuffer (InvalidDimensions)
//! 5. encode, then write the sink                  (EncodeFailed)
//! ```
//!
//! Both format tags are checked before the source is read, and the sink is
//! only written once the whole image has been encoded, so a failed request
//! neither consumes its input nor leaves partial output behind.
//!
//! The pipeline does no logging; callers report errors however they like.
//! [`ConversionError::class`] tells them whether the caller or the
//! processing was at fault.

use crate::imaging::{
    CodecBackend, CodecError, CodecRegistry, Dimensions, Direction, Format, Quality,
    ResampleError, resample, resolve_dimensions,
};
use std::io::{Read, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("unsupported {direction} format: {id:?}")]
    UnsupportedFormat { direction: Direction, id: String },
    #[error("decode failed: {0}")]
    DecodeFailed(#[source] CodecError),
    #[error("encode failed: {0}")]
    EncodeFailed(#[source] CodecError),
    #[error("invalid target dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

/// Who a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The request asked for something that cannot be done.
    Client,
    /// The request was valid but processing it failed.
    Server,
}

impl ConversionError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ConversionError::UnsupportedFormat { .. }
            | ConversionError::InvalidDimensions { .. } => ErrorClass::Client,
            ConversionError::DecodeFailed(_) | ConversionError::EncodeFailed(_) => {
                ErrorClass::Server
            }
        }
    }
}

impl From<ResampleError> for ConversionError {
    fn from(err: ResampleError) -> Self {
        match err {
            ResampleError::InvalidDimensions { width, height } => {
                ConversionError::InvalidDimensions { width, height }
            }
        }
    }
}

/// A single conversion: where the bytes come from, what they are, and what
/// to turn them into.
///
/// `width`, `height` and `quality` use 0 for "unset".
#[derive(Debug)]
pub struct ConversionRequest<R, W> {
    pub source_format: String,
    pub source: R,
    pub destination_format: String,
    pub width: u32,
    pub height: u32,
    pub quality: u32,
    pub sink: W,
}

/// Runs conversions against a codec backend.
///
/// Holds no per-request state; one pipeline can serve any number of
/// concurrent conversions.
#[derive(Debug, Clone, Default)]
pub struct Pipeline<B = CodecRegistry> {
    backend: B,
}

impl Pipeline<CodecRegistry> {
    /// Pipeline over the built-in PNG/JPEG/GIF codecs.
    pub fn new() -> Self {
        Self::with_backend(CodecRegistry::new())
    }
}

impl<B: CodecBackend> Pipeline<B> {
    pub fn with_backend(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Convert `request.source` into `request.sink`.
    pub fn execute<R: Read, W: Write>(
        &self,
        request: ConversionRequest<R, W>,
    ) -> Result<(), ConversionError> {
        let ConversionRequest {
            source_format,
            mut source,
            destination_format,
            width,
            height,
            quality,
            mut sink,
        } = request;

        let from = parse_format(Direction::Source, source_format)?;
        let to = parse_format(Direction::Destination, destination_format)?;

        let mut bytes = Vec::new();
        source
            .read_to_end(&mut bytes)
            .map_err(|e| ConversionError::DecodeFailed(e.into()))?;
        let decoded = self
            .backend
            .decode(from, &bytes)
            .map_err(ConversionError::DecodeFailed)?;
        drop(bytes);

        let target = resolve_dimensions(decoded.dimensions(), Dimensions::new(width, height));
        let scaled = resample::scale(decoded, target.width, target.height)?;

        let encoded = self
            .backend
            .encode(to, &scaled, Quality::from_request(quality))
            .map_err(ConversionError::EncodeFailed)?;
        sink.write_all(&encoded)
            .and_then(|()| sink.flush())
            .map_err(|e| ConversionError::EncodeFailed(e.into()))
    }
}

fn parse_format(direction: Direction, id: String) -> Result<Format, ConversionError> {
    Format::from_mime(&id).ok_or(ConversionError::UnsupportedFormat { direction, id })
}

/// Convert with the built-in codecs.
pub fn execute<R: Read, W: Write>(request: ConversionRequest<R, W>) -> Result<(), ConversionError> {
    Pipeline::new().execute(request)
}
