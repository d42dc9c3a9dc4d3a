//! # imgconv
//!
//! Decode an image, optionally resize it, and re-encode it as PNG, JPEG or
//! GIF. The work is done by a small synchronous pipeline that takes parsed
//! request fields plus a byte source and sink, and returns a typed error
//! when anything goes wrong.
//!
//! # Architecture: Four-Stage Pipeline
//!
//! ```text
//! 1. Decode     bytes + MIME tag   →  PixelBuffer   (codec registry)
//! 2. Resolve    source size + request  →  Dimensions
//! 3. Resample   PixelBuffer        →  PixelBuffer   (bilinear, source-over)
//! 4. Encode     PixelBuffer + MIME tag + quality  →  bytes → sink
//! ```
//!
//! Every stage owns its output and nothing outlives the call, so any number
//! of conversions can run at once without locks.
//!
//! ```no_run
//! use imgconv::pipeline::{ConversionRequest, Pipeline};
//!
//! let png = std::fs::read("photo.png")?;
//! let mut jpeg = Vec::new();
//! Pipeline::new().execute(ConversionRequest {
//!     source_format: "image/png".into(),
//!     source: png.as_slice(),
//!     destination_format: "image/jpeg".into(),
//!     width: 100,
//!     height: 0,
//!     quality: 0,
//!     sink: &mut jpeg,
//! })?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Formats, pixel buffers, codec registry, dimension math, resampler |
//! | [`pipeline`] | The orchestrator: [`pipeline::Pipeline::execute`] and its error type |
//! | [`request`] | Header/query parsing into a request, error → status code mapping |
//! | [`batch`] | Parallel conversion of a directory tree |
//! | [`config`] | `imgconv.toml` loading, merging and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## A Closed Set of Formats
//!
//! PNG, JPEG and GIF are an enum, not a plugin list. The codec table is
//! built once, never changes, and is passed to the pipeline explicitly.
//! There is no global registration step to forget.
//!
//! ## No Partial Output
//!
//! Images are decoded in full and encoded in full before a single byte
//! reaches the sink. Formats are validated before the source is read.
//!
//! ## Zero-Sized Targets Are Errors
//!
//! Deriving one side from the aspect ratio uses truncating integer math, so
//! a tiny requested size on an extreme aspect ratio can produce 0. That is
//! reported as [`pipeline::ConversionError::InvalidDimensions`] instead of
//! producing an empty image.

pub mod batch;
pub mod config;
pub mod imaging;
pub mod output;
pub mod pipeline;
pub mod request;

#[cfg(test)]
pub(crate) mod test_helpers;
