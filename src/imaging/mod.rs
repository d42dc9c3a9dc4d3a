//! Image codecs and pixel operations.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** PNG, JPEG, GIF | `image::ImageReader` |
//! | **Resolve size** | [`resolve_dimensions`] (integer aspect math) |
//! | **Resample** | [`resample::scale`], bilinear, premultiplied, source-over |
//! | **Encode** PNG, JPEG, GIF | `image::codecs::{png, jpeg, gif}` |
//!
//! The module is split into:
//! - **Format**: the closed set of supported formats and their MIME tags
//! - **Buffer / Parameters**: [`PixelBuffer`], [`Quality`], [`Dimensions`]
//! - **Calculations**: pure functions for dimension math (unit testable)
//! - **Resample**: the bilinear scaler
//! - **Backend**: [`CodecBackend`] trait + [`CodecRegistry`]

pub mod backend;
mod buffer;
mod calculations;
pub mod codecs;
mod format;
mod params;
pub mod resample;

pub use backend::{CodecBackend, CodecError};
pub use buffer::PixelBuffer;
pub use calculations::resolve_dimensions;
pub use codecs::CodecRegistry;
pub use format::{Direction, Format};
pub use params::{Dimensions, Quality};
pub use resample::ResampleError;
