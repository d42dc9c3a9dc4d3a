//! Bilinear resampling with source-over compositing.
//!
//! Every destination pixel is mapped back to a point in the source using
//! pixel-centre alignment:
//!
//! ```text
//! sx = (dx + 0.5) * src_w / dst_w - 0.5
//! ```
//!
//! and interpolated from the four surrounding source pixels, weighted by the
//! fractional offsets. Points left of the first centre or right of the last
//! one clamp to the edge column (rows likewise).
//!
//! Interpolation happens on premultiplied color so that transparent pixels do
//! not bleed their (meaningless) color into their neighbours. The sample is
//! then composited source-over onto the destination canvas, which starts out
//! fully transparent, and converted back to straight alpha.

use super::buffer::PixelBuffer;
use super::params::Dimensions;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResampleError {
    #[error("invalid target dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

/// Premultiplied RGBA with each channel in `0.0..=1.0`.
pub(crate) type Premul = [f32; 4];

pub(crate) const TRANSPARENT: Premul = [0.0; 4];
pub(crate) const OPAQUE_BLACK: Premul = [0.0, 0.0, 0.0, 1.0];

/// Largest target canvas, in pixels (1 GiB of RGBA8).
pub const MAX_PIXELS: u64 = 1 << 28;

/// Scale `source` to `width` x `height`.
///
/// When the size is unchanged the buffer is returned as-is.
pub fn scale(source: PixelBuffer, width: u32, height: u32) -> Result<PixelBuffer, ResampleError> {
    check_target(width, height)?;
    if source.dimensions() == Dimensions::new(width, height) {
        return Ok(source);
    }
    bilinear(&source, width, height)
}

/// Bilinear resample without the identity shortcut.
pub fn bilinear(
    source: &PixelBuffer,
    width: u32,
    height: u32,
) -> Result<PixelBuffer, ResampleError> {
    let len = check_target(width, height)?;
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| ResampleError::InvalidDimensions { width, height })?;

    let (sw, sh) = (source.width(), source.height());
    if sw == 0 || sh == 0 {
        // Nothing to sample from; the canvas stays transparent.
        data.resize(len, 0);
    } else {
        let mut columns: Vec<Tap> = Vec::new();
        columns
            .try_reserve_exact(width as usize)
            .map_err(|_| ResampleError::InvalidDimensions { width, height })?;
        columns.extend((0..width).map(|dx| Tap::new(dx, width, sw)));
        for dy in 0..height {
            let row = Tap::new(dy, height, sh);
            for col in &columns {
                let sample = sample(source, col, &row);
                let pixel = composite_over(sample, TRANSPARENT);
                data.extend_from_slice(&to_straight(pixel));
            }
        }
    }

    PixelBuffer::from_raw(width, height, data)
        .ok_or(ResampleError::InvalidDimensions { width, height })
}

/// Validate a target size and return its byte length.
///
/// Zero-sized targets and targets above [`MAX_PIXELS`] are rejected before
/// anything is allocated.
fn check_target(width: u32, height: u32) -> Result<usize, ResampleError> {
    let invalid = ResampleError::InvalidDimensions { width, height };
    let pixels = u64::from(width) * u64::from(height);
    if pixels == 0 || pixels > MAX_PIXELS {
        return Err(invalid);
    }
    usize::try_from(pixels)
        .ok()
        .and_then(|n| n.checked_mul(4))
        .ok_or(invalid)
}

/// The two source indices a destination coordinate reads from, and the
/// weight of the second one.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Tap {
    lo: u32,
    hi: u32,
    frac: f32,
}

impl Tap {
    fn new(dst: u32, dst_len: u32, src_len: u32) -> Self {
        let s = (f64::from(dst) + 0.5) * f64::from(src_len) / f64::from(dst_len) - 0.5;
        if s < 0.0 {
            return Self {
                lo: 0,
                hi: 0,
                frac: 0.0,
            };
        }
        let lo = s.floor() as u32;
        let hi = lo + 1;
        if hi >= src_len {
            let last = src_len - 1;
            return Self {
                lo: last,
                hi: last,
                frac: 0.0,
            };
        }
        Self {
            lo,
            hi,
            frac: (s - f64::from(lo)) as f32,
        }
    }
}

fn sample(source: &PixelBuffer, x: &Tap, y: &Tap) -> Premul {
    let p00 = premultiply(source.pixel(x.lo, y.lo));
    let p10 = premultiply(source.pixel(x.hi, y.lo));
    let p01 = premultiply(source.pixel(x.lo, y.hi));
    let p11 = premultiply(source.pixel(x.hi, y.hi));

    let (fx, fy) = (x.frac, y.frac);
    let w00 = (1.0 - fx) * (1.0 - fy);
    let w10 = fx * (1.0 - fy);
    let w01 = (1.0 - fx) * fy;
    let w11 = fx * fy;

    std::array::from_fn(|c| p00[c] * w00 + p10[c] * w10 + p01[c] * w01 + p11[c] * w11)
}

pub(crate) fn premultiply(px: [u8; 4]) -> Premul {
    let a = f32::from(px[3]) / 255.0;
    [
        f32::from(px[0]) / 255.0 * a,
        f32::from(px[1]) / 255.0 * a,
        f32::from(px[2]) / 255.0 * a,
        a,
    ]
}

/// Porter-Duff source-over: `fg + bg * (1 - fg.alpha)`.
pub(crate) fn composite_over(fg: Premul, bg: Premul) -> Premul {
    let keep = 1.0 - fg[3];
    std::array::from_fn(|c| fg[c] + bg[c] * keep)
}

pub(crate) fn to_straight(px: Premul) -> [u8; 4] {
    let a = px[3];
    if a <= 0.0 {
        return [0, 0, 0, 0];
    }
    [
        quantize(px[0] / a),
        quantize(px[1] / a),
        quantize(px[2] / a),
        quantize(a),
    ]
}

fn quantize(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}
