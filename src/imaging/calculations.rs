//! Pure calculation functions for output dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::Dimensions;

/// Resolve the output size of a conversion.
///
/// `requested` uses 0 for "unset". With neither side set the source size is
/// kept; with one side set the other is derived from the source aspect ratio
/// using truncating integer division; with both set they are used verbatim,
/// even if that distorts the image.
///
/// A derived side can truncate to 0 (e.g. height 1 on a very wide image).
/// That is not corrected here; the resampler rejects it.
///
/// # Examples
/// ```
/// # use imgconv::imaging::{Dimensions, resolve_dimensions};
/// let source = Dimensions::new(300, 200);
/// assert_eq!(resolve_dimensions(source, Dimensions::new(0, 0)), source);
/// assert_eq!(resolve_dimensions(source, Dimensions::new(150, 0)), Dimensions::new(150, 100));
/// assert_eq!(resolve_dimensions(source, Dimensions::new(0, 50)), Dimensions::new(75, 50));
/// assert_eq!(resolve_dimensions(source, Dimensions::new(10, 10)), Dimensions::new(10, 10));
/// ```
pub fn resolve_dimensions(source: Dimensions, requested: Dimensions) -> Dimensions {
    let Dimensions {
        width: sw,
        height: sh,
    } = source;

    match (requested.width, requested.height) {
        (0, 0) => source,
        (0, rh) => Dimensions::new(scale_side(rh, sw, sh), rh),
        (rw, 0) => Dimensions::new(rw, scale_side(rw, sh, sw)),
        (rw, rh) => Dimensions::new(rw, rh),
    }
}

/// `given * numerator / denominator`, truncated.
///
/// Computed in 64 bits so large inputs cannot wrap. A zero denominator
/// yields 0 and a result past `u32::MAX` saturates.
fn scale_side(given: u32, numerator: u32, denominator: u32) -> u32 {
    (u64::from(given) * u64::from(numerator))
        .checked_div(u64::from(denominator))
        .map_or(0, |v| u32::try_from(v).unwrap_or(u32::MAX))
}
