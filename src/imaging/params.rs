//! Parameter types shared between the pipeline and the codecs.
//!
//! - [`Quality`]: lossy encoding quality (1–100, default 100). A request
//!   value of 0 means "use the default"; anything above 100 is clamped.
//! - [`Dimensions`]: a resolved output size.

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u8);

impl Quality {
    /// Highest quality; what a request gets when it does not ask for one.
    pub const MAX: Quality = Quality(100);

    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100) as u8)
    }

    /// Interpret a request's quality field, where 0 means unset.
    pub fn from_request(value: u32) -> Self {
        if value == 0 {
            Self::default()
        } else {
            Self::new(value)
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self::MAX
    }
}

/// Resolved output dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_maximum() {
        assert_eq!(Quality::default().value(), 100);
    }

    #[test]
    fn request_zero_means_default() {
        assert_eq!(Quality::from_request(0), Quality::MAX);
        assert_eq!(Quality::from_request(30).value(), 30);
        assert_eq!(Quality::from_request(1000).value(), 100);
    }
}
