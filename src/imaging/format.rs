//! Format identifiers understood by the codec registry.
//!
//! Formats are a closed set. Requests name them by MIME tag (`image/png`,
//! `image/jpeg`, `image/gif`); the CLI also maps file extensions onto them.
//! Matching on MIME tags is exact: `image/JPEG` or `image/jpeg; q=1` are
//! not recognized.

use std::fmt;
use std::path::Path;

/// One of the three supported encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Lossless bitmap.
    Png,
    /// Lossy photographic, quality-controlled.
    Jpeg,
    /// Paletted; only the first frame is read, a single frame is written.
    Gif,
}

impl Format {
    /// Every supported format, in registry order.
    pub const ALL: [Format; 3] = [Format::Png, Format::Jpeg, Format::Gif];

    /// Look up a format by its MIME tag.
    pub fn from_mime(id: &str) -> Option<Self> {
        match id {
            "image/png" => Some(Format::Png),
            "image/jpeg" => Some(Format::Jpeg),
            "image/gif" => Some(Format::Gif),
            _ => None,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            Format::Png => "image/png",
            Format::Jpeg => "image/jpeg",
            Format::Gif => "image/gif",
        }
    }

    /// Canonical file extension, used when naming converted files.
    pub fn extension(self) -> &'static str {
        match self {
            Format::Png => "png",
            Format::Jpeg => "jpg",
            Format::Gif => "gif",
        }
    }

    /// Look up a format by file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Format::Png),
            "jpg" | "jpeg" => Some(Format::Jpeg),
            "gif" => Some(Format::Gif),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Index into the registry table.
    pub(crate) fn index(self) -> usize {
        match self {
            Format::Png => 0,
            Format::Jpeg => 1,
            Format::Gif => 2,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// Which side of a conversion a format identifier belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Source,
    Destination,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Source => f.write_str("source"),
            Direction::Destination => f.write_str("destination"),
        }
    }
}
