//! Codec backend trait and shared error type.
//!
//! The [`CodecBackend`] trait is the seam between the pipeline and the
//! codecs: decode bytes of a known [`Format`] into a [`PixelBuffer`], and
//! encode a buffer back into bytes. The production implementation is
//! [`CodecRegistry`](super::codecs::CodecRegistry), a fixed table built on
//! the `image` crate. Tests swap in a recording mock.

use super::buffer::PixelBuffer;
use super::format::Format;
use super::params::Quality;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// Decode and encode the supported formats.
///
/// Implementations must be safe to call from many conversions at once; they
/// hold no per-call state.
pub trait CodecBackend: Sync {
    /// Decode a complete encoded image.
    fn decode(&self, format: Format, bytes: &[u8]) -> Result<PixelBuffer, CodecError>;

    /// Encode `image` in full. Formats without a quality knob ignore `quality`.
    fn encode(
        &self,
        format: Format,
        image: &PixelBuffer,
        quality: Quality,
    ) -> Result<Vec<u8>, CodecError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mock backend that records operations instead of running codecs.
    ///
    /// `decode` hands out the queued buffers (or fails when the queue is
    /// empty); `encode` returns the encoded dimensions as text so tests can
    /// check what reached the sink. Uses Mutex (not RefCell) so it is Sync.
    #[derive(Default)]
    pub struct MockBackend {
        pub decode_results: Mutex<Vec<PixelBuffer>>,
        pub fail_encode: bool,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Decode {
            format: Format,
            len: usize,
        },
        Encode {
            format: Format,
            width: u32,
            height: u32,
            quality: u8,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_images(images: Vec<PixelBuffer>) -> Self {
            Self {
                decode_results: Mutex::new(images),
                ..Self::default()
            }
        }

        pub fn failing_encode(images: Vec<PixelBuffer>) -> Self {
            Self {
                fail_encode: true,
                ..Self::with_images(images)
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }
    }

    impl CodecBackend for MockBackend {
        fn decode(&self, format: Format, bytes: &[u8]) -> Result<PixelBuffer, CodecError> {
            self.operations.lock().unwrap().push(RecordedOp::Decode {
                format,
                len: bytes.len(),
            });

            self.decode_results.lock().unwrap().pop().ok_or_else(|| {
                CodecError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "no mock image",
                ))
            })
        }

        fn encode(
            &self,
            format: Format,
            image: &PixelBuffer,
            quality: Quality,
        ) -> Result<Vec<u8>, CodecError> {
            self.operations.lock().unwrap().push(RecordedOp::Encode {
                format,
                width: image.width(),
                height: image.height(),
                quality: quality.value(),
            });

            if self.fail_encode {
                return Err(CodecError::Io(std::io::Error::other("mock encode failure")));
            }
            Ok(format!("{}x{}", image.width(), image.height()).into_bytes())
        }
    }

    #[test]
    fn mock_records_decode() {
        let backend = MockBackend::with_images(vec![PixelBuffer::from_fn(8, 6, |_, _| {
            image::Rgba([0, 0, 0, 255])
        })]);

        let result = backend.decode(Format::Png, b"abc").unwrap();
        assert_eq!(result.width(), 8);
        assert_eq!(result.height(), 6);

        let ops = backend.get_operations();
        assert_eq!(
            ops,
            vec![RecordedOp::Decode {
                format: Format::Png,
                len: 3
            }]
        );
    }

    #[test]
    fn mock_decode_without_images_fails() {
        let backend = MockBackend::new();
        assert!(backend.decode(Format::Gif, b"").is_err());
    }

    #[test]
    fn mock_records_encode() {
        let backend = MockBackend::new();
        let image = PixelBuffer::from_fn(4, 2, |_, _| image::Rgba([0, 0, 0, 255]));

        let bytes = backend
            .encode(Format::Jpeg, &image, Quality::new(80))
            .unwrap();
        assert_eq!(bytes, b"4x2");

        assert!(matches!(
            &backend.get_operations()[0],
            RecordedOp::Encode {
                format: Format::Jpeg,
                width: 4,
                height: 2,
                quality: 80,
            }
        ));
    }
}
