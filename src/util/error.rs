//! Error types for yolodecode.

use thiserror::Error;

/// Result alias for yolodecode operations.
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

/// Errors that can occur while decoding a frame.
///
/// Every variant is fatal for the frame it was raised on. Candidates below the
/// score floor and boxes that clip to nothing are not errors.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DecodeError {
    /// Tensor rank or dimensions disagree with the configured layout.
    #[error("shape mismatch for {shape:?}: {reason}")]
    ShapeMismatch {
        shape: Vec<usize>,
        reason: &'static str,
    },
    /// The backing buffer is shorter than the declared shape requires.
    #[error("buffer too small: needed {needed} elements, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// A decoded class id has no entry in the class table.
    #[error("class index {class_id} out of range for {len} class names")]
    ClassIndexOutOfRange { class_id: usize, len: usize },
    /// An index fell outside a bounded collection.
    #[error("{context} index {index} out of bounds (len {len})")]
    IndexOutOfBounds {
        index: usize,
        len: usize,
        context: &'static str,
    },
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Image loading or conversion failed.
    #[cfg(feature = "image-io")]
    #[error("image io: {reason}")]
    ImageIo { reason: String },
}
