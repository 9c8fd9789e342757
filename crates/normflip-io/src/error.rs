//! Error types for I/O operations.
//!
//! Provides unified error handling for all image format operations.

use std::io;
use thiserror::Error;

/// I/O operation error.
#[derive(Debug, Error)]
pub enum IoError {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Unsupported format.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Decoding error.
    #[error("decode error: {0}")]
    DecodeError(String),

    /// Encoding error.
    #[error("encode error: {0}")]
    EncodeError(String),

    /// Sample store does not match the declared geometry.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected size.
        expected: String,
        /// Actual size.
        actual: String,
    },

    /// Sample type or channel count does not fit the requested layout.
    #[error("layout mismatch: {0}")]
    LayoutMismatch(String),

    /// Unsupported bit depth or color type.
    #[error("unsupported bit depth: {0}")]
    UnsupportedBitDepth(String),

    /// Codec not compiled in or disabled by configuration.
    #[error("feature unavailable: {0}")]
    UnsupportedFeature(String),
}

/// Result type for I/O operations.
pub type IoResult<T> = Result<T, IoError>;
