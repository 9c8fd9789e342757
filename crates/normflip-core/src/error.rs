//! Conversion errors.
//!
//! Every variant is scoped to a single input file; none of them should
//! stop a batch.

use normflip_io::{ChannelLayout, IoError};
use std::path::PathBuf;
use thiserror::Error;

/// Per-file conversion failure.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The input could not be read or decoded.
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        /// Input file.
        path: PathBuf,
        /// Underlying codec error.
        #[source]
        source: IoError,
    },

    /// The output could not be encoded or written.
    #[error("failed to encode {}: {source}", path.display())]
    Encode {
        /// Output file.
        path: PathBuf,
        /// Underlying codec error.
        #[source]
        source: IoError,
    },

    /// The decoded image has no green channel to flip.
    #[error("unexpected channel layout {layout:?} in {}", path.display())]
    UnexpectedLayout {
        /// Input file.
        path: PathBuf,
        /// Layout the decoder produced.
        layout: ChannelLayout,
    },

    /// The decoded image has no pixels.
    #[error("empty image: {}", path.display())]
    EmptyImage {
        /// Input file.
        path: PathBuf,
    },

    /// EXR input while the HDR codec is not available.
    #[error("EXR support unavailable, skipping {}", path.display())]
    HdrUnavailable {
        /// Input file.
        path: PathBuf,
    },

    /// No output name can be derived, or it would be the input itself.
    #[error("invalid input path: {}", path.display())]
    InvalidPath {
        /// Input file.
        path: PathBuf,
    },
}

impl ConvertError {
    /// Returns true if the file was skipped rather than failed.
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::HdrUnavailable { .. })
    }
}

/// Result type for conversions.
pub type ConvertResult<T> = Result<T, ConvertError>;
