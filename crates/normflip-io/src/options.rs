//! Encoder and codec configuration.

/// Lossless compression for container formats that offer a choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// LZW compression (lossless, good compression).
    Lzw,
    /// ZIP/Deflate compression.
    Deflate,
}

/// JPEG chroma subsampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromaSubsampling {
    /// 4:4:4, no subsampling.
    Full,
    /// 4:2:2, chroma halved horizontally.
    Half,
    /// 4:2:0, chroma halved in both directions.
    Quarter,
}

/// Format-specific encode knobs.
///
/// Each writer reads only the fields that apply to it. [`EncodeOptions::NONE`]
/// leaves every codec at its own defaults.
///
/// # Example
///
/// ```rust,ignore
/// use normflip_io::{ChromaSubsampling, EncodeOptions};
///
/// let jpeg = EncodeOptions {
///     quality: Some(95),
///     subsampling: Some(ChromaSubsampling::Half),
///     optimize: true,
///     ..EncodeOptions::NONE
/// };
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodeOptions {
    /// Lossy quality 1-100.
    pub quality: Option<u8>,
    /// Chroma subsampling for lossy codecs.
    pub subsampling: Option<ChromaSubsampling>,
    /// Spend extra time on smaller entropy-coded output.
    pub optimize: bool,
    /// Lossless compression method.
    pub compression: Option<Compression>,
}

impl EncodeOptions {
    /// No format-specific options.
    pub const NONE: Self = Self {
        quality: None,
        subsampling: None,
        optimize: false,
        compression: None,
    };

    /// Returns true if no option deviates from codec defaults.
    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

/// Which optional codecs a conversion may use.
///
/// Passed explicitly to whoever drives the codecs, so availability is
/// fixed when the consumer is built rather than by global state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    /// Allow reading and writing OpenEXR.
    pub exr: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            exr: cfg!(feature = "exr"),
        }
    }
}

impl CodecConfig {
    /// Returns true if EXR is both requested and compiled in.
    pub fn hdr_available(&self) -> bool {
        self.exr && cfg!(feature = "exr")
    }
}
