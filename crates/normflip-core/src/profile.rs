//! Per-extension output profiles.
//!
//! A [`FormatProfile`] tells the pipeline what the target container can
//! hold and which encoder knobs to use for it.

use normflip_io::{ChromaSubsampling, Compression, EncodeOptions, Format};
use std::path::Path;

/// Output policy for one file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatProfile {
    /// Container the extension maps to.
    pub format: Format,
    /// The container can store an alpha channel.
    pub supports_alpha: bool,
    /// The container holds floating-point samples.
    pub is_float_hdr: bool,
    /// Encoder options tried first.
    pub encode_options: EncodeOptions,
}

const JPEG_OPTIONS: EncodeOptions = EncodeOptions {
    quality: Some(95),
    subsampling: Some(ChromaSubsampling::Half),
    optimize: true,
    compression: None,
};

const TIFF_OPTIONS: EncodeOptions = EncodeOptions {
    compression: Some(Compression::Lzw),
    ..EncodeOptions::NONE
};

const fn profile(format: Format, encode_options: EncodeOptions) -> FormatProfile {
    FormatProfile {
        format,
        supports_alpha: format.supports_alpha(),
        is_float_hdr: format.is_hdr(),
        encode_options,
    }
}

static PROFILES: &[(&str, FormatProfile)] = &[
    ("png", profile(Format::Png, EncodeOptions::NONE)),
    ("jpg", profile(Format::Jpeg, JPEG_OPTIONS)),
    ("jpeg", profile(Format::Jpeg, JPEG_OPTIONS)),
    ("tga", profile(Format::Tga, EncodeOptions::NONE)),
    ("tif", profile(Format::Tiff, TIFF_OPTIONS)),
    ("tiff", profile(Format::Tiff, TIFF_OPTIONS)),
    ("bmp", profile(Format::Bmp, EncodeOptions::NONE)),
    ("webp", profile(Format::WebP, EncodeOptions::NONE)),
    ("exr", profile(Format::Exr, EncodeOptions::NONE)),
];

impl FormatProfile {
    /// Looks up the profile for a bare extension, ignoring case.
    pub fn for_extension(ext: &str) -> Option<&'static FormatProfile> {
        let ext = ext.to_ascii_lowercase();
        PROFILES
            .iter()
            .find(|(key, _)| *key == ext)
            .map(|(_, profile)| profile)
    }

    /// Looks up the profile for a path's extension.
    pub fn for_path(path: &Path) -> Option<&'static FormatProfile> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::for_extension)
    }
}
