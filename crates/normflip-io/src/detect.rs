//! Format detection utilities.
//!
//! Detects image formats from file extensions and magic bytes. Encoding is
//! always keyed on the extension; decoding prefers the file contents.

use crate::IoResult;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// OpenEXR format.
    Exr,
    /// PNG format.
    Png,
    /// JPEG format.
    Jpeg,
    /// TIFF format.
    Tiff,
    /// Truevision TGA format.
    Tga,
    /// Windows bitmap format.
    Bmp,
    /// WebP format.
    WebP,
    /// Unknown/unsupported format.
    Unknown,
}

impl Format {
    /// Every known format, in the order extensions are listed.
    pub const ALL: [Format; 7] = [
        Format::Png,
        Format::Jpeg,
        Format::Tga,
        Format::Tiff,
        Format::Bmp,
        Format::WebP,
        Format::Exr,
    ];

    /// Detects format from file path (magic bytes first, then extension).
    ///
    /// TGA has no signature, so it is only ever found by extension.
    pub fn detect<P: AsRef<Path>>(path: P) -> IoResult<Self> {
        let path = path.as_ref();

        if let Ok(format) = Self::from_magic_bytes(path) {
            if format != Format::Unknown {
                return Ok(format);
            }
        }

        Ok(Self::from_extension(path))
    }

    /// Detects format from file magic bytes.
    pub fn from_magic_bytes<P: AsRef<Path>>(path: P) -> IoResult<Self> {
        let mut file = File::open(path)?;
        let mut header = [0u8; 12];

        let bytes_read = file.read(&mut header)?;
        Ok(Self::from_bytes(&header[..bytes_read]))
    }

    /// Detects format from raw bytes (magic number check).
    pub fn from_bytes(bytes: &[u8]) -> Self {
        if bytes.len() < 2 {
            return Format::Unknown;
        }

        // EXR: 0x76 0x2f 0x31 0x01
        if bytes.starts_with(&[0x76, 0x2f, 0x31, 0x01]) {
            return Format::Exr;
        }

        // PNG: 0x89 0x50 0x4E 0x47 0x0D 0x0A 0x1A 0x0A
        if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Format::Png;
        }

        // JPEG: 0xFF 0xD8 0xFF
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Format::Jpeg;
        }

        // TIFF: II (little-endian) or MM (big-endian)
        if bytes.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || bytes.starts_with(&[0x4D, 0x4D, 0x00, 0x2A]) {
            return Format::Tiff;
        }

        // WebP: RIFF....WEBP
        if bytes.len() >= 12 && bytes[0..4] == *b"RIFF" && bytes[8..12] == *b"WEBP" {
            return Format::WebP;
        }

        // BMP: "BM"
        if bytes.starts_with(b"BM") {
            return Format::Bmp;
        }

        Format::Unknown
    }

    /// Detects format from file extension only (case-insensitive).
    pub fn from_extension<P: AsRef<Path>>(path: P) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some(ext) => Self::from_extension_str(ext),
            None => Format::Unknown,
        }
    }

    /// Maps a bare, lowercase extension (no dot) to a format.
    pub fn from_extension_str(ext: &str) -> Self {
        match ext {
            "exr" => Format::Exr,
            "png" => Format::Png,
            "jpg" | "jpeg" => Format::Jpeg,
            "tif" | "tiff" => Format::Tiff,
            "tga" => Format::Tga,
            "bmp" => Format::Bmp,
            "webp" => Format::WebP,
            _ => Format::Unknown,
        }
    }

    /// Returns all file extensions recognised for this format.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Format::Exr => &["exr"],
            Format::Png => &["png"],
            Format::Jpeg => &["jpg", "jpeg"],
            Format::Tiff => &["tif", "tiff"],
            Format::Tga => &["tga"],
            Format::Bmp => &["bmp"],
            Format::WebP => &["webp"],
            Format::Unknown => &[],
        }
    }

    /// Returns true for the floating-point HDR container.
    pub const fn is_hdr(&self) -> bool {
        matches!(self, Format::Exr)
    }

    /// Returns true if this format can store an alpha channel.
    pub const fn supports_alpha(&self) -> bool {
        matches!(
            self,
            Format::Exr | Format::Png | Format::Tiff | Format::Tga | Format::Bmp | Format::WebP
        )
    }
}
