//! # normflip-io
//!
//! Format-preserving image I/O for normal-map conversion.
//!
//! Every supported container decodes into a [`PixelBuffer`] that keeps the
//! file's native channel layout, and encodes back from one with
//! per-call [`EncodeOptions`]:
//!
//! - **PNG** - 8-bit, grayscale/RGB with or without alpha, `tRNS` aware
//! - **JPEG** - 8-bit, quality, chroma subsampling and Huffman optimisation
//! - **TIFF** - 8-bit, LZW or Deflate compression
//! - **TGA / BMP / WebP** - via the `image` crate
//! - **EXR** - 32-bit float RGB(A), kept in blue-green-red order
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use normflip_io::{read, write_with_options, EncodeOptions};
//!
//! let image = read("rock_normal_map.png")?;
//! write_with_options("rock_normal_map_DX.png", &image, &EncodeOptions::NONE)?;
//! ```
//!
//! # Channel layouts
//!
//! | Layout | Channels | Samples | Produced by |
//! |--------|----------|---------|-------------|
//! | `Rgb8` | 3 | u8 | all standard formats |
//! | `Rgba8` | 4 | u8 | PNG, TIFF, TGA, BMP, WebP |
//! | `Gray8` | 1 | u8 | PNG, JPEG, TIFF, TGA, BMP |
//! | `GrayAlpha8` | 2 | u8 | PNG, TIFF, TGA |
//! | `Bgr32F` | 3 | f32 | EXR |
//! | `Bgra32F` | 4 | f32 | EXR |
//!
//! # Feature Flags
//!
//! - `exr` - OpenEXR support (default)
//! - `png` - PNG support (default)
//! - `jpeg` - JPEG support (default)
//! - `tiff` - TIFF support (default)
//! - `raster` - TGA, BMP and WebP through `image` (default)

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod detect;
mod error;
mod options;

#[cfg(feature = "exr")]
pub mod exr;

#[cfg(feature = "png")]
pub mod png;

#[cfg(feature = "jpeg")]
pub mod jpeg;

#[cfg(feature = "tiff")]
pub mod tiff;

#[cfg(feature = "raster")]
pub mod raster;

pub use detect::Format;
pub use error::{IoError, IoResult};
pub use options::{ChromaSubsampling, CodecConfig, Compression, EncodeOptions};

use std::path::Path;
use tracing::trace;

/// Reads an image from a file, auto-detecting the format.
///
/// The format is detected by magic bytes, falling back to the extension.
/// The returned buffer keeps the file's native channel layout.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be opened
/// - The format is not supported or its codec is not compiled in
/// - The file is corrupted
#[allow(unreachable_patterns)]
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<PixelBuffer> {
    let path = path.as_ref();
    let format = Format::detect(path)?;
    trace!(path = %path.display(), ?format, "read");

    match format {
        #[cfg(feature = "exr")]
        Format::Exr => exr::read(path),

        #[cfg(feature = "png")]
        Format::Png => png::read(path),

        #[cfg(feature = "jpeg")]
        Format::Jpeg => jpeg::read(path),

        #[cfg(feature = "tiff")]
        Format::Tiff => tiff::read(path),

        #[cfg(feature = "raster")]
        Format::Tga | Format::Bmp | Format::WebP => raster::read(path, format),

        Format::Unknown => Err(unsupported(path)),

        other => Err(IoError::UnsupportedFeature(format!(
            "{:?} codec not compiled in",
            other
        ))),
    }
}

/// Writes an image to a file with default options, detecting format from
/// the extension.
pub fn write<P: AsRef<Path>>(path: P, image: &PixelBuffer) -> IoResult<()> {
    write_with_options(path, image, &EncodeOptions::NONE)
}

/// Writes an image to a file, detecting format from the extension.
///
/// Options a format does not understand are ignored (quality for PNG,
/// compression for JPEG, ...).
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be created
/// - The format is not supported for writing
/// - The buffer layout is incompatible with the format
#[allow(unreachable_patterns)]
pub fn write_with_options<P: AsRef<Path>>(
    path: P,
    image: &PixelBuffer,
    options: &EncodeOptions,
) -> IoResult<()> {
    let path = path.as_ref();
    let format = Format::from_extension(path);
    trace!(path = %path.display(), ?format, layout = ?image.layout(), "write");

    match format {
        #[cfg(feature = "exr")]
        Format::Exr => exr::write(path, image),

        #[cfg(feature = "png")]
        Format::Png => png::write(path, image),

        #[cfg(feature = "jpeg")]
        Format::Jpeg => jpeg::write_with_options(path, image, options),

        #[cfg(feature = "tiff")]
        Format::Tiff => tiff::write_with_options(path, image, options),

        #[cfg(feature = "raster")]
        Format::Tga | Format::Bmp | Format::WebP => raster::write(path, image, format),

        Format::Unknown => Err(unsupported(path)),

        other => {
            let _ = options;
            Err(IoError::UnsupportedFeature(format!(
                "{:?} codec not compiled in",
                other
            )))
        }
    }
}

fn unsupported(path: &Path) -> IoError {
    IoError::UnsupportedFormat(
        path.extension()
            .and_then(|e| e.to_str())
            .unwrap_or("unknown")
            .to_string(),
    )
}

/// Channel layout of a [`PixelBuffer`].
///
/// The layout fixes both the channel count and the sample domain; 8-bit
/// layouts hold `u8` samples, the EXR layouts hold unclamped `f32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelLayout {
    /// Red, green, blue; 8-bit.
    Rgb8,
    /// Red, green, blue, alpha; 8-bit.
    Rgba8,
    /// Single luma channel; 8-bit.
    Gray8,
    /// Luma plus alpha; 8-bit.
    GrayAlpha8,
    /// Blue, green, red; 32-bit float.
    Bgr32F,
    /// Blue, green, red, alpha; 32-bit float.
    Bgra32F,
}

impl ChannelLayout {
    /// Number of interleaved samples per pixel.
    pub fn channels(&self) -> usize {
        match self {
            Self::Gray8 => 1,
            Self::GrayAlpha8 => 2,
            Self::Rgb8 | Self::Bgr32F => 3,
            Self::Rgba8 | Self::Bgra32F => 4,
        }
    }

    /// Returns true if the layout carries an alpha channel.
    pub fn has_alpha(&self) -> bool {
        matches!(self, Self::Rgba8 | Self::GrayAlpha8 | Self::Bgra32F)
    }

    /// Returns true for the floating-point layouts.
    pub fn is_float(&self) -> bool {
        matches!(self, Self::Bgr32F | Self::Bgra32F)
    }

    /// Index of the green sample within a pixel, if the layout has one.
    pub fn green_index(&self) -> Option<usize> {
        match self {
            Self::Rgb8 | Self::Rgba8 | Self::Bgr32F | Self::Bgra32F => Some(1),
            Self::Gray8 | Self::GrayAlpha8 => None,
        }
    }

    /// Same layout with the alpha channel removed.
    pub fn without_alpha(&self) -> Self {
        match self {
            Self::Rgba8 => Self::Rgb8,
            Self::GrayAlpha8 => Self::Gray8,
            Self::Bgra32F => Self::Bgr32F,
            other => *other,
        }
    }
}

/// Raw pixel data storage.
#[derive(Debug, Clone, PartialEq)]
enum PixelData {
    /// 8-bit unsigned data.
    U8(Vec<u8>),
    /// 32-bit float data.
    F32(Vec<f32>),
}

impl PixelData {
    fn len(&self) -> usize {
        match self {
            Self::U8(data) => data.len(),
            Self::F32(data) => data.len(),
        }
    }
}

/// Decode-time facts about the source file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metadata {
    /// The source declared a transparency side-channel (PNG `tRNS`) that
    /// is not part of its native color type.
    pub transparency: bool,
}

/// A decoded image: width x height pixels of interleaved, row-major
/// samples in a fixed [`ChannelLayout`].
///
/// The sample store always holds exactly `width * height * channels`
/// values of the type the layout demands. Only [`to_rgba8`] and
/// [`drop_alpha`] change the layout.
///
/// [`to_rgba8`]: PixelBuffer::to_rgba8
/// [`drop_alpha`]: PixelBuffer::drop_alpha
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    layout: ChannelLayout,
    data: PixelData,
    /// Facts recorded while decoding.
    pub metadata: Metadata,
}

impl PixelBuffer {
    /// Creates a buffer from 8-bit samples.
    pub fn from_u8(width: u32, height: u32, layout: ChannelLayout, data: Vec<u8>) -> IoResult<Self> {
        Self::new(width, height, layout, PixelData::U8(data))
    }

    /// Creates a buffer from 32-bit float samples.
    pub fn from_f32(width: u32, height: u32, layout: ChannelLayout, data: Vec<f32>) -> IoResult<Self> {
        Self::new(width, height, layout, PixelData::F32(data))
    }

    fn new(width: u32, height: u32, layout: ChannelLayout, data: PixelData) -> IoResult<Self> {
        let float_data = matches!(data, PixelData::F32(_));
        if layout.is_float() != float_data {
            return Err(IoError::LayoutMismatch(format!(
                "{:?} cannot hold {} samples",
                layout,
                if float_data { "f32" } else { "u8" }
            )));
        }

        let expected = width as usize * height as usize * layout.channels();
        if data.len() != expected {
            return Err(IoError::DimensionMismatch {
                expected: format!("{} samples ({}x{}x{})", expected, width, height, layout.channels()),
                actual: format!("{} samples", data.len()),
            });
        }

        Ok(Self {
            width,
            height,
            layout,
            data,
            metadata: Metadata::default(),
        })
    }

    /// Attaches decode-time metadata.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Channel layout.
    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    /// Number of channels per pixel.
    pub fn channels(&self) -> usize {
        self.layout.channels()
    }

    /// Returns the total number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Returns true if the buffer holds no pixels.
    pub fn is_empty(&self) -> bool {
        self.pixel_count() == 0
    }

    /// 8-bit samples, or `None` for a float layout.
    pub fn as_u8(&self) -> Option<&[u8]> {
        match &self.data {
            PixelData::U8(data) => Some(data),
            PixelData::F32(_) => None,
        }
    }

    /// Mutable 8-bit samples, or `None` for a float layout.
    pub fn as_u8_mut(&mut self) -> Option<&mut [u8]> {
        match &mut self.data {
            PixelData::U8(data) => Some(data),
            PixelData::F32(_) => None,
        }
    }

    /// Float samples, or `None` for an 8-bit layout.
    pub fn as_f32(&self) -> Option<&[f32]> {
        match &self.data {
            PixelData::F32(data) => Some(data),
            PixelData::U8(_) => None,
        }
    }

    /// Mutable float samples, or `None` for an 8-bit layout.
    pub fn as_f32_mut(&mut self) -> Option<&mut [f32]> {
        match &mut self.data {
            PixelData::F32(data) => Some(data),
            PixelData::U8(_) => None,
        }
    }

    /// Samples of the pixel at `(x, y)`.
    pub fn pixel_u8(&self, x: u32, y: u32) -> Option<&[u8]> {
        let data = self.as_u8()?;
        let idx = self.sample_index(x, y)?;
        data.get(idx..idx + self.channels())
    }

    /// Samples of the pixel at `(x, y)`.
    pub fn pixel_f32(&self, x: u32, y: u32) -> Option<&[f32]> {
        let data = self.as_f32()?;
        let idx = self.sample_index(x, y)?;
        data.get(idx..idx + self.channels())
    }

    fn sample_index(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * self.channels())
    }

    /// Expands an 8-bit buffer into a new RGBA-8 buffer.
    ///
    /// Grayscale is replicated into red, green and blue; a missing alpha
    /// channel becomes fully opaque (255). Metadata is carried over.
    pub fn to_rgba8(&self) -> IoResult<PixelBuffer> {
        let data = self.as_u8().ok_or_else(|| {
            IoError::LayoutMismatch(format!("{:?} cannot be expanded to Rgba8", self.layout))
        })?;

        let rgba: Vec<u8> = match self.layout {
            ChannelLayout::Rgba8 => data.to_vec(),
            ChannelLayout::Rgb8 => data
                .chunks_exact(3)
                .flat_map(|px| [px[0], px[1], px[2], 255])
                .collect(),
            ChannelLayout::Gray8 => data.iter().flat_map(|&g| [g, g, g, 255]).collect(),
            ChannelLayout::GrayAlpha8 => data
                .chunks_exact(2)
                .flat_map(|ga| [ga[0], ga[0], ga[0], ga[1]])
                .collect(),
            ChannelLayout::Bgr32F | ChannelLayout::Bgra32F => unreachable!("float layouts hold f32 data"),
        };

        Ok(PixelBuffer::from_u8(self.width, self.height, ChannelLayout::Rgba8, rgba)?
            .with_metadata(self.metadata))
    }

    /// Removes the alpha channel, if any. Other channels keep their order.
    pub fn drop_alpha(self) -> PixelBuffer {
        if !self.layout.has_alpha() {
            return self;
        }

        let channels = self.layout.channels();
        let keep = channels - 1;
        let data = match self.data {
            PixelData::U8(data) => PixelData::U8(
                data.chunks_exact(channels)
                    .flat_map(|px| px[..keep].iter().copied())
                    .collect(),
            ),
            PixelData::F32(data) => PixelData::F32(
                data.chunks_exact(channels)
                    .flat_map(|px| px[..keep].iter().copied())
                    .collect(),
            ),
        };

        PixelBuffer {
            width: self.width,
            height: self.height,
            layout: self.layout.without_alpha(),
            data,
            metadata: self.metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_properties() {
        assert_eq!(ChannelLayout::Gray8.channels(), 1);
        assert_eq!(ChannelLayout::GrayAlpha8.channels(), 2);
        assert_eq!(ChannelLayout::Bgr32F.channels(), 3);
        assert_eq!(ChannelLayout::Bgra32F.channels(), 4);
        assert!(ChannelLayout::GrayAlpha8.has_alpha());
        assert!(!ChannelLayout::Rgb8.has_alpha());
        assert!(ChannelLayout::Bgr32F.is_float());
        assert_eq!(ChannelLayout::Bgra32F.green_index(), Some(1));
        assert_eq!(ChannelLayout::Gray8.green_index(), None);
        assert_eq!(ChannelLayout::Rgba8.without_alpha(), ChannelLayout::Rgb8);
    }

    #[test]
    fn test_rejects_wrong_sample_count() {
        let err = PixelBuffer::from_u8(2, 2, ChannelLayout::Rgb8, vec![0; 11]).unwrap_err();
        assert!(matches!(err, IoError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_rejects_wrong_sample_type() {
        let err = PixelBuffer::from_f32(1, 1, ChannelLayout::Rgb8, vec![0.0; 3]).unwrap_err();
        assert!(matches!(err, IoError::LayoutMismatch(_)));

        let err = PixelBuffer::from_u8(1, 1, ChannelLayout::Bgr32F, vec![0; 3]).unwrap_err();
        assert!(matches!(err, IoError::LayoutMismatch(_)));
    }

    #[test]
    fn test_to_rgba8_synthesizes_opaque_alpha() {
        let rgb = PixelBuffer::from_u8(2, 1, ChannelLayout::Rgb8, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let rgba = rgb.to_rgba8().unwrap();
        assert_eq!(rgba.layout(), ChannelLayout::Rgba8);
        assert_eq!(rgba.as_u8().unwrap(), &[1, 2, 3, 255, 4, 5, 6, 255]);
    }

    #[test]
    fn test_to_rgba8_replicates_gray() {
        let la = PixelBuffer::from_u8(1, 1, ChannelLayout::GrayAlpha8, vec![90, 17]).unwrap();
        let rgba = la.to_rgba8().unwrap();
        assert_eq!(rgba.as_u8().unwrap(), &[90, 90, 90, 17]);

        let l = PixelBuffer::from_u8(1, 1, ChannelLayout::Gray8, vec![42]).unwrap();
        assert_eq!(l.to_rgba8().unwrap().as_u8().unwrap(), &[42, 42, 42, 255]);
    }

    #[test]
    fn test_to_rgba8_keeps_metadata() {
        let buf = PixelBuffer::from_u8(1, 1, ChannelLayout::Rgb8, vec![0, 0, 0])
            .unwrap()
            .with_metadata(Metadata { transparency: true });
        assert!(buf.to_rgba8().unwrap().metadata.transparency);
    }

    #[test]
    fn test_to_rgba8_rejects_float() {
        let hdr = PixelBuffer::from_f32(1, 1, ChannelLayout::Bgr32F, vec![0.0; 3]).unwrap();
        assert!(hdr.to_rgba8().is_err());
    }

    #[test]
    fn test_drop_alpha() {
        let rgba = PixelBuffer::from_u8(2, 1, ChannelLayout::Rgba8, vec![1, 2, 3, 9, 4, 5, 6, 9]).unwrap();
        let rgb = rgba.drop_alpha();
        assert_eq!(rgb.layout(), ChannelLayout::Rgb8);
        assert_eq!(rgb.as_u8().unwrap(), &[1, 2, 3, 4, 5, 6]);

        let bgra = PixelBuffer::from_f32(1, 1, ChannelLayout::Bgra32F, vec![0.1, 0.2, 0.3, 0.4]).unwrap();
        let bgr = bgra.drop_alpha();
        assert_eq!(bgr.layout(), ChannelLayout::Bgr32F);
        assert_eq!(bgr.as_f32().unwrap(), &[0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_pixel_count_and_empty() {
        let buf = PixelBuffer::from_u8(3, 2, ChannelLayout::Rgba8, vec![0; 24]).unwrap();
        assert_eq!(buf.pixel_count(), 6);
        assert!(!buf.is_empty());

        let empty = PixelBuffer::from_f32(0, 5, ChannelLayout::Bgr32F, Vec::new()).unwrap();
        assert_eq!(empty.pixel_count(), 0);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_pixel_access() {
        let buf = PixelBuffer::from_u8(2, 2, ChannelLayout::Gray8, vec![10, 20, 30, 40]).unwrap();
        assert_eq!(buf.pixel_u8(1, 1), Some(&[40u8][..]));
        assert_eq!(buf.pixel_u8(2, 0), None);
        assert_eq!(buf.pixel_f32(0, 0), None);
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let buf = PixelBuffer::from_u8(1, 1, ChannelLayout::Rgb8, vec![0, 0, 0]).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let err = write(dir.path().join("out.xyz"), &buf).unwrap_err();
        assert!(matches!(err, IoError::UnsupportedFormat(ext) if ext == "xyz"));
    }
}
