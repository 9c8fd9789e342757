//! JPEG format support.
//!
//! Decodes baseline and progressive JPEGs into `Gray8` or `Rgb8` (CMYK is
//! converted to RGB, 16-bit luma keeps its high byte) and encodes 8-bit
//! buffers with configurable quality, chroma subsampling and Huffman
//! table optimisation.
//!
//! JPEG has no alpha channel: an alpha channel in the buffer is dropped
//! at encode time.
//!
//! # Example
//!
//! ```rust,ignore
//! use normflip_io::jpeg::{JpegWriter, JpegWriterOptions};
//!
//! let writer = JpegWriter::with_options(JpegWriterOptions {
//!     quality: 95,
//!     ..Default::default()
//! });
//! writer.write("reference.jpg", &image)?;
//! ```

use crate::{ChannelLayout, ChromaSubsampling, EncodeOptions, IoError, IoResult, PixelBuffer};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Quality used when the caller does not ask for one.
pub const DEFAULT_QUALITY: u8 = 90;

/// Options for writing JPEG files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegWriterOptions {
    /// Quality level 1-100. Higher = better quality, larger files.
    pub quality: u8,
    /// Chroma subsampling; `None` keeps the encoder default.
    pub subsampling: Option<ChromaSubsampling>,
    /// Build image-specific Huffman tables.
    pub optimize: bool,
}

impl Default for JpegWriterOptions {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            subsampling: None,
            optimize: false,
        }
    }
}

impl From<&EncodeOptions> for JpegWriterOptions {
    fn from(options: &EncodeOptions) -> Self {
        Self {
            quality: options.quality.unwrap_or(DEFAULT_QUALITY).clamp(1, 100),
            subsampling: options.subsampling,
            optimize: options.optimize,
        }
    }
}

/// JPEG file writer.
#[derive(Debug, Clone, Default)]
pub struct JpegWriter {
    options: JpegWriterOptions,
}

impl JpegWriter {
    /// Creates a writer with custom options.
    pub fn with_options(options: JpegWriterOptions) -> Self {
        Self { options }
    }

    /// Writes a JPEG file to disk.
    pub fn write<P: AsRef<Path>>(&self, path: P, image: &PixelBuffer) -> IoResult<()> {
        let data = self.write_to_memory(image)?;
        std::fs::write(path.as_ref(), data)?;
        Ok(())
    }

    /// Encodes a JPEG into a byte vector.
    pub fn write_to_memory(&self, image: &PixelBuffer) -> IoResult<Vec<u8>> {
        use jpeg_encoder::{ColorType as JpegColorType, Encoder, SamplingFactor};

        let width = u16::try_from(image.width())
            .map_err(|_| IoError::EncodeError(format!("width {} exceeds JPEG limit", image.width())))?;
        let height = u16::try_from(image.height())
            .map_err(|_| IoError::EncodeError(format!("height {} exceeds JPEG limit", image.height())))?;

        let samples = image.as_u8()
            .ok_or_else(|| IoError::EncodeError("JPEG requires 8-bit samples".into()))?;

        let (color_type, pixels): (JpegColorType, Vec<u8>) = match image.layout() {
            ChannelLayout::Rgb8 => (JpegColorType::Rgb, samples.to_vec()),
            ChannelLayout::Rgba8 => (
                JpegColorType::Rgb,
                samples.chunks_exact(4).flat_map(|rgba| [rgba[0], rgba[1], rgba[2]]).collect(),
            ),
            ChannelLayout::Gray8 => (JpegColorType::Luma, samples.to_vec()),
            ChannelLayout::GrayAlpha8 => (JpegColorType::Luma, samples.iter().step_by(2).copied().collect()),
            layout => return Err(IoError::EncodeError(format!("JPEG cannot store {:?}", layout))),
        };

        debug!(quality = self.options.quality, subsampling = ?self.options.subsampling, optimize = self.options.optimize, "jpeg encode");

        let mut buffer = Vec::new();
        let mut encoder = Encoder::new(&mut buffer, self.options.quality);
        if let Some(subsampling) = self.options.subsampling {
            encoder.set_sampling_factor(match subsampling {
                ChromaSubsampling::Full => SamplingFactor::R_4_4_4,
                ChromaSubsampling::Half => SamplingFactor::R_4_2_2,
                ChromaSubsampling::Quarter => SamplingFactor::R_4_2_0,
            });
        }
        encoder.set_optimized_huffman_tables(self.options.optimize);
        encoder
            .encode(&pixels, width, height, color_type)
            .map_err(|e: jpeg_encoder::EncodingError| IoError::EncodeError(e.to_string()))?;

        Ok(buffer)
    }
}

/// Reads a JPEG file.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<PixelBuffer> {
    let file = File::open(path.as_ref())?;
    let mut decoder = jpeg_decoder::Decoder::new(BufReader::new(file));
    let pixels = decoder
        .decode()
        .map_err(|e| IoError::DecodeError(e.to_string()))?;

    let info = decoder
        .info()
        .ok_or_else(|| IoError::DecodeError("missing JPEG info".into()))?;

    let width = info.width as u32;
    let height = info.height as u32;

    let (layout, data) = match info.pixel_format {
        jpeg_decoder::PixelFormat::RGB24 => (ChannelLayout::Rgb8, pixels),
        jpeg_decoder::PixelFormat::L8 => (ChannelLayout::Gray8, pixels),
        // 16-bit luma keeps its high byte
        jpeg_decoder::PixelFormat::L16 => (ChannelLayout::Gray8, pixels.chunks_exact(2).map(|l16| l16[0]).collect()),
        jpeg_decoder::PixelFormat::CMYK32 => {
            // CMYK to RGB (approximate conversion)
            let rgb = pixels
                .chunks_exact(4)
                .flat_map(|cmyk| {
                    let c = cmyk[0] as f32 / 255.0;
                    let m = cmyk[1] as f32 / 255.0;
                    let y = cmyk[2] as f32 / 255.0;
                    let k = cmyk[3] as f32 / 255.0;

                    let r = ((1.0 - c) * (1.0 - k) * 255.0) as u8;
                    let g = ((1.0 - m) * (1.0 - k) * 255.0) as u8;
                    let b = ((1.0 - y) * (1.0 - k) * 255.0) as u8;

                    [r, g, b]
                })
                .collect();
            (ChannelLayout::Rgb8, rgb)
        }
    };

    PixelBuffer::from_u8(width, height, layout, data)
}

/// Writes a JPEG file with default options (quality 90).
pub fn write<P: AsRef<Path>>(path: P, image: &PixelBuffer) -> IoResult<()> {
    JpegWriter::default().write(path, image)
}

/// Writes a JPEG file, taking quality, subsampling and optimisation from
/// `options`.
pub fn write_with_options<P: AsRef<Path>>(
    path: P,
    image: &PixelBuffer,
    options: &EncodeOptions,
) -> IoResult<()> {
    JpegWriter::with_options(options.into()).write(path, image)
}
