//! TIFF format support.
//!
//! Reads 8- and 16-bit grayscale/RGB TIFFs with or without alpha into an
//! 8-bit layout (16-bit samples keep their high byte) and writes 8-bit
//! buffers, uncompressed or with LZW / Deflate compression.
//!
//! # Example
//!
//! ```rust,ignore
//! use normflip_io::{tiff, Compression, EncodeOptions};
//!
//! let image = tiff::read("scan.tiff")?;
//! let lzw = EncodeOptions { compression: Some(Compression::Lzw), ..EncodeOptions::NONE };
//! tiff::write_with_options("output.tiff", &image, &lzw)?;
//! ```

use crate::{ChannelLayout, Compression, EncodeOptions, IoError, IoResult, PixelBuffer};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tiff::encoder::{colortype, compression, TiffEncoder};
use tracing::debug;

/// Reads a TIFF file from the given path.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<PixelBuffer> {
    use tiff::decoder::{Decoder, DecodingResult};
    use tiff::ColorType;

    let file = File::open(path.as_ref())?;
    let mut decoder = Decoder::new(BufReader::new(file))
        .map_err(|e: tiff::TiffError| IoError::DecodeError(e.to_string()))?;

    let (width, height) = decoder.dimensions()
        .map_err(|e: tiff::TiffError| IoError::DecodeError(e.to_string()))?;
    let color_type = decoder.colortype()
        .map_err(|e: tiff::TiffError| IoError::DecodeError(e.to_string()))?;

    let result = decoder.read_image()
        .map_err(|e: tiff::TiffError| IoError::DecodeError(e.to_string()))?;

    let layout = match color_type {
        ColorType::Gray(8 | 16) => ChannelLayout::Gray8,
        ColorType::GrayA(8 | 16) => ChannelLayout::GrayAlpha8,
        ColorType::RGB(8 | 16) => ChannelLayout::Rgb8,
        ColorType::RGBA(8 | 16) => ChannelLayout::Rgba8,
        ct => {
            return Err(IoError::UnsupportedBitDepth(format!(
                "unsupported TIFF color type: {:?}",
                ct
            )));
        }
    };

    let data = match result {
        DecodingResult::U8(buf) => buf,
        DecodingResult::U16(buf) => buf.iter().map(|&v| (v >> 8) as u8).collect(),
        _ => {
            return Err(IoError::UnsupportedBitDepth(format!(
                "unsupported TIFF sample type for {:?}",
                color_type
            )));
        }
    };

    PixelBuffer::from_u8(width, height, layout, data)
}

/// Writes an uncompressed TIFF.
pub fn write<P: AsRef<Path>>(path: P, image: &PixelBuffer) -> IoResult<()> {
    write_with_options(path, image, &EncodeOptions::NONE)
}

/// Writes a TIFF, compressed per `options.compression`.
pub fn write_with_options<P: AsRef<Path>>(
    path: P,
    image: &PixelBuffer,
    options: &EncodeOptions,
) -> IoResult<()> {
    let data = image.as_u8()
        .ok_or_else(|| IoError::EncodeError("TIFF writer requires 8-bit samples".into()))?;

    let file = File::create(path.as_ref())?;
    let mut encoder = TiffEncoder::new(file)
        .map_err(|e: tiff::TiffError| IoError::EncodeError(e.to_string()))?;

    debug!(compression = ?options.compression, layout = ?image.layout(), "tiff encode");

    match options.compression {
        None => encode(&mut encoder, image, data, compression::Uncompressed),
        Some(Compression::Lzw) => encode(&mut encoder, image, data, compression::Lzw),
        Some(Compression::Deflate) => encode(&mut encoder, image, data, compression::Deflate::default()),
    }
}

fn encode<W, D>(encoder: &mut TiffEncoder<W>, image: &PixelBuffer, data: &[u8], method: D) -> IoResult<()>
where
    W: std::io::Write + std::io::Seek,
    D: compression::Compression,
{
    let (width, height) = (image.width(), image.height());

    let result = match image.layout() {
        ChannelLayout::Rgb8 => {
            encoder.write_image_with_compression::<colortype::RGB8, D>(width, height, method, data)
        }
        ChannelLayout::Rgba8 => {
            encoder.write_image_with_compression::<colortype::RGBA8, D>(width, height, method, data)
        }
        ChannelLayout::Gray8 => {
            encoder.write_image_with_compression::<colortype::Gray8, D>(width, height, method, data)
        }
        layout => {
            return Err(IoError::EncodeError(format!("TIFF writer cannot store {:?}", layout)));
        }
    };

    result.map_err(|e: tiff::TiffError| IoError::EncodeError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32, layout: ChannelLayout) -> PixelBuffer {
        let len = (width * height) as usize * layout.channels();
        PixelBuffer::from_u8(width, height, layout, (0..len).map(|i| (i % 251) as u8).collect()).unwrap()
    }

    fn stored_compression(path: &Path) -> u16 {
        use tiff::decoder::Decoder;
        use tiff::tags::Tag;

        let mut decoder = Decoder::new(BufReader::new(File::open(path).unwrap())).unwrap();
        decoder.get_tag_u32(Tag::Compression).unwrap() as u16
    }

    #[test]
    fn test_roundtrip_rgb() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rgb.tiff");
        let image = gradient(32, 32, ChannelLayout::Rgb8);

        write(&path, &image).expect("Failed to write TIFF");
        let loaded = read(&path).expect("Failed to read TIFF");

        assert_eq!(loaded.layout(), ChannelLayout::Rgb8);
        assert_eq!(loaded.as_u8(), image.as_u8());
        assert_eq!(stored_compression(&path), 1);
    }

    #[test]
    fn test_roundtrip_rgba_lzw() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rgba.tif");
        let image = gradient(16, 16, ChannelLayout::Rgba8);
        let options = EncodeOptions {
            compression: Some(Compression::Lzw),
            ..EncodeOptions::NONE
        };

        write_with_options(&path, &image, &options).expect("Failed to write TIFF");
        let loaded = read(&path).expect("Failed to read TIFF");

        assert_eq!(loaded.layout(), ChannelLayout::Rgba8);
        assert_eq!(loaded.as_u8(), image.as_u8());
        // 5 = LZW
        assert_eq!(stored_compression(&path), 5);
    }

    #[test]
    fn test_roundtrip_gray_deflate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gray.tif");
        let image = gradient(8, 8, ChannelLayout::Gray8);
        let options = EncodeOptions {
            compression: Some(Compression::Deflate),
            ..EncodeOptions::NONE
        };

        write_with_options(&path, &image, &options).unwrap();
        assert_eq!(read(&path).unwrap().as_u8(), image.as_u8());
    }

    #[test]
    fn test_rejects_gray_alpha_write() {
        let dir = tempfile::tempdir().unwrap();
        let image = gradient(2, 2, ChannelLayout::GrayAlpha8);
        assert!(write(dir.path().join("la.tif"), &image).is_err());
    }
}
