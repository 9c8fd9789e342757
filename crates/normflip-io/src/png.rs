//! PNG format support.
//!
//! Reads any PNG into an 8-bit layout (palette and sub-byte images are
//! expanded, 16-bit samples are stripped to their high byte) and writes
//! 8-bit grayscale/RGB with or without alpha.
//!
//! A `tRNS` chunk is expanded into a real alpha channel and also recorded
//! in [`Metadata::transparency`].
//!
//! # Example
//!
//! ```rust,ignore
//! use normflip_io::png::{read, write};
//!
//! let image = read("input.png")?;
//! write("output.png", &image)?;
//! ```

use crate::{ChannelLayout, IoError, IoResult, Metadata, PixelBuffer};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::debug;

/// Reads a PNG file from the given path.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<PixelBuffer> {
    let file = File::open(path.as_ref())?;
    let mut decoder = png::Decoder::new(BufReader::new(file));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);

    let mut reader = decoder.read_info()
        .map_err(|e: png::DecodingError| IoError::DecodeError(e.to_string()))?;

    let native = reader.info().color_type;
    let transparency = reader.info().trns.is_some();

    let buf_size = reader.output_buffer_size()
        .ok_or_else(|| IoError::DecodeError("cannot determine output buffer size".into()))?;
    let mut buf = vec![0u8; buf_size];
    let info = reader.next_frame(&mut buf)
        .map_err(|e: png::DecodingError| IoError::DecodeError(e.to_string()))?;
    buf.truncate(info.buffer_size());

    debug!(?native, output = ?info.color_type, transparency, "png decoded");

    let layout = match (info.color_type, info.bit_depth) {
        (png::ColorType::Rgb, png::BitDepth::Eight) => ChannelLayout::Rgb8,
        (png::ColorType::Rgba, png::BitDepth::Eight) => ChannelLayout::Rgba8,
        (png::ColorType::Grayscale, png::BitDepth::Eight) => ChannelLayout::Gray8,
        (png::ColorType::GrayscaleAlpha, png::BitDepth::Eight) => ChannelLayout::GrayAlpha8,
        (color_type, bit_depth) => {
            return Err(IoError::UnsupportedBitDepth(
                format!("{:?} {:?}", color_type, bit_depth)
            ));
        }
    };

    Ok(PixelBuffer::from_u8(info.width, info.height, layout, buf)?
        .with_metadata(Metadata { transparency }))
}

/// Writes an 8-bit buffer to a PNG file.
pub fn write<P: AsRef<Path>>(path: P, image: &PixelBuffer) -> IoResult<()> {
    let color_type = match image.layout() {
        ChannelLayout::Gray8 => png::ColorType::Grayscale,
        ChannelLayout::GrayAlpha8 => png::ColorType::GrayscaleAlpha,
        ChannelLayout::Rgb8 => png::ColorType::Rgb,
        ChannelLayout::Rgba8 => png::ColorType::Rgba,
        layout => return Err(IoError::EncodeError(format!("PNG cannot store {:?}", layout))),
    };
    let data = image.as_u8()
        .ok_or_else(|| IoError::EncodeError("PNG requires 8-bit samples".into()))?;

    let file = File::create(path.as_ref())?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), image.width(), image.height());
    encoder.set_color(color_type);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::default());

    let mut png_writer = encoder.write_header()
        .map_err(|e| IoError::EncodeError(e.to_string()))?;

    png_writer.write_image_data(data)
        .map_err(|e| IoError::EncodeError(e.to_string()))?;

    png_writer.finish()
        .map_err(|e| IoError::EncodeError(e.to_string()))?;

    Ok(())
}
