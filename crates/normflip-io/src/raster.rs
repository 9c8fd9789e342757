//! TGA, BMP and WebP support.
//!
//! Read/write via the `image` crate. The decoded [`DynamicImage`] keeps its
//! color type where it maps onto an 8-bit layout; anything wider is
//! narrowed to 8-bit RGB or RGBA depending on whether it carries alpha.
//!
//! The `image` WebP encoder only produces lossless files.
//!
//! # Example
//!
//! ```ignore
//! use normflip_io::{raster, Format};
//!
//! let img = raster::read("input.tga", Format::Tga)?;
//! raster::write("output.tga", &img, Format::Tga)?;
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use image::{DynamicImage, ImageFormat, ImageReader};

use crate::{ChannelLayout, Format, IoError, IoResult, PixelBuffer};

fn image_format(format: Format) -> IoResult<ImageFormat> {
    match format {
        Format::Tga => Ok(ImageFormat::Tga),
        Format::Bmp => Ok(ImageFormat::Bmp),
        Format::WebP => Ok(ImageFormat::WebP),
        other => Err(IoError::UnsupportedFormat(format!("{:?} is not a raster format", other))),
    }
}

/// Reads a TGA, BMP or WebP image from file.
pub fn read<P: AsRef<Path>>(path: P, format: Format) -> IoResult<PixelBuffer> {
    let file = File::open(path.as_ref())?;
    let reader = BufReader::new(file);

    let img = ImageReader::with_format(reader, image_format(format)?)
        .decode()
        .map_err(|e| IoError::DecodeError(e.to_string()))?;

    dynamic_to_buffer(img)
}

/// Writes an 8-bit buffer as TGA, BMP or WebP.
pub fn write<P: AsRef<Path>>(path: P, image: &PixelBuffer, format: Format) -> IoResult<()> {
    let dyn_img = buffer_to_dynamic(image)?;

    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);

    let result = match format {
        Format::Tga => dyn_img.write_with_encoder(image::codecs::tga::TgaEncoder::new(&mut writer)),
        Format::Bmp => dyn_img.write_with_encoder(image::codecs::bmp::BmpEncoder::new(&mut writer)),
        Format::WebP => dyn_img.write_with_encoder(image::codecs::webp::WebPEncoder::new_lossless(&mut writer)),
        other => return Err(IoError::UnsupportedFormat(format!("{:?} is not a raster format", other))),
    };
    result.map_err(|e| IoError::EncodeError(e.to_string()))?;

    // BufWriter drops flush errors silently
    writer.flush().map_err(|e| IoError::EncodeError(e.to_string()))?;

    Ok(())
}

/// Converts DynamicImage to PixelBuffer.
fn dynamic_to_buffer(img: DynamicImage) -> IoResult<PixelBuffer> {
    let (width, height) = (img.width(), img.height());

    let (layout, data) = match img {
        DynamicImage::ImageRgb8(rgb) => (ChannelLayout::Rgb8, rgb.into_raw()),
        DynamicImage::ImageRgba8(rgba) => (ChannelLayout::Rgba8, rgba.into_raw()),
        DynamicImage::ImageLuma8(gray) => (ChannelLayout::Gray8, gray.into_raw()),
        DynamicImage::ImageLumaA8(gray_alpha) => (ChannelLayout::GrayAlpha8, gray_alpha.into_raw()),
        other if other.color().has_alpha() => (ChannelLayout::Rgba8, other.to_rgba8().into_raw()),
        other => (ChannelLayout::Rgb8, other.to_rgb8().into_raw()),
    };

    PixelBuffer::from_u8(width, height, layout, data)
}

/// Converts PixelBuffer to DynamicImage.
fn buffer_to_dynamic(image: &PixelBuffer) -> IoResult<DynamicImage> {
    let data = image.as_u8()
        .ok_or_else(|| IoError::EncodeError("raster formats require 8-bit samples".into()))?
        .to_vec();
    let (width, height) = (image.width(), image.height());
    let invalid = || IoError::EncodeError(format!("cannot wrap {:?} buffer", image.layout()));

    match image.layout() {
        ChannelLayout::Gray8 => Ok(DynamicImage::ImageLuma8(
            image::GrayImage::from_raw(width, height, data).ok_or_else(invalid)?,
        )),
        ChannelLayout::GrayAlpha8 => Ok(DynamicImage::ImageLumaA8(
            image::GrayAlphaImage::from_raw(width, height, data).ok_or_else(invalid)?,
        )),
        ChannelLayout::Rgb8 => Ok(DynamicImage::ImageRgb8(
            image::RgbImage::from_raw(width, height, data).ok_or_else(invalid)?,
        )),
        ChannelLayout::Rgba8 => Ok(DynamicImage::ImageRgba8(
            image::RgbaImage::from_raw(width, height, data).ok_or_else(invalid)?,
        )),
        ChannelLayout::Bgr32F | ChannelLayout::Bgra32F => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(width: u32, height: u32, layout: ChannelLayout) -> PixelBuffer {
        let len = (width * height) as usize * layout.channels();
        PixelBuffer::from_u8(width, height, layout, (0..len).map(|i| (i * 7 % 256) as u8).collect()).unwrap()
    }

    #[test]
    fn test_lossless_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        for (format, ext) in [(Format::Tga, "tga"), (Format::Bmp, "bmp"), (Format::WebP, "webp")] {
            for layout in [ChannelLayout::Rgb8, ChannelLayout::Rgba8] {
                let image = pattern(12, 9, layout);
                let path = dir.path().join(format!("{:?}.{}", layout, ext));

                write(&path, &image, format).unwrap();
                let loaded = read(&path, format).unwrap();

                assert_eq!(loaded.width(), 12, "{:?}", format);
                assert_eq!(loaded.height(), 9, "{:?}", format);
                assert_eq!(loaded.layout(), layout, "{:?}", format);
                assert_eq!(loaded.as_u8(), image.as_u8(), "{:?} {:?}", format, layout);
            }
        }
    }

    #[test]
    fn test_tga_grayscale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gray.tga");
        let image = pattern(4, 4, ChannelLayout::Gray8);

        write(&path, &image, Format::Tga).unwrap();
        let loaded = read(&path, Format::Tga).unwrap();
        assert_eq!(loaded.layout(), ChannelLayout::Gray8);
        assert_eq!(loaded.as_u8(), image.as_u8());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_write_error_is_reported() {
        let image = pattern(4, 4, ChannelLayout::Rgb8);
        for format in [Format::Tga, Format::Bmp, Format::WebP] {
            let err = write("/dev/full", &image, format).unwrap_err();
            assert!(matches!(err, IoError::EncodeError(_)), "{:?}: {:?}", format, err);
        }
    }

    #[test]
    fn test_rejects_non_raster_format() {
        let dir = tempfile::tempdir().unwrap();
        let image = pattern(1, 1, ChannelLayout::Rgb8);
        assert!(write(dir.path().join("x.png"), &image, Format::Png).is_err());
    }
}
