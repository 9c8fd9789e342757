//! OpenEXR format support.
//!
//! Reads the first RGB(A) layer of an EXR file as unclamped 32-bit float
//! samples and writes one back with the same channel set.
//!
//! EXR stores channels sorted by name (`A`, `B`, `G`, `R`), so the color
//! samples are kept in blue-green-red order: [`ChannelLayout::Bgr32F`] or
//! [`ChannelLayout::Bgra32F`]. Both [`read`] and [`write`] use that order,
//! green is always sample index 1.
//!
//! # Example
//!
//! ```rust,ignore
//! use normflip_io::exr::{read, write};
//!
//! let image = read("normal_map.exr")?;
//! write("normal_map_DX.exr", &image)?;
//! ```

use crate::{ChannelLayout, IoError, IoResult, PixelBuffer};
use std::path::Path;
use tracing::debug;

/// Reads an EXR file from the given path.
///
/// Returns the first layer that has red, green and blue channels. Alpha is
/// kept only if the file has an `A` channel.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<PixelBuffer> {
    use exr::prelude::*;

    let path = path.as_ref();

    let image = read_first_rgba_layer_from_file(
        path,
        |resolution, _| {
            let width = resolution.width();
            let size = width * resolution.height();
            (width, vec![(0.0f32, 0.0f32, 0.0f32, 1.0f32); size])
        },
        |(width, buffer), position, (r, g, b, a): (f32, f32, f32, f32)| {
            let idx = position.y() * *width + position.x();
            if idx < buffer.len() {
                buffer[idx] = (r, g, b, a);
            }
        },
    ).map_err(|e| IoError::DecodeError(e.to_string()))?;

    let width = image.layer_data.size.width() as u32;
    let height = image.layer_data.size.height() as u32;
    let has_alpha = image.layer_data.channel_data.channels.3.is_some();
    let (_, ref pixel_data) = image.layer_data.channel_data.pixels;

    debug!(width, height, has_alpha, "exr decoded");

    let (layout, data) = if has_alpha {
        let data = pixel_data.iter().flat_map(|&(r, g, b, a)| [b, g, r, a]).collect();
        (ChannelLayout::Bgra32F, data)
    } else {
        let data = pixel_data.iter().flat_map(|&(r, g, b, _)| [b, g, r]).collect();
        (ChannelLayout::Bgr32F, data)
    };

    PixelBuffer::from_f32(width, height, layout, data)
}

/// Writes a float buffer to an EXR file.
///
/// `Bgr32F` becomes an RGB image, `Bgra32F` an RGBA image; samples are
/// stored as 32-bit float without clamping.
pub fn write<P: AsRef<Path>>(path: P, image: &PixelBuffer) -> IoResult<()> {
    use exr::prelude::*;

    let path = path.as_ref();
    let width = image.width() as usize;
    let height = image.height() as usize;
    let channels = image.channels();

    let samples = match image.layout() {
        ChannelLayout::Bgr32F | ChannelLayout::Bgra32F => image.as_f32(),
        _ => None,
    }
    .ok_or_else(|| IoError::EncodeError(format!("EXR writer cannot store {:?}", image.layout())))?;

    // [b, g, r, a], alpha is 1.0 when the layout has none
    let pixel = |pos: Vec2<usize>| -> [f32; 4] {
        let base = (pos.y() * width + pos.x()) * channels;
        let alpha = if channels == 4 { samples[base + 3] } else { 1.0 };
        [samples[base], samples[base + 1], samples[base + 2], alpha]
    };

    let result = if image.layout().has_alpha() {
        let layer = Layer::new(
            (width, height),
            LayerAttributes::default(),
            Encoding::SMALL_LOSSLESS,
            SpecificChannels::rgba(|pos: Vec2<usize>| {
                let px = pixel(pos);
                (px[2], px[1], px[0], px[3])
            }),
        );
        Image::from_layer(layer).write().to_file(path)
    } else {
        let layer = Layer::new(
            (width, height),
            LayerAttributes::default(),
            Encoding::SMALL_LOSSLESS,
            SpecificChannels::rgb(|pos: Vec2<usize>| {
                let px = pixel(pos);
                (px[2], px[1], px[0])
            }),
        );
        Image::from_layer(layer).write().to_file(path)
    };

    result.map_err(|e| IoError::EncodeError(e.to_string()))
}
