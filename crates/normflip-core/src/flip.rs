//! Green-channel inversion.
//!
//! OpenGL and DirectX tangent-space normal maps differ only in the sign
//! of Y, stored in green. Inverting green converts either way, so the
//! same transform serves both [`Direction`]s.

use normflip_io::{ChannelLayout, PixelBuffer};

/// Conversion direction. Only used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// OpenGL (Y+) to DirectX (Y-).
    #[default]
    OglToDx,
    /// DirectX (Y-) to OpenGL (Y+).
    DxToOgl,
}

impl Direction {
    /// Short name, as accepted on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::OglToDx => "ogl2dx",
            Direction::DxToOgl => "dx2ogl",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How EXR green values are interpreted.
///
/// `Unsigned` treats green as a [0, 1] encoded component, `Signed` as a
/// [-1, 1] vector component packed into [0, 1]. Unpack, negate and
/// repack reduces to `1 - g`, so both use [`flip_green_f32`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExrRange {
    /// g' = 1 - g
    #[default]
    Unsigned,
    /// g' = -(g * 2 - 1) * 0.5 + 0.5
    Signed,
}

/// Inverts one 8-bit sample.
#[inline]
pub fn flip_u8(g: u8) -> u8 {
    255 - g
}

/// Inverts one float sample, clamped to [0, 1].
#[inline]
pub fn flip_f32(g: f32) -> f32 {
    (1.0 - g).clamp(0.0, 1.0)
}

/// Flips green in an 8-bit RGB or RGBA buffer in place.
///
/// Returns false (leaving the buffer alone) for layouts without a green
/// channel.
#[must_use]
pub fn flip_green_u8(image: &mut PixelBuffer) -> bool {
    let layout = image.layout();
    let (Some(green), false) = (layout.green_index(), layout.is_float()) else {
        return false;
    };
    let channels = layout.channels();
    let Some(data) = image.as_u8_mut() else {
        return false;
    };

    for px in data.chunks_exact_mut(channels) {
        px[green] = flip_u8(px[green]);
    }
    true
}

/// Flips green in a float BGR or BGRA buffer in place.
///
/// Alpha and the other color channels are not touched. Returns false for
/// anything but `Bgr32F` / `Bgra32F`.
#[must_use]
pub fn flip_green_f32(image: &mut PixelBuffer) -> bool {
    let layout = image.layout();
    if !matches!(layout, ChannelLayout::Bgr32F | ChannelLayout::Bgra32F) {
        return false;
    }
    let Some(green) = layout.green_index() else {
        return false;
    };
    let channels = layout.channels();
    let Some(data) = image.as_f32_mut() else {
        return false;
    };

    for px in data.chunks_exact_mut(channels) {
        px[green] = flip_f32(px[green]);
    }
    true
}
