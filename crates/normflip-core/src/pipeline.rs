//! Per-file conversion.
//!
//! [`Pipeline::convert`] decodes one normal map, inverts its green channel
//! and writes the result next to the input with a suffix. Standard 8-bit
//! containers go through an RGBA-8 working buffer; EXR is flipped in its
//! native float representation.
//!
//! # Example
//!
//! ```rust,ignore
//! use normflip_core::{ConvertOptions, Pipeline};
//! use normflip_io::CodecConfig;
//!
//! let pipeline = Pipeline::new(CodecConfig::default());
//! let done = pipeline.convert("textures/cliff_normal_map.png".as_ref(), &ConvertOptions::default())?;
//! assert!(done.output.ends_with("cliff_normal_map_DX.png"));
//! ```

use crate::error::{ConvertError, ConvertResult};
use crate::flip::{flip_green_f32, flip_green_u8, Direction, ExrRange};
use crate::profile::FormatProfile;
use normflip_io::{ChannelLayout, CodecConfig, EncodeOptions, IoError, IoResult, PixelBuffer};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Suffix appended to the file stem when none is given.
pub const DEFAULT_SUFFIX: &str = "_DX";

/// Options for a single conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Appended to the input stem to form the output name.
    pub suffix: String,
    /// Reported direction; the transform is the same either way.
    pub direction: Direction,
    /// Interpretation of EXR green values.
    pub exr_range: ExrRange,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            suffix: DEFAULT_SUFFIX.to_string(),
            direction: Direction::default(),
            exr_range: ExrRange::default(),
        }
    }
}

/// A finished conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    /// File that was read.
    pub input: PathBuf,
    /// File that was written.
    pub output: PathBuf,
    /// Direction requested by the caller.
    pub direction: Direction,
    /// Channel layout of the written image.
    pub layout: ChannelLayout,
}

/// Builds the output path: `dir / (stem + suffix + "." + ext)`.
///
/// The extension keeps its original case. An output that would land on
/// the input itself (empty suffix) is rejected.
pub fn output_path(input: &Path, suffix: &str) -> ConvertResult<PathBuf> {
    let invalid = || ConvertError::InvalidPath {
        path: input.to_path_buf(),
    };

    let stem = input.file_stem().ok_or_else(invalid)?;
    let mut name = stem.to_os_string();
    name.push(suffix);
    if let Some(ext) = input.extension() {
        name.push(".");
        name.push(ext);
    }

    let output = input.with_file_name(name);
    if output == input {
        return Err(invalid());
    }
    Ok(output)
}

/// Converts normal maps one file at a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pipeline {
    codecs: CodecConfig,
}

impl Pipeline {
    /// Creates a pipeline with a fixed set of available codecs.
    pub fn new(codecs: CodecConfig) -> Self {
        Self { codecs }
    }

    /// Converts `input`, writing the flipped image next to it.
    ///
    /// # Errors
    ///
    /// Every error concerns this file only. [`ConvertError::is_skip`]
    /// tells skips (EXR without the codec) from failures.
    pub fn convert(&self, input: &Path, options: &ConvertOptions) -> ConvertResult<Conversion> {
        trace!(input = %input.display(), direction = %options.direction, "convert");

        let profile = FormatProfile::for_path(input).ok_or_else(|| ConvertError::Decode {
            path: input.to_path_buf(),
            source: IoError::UnsupportedFormat(
                input
                    .extension()
                    .map(|e| e.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "unknown".to_string()),
            ),
        })?;
        let output = output_path(input, &options.suffix)?;

        let layout = if profile.is_float_hdr {
            self.convert_hdr(input, &output, options.exr_range)?
        } else {
            self.convert_standard(input, &output, profile)?
        };

        debug!(input = %input.display(), output = %output.display(), ?layout, "converted");
        Ok(Conversion {
            input: input.to_path_buf(),
            output,
            direction: options.direction,
            layout,
        })
    }

    fn convert_standard(
        &self,
        input: &Path,
        output: &Path,
        profile: &FormatProfile,
    ) -> ConvertResult<ChannelLayout> {
        let decode_err = |source: IoError| ConvertError::Decode {
            path: input.to_path_buf(),
            source,
        };

        let source = normflip_io::read(input).map_err(decode_err)?;
        if source.is_empty() {
            return Err(ConvertError::EmptyImage {
                path: input.to_path_buf(),
            });
        }
        if source.layout().is_float() {
            return Err(ConvertError::UnexpectedLayout {
                path: input.to_path_buf(),
                layout: source.layout(),
            });
        }

        // decided on the decoded image, before anything is expanded
        let keep_alpha = source.layout().has_alpha() || source.metadata.transparency;
        debug!(
            layout = ?source.layout(),
            transparency = source.metadata.transparency,
            keep_alpha,
            "alpha policy"
        );

        let mut working = source.to_rgba8().map_err(decode_err)?;
        drop(source);
        if !flip_green_u8(&mut working) {
            return Err(ConvertError::UnexpectedLayout {
                path: input.to_path_buf(),
                layout: working.layout(),
            });
        }

        let mut image = if keep_alpha { working } else { working.drop_alpha() };
        if !profile.supports_alpha {
            image = image.drop_alpha();
        }

        debug!(format = ?profile.format, options = ?profile.encode_options, "encoding");
        let write = |path: &Path, image: &PixelBuffer, options: &EncodeOptions| {
            normflip_io::write_with_options(path, image, options)
        };
        encode_with_retry(output, &image, &profile.encode_options, write)
            .map_err(|source| {
                remove_partial(output);
                ConvertError::Encode {
                    path: output.to_path_buf(),
                    source,
                }
            })?;

        Ok(image.layout())
    }

    fn convert_hdr(&self, input: &Path, output: &Path, range: ExrRange) -> ConvertResult<ChannelLayout> {
        if !self.codecs.hdr_available() {
            return Err(ConvertError::HdrUnavailable {
                path: input.to_path_buf(),
            });
        }

        let mut image = normflip_io::read(input).map_err(|source| ConvertError::Decode {
            path: input.to_path_buf(),
            source,
        })?;
        if image.is_empty() {
            return Err(ConvertError::EmptyImage {
                path: input.to_path_buf(),
            });
        }
        if !flip_green_f32(&mut image) {
            return Err(ConvertError::UnexpectedLayout {
                path: input.to_path_buf(),
                layout: image.layout(),
            });
        }
        debug!(?range, layout = ?image.layout(), "exr green flipped");

        normflip_io::write(output, &image).map_err(|source| {
            remove_partial(output);
            ConvertError::Encode {
                path: output.to_path_buf(),
                source,
            }
        })?;

        Ok(image.layout())
    }
}

/// Encodes with `options`, falling back once to codec defaults.
fn encode_with_retry<F>(output: &Path, image: &PixelBuffer, options: &EncodeOptions, mut write: F) -> IoResult<()>
where
    F: FnMut(&Path, &PixelBuffer, &EncodeOptions) -> IoResult<()>,
{
    match write(output, image, options) {
        Ok(()) => Ok(()),
        Err(e) if !options.is_none() => {
            warn!(output = %output.display(), error = %e, "encode failed, retrying without options");
            write(output, image, &EncodeOptions::NONE)
        }
        Err(e) => Err(e),
    }
}

fn remove_partial(output: &Path) {
    if output.exists() {
        if let Err(e) = fs::remove_file(output) {
            warn!(output = %output.display(), error = %e, "could not remove partial output");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use normflip_io::ChromaSubsampling;

    #[test]
    fn test_output_path_keeps_extension_case() {
        let out = output_path(Path::new("textures/cliff_normal_map.png"), "_DX").unwrap();
        assert_eq!(out, Path::new("textures/cliff_normal_map_DX.png"));

        let out = output_path(Path::new("a/b/Rock_Normal_Map.TGA"), "_DX").unwrap();
        assert_eq!(out, Path::new("a/b/Rock_Normal_Map_DX.TGA"));

        let out = output_path(Path::new("metal_normal_map.tar.jpeg"), "-gl").unwrap();
        assert_eq!(out, Path::new("metal_normal_map.tar-gl.jpeg"));
    }

    #[test]
    fn test_output_path_rejects_empty_suffix() {
        let err = output_path(Path::new("x/normal_map.png"), "").unwrap_err();
        assert!(matches!(err, ConvertError::InvalidPath { .. }));
    }

    #[test]
    fn test_default_options() {
        let options = ConvertOptions::default();
        assert_eq!(options.suffix, "_DX");
        assert_eq!(options.direction, Direction::OglToDx);
        assert_eq!(options.exr_range, ExrRange::Unsigned);
    }

    fn tiny() -> PixelBuffer {
        PixelBuffer::from_u8(1, 1, ChannelLayout::Rgb8, vec![1, 2, 3]).unwrap()
    }

    #[test]
    fn test_retry_once_without_options() {
        let options = EncodeOptions {
            quality: Some(95),
            subsampling: Some(ChromaSubsampling::Half),
            optimize: true,
            compression: None,
        };
        let mut calls = Vec::new();
        let result = encode_with_retry(Path::new("out.jpg"), &tiny(), &options, |_, _, opts| {
            calls.push(*opts);
            if opts.is_none() {
                Ok(())
            } else {
                Err(IoError::EncodeError("rejected".into()))
            }
        });

        assert!(result.is_ok());
        assert_eq!(calls, vec![options, EncodeOptions::NONE]);
    }

    #[test]
    fn test_retry_failure_surfaces() {
        let options = EncodeOptions {
            quality: Some(95),
            ..EncodeOptions::NONE
        };
        let mut calls = 0;
        let result = encode_with_retry(Path::new("out.jpg"), &tiny(), &options, |_, _, _| {
            calls += 1;
            Err(IoError::EncodeError("disk full".into()))
        });

        assert!(matches!(result, Err(IoError::EncodeError(_))));
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_no_retry_without_options() {
        let mut calls = 0;
        let result = encode_with_retry(Path::new("out.png"), &tiny(), &EncodeOptions::NONE, |_, _, _| {
            calls += 1;
            Err(IoError::EncodeError("nope".into()))
        });

        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_exr_skipped_when_disabled() {
        let pipeline = Pipeline::new(CodecConfig { exr: false });
        let err = pipeline
            .convert(Path::new("does/not/matter/metal_normal_map.exr"), &ConvertOptions::default())
            .unwrap_err();
        assert!(err.is_skip());
    }

    #[test]
    fn test_unsupported_extension_names_the_extension() {
        let err = Pipeline::default()
            .convert(Path::new("maps/rock_normal_map.dds"), &ConvertOptions::default())
            .unwrap_err();
        match err {
            ConvertError::Decode {
                source: IoError::UnsupportedFormat(ext),
                ..
            } => assert_eq!(ext, "dds"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_decode_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = Pipeline::default()
            .convert(&dir.path().join("gone_normal_map.png"), &ConvertOptions::default())
            .unwrap_err();
        assert!(matches!(err, ConvertError::Decode { .. }));
        assert!(!err.is_skip());
    }
}
