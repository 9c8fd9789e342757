//! # normflip-core
//!
//! Converts tangent-space normal maps between the OpenGL (Y+) and DirectX
//! (Y-) conventions by inverting the green channel, keeping each file's
//! format, alpha and extension.
//!
//! - [`discover`] finds candidate files by name and extension
//! - [`Pipeline`] converts one file at a time
//! - [`FormatProfile`] holds the per-extension output policy
//!
//! # Example
//!
//! ```rust,ignore
//! use normflip_core::{discover, ConvertOptions, Pipeline};
//! use normflip_io::CodecConfig;
//!
//! let pipeline = Pipeline::new(CodecConfig::default());
//! let options = ConvertOptions::default();
//! for path in discover("textures") {
//!     match pipeline.convert(&path, &options) {
//!         Ok(done) => println!("{} -> {}", done.input.display(), done.output.display()),
//!         Err(e) => eprintln!("{}", e),
//!     }
//! }
//! ```

#![warn(missing_docs)]

mod discover;
mod error;
pub mod flip;
mod pipeline;
mod profile;

pub use discover::{discover, is_supported, looks_like_normal_map};
pub use error::{ConvertError, ConvertResult};
pub use flip::{Direction, ExrRange};
pub use pipeline::{output_path, Conversion, ConvertOptions, Pipeline, DEFAULT_SUFFIX};
pub use profile::FormatProfile;
