//! normflip - flip the green channel of normal maps (OpenGL <-> DirectX)
//!
//! Writes each converted map next to its original, same format and
//! extension, with a suffix on the file stem.

use anyhow::{Context, Result};
use clap::{Args, Parser, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use normflip_core::{ConvertOptions, Direction, ExrRange, DEFAULT_SUFFIX};
use normflip_io::CodecConfig;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "normflip")]
#[command(author, version, about = "Flip Y channel of normal maps (OpenGL <-> DirectX), saved next to the originals in the same format")]
#[command(long_about = "
Finds normal maps (file names containing both 'normal' and 'map') and
inverts their green channel. Each output keeps the input's format, alpha
and extension and is written next to it with a suffix.

Supported: png, jpg, jpeg, tga, tif, tiff, bmp, webp, exr

Examples:
  normflip textures/                        # convert every normal map below textures/
  normflip rock_normal_map.png              # convert a single file
  normflip textures/ --mode dx2ogl --suffix _GL
  normflip textures/ --no-exr -v --log-file normflip.log
")]
struct Cli {
    #[command(flatten)]
    batch: BatchArgs,

    /// Verbose logging (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Also write log events to this file
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

/// Conversion direction label; both flip Y.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    /// OpenGL to DirectX
    #[value(name = "ogl2dx")]
    Ogl2Dx,
    /// DirectX to OpenGL
    #[value(name = "dx2ogl")]
    Dx2Ogl,
}

impl From<Mode> for Direction {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Ogl2Dx => Direction::OglToDx,
            Mode::Dx2Ogl => Direction::DxToOgl,
        }
    }
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// Input file or top-level folder to search recursively
    input: PathBuf,

    /// Conversion direction label (both flip Y; for your reference)
    #[arg(long, value_enum, default_value_t = Mode::Ogl2Dx)]
    mode: Mode,

    /// Suffix appended to the output file name (e.g. _DX or _GL)
    #[arg(long, default_value = DEFAULT_SUFFIX, value_parser = clap::builder::NonEmptyStringValueParser::new())]
    suffix: String,

    /// Treat EXR green as a signed [-1, 1] vector component
    #[arg(long)]
    exr_signed: bool,

    /// Skip EXR files
    #[arg(long)]
    no_exr: bool,
}

impl BatchArgs {
    fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            suffix: self.suffix.clone(),
            direction: self.mode.into(),
            exr_range: if self.exr_signed { ExrRange::Signed } else { ExrRange::Unsigned },
        }
    }

    fn codec_config(&self) -> CodecConfig {
        let mut config = CodecConfig::default();
        if self.no_exr {
            config.exr = false;
        }
        config
    }
}

/// Installs the global subscriber. The returned guard flushes the log
/// file on drop and must live until the process exits.
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let default_directives = match verbose {
        0 => "warn",
        1 => "warn,normflip=info,normflip_core=info,normflip_io=info",
        _ => "warn,normflip=debug,normflip_core=debug,normflip_io=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    let console = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .with_context(|| format!("Log file has no file name: {}", path.display()))?;
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::NEVER)
                .filename_prefix(name.to_string_lossy())
                .build(dir)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()
        .context("Failed to install logger")?;

    Ok(guard)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.verbose, cli.log_file.as_deref())?;

    commands::batch::run(&cli.batch)
}
