//! Batch conversion command

use crate::BatchArgs;
use anyhow::{bail, Result};
use normflip_core::{Conversion, ConvertOptions, ConvertResult, Pipeline};
use std::path::Path;
use tracing::{info, trace, warn};

const NO_MATCHES: &str =
    "No matching normal map files found (must contain both 'normal' and 'map' in the filename).";

/// Per-run outcome counts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub converted: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl Summary {
    /// Counts one result and prints its console line.
    fn record(&mut self, input: &Path, result: ConvertResult<Conversion>) {
        match result {
            Ok(done) => {
                self.converted += 1;
                println!("  - {} -> {}", done.input.display(), done.output.display());
            }
            Err(e) if e.is_skip() => {
                self.skipped += 1;
                warn!(input = %input.display(), "skipped");
                println!("  - {} skipped: {}", input.display(), e);
            }
            Err(e) => {
                self.failed += 1;
                eprintln!("Error: {}", e);
            }
        }
    }
}

pub fn run(args: &BatchArgs) -> Result<()> {
    trace!(input = %args.input.display(), mode = ?args.mode, "batch::run");

    let options = args.convert_options();
    let summary = convert_all(&args.input, &Pipeline::new(args.codec_config()), &options);

    if summary.failed > 0 {
        bail!("{} file(s) failed", summary.failed);
    }
    Ok(())
}

/// Converts every normal map under `root`, one at a time, and prints the
/// per-file lines and the final summary.
fn convert_all(root: &Path, pipeline: &Pipeline, options: &ConvertOptions) -> Summary {
    let files = normflip_core::discover(root);
    let mut summary = Summary::default();

    if files.is_empty() {
        println!("{}", NO_MATCHES);
        return summary;
    }

    info!(files = files.len(), root = %root.display(), direction = %options.direction, "Starting batch conversion");
    println!("Converting {} file(s) (mode={}) ...", files.len(), options.direction);

    for input in &files {
        summary.record(input, pipeline.convert(input, options));
    }

    println!("Done.");
    println!(
        "Converted: {}, skipped: {}, failed: {}",
        summary.converted, summary.skipped, summary.failed
    );
    info!(
        converted = summary.converted,
        skipped = summary.skipped,
        failed = summary.failed,
        "Batch conversion complete"
    );

    summary
}
