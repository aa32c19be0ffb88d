//! Interpolate Command
//!
//! Gap-fills and interpolates every `<PAIR>.csv` in the input directory and
//! writes the post-processed files to the output directory. Files are spread
//! over a pool of worker threads; a file that fails or is rejected never
//! stops the others.

use std::path::PathBuf;
use tracing::{info, warn};

use crate::error::Error;
use crate::models::{parse_cutoff_date, PipelineConfig};
use crate::services::{batch, kline_csv, pipeline};
use crate::utils::{get_min_last_open_time, get_read_dir, get_write_dir};

/// Command-line options for one run
#[derive(Debug, Default)]
pub struct InterpolateArgs {
    pub input_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub workers: Option<usize>,
    pub chunk_size: Option<usize>,
    pub no_chunking: bool,
    pub min_last_date: Option<String>,
    pub show_progress: bool,
}

/// Resolve flags, environment and defaults into a pipeline config
pub fn build_config(args: &InterpolateArgs) -> Result<PipelineConfig, Error> {
    let read_dir = args.input_dir.clone().unwrap_or_else(get_read_dir);
    let write_dir = args.output_dir.clone().unwrap_or_else(get_write_dir);
    let mut config = PipelineConfig::new(read_dir, write_dir);

    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if args.no_chunking {
        config.chunk_size = None;
    } else if let Some(chunk_size) = args.chunk_size {
        config.chunk_size = Some(chunk_size);
    }

    // flag beats environment
    let cutoff = match &args.min_last_date {
        Some(date) => Some(parse_cutoff_date(date)?),
        None => get_min_last_open_time()?,
    };
    if let Some(cutoff) = cutoff {
        config.min_last_open_time = cutoff;
    }

    config.validate()?;
    Ok(config)
}

/// Run the interpolate command
pub fn run(args: InterpolateArgs) -> Result<(), Error> {
    let start_time = std::time::Instant::now();
    let config = build_config(&args)?;

    println!("🔧 Interpolating klines");
    println!("  Input:   {}", config.read_dir.display());
    println!("  Output:  {}", config.write_dir.display());
    println!("  Workers: {}", config.workers);
    println!("  Cut-off: {}", config.min_last_open_time.format("%Y-%m-%d"));

    batch::ensure_input_dir(&config.read_dir)?;
    let files = kline_csv::list_kline_files(&config.read_dir)?;
    if files.is_empty() {
        warn!(dir = %config.read_dir.display(), "No kline files found");
        println!("⚠️  No .csv files found in {}", config.read_dir.display());
        return Ok(());
    }

    let summary = batch::run_batch(files, config.workers, args.show_progress, |path| {
        pipeline::process_file(path, &config)
    });

    summary.print_summary();

    let duration = start_time.elapsed();
    println!("  ⏱️  Total time: {:.2}s", duration.as_secs_f64());

    if summary.failed.is_empty() {
        info!("Interpolation completed successfully");
    } else {
        warn!("Interpolation completed with {} failed files", summary.failed.len());
    }
    Ok(())
}
