use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands;

#[derive(Parser)]
#[command(name = "klinefill")]
#[command(about = "Gap-fill and interpolate minute kline files", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fill and interpolate every kline file in a directory
    Interpolate {
        /// Directory with raw <PAIR>.csv files (default: $KLINES_READ_DIR or data)
        #[arg(short, long)]
        input_dir: Option<PathBuf>,

        /// Directory for processed files (default: $KLINES_WRITE_DIR or processed_data)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Number of worker threads (default: available CPUs)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Gap-fill batch size in rows
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Build each filled series in a single buffer
        #[arg(long, conflicts_with = "chunk_size")]
        no_chunking: bool,

        /// Reject series whose latest kline is before this date (YYYY-MM-DD)
        #[arg(long)]
        min_last_date: Option<String>,

        /// Hide the progress bar
        #[arg(short, long)]
        quiet: bool,
    },
    /// Score processed files and report the minimum quality
    Validate {
        /// Directory with processed files (default: $KLINES_WRITE_DIR or processed_data)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Interpolate {
            input_dir,
            output_dir,
            workers,
            chunk_size,
            no_chunking,
            min_last_date,
            quiet,
        } => commands::interpolate::run(commands::interpolate::InterpolateArgs {
            input_dir,
            output_dir,
            workers,
            chunk_size,
            no_chunking,
            min_last_date,
            show_progress: !quiet,
        }),
        Commands::Validate { dir, json } => commands::validate::run(dir, json),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}
