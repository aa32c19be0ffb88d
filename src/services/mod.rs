pub mod batch;
pub mod gap_filler;
pub mod interpolator;
pub mod kline_csv;
pub mod normalizer;
pub mod pipeline;
pub mod preprocessing;
pub mod validator;

pub use batch::{ensure_input_dir, run_batch, BatchSummary, FailedFile, TaskQueue, WorkerMessage};
pub use gap_filler::{ChunkBuffer, GapFill, GapFiller};
pub use interpolator::{count_missing, find_interior_missing, interpolate, interpolate_column};
pub use kline_csv::{
    list_kline_files, pair_name, read_klines, read_processed, write_processed, LoadedKlines,
};
pub use normalizer::{assert_integrity, ensure_strictly_increasing, is_on_grid, normalize};
pub use pipeline::{process_file, process_series, FileOutcome, PipelineStats, SeriesOutcome};
pub use preprocessing::{clear_raw, prepare, PreprocessStats};
pub use validator::{last_open_time, max_time_gap, quality, validate, UsabilityGate};
