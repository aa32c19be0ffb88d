mod format;
mod kline;
mod pipeline_config;
mod validity;

pub use format::KlineFormat;
pub use kline::{Kline, KlineRow, KlineValues, NumericColumn, Timestamped};
pub use pipeline_config::{default_min_last_open_time, parse_cutoff_date, PipelineConfig};
pub use validity::{QualityReport, RejectReason, Validity};

