//! Kline Grid Constants
//!
//! Fixed parameters of the 1-minute kline grid and the defaults used by the
//! usability gate.
//!
//! | Constant                 | Value      | Meaning                                  |
//! |--------------------------|------------|------------------------------------------|
//! | `STEP_MS`                | 60 000     | one grid step (1 minute)                 |
//! | `INTERP_CHUNK_SIZE`      | 16 384     | rows per emitted gap-fill batch          |
//! | `MAX_TIME_GAP_MS`        | 86 400 000 | largest tolerated gap (1 day, exclusive) |
//! | `REFERENCE_DATE`         | 2022-08-16 | anchor for the staleness cut-off         |
//! | `STALENESS_DAYS`         | 105        | days before the anchor still accepted    |

/// Milliseconds in one kline step (1 minute)
pub const STEP_MS: i64 = 60_000;

/// Number of rows buffered before the gap filler flushes a batch
pub const INTERP_CHUNK_SIZE: usize = 1 << 14;

/// A series with any consecutive gap of this size or more is rejected
pub const MAX_TIME_GAP_MS: i64 = 24 * 60 * 60 * 1000;

/// Reference date the staleness cut-off is measured from (YYYY, MM, DD)
pub const REFERENCE_DATE: (i32, u32, u32) = (2022, 8, 16);

/// Series whose latest kline is older than `REFERENCE_DATE - STALENESS_DAYS` are rejected
pub const STALENESS_DAYS: i64 = 35 * 3;

/// Default directory scanned for raw kline files
pub const DEFAULT_READ_DIR: &str = "data";

/// Default directory processed kline files are written to
pub const DEFAULT_WRITE_DIR: &str = "processed_data";

/// File extension of kline files
pub const KLINE_FILE_EXTENSION: &str = "csv";

/// Column names shared by every kline format
pub mod kline_column {
    pub const OPEN_TIME: &str = "open_time";
    pub const OPEN: &str = "open";
    pub const HIGH: &str = "high";
    pub const LOW: &str = "low";
    pub const CLOSE: &str = "close";
    pub const VOLUME: &str = "volume";
    pub const QUOTE_ASSET_VOLUME: &str = "quote_asset_volume";
    pub const NUMBER_OF_TRADES: &str = "number_of_trades";
    pub const TAKER_BUY_BASE_ASSET_VOLUME: &str = "taker_buy_base_asset_volume";
    pub const TAKER_BUY_QUOTE_ASSET_VOLUME: &str = "taker_buy_quote_asset_volume";
    pub const INTERPOLATED: &str = "interpolated";
}
