use crate::constants::kline_column;
use crate::error::{AppError, Result};

/// Column layout of a kline file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KlineFormat {
    /// open_time plus the nine numeric columns, as read for processing
    Processing,
    /// Processing columns plus the `interpolated` flag
    PostProcessed,
}

const PROCESSING_COLUMNS: &[&str] = &[
    kline_column::OPEN_TIME,
    kline_column::OPEN,
    kline_column::HIGH,
    kline_column::LOW,
    kline_column::CLOSE,
    kline_column::VOLUME,
    kline_column::QUOTE_ASSET_VOLUME,
    kline_column::NUMBER_OF_TRADES,
    kline_column::TAKER_BUY_BASE_ASSET_VOLUME,
    kline_column::TAKER_BUY_QUOTE_ASSET_VOLUME,
];

const POST_PROCESSED_COLUMNS: &[&str] = &[
    kline_column::OPEN_TIME,
    kline_column::OPEN,
    kline_column::HIGH,
    kline_column::LOW,
    kline_column::CLOSE,
    kline_column::VOLUME,
    kline_column::QUOTE_ASSET_VOLUME,
    kline_column::NUMBER_OF_TRADES,
    kline_column::TAKER_BUY_BASE_ASSET_VOLUME,
    kline_column::TAKER_BUY_QUOTE_ASSET_VOLUME,
    kline_column::INTERPOLATED,
];

impl KlineFormat {
    /// Columns in write order
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            KlineFormat::Processing => PROCESSING_COLUMNS,
            KlineFormat::PostProcessed => POST_PROCESSED_COLUMNS,
        }
    }

    /// Guess the layout of a header: the `interpolated` column marks a file
    /// that has already been through the pipeline
    pub fn detect<'a, I>(headers: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        if headers.into_iter().any(|h| h.trim() == kline_column::INTERPOLATED) {
            KlineFormat::PostProcessed
        } else {
            KlineFormat::Processing
        }
    }

    /// Columns of this layout not present in `headers`
    pub fn missing_columns<'a, I>(&self, headers: I) -> Vec<&'static str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let present: Vec<&str> = headers.into_iter().map(str::trim).collect();
        self.columns()
            .iter()
            .filter(|c| !present.contains(*c))
            .copied()
            .collect()
    }

    /// Fail with a schema error naming every absent column
    pub fn check_headers<'a, I>(&self, headers: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let missing = self.missing_columns(headers);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::Schema(format!(
                "missing columns: {}",
                missing.join(", ")
            )))
        }
    }
}
