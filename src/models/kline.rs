use std::fmt;

use crate::constants::kline_column;

/// One of the nine numeric kline columns
///
/// Every stage that touches values (interpolation, storage) walks these
/// columns independently, so they are addressable by enum rather than by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericColumn {
    Open,
    High,
    Low,
    Close,
    Volume,
    QuoteAssetVolume,
    NumberOfTrades,
    TakerBuyBaseAssetVolume,
    TakerBuyQuoteAssetVolume,
}

impl NumericColumn {
    /// All numeric columns in storage order
    pub const ALL: [NumericColumn; 9] = [
        NumericColumn::Open,
        NumericColumn::High,
        NumericColumn::Low,
        NumericColumn::Close,
        NumericColumn::Volume,
        NumericColumn::QuoteAssetVolume,
        NumericColumn::NumberOfTrades,
        NumericColumn::TakerBuyBaseAssetVolume,
        NumericColumn::TakerBuyQuoteAssetVolume,
    ];

    /// Column name as it appears in a file header
    pub fn name(&self) -> &'static str {
        match self {
            NumericColumn::Open => kline_column::OPEN,
            NumericColumn::High => kline_column::HIGH,
            NumericColumn::Low => kline_column::LOW,
            NumericColumn::Close => kline_column::CLOSE,
            NumericColumn::Volume => kline_column::VOLUME,
            NumericColumn::QuoteAssetVolume => kline_column::QUOTE_ASSET_VOLUME,
            NumericColumn::NumberOfTrades => kline_column::NUMBER_OF_TRADES,
            NumericColumn::TakerBuyBaseAssetVolume => kline_column::TAKER_BUY_BASE_ASSET_VOLUME,
            NumericColumn::TakerBuyQuoteAssetVolume => kline_column::TAKER_BUY_QUOTE_ASSET_VOLUME,
        }
    }
}

impl fmt::Display for NumericColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Numeric payload of a kline
///
/// A missing value is stored as `f64::NAN` (the sentinel). `number_of_trades`
/// is a count in the source data but is kept as `f64` because interpolated
/// rows may carry fractional trade counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KlineValues {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub quote_asset_volume: f64,
    pub number_of_trades: f64,
    pub taker_buy_base_asset_volume: f64,
    pub taker_buy_quote_asset_volume: f64,
}

impl KlineValues {
    /// Values with every column set to the missing sentinel
    pub fn missing() -> Self {
        Self {
            open: f64::NAN,
            high: f64::NAN,
            low: f64::NAN,
            close: f64::NAN,
            volume: f64::NAN,
            quote_asset_volume: f64::NAN,
            number_of_trades: f64::NAN,
            taker_buy_base_asset_volume: f64::NAN,
            taker_buy_quote_asset_volume: f64::NAN,
        }
    }

    pub fn get(&self, column: NumericColumn) -> f64 {
        match column {
            NumericColumn::Open => self.open,
            NumericColumn::High => self.high,
            NumericColumn::Low => self.low,
            NumericColumn::Close => self.close,
            NumericColumn::Volume => self.volume,
            NumericColumn::QuoteAssetVolume => self.quote_asset_volume,
            NumericColumn::NumberOfTrades => self.number_of_trades,
            NumericColumn::TakerBuyBaseAssetVolume => self.taker_buy_base_asset_volume,
            NumericColumn::TakerBuyQuoteAssetVolume => self.taker_buy_quote_asset_volume,
        }
    }

    pub fn set(&mut self, column: NumericColumn, value: f64) {
        let slot = match column {
            NumericColumn::Open => &mut self.open,
            NumericColumn::High => &mut self.high,
            NumericColumn::Low => &mut self.low,
            NumericColumn::Close => &mut self.close,
            NumericColumn::Volume => &mut self.volume,
            NumericColumn::QuoteAssetVolume => &mut self.quote_asset_volume,
            NumericColumn::NumberOfTrades => &mut self.number_of_trades,
            NumericColumn::TakerBuyBaseAssetVolume => &mut self.taker_buy_base_asset_volume,
            NumericColumn::TakerBuyQuoteAssetVolume => &mut self.taker_buy_quote_asset_volume,
        };
        *slot = value;
    }

    /// True if the column holds the missing sentinel
    pub fn is_missing(&self, column: NumericColumn) -> bool {
        self.get(column).is_nan()
    }

    /// True if any column holds the missing sentinel
    pub fn has_missing(&self) -> bool {
        NumericColumn::ALL.iter().any(|c| self.is_missing(*c))
    }
}

/// Observed kline in the processing layout (no `interpolated` flag)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kline {
    /// Open time in milliseconds since the Unix epoch
    pub open_time: i64,
    pub values: KlineValues,
}

impl Kline {
    pub fn new(open_time: i64, values: KlineValues) -> Self {
        Self { open_time, values }
    }
}

/// Kline in the post-processed layout
///
/// Observed rows carry `interpolated = false`; rows synthesized to fill a gap
/// carry `interpolated = true` and start out with missing values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KlineRow {
    /// Open time in milliseconds since the Unix epoch
    pub open_time: i64,
    pub values: KlineValues,
    pub interpolated: bool,
}

impl KlineRow {
    /// Copy an observed kline forward
    pub fn observed(kline: Kline) -> Self {
        Self {
            open_time: kline.open_time,
            values: kline.values,
            interpolated: false,
        }
    }

    /// Placeholder for a missing minute, to be filled by interpolation
    pub fn blank(open_time: i64) -> Self {
        Self {
            open_time,
            values: KlineValues::missing(),
            interpolated: true,
        }
    }
}

impl From<Kline> for KlineRow {
    fn from(kline: Kline) -> Self {
        KlineRow::observed(kline)
    }
}

/// Anything that carries an open time, so validation can score raw and
/// processed series alike
pub trait Timestamped {
    fn open_time(&self) -> i64;
}

impl Timestamped for Kline {
    fn open_time(&self) -> i64 {
        self.open_time
    }
}

impl Timestamped for KlineRow {
    fn open_time(&self) -> i64 {
        self.open_time
    }
}
