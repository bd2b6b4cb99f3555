//! Data provider trait and structured error types.
//!
//! A `DataProvider` is the external source (Yahoo Finance, a CSV folder, a
//! test double). The cache layer sits above this trait; providers don't know
//! about the cache.

use crate::domain::{Bar, BarError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Daily OHLCV row as a source returns it, before sorting and de-duplication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl From<RawBar> for Bar {
    fn from(raw: RawBar) -> Self {
        Bar {
            date: raw.date,
            open: raw.open,
            high: raw.high,
            low: raw.low,
            close: raw.close,
            volume: raw.volume,
        }
    }
}

#[derive(Debug, Error)]
pub enum DataError {
    #[error("no data for '{symbol}' between {start} and {end}")]
    NoData {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("network error: {0}")]
    Network(String),

    #[error("response format changed: {0}")]
    ResponseFormat(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("csv error: {0}")]
    Csv(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("cache error: {0}")]
    Cache(String),

    #[error("invalid bar series: {0}")]
    InvalidSeries(#[from] BarError),
}

impl From<std::io::Error> for DataError {
    fn from(e: std::io::Error) -> Self {
        DataError::Io(e.to_string())
    }
}

impl From<csv::Error> for DataError {
    fn from(e: csv::Error) -> Self {
        DataError::Csv(e.to_string())
    }
}

/// An external source of daily bars.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily bars for `symbol` over `[start, end)`.
    ///
    /// May return an empty vec; the caller decides what that means.
    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawBar>, DataError>;
}

impl<T: DataProvider + ?Sized> DataProvider for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawBar>, DataError> {
        (**self).fetch(symbol, start, end)
    }
}
