//! Bar and BarSeries: the market data the engine consumes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OHLCV bar for one trading day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// A close the engine can trade at: finite and strictly positive.
    pub fn has_tradable_close(&self) -> bool {
        self.close.is_finite() && self.close > 0.0
    }
}

/// Structural problems with a bar sequence.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarError {
    #[error("bar series for '{symbol}' is empty")]
    Empty { symbol: String },

    #[error("bar dates must be strictly increasing: {previous} is followed by {next}")]
    NotIncreasing { previous: NaiveDate, next: NaiveDate },
}

/// Chronologically ordered bars for a single symbol.
///
/// Invariants (checked on construction): at least one bar, dates strictly
/// increasing. Exchange holidays are simply absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    symbol: String,
    bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, BarError> {
        let symbol = symbol.into();
        if bars.is_empty() {
            return Err(BarError::Empty { symbol });
        }
        for pair in bars.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(BarError::NotIncreasing {
                    previous: pair[0].date,
                    next: pair[1].date,
                });
            }
        }
        Ok(Self { symbol, bars })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always false for a constructed series; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.bars[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.bars[self.bars.len() - 1].date
    }

    pub fn last_close(&self) -> f64 {
        self.bars[self.bars.len() - 1].close
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Bar> {
        self.bars.iter()
    }
}

impl<'a> IntoIterator for &'a BarSeries {
    type Item = &'a Bar;
    type IntoIter = std::slice::Iter<'a, Bar>;

    fn into_iter(self) -> Self::IntoIter {
        self.bars.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1_000,
        }
    }

    #[test]
    fn series_accepts_increasing_dates() {
        let series = BarSeries::new("SPY", vec![bar(2, 100.0), bar(3, 101.0), bar(5, 99.0)]).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.symbol(), "SPY");
        assert_eq!(series.first_date(), NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(series.last_date(), NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(series.last_close(), 99.0);
    }

    #[test]
    fn series_rejects_empty() {
        let err = BarSeries::new("SPY", vec![]).unwrap_err();
        assert_eq!(err, BarError::Empty { symbol: "SPY".into() });
    }

    #[test]
    fn series_rejects_duplicate_dates() {
        let err = BarSeries::new("SPY", vec![bar(2, 100.0), bar(2, 101.0)]).unwrap_err();
        assert!(matches!(err, BarError::NotIncreasing { .. }));
    }

    #[test]
    fn series_rejects_out_of_order_dates() {
        let err = BarSeries::new("SPY", vec![bar(3, 100.0), bar(2, 101.0)]).unwrap_err();
        assert!(matches!(err, BarError::NotIncreasing { .. }));
    }

    #[test]
    fn tradable_close() {
        assert!(bar(2, 100.0).has_tradable_close());
        assert!(!bar(2, 0.0).has_tradable_close());
        assert!(!bar(2, -1.0).has_tradable_close());
        assert!(!bar(2, f64::NAN).has_tradable_close());
        assert!(!bar(2, f64::INFINITY).has_tradable_close());
    }

    #[test]
    fn series_serialization_roundtrip() {
        let series = BarSeries::new("SPY", vec![bar(2, 100.0), bar(3, 101.5)]).unwrap();
        let json = serde_json::to_string(&series).unwrap();
        let deser: BarSeries = serde_json::from_str(&json).unwrap();
        assert_eq!(series, deser);
    }
}
