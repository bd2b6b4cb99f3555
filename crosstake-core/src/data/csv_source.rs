//! CSV folder data provider.
//!
//! Reads `{dir}/{SYMBOL}.csv` in the layout Yahoo's download produces
//! (`Date,Open,High,Low,Close,Adj Close,Volume`). Headers are matched after
//! lowercasing and dropping non-alphanumerics, so `Date`, `date` and
//! `datetime` all resolve to the date column. Column order does not matter.

use super::provider::{DataError, DataProvider, RawBar};
use chrono::NaiveDate;
use std::path::PathBuf;
use tracing::debug;

pub struct CsvProvider {
    dir: PathBuf,
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }
}

/// Lowercase and strip everything but letters and digits.
fn normalize_header(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[derive(Debug, Clone, Copy)]
struct Columns {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, DataError> {
        let names: Vec<String> = headers.iter().map(normalize_header).collect();
        let find = |aliases: &[&str]| names.iter().position(|n| aliases.contains(&n.as_str()));
        let require = |aliases: &[&str], label: &str| {
            find(aliases).ok_or_else(|| DataError::Csv(format!("missing {label} column")))
        };

        Ok(Self {
            date: require(&["date", "datetime", "timestamp"], "date")?,
            open: require(&["open"], "open")?,
            high: require(&["high"], "high")?,
            low: require(&["low"], "low")?,
            close: require(&["close"], "close")?,
            volume: find(&["volume"]),
        })
    }
}

/// Accepts `YYYY-MM-DD` optionally followed by a time part.
fn parse_date(raw: &str) -> Result<NaiveDate, DataError> {
    let raw = raw.trim();
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| DataError::Csv(format!("invalid date '{raw}': {e}")))
}

/// Empty and `null` cells are missing values.
fn parse_price(raw: Option<&str>, label: &str) -> Result<Option<f64>, DataError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) if s.eq_ignore_ascii_case("null") => Ok(None),
        Some(s) => s
            .parse::<f64>()
            .map(Some)
            .map_err(|e| DataError::Csv(format!("invalid {label} value '{s}': {e}"))),
    }
}

impl DataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawBar>, DataError> {
        let path = self.csv_path(symbol);
        if !path.is_file() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        debug!(symbol, path = %path.display(), "reading csv");

        let mut rdr = csv::Reader::from_path(&path)?;
        let columns = Columns::from_headers(rdr.headers()?)?;
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result?;

            let date_raw = record
                .get(columns.date)
                .ok_or_else(|| DataError::Csv("missing date value".into()))?;
            let date = parse_date(date_raw)?;
            if date < start || date >= end {
                continue;
            }

            let open = parse_price(record.get(columns.open), "open")?;
            let high = parse_price(record.get(columns.high), "high")?;
            let low = parse_price(record.get(columns.low), "low")?;
            let close = parse_price(record.get(columns.close), "close")?;
            let volume = match columns.volume {
                Some(idx) => parse_price(record.get(idx), "volume")?,
                None => None,
            };

            if open.is_none() && high.is_none() && low.is_none() && close.is_none() {
                continue;
            }

            bars.push(RawBar {
                date,
                open: open.unwrap_or(f64::NAN),
                high: high.unwrap_or(f64::NAN),
                low: low.unwrap_or(f64::NAN),
                close: close.unwrap_or(f64::NAN),
                volume: volume.map(|v| v.max(0.0) as u64).unwrap_or(0),
            });
        }

        Ok(bars)
    }
}
