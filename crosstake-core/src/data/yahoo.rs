//! Yahoo Finance data provider.
//!
//! Fetches daily OHLCV bars from Yahoo's v8 chart API. One request per fetch:
//! there are no retries, and a request that exceeds the timeout is surfaced as
//! a network error.
//!
//! Yahoo Finance has no official API and is subject to unannounced format changes.
//! The CSV provider is the fallback when Yahoo is unavailable.

use super::provider::{DataError, DataProvider, RawBar};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

pub struct YahooProvider {
    client: reqwest::blocking::Client,
}

impl YahooProvider {
    pub fn new(timeout: Duration) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Build the chart API URL for a symbol over `[start, end)`.
    fn chart_url(symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        let end_ts = end.and_time(NaiveTime::MIN).and_utc().timestamp();
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{symbol}\
             ?period1={start_ts}&period2={end_ts}&interval=1d"
        )
    }

    /// Parse the chart API response into RawBars inside `[start, end)`.
    fn parse_response(
        symbol: &str,
        resp: ChartResponse,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawBar>, DataError> {
        let result = resp.chart.result.ok_or_else(|| {
            if let Some(err) = resp.chart.error {
                if err.code == "Not Found" {
                    DataError::SymbolNotFound {
                        symbol: symbol.to_string(),
                    }
                } else {
                    DataError::ResponseFormat(format!("{}: {}", err.code, err.description))
                }
            } else {
                DataError::ResponseFormat("empty result with no error".into())
            }
        })?;

        let Some(data) = result.into_iter().next() else {
            return Ok(Vec::new());
        };

        // A symbol with no trading in the window comes back without timestamps.
        let Some(timestamps) = data.timestamp else {
            return Ok(Vec::new());
        };

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormat("no quote data".into()))?;

        let mut bars = Vec::with_capacity(timestamps.len());

        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.naive_utc().date())
                .ok_or_else(|| DataError::ResponseFormat(format!("invalid timestamp: {ts}")))?;

            if date < start || date >= end {
                continue;
            }

            let open = quote.open.get(i).copied().flatten();
            let high = quote.high.get(i).copied().flatten();
            let low = quote.low.get(i).copied().flatten();
            let close = quote.close.get(i).copied().flatten();
            let volume = quote.volume.get(i).copied().flatten();

            // Skip rows where every field is missing (holidays/non-trading days)
            if open.is_none()
                && high.is_none()
                && low.is_none()
                && close.is_none()
                && volume.is_none()
            {
                continue;
            }

            bars.push(RawBar {
                date,
                open: open.unwrap_or(f64::NAN),
                high: high.unwrap_or(f64::NAN),
                low: low.unwrap_or(f64::NAN),
                close: close.unwrap_or(f64::NAN),
                volume: volume.unwrap_or(0),
            });
        }

        Ok(bars)
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawBar>, DataError> {
        let url = Self::chart_url(symbol, start, end);
        debug!(symbol, %start, %end, "requesting Yahoo chart");

        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| DataError::Network(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        if !status.is_success() {
            return Err(DataError::Network(format!("HTTP {status} for {symbol}")));
        }

        let chart: ChartResponse = resp.json().map_err(|e| {
            DataError::ResponseFormat(format!("failed to parse response for {symbol}: {e}"))
        })?;

        Self::parse_response(symbol, chart, start, end)
    }
}
