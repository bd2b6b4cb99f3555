//! Cache-first market data: the only way the runner obtains bars.
//!
//! A hit never touches the source. A miss calls the source once, normalizes
//! what comes back (date order, first row per date wins, rows without a
//! finite close dropped) and stores it. An empty result is `NoData` and is
//! never cached.

use super::cache::{CacheKey, CacheStore};
use super::provider::{DataError, DataProvider, RawBar};
use crate::domain::{Bar, BarSeries};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct MarketData<P: DataProvider, C: CacheStore + ?Sized> {
    source: P,
    cache: Arc<C>,
}

impl<P: DataProvider, C: CacheStore + ?Sized> MarketData<P, C> {
    pub fn new(source: P, cache: Arc<C>) -> Self {
        Self { source, cache }
    }

    pub fn source(&self) -> &P {
        &self.source
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Bars for `symbol` over `[start, end)`.
    pub fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BarSeries, DataError> {
        let key = CacheKey::new(symbol, start, end);
        if let Some(series) = self.cache.get(&key) {
            debug!(symbol, bars = series.len(), "served from cache");
            return Ok(series);
        }

        let raw = self.source.fetch(symbol, start, end)?;
        let received = raw.len();
        let bars = normalize(raw);
        if bars.len() < received {
            debug!(
                symbol,
                dropped = received - bars.len(),
                "dropped duplicate or closeless rows"
            );
        }
        if bars.is_empty() {
            return Err(DataError::NoData {
                symbol: symbol.to_string(),
                start,
                end,
            });
        }

        let series = BarSeries::new(symbol, bars)?;
        info!(
            symbol,
            source = self.source.name(),
            bars = series.len(),
            "fetched bars"
        );

        if let Err(e) = self.cache.put(&key, &series) {
            warn!(symbol, error = %e, "cache write failed, continuing without cache");
        }
        Ok(series)
    }
}

/// Sort ascending by date and keep the first row seen for each date.
///
/// Rows without a finite close are dropped; a missing open, high or low takes
/// the close. Every price in the result is finite, so the series always
/// survives a JSON round trip through the cache.
pub fn normalize(raw: Vec<RawBar>) -> Vec<Bar> {
    let mut indexed: Vec<(usize, RawBar)> = raw
        .into_iter()
        .filter(|bar| bar.close.is_finite())
        .enumerate()
        .collect();
    // Stable on the original position so "first seen" survives the sort.
    indexed.sort_by_key(|(i, bar)| (bar.date, *i));
    indexed.dedup_by_key(|(_, bar)| bar.date);
    indexed.into_iter().map(|(_, bar)| fill_missing(bar).into()).collect()
}

fn fill_missing(mut bar: RawBar) -> RawBar {
    let close = bar.close;
    for price in [&mut bar.open, &mut bar.high, &mut bar.low] {
        if !price.is_finite() {
            *price = close;
        }
    }
    bar
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::cache::MemoryCache;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn raw(day: u32, close: f64) -> RawBar {
        RawBar {
            date: d(day),
            open: close,
            high: close,
            low: close,
            close,
            volume: 10,
        }
    }

    struct StubSource {
        bars: Vec<RawBar>,
        calls: AtomicUsize,
    }

    impl DataProvider for StubSource {
        fn name(&self) -> &str {
            "stub"
        }

        fn fetch(&self, _: &str, _: NaiveDate, _: NaiveDate) -> Result<Vec<RawBar>, DataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.bars.clone())
        }
    }

    fn market(bars: Vec<RawBar>) -> MarketData<StubSource, MemoryCache> {
        let source = StubSource {
            bars,
            calls: AtomicUsize::new(0),
        };
        MarketData::new(source, Arc::new(MemoryCache::new()))
    }

    #[test]
    fn normalize_sorts_and_keeps_first_duplicate() {
        let bars = normalize(vec![raw(3, 3.0), raw(2, 2.0), raw(3, 99.0), raw(1, 1.0)]);
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn normalize_drops_closeless_rows_and_fills_other_prices() {
        let mut partial = raw(2, 5.0);
        partial.open = f64::NAN;
        partial.low = f64::INFINITY;
        let bars = normalize(vec![raw(1, f64::NAN), partial, raw(3, 6.0)]);

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, d(2));
        assert_eq!(bars[0].open, 5.0);
        assert_eq!(bars[0].low, 5.0);
        assert_eq!(bars[0].high, 5.0);
    }

    #[test]
    fn closeless_duplicate_does_not_shadow_a_valid_row() {
        let bars = normalize(vec![raw(2, f64::NAN), raw(2, 7.0)]);
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, 7.0);
    }

    #[test]
    fn only_closeless_rows_is_no_data() {
        let market = market(vec![raw(2, f64::NAN)]);
        let err = market.fetch("SPY", d(1), d(10)).unwrap_err();
        assert!(matches!(err, DataError::NoData { .. }));
        assert!(market.cache().is_empty());
    }

    #[test]
    fn second_fetch_is_a_cache_hit() {
        let market = market(vec![raw(2, 1.0), raw(3, 2.0)]);
        let first = market.fetch("SPY", d(1), d(10)).unwrap();
        let second = market.fetch("SPY", d(1), d(10)).unwrap();
        assert_eq!(first, second);
        assert_eq!(market.source().calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_source_is_no_data_and_not_cached() {
        let market = market(vec![]);
        let err = market.fetch("ZZZZ", d(1), d(10)).unwrap_err();
        assert!(matches!(err, DataError::NoData { ref symbol, .. } if symbol == "ZZZZ"));
        assert!(market.cache().is_empty());
    }

    #[test]
    fn different_window_is_a_different_key() {
        let market = market(vec![raw(2, 1.0)]);
        market.fetch("SPY", d(1), d(10)).unwrap();
        market.fetch("SPY", d(1), d(11)).unwrap();
        assert_eq!(market.source().calls.load(Ordering::SeqCst), 2);
        assert_eq!(market.cache().len(), 2);
    }
}
