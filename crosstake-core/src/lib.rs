//! crosstake core: domain types, indicators, strategy engine, market data.
//!
//! This crate contains everything a single backtest needs:
//! - Domain types (bars, orders, positions, account, decision log, trades)
//! - Streaming SMA and the fast/mid crossover signal
//! - The flat/long strategy state machine and its simulated broker
//! - Data sources (Yahoo Finance, CSV folder) behind the `DataProvider` trait
//! - The bar-series cache and the cache-first `MarketData` provider

pub mod data;
pub mod domain;
pub mod engine;
pub mod indicators;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: types shared across batch worker threads are
    /// Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::BarSeries>();
        require_sync::<domain::BarSeries>();
        require_send::<domain::Position>();
        require_sync::<domain::Position>();
        require_send::<domain::DecisionLogEntry>();
        require_sync::<domain::DecisionLogEntry>();
        require_send::<domain::TradeRecord>();
        require_sync::<domain::TradeRecord>();

        // Engine types
        require_send::<engine::StrategyConfig>();
        require_sync::<engine::StrategyConfig>();
        require_send::<engine::EngineOutcome>();
        require_sync::<engine::EngineOutcome>();
        require_send::<engine::StrategyEngine>();

        // Data layer
        require_send::<data::FileCache>();
        require_sync::<data::FileCache>();
        require_send::<data::MemoryCache>();
        require_sync::<data::MemoryCache>();
        require_send::<data::YahooProvider>();
        require_sync::<data::YahooProvider>();
        require_send::<data::CsvProvider>();
        require_sync::<data::CsvProvider>();
        require_send::<data::DataError>();
    }

    /// The cache trait must stay object safe so the runner can share
    /// `Arc<dyn CacheStore>` across threads.
    #[test]
    fn cache_store_is_object_safe() {
        fn _takes_dyn(cache: std::sync::Arc<dyn data::CacheStore>) -> usize {
            std::mem::size_of_val(&cache)
        }
        let cache: std::sync::Arc<dyn data::CacheStore> =
            std::sync::Arc::new(data::MemoryCache::new());
        assert!(_takes_dyn(cache) > 0);
    }
}
