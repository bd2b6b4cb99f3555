//! Market data: sources, the bar-series cache, and the cache-first provider.

pub mod cache;
pub mod csv_source;
pub mod market_data;
pub mod provider;
pub mod yahoo;

pub use cache::{CacheEntry, CacheKey, CacheStore, FileCache, MemoryCache, CACHE_FORMAT_VERSION};
pub use csv_source::CsvProvider;
pub use market_data::{normalize, MarketData};
pub use provider::{DataError, DataProvider, RawBar};
pub use yahoo::{YahooProvider, DEFAULT_TIMEOUT_SECS};
