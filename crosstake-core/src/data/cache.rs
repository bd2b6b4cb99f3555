//! Bar-series cache keyed by `(symbol, start, end)`.
//!
//! Layout: `{cache_dir}/{blake3("{symbol}_{start}_{end}")}.json`
//!
//! Features:
//! - Atomic writes (write to a unique .tmp, rename into place, last writer wins)
//! - Integrity validation on load (format version, key, bar checksum, series invariants)
//! - Quarantine for corrupt files ({digest}.json.quarantined)
//!
//! Entries never expire. A corrupt or unreadable entry is a miss, never an
//! error for the caller.

use super::provider::DataError;
use crate::domain::{Bar, BarSeries};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};
use tracing::{debug, warn};

/// Bump when the on-disk envelope changes shape.
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// Deterministic identity of one cached request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    symbol: String,
    start: NaiveDate,
    end: NaiveDate,
    digest: String,
}

impl CacheKey {
    pub fn new(symbol: &str, start: NaiveDate, end: NaiveDate) -> Self {
        let raw = format!(
            "{symbol}_{}_{}",
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        );
        Self {
            symbol: symbol.to_string(),
            start,
            end,
            digest: blake3::hash(raw.as_bytes()).to_hex().to_string(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Hex digest used as the file stem.
    pub fn digest(&self) -> &str {
        &self.digest
    }
}

/// Persisted envelope around a cached series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub format_version: u32,
    pub key: String,
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// BLAKE3 hex of the JSON-serialized bars.
    pub checksum: String,
    pub bars: Vec<Bar>,
}

impl CacheEntry {
    pub fn new(key: &CacheKey, series: &BarSeries) -> Result<Self, DataError> {
        Ok(Self {
            format_version: CACHE_FORMAT_VERSION,
            key: key.digest().to_string(),
            symbol: series.symbol().to_string(),
            start: key.start(),
            end: key.end(),
            checksum: bars_checksum(series.bars())?,
            bars: series.bars().to_vec(),
        })
    }

    /// Validate the envelope against `key` and rebuild the series.
    pub fn into_series(self, key: &CacheKey) -> Result<BarSeries, String> {
        if self.format_version != CACHE_FORMAT_VERSION {
            return Err(format!(
                "format version {} (expected {CACHE_FORMAT_VERSION})",
                self.format_version
            ));
        }
        if self.key != key.digest() {
            return Err(format!("key mismatch: entry holds {}", self.key));
        }
        let checksum = bars_checksum(&self.bars).map_err(|e| e.to_string())?;
        if checksum != self.checksum {
            return Err("checksum mismatch".into());
        }
        BarSeries::new(self.symbol, self.bars).map_err(|e| e.to_string())
    }
}

fn bars_checksum(bars: &[Bar]) -> Result<String, DataError> {
    let bytes = serde_json::to_vec(bars)
        .map_err(|e| DataError::Cache(format!("checksum serialization: {e}")))?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

/// Persistent store of bar series.
pub trait CacheStore: Send + Sync {
    /// Cached series for `key`, or `None` on a miss (including a corrupt entry).
    fn get(&self, key: &CacheKey) -> Option<BarSeries>;

    /// Store `series` under `key`, silently replacing any previous entry.
    fn put(&self, key: &CacheKey, series: &BarSeries) -> Result<(), DataError>;
}

// ── File cache ──────────────────────────────────────────────────────

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// One JSON file per key under `cache_dir`.
pub struct FileCache {
    cache_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the entry for `key`: `{cache_dir}/{digest}.json`
    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key.digest()))
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entry_path(key).is_file()
    }

    /// Number of entries on disk (quarantined files excluded).
    pub fn len(&self) -> usize {
        self.entry_files().map(|files| files.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every entry. Quarantined files are left for inspection.
    pub fn clear(&self) -> Result<usize, DataError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|p| p.into_inner());
        let files = self.entry_files()?;
        for path in &files {
            fs::remove_file(path)
                .map_err(|e| DataError::Cache(format!("remove {}: {e}", path.display())))?;
        }
        Ok(files.len())
    }

    fn entry_files(&self) -> Result<Vec<PathBuf>, DataError> {
        if !self.cache_dir.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.cache_dir)
            .map_err(|e| DataError::Cache(format!("read dir: {e}")))?;
        let mut files = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| DataError::Cache(format!("dir entry: {e}")))?
                .path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                files.push(path);
            }
        }
        Ok(files)
    }

    fn load(&self, path: &Path, key: &CacheKey) -> Result<BarSeries, String> {
        let content = fs::read(path).map_err(|e| format!("read: {e}"))?;
        let entry: CacheEntry =
            serde_json::from_slice(&content).map_err(|e| format!("parse: {e}"))?;
        entry.into_series(key)
    }

    /// Re-read `path` under the write lock and quarantine it only if it is
    /// still corrupt. A `put` that landed after the first read wins.
    fn recheck_or_quarantine(
        &self,
        path: &Path,
        key: &CacheKey,
        reason: &str,
    ) -> Option<BarSeries> {
        let _guard = self.write_lock.lock().unwrap_or_else(|p| p.into_inner());
        if !path.is_file() {
            return None;
        }
        if let Ok(series) = self.load(path, key) {
            debug!(symbol = key.symbol(), "entry replaced by a concurrent write");
            return Some(series);
        }

        warn!(
            path = %path.display(),
            symbol = key.symbol(),
            %reason,
            "quarantining corrupt cache entry"
        );
        let quarantined = path.with_extension("json.quarantined");
        if let Err(e) = fs::rename(path, &quarantined) {
            warn!(path = %path.display(), error = %e, "failed to quarantine cache entry");
        }
        None
    }
}

impl CacheStore for FileCache {
    fn get(&self, key: &CacheKey) -> Option<BarSeries> {
        let path = self.entry_path(key);
        if !path.is_file() {
            debug!(symbol = key.symbol(), "cache miss");
            return None;
        }
        match self.load(&path, key) {
            Ok(series) => {
                debug!(symbol = key.symbol(), bars = series.len(), "cache hit");
                Some(series)
            }
            Err(reason) => self.recheck_or_quarantine(&path, key, &reason),
        }
    }

    fn put(&self, key: &CacheKey, series: &BarSeries) -> Result<(), DataError> {
        let entry = CacheEntry::new(key, series)?;
        let json = serde_json::to_vec_pretty(&entry)
            .map_err(|e| DataError::Cache(format!("entry serialization: {e}")))?;

        let _guard = self.write_lock.lock().unwrap_or_else(|p| p.into_inner());

        fs::create_dir_all(&self.cache_dir)
            .map_err(|e| DataError::Cache(format!("failed to create dir: {e}")))?;

        let path = self.entry_path(key);
        let seq = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let tmp_path = self.cache_dir.join(format!(
            "{}.{}.{seq}.tmp",
            key.digest(),
            std::process::id()
        ));

        fs::write(&tmp_path, json)
            .map_err(|e| DataError::Cache(format!("write {}: {e}", tmp_path.display())))?;

        // Atomic rename
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DataError::Cache(format!("atomic rename failed: {e}"))
        })?;

        debug!(symbol = key.symbol(), path = %path.display(), "cache write");
        Ok(())
    }
}

// ── Memory cache ────────────────────────────────────────────────────

/// Process-lifetime cache, mostly for tests.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, BarSeries>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &CacheKey) -> Option<BarSeries> {
        self.entries
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(key.digest())
            .cloned()
    }

    fn put(&self, key: &CacheKey, series: &BarSeries) -> Result<(), DataError> {
        self.entries
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .insert(key.digest().to_string(), series.clone());
        Ok(())
    }
}
