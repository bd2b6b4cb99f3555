//! Ticker universe loaded from a folder of CSV lists.
//!
//! Every `*.csv` file in the folder is read and its `Ticker` column collected.
//! Files that cannot be read, or have no `Ticker` column, are logged and skipped.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::simulation::RunError;

const TICKER_COLUMN: &str = "Ticker";

/// Sorted, de-duplicated tickers from every CSV in `dir`.
pub fn load_tickers_from_dir(dir: &Path) -> Result<Vec<String>, RunError> {
    let entries = fs::read_dir(dir).map_err(|e| {
        RunError::InvalidInput(format!("cannot read ticker folder {}: {e}", dir.display()))
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
        })
        .collect();
    files.sort();

    let mut tickers = BTreeSet::new();
    for path in &files {
        match read_ticker_column(path) {
            Ok(found) => {
                debug!(path = %path.display(), count = found.len(), "loaded tickers");
                tickers.extend(found);
            }
            Err(reason) => warn!(path = %path.display(), %reason, "skipping ticker file"),
        }
    }
    Ok(tickers.into_iter().collect())
}

fn read_ticker_column(path: &Path) -> Result<Vec<String>, String> {
    let mut rdr = csv::Reader::from_path(path).map_err(|e| e.to_string())?;
    let column = rdr
        .headers()
        .map_err(|e| e.to_string())?
        .iter()
        .position(|h| h.trim() == TICKER_COLUMN)
        .ok_or_else(|| format!("no '{TICKER_COLUMN}' column"))?;

    let mut out = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| e.to_string())?;
        if let Some(cell) = record.get(column).map(str::trim) {
            if !cell.is_empty() {
                out.push(cell.to_string());
            }
        }
    }
    Ok(out)
}
