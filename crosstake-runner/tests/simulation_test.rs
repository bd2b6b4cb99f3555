//! End-to-end simulation tests on the ACME CSV fixture.
//!
//! The fixture is 43 weekday bars from 2024-01-01: a rise, a roll-over that
//! crosses on 2024-02-22 at close 100, then a run-up to 120 on 2024-02-28.

use chrono::NaiveDate;
use crosstake_core::data::{
    CacheStore, CsvProvider, DataError, DataProvider, FileCache, MemoryCache, RawBar,
};
use crosstake_core::domain::DecisionKind;
use crosstake_runner::{
    write_decision_log_csv, ProfitSummary, RunError, Simulation, SimulationConfig, Valuation,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("crosstake-core/tests/fixtures")
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn csv_sim(cache: Arc<dyn CacheStore>) -> Simulation<CsvProvider> {
    Simulation::new(CsvProvider::new(fixture_dir()), cache)
}

#[test]
fn full_round_trip_on_fixture() {
    let sim = csv_sim(Arc::new(MemoryCache::new()));
    let result = sim
        .run_window("ACME", d(2024, 1, 1), d(2024, 3, 1), 1_000.0, 20.0)
        .unwrap();

    assert_eq!(result.bar_count, 43);
    assert_eq!(result.trades.len(), 1);
    assert!(result.open_position.is_none());
    assert!((result.final_cash - 1_170.1).abs() < 1e-9);
    assert_eq!(result.final_portfolio_value, result.final_cash);

    let trade = &result.trades[0];
    assert_eq!(trade.entry_date, d(2024, 2, 22));
    assert_eq!(trade.exit_date, d(2024, 2, 28));
    assert_eq!(trade.size, 9);

    let summary = ProfitSummary::from_result(&result);
    assert!((summary.profit_loss - 170.1).abs() < 1e-9);
    assert_eq!(summary.trade_count, 1);
    assert_eq!(summary.winning_trades, 1);
}

#[test]
fn cash_only_valuation_ignores_open_position() {
    // Window ends before the take-profit bar, so the position stays open.
    let sim = csv_sim(Arc::new(MemoryCache::new()));
    let result = sim
        .run_window("ACME", d(2024, 1, 1), d(2024, 2, 26), 1_000.0, 20.0)
        .unwrap();

    let position = result.open_position.as_ref().expect("position stays open");
    assert_eq!(position.size, 9);
    assert!((result.final_portfolio_value - 95.5).abs() < 1e-9);
    assert_eq!(result.valuation, Valuation::CashOnly);
}

#[test]
fn mark_to_market_valuation_includes_open_position() {
    let sim = csv_sim(Arc::new(MemoryCache::new())).with_valuation(Valuation::MarkToMarket);
    let result = sim
        .run_window("ACME", d(2024, 1, 1), d(2024, 2, 26), 1_000.0, 20.0)
        .unwrap();

    // Last bar in the window is 2024-02-23 at 101.
    assert_eq!(result.last_close, 101.0);
    assert!((result.final_portfolio_value - (95.5 + 9.0 * 101.0)).abs() < 1e-9);
    assert!((result.final_cash - 95.5).abs() < 1e-9);
}

#[test]
fn config_drives_sizing() {
    let config = SimulationConfig::from_toml_str("[simulation]\nsizing = \"cash_only\"\n").unwrap();
    let sim = Simulation::from_config(
        &config,
        CsvProvider::new(fixture_dir()),
        Arc::new(MemoryCache::new()),
    )
    .unwrap();
    let result = sim
        .run_window("ACME", d(2024, 1, 1), d(2024, 3, 1), 1_000.0, 20.0)
        .unwrap();

    let kinds: Vec<DecisionKind> = result.decision_log.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![DecisionKind::BuyCreated, DecisionKind::OrderRejected]);
    assert_eq!(result.final_portfolio_value, 1_000.0);
}

#[test]
fn file_cache_is_populated_and_reused() {
    let dir = TempDir::new().unwrap();
    let cache = Arc::new(FileCache::new(dir.path()));
    let sim = csv_sim(cache.clone());

    let first = sim
        .run_window("ACME", d(2024, 1, 1), d(2024, 3, 1), 1_000.0, 20.0)
        .unwrap();
    assert_eq!(cache.len(), 1);
    let second = sim
        .run_window("ACME", d(2024, 1, 1), d(2024, 3, 1), 1_000.0, 20.0)
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn decision_log_export() {
    let dir = TempDir::new().unwrap();
    let sim = csv_sim(Arc::new(MemoryCache::new()));
    let result = sim
        .run_window("ACME", d(2024, 1, 1), d(2024, 3, 1), 1_000.0, 20.0)
        .unwrap();

    let path = dir.path().join("ACME_log.csv");
    write_decision_log_csv(&path, &result.decision_log).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 1 + result.decision_log.len());
    assert!(lines[1].starts_with("2024-02-22,buy_created"));
    assert!(lines.last().unwrap().contains("OPERATION PROFIT, GROSS 180.00, NET 170.10"));
}

// ── Batch ────────────────────────────────────────────────────────────

/// Serves the same rising series for every symbol except `BAD`, which is
/// empty. Ignores the requested window.
struct SyntheticSource {
    calls: AtomicUsize,
}

impl DataProvider for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(
        &self,
        symbol: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<Vec<RawBar>, DataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if symbol == "BAD" {
            return Ok(vec![]);
        }
        Ok((0..60)
            .map(|i| {
                let close = 10.0 + i as f64;
                RawBar {
                    date: d(2023, 1, 1) + chrono::Duration::days(i),
                    open: close,
                    high: close,
                    low: close,
                    close,
                    volume: 1,
                }
            })
            .collect())
    }
}

#[test]
fn batch_isolates_failures() {
    let sim = Simulation::new(
        SyntheticSource {
            calls: AtomicUsize::new(0),
        },
        Arc::new(MemoryCache::new()),
    );
    let symbols: Vec<String> = ["AAA", "BAD", "CCC"].iter().map(|s| s.to_string()).collect();
    let results = sim.run_batch(&symbols, 1, 500.0, 20.0);

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].0, "AAA");
    assert!(results[0].1.is_ok());
    assert!(matches!(
        results[1].1,
        Err(RunError::Data(DataError::NoData { .. }))
    ));
    assert!(results[2].1.is_ok());
    assert_eq!(sim.market().source().calls.load(Ordering::SeqCst), 3);
}

#[test]
fn batch_rejects_invalid_budget_per_symbol() {
    let sim = Simulation::new(
        SyntheticSource {
            calls: AtomicUsize::new(0),
        },
        Arc::new(MemoryCache::new()),
    );
    let results = sim.run_batch(&["AAA".to_string()], 2, -5.0, 20.0);
    assert!(matches!(results[0].1, Err(RunError::InvalidInput(_))));
    assert_eq!(sim.market().source().calls.load(Ordering::SeqCst), 0);
}
