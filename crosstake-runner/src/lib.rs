//! crosstake runner: simulations over cached market data.
//!
//! This crate builds on `crosstake-core` to provide:
//! - Single-symbol and parallel batch simulation runs
//! - TOML configuration with defaults for every field
//! - Ticker universe loading from a folder of CSV lists
//! - Profit summaries, decision-log CSV and result JSON export

pub mod config;
pub mod report;
pub mod simulation;
pub mod tickers;

pub use config::{ConfigError, DataSection, SimulationConfig, SimulationSection, SourceKind};
pub use report::{decision_log_csv, write_decision_log_csv, write_result_json, ProfitSummary};
pub use simulation::{RunError, Simulation, SimulationResult, Valuation, DAYS_PER_YEAR};
pub use tickers::load_tickers_from_dir;

#[cfg(test)]
mod send_sync_checks {
    use super::*;
    use crosstake_core::data::CsvProvider;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn simulation_result_is_send_sync() {
        assert_send::<SimulationResult>();
        assert_sync::<SimulationResult>();
    }

    #[test]
    fn simulation_is_shareable_across_batch_workers() {
        assert_send::<Simulation<CsvProvider>>();
        assert_sync::<Simulation<CsvProvider>>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<SimulationConfig>();
        assert_sync::<SimulationConfig>();
        assert_send::<RunError>();
    }
}
