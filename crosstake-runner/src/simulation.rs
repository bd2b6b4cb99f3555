//! Simulation runner: wires market data, the strategy engine, and valuation.
//!
//! Entry points:
//! - `Simulation::run()`: lookback window ending today (local calendar date).
//! - `Simulation::run_window()`: explicit `[start, end)` window.
//! - `Simulation::run_batch()`: many symbols in parallel, one result each.

use chrono::{Duration, Local, NaiveDate};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crosstake_core::data::{CacheStore, DataError, DataProvider, MarketData};
use crosstake_core::domain::{DecisionLogEntry, Position, TradeRecord};
use crosstake_core::engine::{run_strategy, EngineError, StrategyConfig};

use crate::config::{ConfigError, SimulationConfig};

/// Days per year when converting a lookback in years.
pub const DAYS_PER_YEAR: i64 = 365;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// How the final portfolio value is computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Valuation {
    /// Broker cash only; an open position contributes nothing.
    #[default]
    CashOnly,
    /// Cash plus the open position at the last close.
    MarkToMarket,
}

/// Complete result of one simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub starting_cash: f64,
    pub final_portfolio_value: f64,
    pub final_cash: f64,
    pub open_position: Option<Position>,
    pub last_close: f64,
    pub bar_count: usize,
    pub valuation: Valuation,
    pub decision_log: Vec<DecisionLogEntry>,
    pub trades: Vec<TradeRecord>,
}

impl SimulationResult {
    pub fn profit_loss(&self) -> f64 {
        self.final_portfolio_value - self.starting_cash
    }
}

pub struct Simulation<P: DataProvider> {
    market: MarketData<P, dyn CacheStore>,
    strategy: StrategyConfig,
    valuation: Valuation,
}

impl<P: DataProvider> Simulation<P> {
    pub fn new(source: P, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            market: MarketData::new(source, cache),
            strategy: StrategyConfig::default(),
            valuation: Valuation::default(),
        }
    }

    /// Build from a loaded config. The take-profit in the config is the
    /// default; each run call still passes its own.
    pub fn from_config(
        config: &SimulationConfig,
        source: P,
        cache: Arc<dyn CacheStore>,
    ) -> Result<Self, RunError> {
        config.validate()?;
        Ok(Self::new(source, cache)
            .with_strategy(config.strategy())
            .with_valuation(config.simulation.valuation))
    }

    pub fn with_strategy(mut self, strategy: StrategyConfig) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_valuation(mut self, valuation: Valuation) -> Self {
        self.valuation = valuation;
        self
    }

    pub fn strategy(&self) -> &StrategyConfig {
        &self.strategy
    }

    pub fn market(&self) -> &MarketData<P, dyn CacheStore> {
        &self.market
    }

    /// Simulate over `[today - lookback_days, today)`.
    pub fn run(
        &self,
        symbol: &str,
        lookback_days: i64,
        starting_cash: f64,
        take_profit_percent: f64,
    ) -> Result<SimulationResult, RunError> {
        if lookback_days <= 0 {
            return Err(RunError::InvalidInput(format!(
                "lookback_days must be > 0, got {lookback_days}"
            )));
        }
        let end = Local::now().date_naive();
        let start = end - Duration::days(lookback_days);
        self.run_window(symbol, start, end, starting_cash, take_profit_percent)
    }

    /// Simulate over an explicit `[start, end)` window.
    pub fn run_window(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        starting_cash: f64,
        take_profit_percent: f64,
    ) -> Result<SimulationResult, RunError> {
        validate_inputs(symbol, start, end, starting_cash, take_profit_percent)?;

        let strategy = StrategyConfig {
            take_profit_percent,
            ..self.strategy.clone()
        };

        info!(symbol, %start, %end, starting_cash, take_profit_percent, "simulation start");
        let series = self.market.fetch(symbol, start, end)?;
        let outcome = run_strategy(strategy, &series, starting_cash)?;

        let final_portfolio_value = match self.valuation {
            Valuation::CashOnly => outcome.account.cash,
            Valuation::MarkToMarket => outcome.marked_value(),
        };

        let result = SimulationResult {
            symbol: symbol.to_string(),
            start,
            end,
            starting_cash,
            final_portfolio_value,
            final_cash: outcome.account.cash,
            open_position: outcome.state.into_position(),
            last_close: series.last_close(),
            bar_count: outcome.bar_count,
            valuation: self.valuation,
            decision_log: outcome.decision_log,
            trades: outcome.trades,
        };
        info!(
            symbol,
            bars = result.bar_count,
            trades = result.trades.len(),
            final_value = result.final_portfolio_value,
            "simulation finished"
        );
        Ok(result)
    }

    /// Run every symbol independently, in parallel. Results come back in
    /// input order; one symbol's failure never affects another.
    pub fn run_batch(
        &self,
        symbols: &[String],
        lookback_years: u32,
        budget_per_symbol: f64,
        take_profit_percent: f64,
    ) -> Vec<(String, Result<SimulationResult, RunError>)> {
        let lookback_days = i64::from(lookback_years) * DAYS_PER_YEAR;
        symbols
            .par_iter()
            .map(|symbol| {
                let result =
                    self.run(symbol, lookback_days, budget_per_symbol, take_profit_percent);
                if let Err(e) = &result {
                    warn!(symbol = symbol.as_str(), error = %e, "simulation failed");
                }
                (symbol.clone(), result)
            })
            .collect()
    }
}

fn validate_inputs(
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
    starting_cash: f64,
    take_profit_percent: f64,
) -> Result<(), RunError> {
    if symbol.trim().is_empty() {
        return Err(RunError::InvalidInput("symbol must not be empty".into()));
    }
    if start >= end {
        return Err(RunError::InvalidInput(format!(
            "start {start} must be before end {end}"
        )));
    }
    if !starting_cash.is_finite() || starting_cash <= 0.0 {
        return Err(RunError::InvalidInput(format!(
            "starting_cash must be a positive amount, got {starting_cash}"
        )));
    }
    if !(1.0..=100.0).contains(&take_profit_percent) {
        return Err(RunError::InvalidInput(format!(
            "take_profit_percent must be in 1..=100, got {take_profit_percent}"
        )));
    }
    Ok(())
}
