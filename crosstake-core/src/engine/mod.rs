//! Strategy engine: crossover entry, take-profit exit, simulated broker.
//!
//! The engine is a sequential fold over one `BarSeries`. It owns its account,
//! position and pending-order slot; nothing is shared between runs.

pub mod broker;
pub mod config;
pub mod state;
pub mod strategy;

pub use broker::{Resolution, SimBroker};
pub use config::{SizingPolicy, StrategyConfig};
pub use state::{EngineOutcome, EngineState};
pub use strategy::{run_strategy, StrategyEngine};

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("bad bar on {date}: close {close} is not a finite positive price")]
    BadBar { date: NaiveDate, close: f64 },

    #[error("invalid strategy config: {0}")]
    InvalidConfig(String),
}
