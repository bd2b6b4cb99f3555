//! Strategy configuration: crossover windows, take-profit, commission, sizing.

use crate::domain::DEFAULT_COMMISSION_RATE;
use crate::indicators::CrossoverWindows;
use serde::{Deserialize, Serialize};

use super::EngineError;

/// How many shares a buy signal turns into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizingPolicy {
    /// `floor(cash / (close * (1 + rate)))`: the largest order the broker
    /// will accept once commission is added.
    #[default]
    CommissionAware,
    /// `floor(cash / close)`. Commission is ignored when sizing, so an
    /// all-in order can be refused for margin.
    CashOnly,
}

impl SizingPolicy {
    pub fn size(&self, cash: f64, close: f64, commission_rate: f64) -> u64 {
        let per_share = match self {
            SizingPolicy::CommissionAware => close * (1.0 + commission_rate),
            SizingPolicy::CashOnly => close,
        };
        if cash <= 0.0 || per_share <= 0.0 {
            return 0;
        }
        (cash / per_share).floor() as u64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub windows: CrossoverWindows,
    /// Percent gain over the entry price that triggers the exit (1..=100).
    pub take_profit_percent: f64,
    pub commission_rate: f64,
    pub sizing: SizingPolicy,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            windows: CrossoverWindows::default(),
            take_profit_percent: 20.0,
            commission_rate: DEFAULT_COMMISSION_RATE,
            sizing: SizingPolicy::default(),
        }
    }
}

impl StrategyConfig {
    pub fn with_take_profit(take_profit_percent: f64) -> Self {
        Self {
            take_profit_percent,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        self.windows.validate().map_err(EngineError::InvalidConfig)?;
        if !(1.0..=100.0).contains(&self.take_profit_percent) {
            return Err(EngineError::InvalidConfig(format!(
                "take_profit_percent must be in 1..=100, got {}",
                self.take_profit_percent
            )));
        }
        if !self.commission_rate.is_finite() || !(0.0..1.0).contains(&self.commission_rate) {
            return Err(EngineError::InvalidConfig(format!(
                "commission_rate must be in [0, 1), got {}",
                self.commission_rate
            )));
        }
        Ok(())
    }
}
