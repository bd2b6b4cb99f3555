//! Engine state and run outcome types.

use crate::domain::{Account, DecisionLogEntry, Position, TradeRecord};
use serde::{Deserialize, Serialize};

/// Position state of one simulation. Starts `Flat`; an open position is never
/// liquidated at the end of the series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum EngineState {
    #[default]
    Flat,
    Long(Position),
}

impl EngineState {
    pub fn is_flat(&self) -> bool {
        matches!(self, EngineState::Flat)
    }

    pub fn position(&self) -> Option<&Position> {
        match self {
            EngineState::Flat => None,
            EngineState::Long(position) => Some(position),
        }
    }

    pub fn into_position(self) -> Option<Position> {
        match self {
            EngineState::Flat => None,
            EngineState::Long(position) => Some(position),
        }
    }
}

/// Everything a finished engine run hands back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOutcome {
    pub account: Account,
    pub state: EngineState,
    pub decision_log: Vec<DecisionLogEntry>,
    pub trades: Vec<TradeRecord>,
    pub bar_count: usize,
    /// Close of the last bar processed, `None` if no bars were seen.
    pub last_close: Option<f64>,
}

impl EngineOutcome {
    /// Cash plus the open position valued at the last close.
    pub fn marked_value(&self) -> f64 {
        let open_value = match (self.state.position(), self.last_close) {
            (Some(position), Some(close)) => position.market_value(close),
            _ => 0.0,
        };
        self.account.cash + open_value
    }
}
