use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An open long position. Only exists while `size > 0`; a full exit drops it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub size: u64,
    pub entry_price: f64,
    pub entry_commission: f64,
    pub entry_date: NaiveDate,
    /// Bars seen since entry, the entry bar excluded.
    pub bars_held: usize,
}

impl Position {
    pub fn open(size: u64, entry_price: f64, entry_commission: f64, entry_date: NaiveDate) -> Self {
        Self {
            size,
            entry_price,
            entry_commission,
            entry_date,
            bars_held: 0,
        }
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.size as f64 * price
    }

    /// Price at or above which the take-profit exit fires.
    pub fn take_profit_price(&self, take_profit_percent: f64) -> f64 {
        self.entry_price * (1.0 + take_profit_percent / 100.0)
    }
}
