//! TradeRecord: a completed entry → exit round trip.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    // ── Entry ──
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub entry_commission: f64,

    // ── Exit ──
    pub exit_date: NaiveDate,
    pub exit_price: f64,
    pub exit_commission: f64,

    // ── Size ──
    pub size: u64,

    // ── PnL ──
    /// `(exit_price - entry_price) * size`
    pub gross_pnl: f64,
    /// Gross minus both commissions.
    pub net_pnl: f64,

    pub bars_held: usize,
}

impl TradeRecord {
    /// Net return as a fraction of entry cost.
    pub fn return_pct(&self) -> f64 {
        if self.entry_price == 0.0 || self.size == 0 {
            return 0.0;
        }
        self.net_pnl / (self.entry_price * self.size as f64)
    }

    pub fn is_winner(&self) -> bool {
        self.net_pnl > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_trade() -> TradeRecord {
        TradeRecord {
            entry_date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            entry_price: 100.0,
            entry_commission: 4.5,
            exit_date: NaiveDate::from_ymd_opt(2024, 2, 9).unwrap(),
            exit_price: 120.0,
            exit_commission: 5.4,
            size: 9,
            gross_pnl: 180.0,
            net_pnl: 170.1,
            bars_held: 24,
        }
    }

    #[test]
    fn return_pct_calculation() {
        let trade = sample_trade();
        let expected = 170.1 / 900.0;
        assert!((trade.return_pct() - expected).abs() < 1e-10);
    }

    #[test]
    fn is_winner() {
        assert!(sample_trade().is_winner());
        let mut loser = sample_trade();
        loser.net_pnl = -1.0;
        assert!(!loser.is_winner());
    }
}
