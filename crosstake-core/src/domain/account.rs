//! Account: broker cash and the proportional commission rate.

use serde::{Deserialize, Serialize};

/// Default commission: 0.5% of traded value, charged on entry and on exit.
pub const DEFAULT_COMMISSION_RATE: f64 = 0.005;

/// Cash balance of one simulation. Mutated only by fills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub cash: f64,
    pub commission_rate: f64,
}

impl Account {
    pub fn new(cash: f64, commission_rate: f64) -> Self {
        Self {
            cash,
            commission_rate,
        }
    }

    /// Commission charged for trading `size` shares at `price`.
    pub fn commission(&self, price: f64, size: u64) -> f64 {
        price * size as f64 * self.commission_rate
    }

    /// Cash needed to buy `size` shares at `price`, commission included.
    pub fn buy_cost(&self, price: f64, size: u64) -> f64 {
        price * size as f64 + self.commission(price, size)
    }

    pub fn can_afford(&self, price: f64, size: u64) -> bool {
        self.buy_cost(price, size) <= self.cash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commission_is_proportional() {
        let account = Account::new(1_000.0, DEFAULT_COMMISSION_RATE);
        assert!((account.commission(100.0, 9) - 4.5).abs() < 1e-12);
        assert!((account.buy_cost(100.0, 9) - 904.5).abs() < 1e-12);
    }

    #[test]
    fn affordability_includes_commission() {
        let account = Account::new(1_000.0, DEFAULT_COMMISSION_RATE);
        assert!(account.can_afford(100.0, 9));
        // 10 * 100 * 1.005 = 1005 > 1000
        assert!(!account.can_afford(100.0, 10));
    }
}
