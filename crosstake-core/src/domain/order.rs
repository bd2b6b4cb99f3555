//! Order side, the single pending-order slot, and order outcomes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

/// The one order a simulation may have in flight.
///
/// Created when the strategy decides to act, cleared once the simulated broker
/// resolves it (filled or rejected).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingOrder {
    pub side: OrderSide,
    pub size: u64,
    pub created: NaiveDate,
}

impl PendingOrder {
    pub fn buy(size: u64, created: NaiveDate) -> Self {
        Self {
            side: OrderSide::Buy,
            size,
            created,
        }
    }

    pub fn sell(size: u64, created: NaiveDate) -> Self {
        Self {
            side: OrderSide::Sell,
            size,
            created,
        }
    }
}

/// Execution details of a completed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub side: OrderSide,
    pub date: NaiveDate,
    pub size: u64,
    pub price: f64,
    /// Cost basis of the shares moved: `price * size` for a buy, entry price
    /// times size for a sell.
    pub value: f64,
    pub commission: f64,
}

/// Why the broker refused an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// Cost plus commission exceeds available cash.
    Margin,
    /// Sell without an open position, or a zero-size order.
    Rejected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_side() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(PendingOrder::buy(5, date).side, OrderSide::Buy);
        assert_eq!(PendingOrder::sell(5, date).side, OrderSide::Sell);
        assert_eq!(PendingOrder::sell(5, date).size, 5);
    }
}
