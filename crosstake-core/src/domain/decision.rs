//! Decision log: the dated record of everything the strategy did.

use super::order::{Execution, OrderSide, RejectReason};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionKind {
    BuyCreated,
    BuyExecuted,
    SellCreated,
    SellExecuted,
    TradeClosed,
    OrderRejected,
}

impl DecisionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionKind::BuyCreated => "buy_created",
            DecisionKind::BuyExecuted => "buy_executed",
            DecisionKind::SellCreated => "sell_created",
            DecisionKind::SellExecuted => "sell_executed",
            DecisionKind::TradeClosed => "trade_closed",
            DecisionKind::OrderRejected => "order_rejected",
        }
    }
}

/// One line of the decision log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionLogEntry {
    pub date: NaiveDate,
    pub kind: DecisionKind,
    pub message: String,
}

impl DecisionLogEntry {
    pub fn order_created(date: NaiveDate, side: OrderSide, price: f64) -> Self {
        let (kind, label) = match side {
            OrderSide::Buy => (DecisionKind::BuyCreated, "BUY"),
            OrderSide::Sell => (DecisionKind::SellCreated, "SELL"),
        };
        Self {
            date,
            kind,
            message: format!("{label} CREATE, {price:.2}"),
        }
    }

    pub fn executed(exec: &Execution) -> Self {
        let (kind, label) = match exec.side {
            OrderSide::Buy => (DecisionKind::BuyExecuted, "BUY"),
            OrderSide::Sell => (DecisionKind::SellExecuted, "SELL"),
        };
        Self {
            date: exec.date,
            kind,
            message: format!(
                "{label} EXECUTED, Share: {:.2}, Price: {:.2}, Cost: {:.2}, Comm {:.2}",
                exec.size as f64, exec.price, exec.value, exec.commission
            ),
        }
    }

    pub fn trade_closed(date: NaiveDate, gross_pnl: f64, net_pnl: f64) -> Self {
        Self {
            date,
            kind: DecisionKind::TradeClosed,
            message: format!("OPERATION PROFIT, GROSS {gross_pnl:.2}, NET {net_pnl:.2}"),
        }
    }

    pub fn rejected(date: NaiveDate, reason: RejectReason) -> Self {
        let detail = match reason {
            RejectReason::Margin => "margin",
            RejectReason::Rejected => "rejected",
        };
        Self {
            date,
            kind: DecisionKind::OrderRejected,
            message: format!("Order Canceled/Margin/Rejected ({detail})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn created_message() {
        let entry = DecisionLogEntry::order_created(date(), OrderSide::Buy, 100.0);
        assert_eq!(entry.kind, DecisionKind::BuyCreated);
        assert_eq!(entry.message, "BUY CREATE, 100.00");
    }

    #[test]
    fn executed_message() {
        let exec = Execution {
            side: OrderSide::Buy,
            date: date(),
            size: 9,
            price: 100.0,
            value: 900.0,
            commission: 4.5,
        };
        let entry = DecisionLogEntry::executed(&exec);
        assert_eq!(entry.kind, DecisionKind::BuyExecuted);
        assert_eq!(
            entry.message,
            "BUY EXECUTED, Share: 9.00, Price: 100.00, Cost: 900.00, Comm 4.50"
        );
    }

    #[test]
    fn trade_closed_message() {
        let entry = DecisionLogEntry::trade_closed(date(), 180.0, 170.1);
        assert_eq!(entry.message, "OPERATION PROFIT, GROSS 180.00, NET 170.10");
    }

    #[test]
    fn rejected_message() {
        let entry = DecisionLogEntry::rejected(date(), RejectReason::Margin);
        assert_eq!(entry.kind, DecisionKind::OrderRejected);
        assert!(entry.message.starts_with("Order Canceled/Margin/Rejected"));
    }
}
