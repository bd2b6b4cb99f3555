//! Simulated broker: fills the pending order at the close of the bar that
//! created it.
//!
//! Commission is proportional (`price * size * rate`) on both legs. A buy
//! whose cost plus commission exceeds cash is refused for margin; nothing
//! else about the account changes in that case.

use crate::domain::{
    Account, Execution, OrderSide, PendingOrder, Position, RejectReason, TradeRecord,
};
use chrono::NaiveDate;

/// Result of resolving one order against the account.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Opened {
        execution: Execution,
        position: Position,
    },
    Closed {
        execution: Execution,
        trade: TradeRecord,
    },
    Rejected(RejectReason),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SimBroker;

impl SimBroker {
    /// Fill `order` at `price` on its creation date, mutating `account` on
    /// success.
    pub fn resolve(
        &self,
        order: &PendingOrder,
        price: f64,
        account: &mut Account,
        position: Option<&Position>,
    ) -> Resolution {
        if order.size == 0 {
            return Resolution::Rejected(RejectReason::Rejected);
        }
        let date = order.created;
        match order.side {
            OrderSide::Buy => self.buy(order.size, date, price, account),
            OrderSide::Sell => match position {
                Some(position) if position.size >= order.size => {
                    self.sell(order.size, date, price, account, position)
                }
                _ => Resolution::Rejected(RejectReason::Rejected),
            },
        }
    }

    fn buy(&self, size: u64, date: NaiveDate, price: f64, account: &mut Account) -> Resolution {
        if !account.can_afford(price, size) {
            return Resolution::Rejected(RejectReason::Margin);
        }
        let value = price * size as f64;
        let commission = account.commission(price, size);
        account.cash -= value + commission;

        Resolution::Opened {
            execution: Execution {
                side: OrderSide::Buy,
                date,
                size,
                price,
                value,
                commission,
            },
            position: Position::open(size, price, commission, date),
        }
    }

    fn sell(
        &self,
        size: u64,
        date: NaiveDate,
        price: f64,
        account: &mut Account,
        position: &Position,
    ) -> Resolution {
        let proceeds = price * size as f64;
        let commission = account.commission(price, size);
        account.cash += proceeds - commission;

        let gross_pnl = (price - position.entry_price) * size as f64;
        let net_pnl = gross_pnl - position.entry_commission - commission;

        Resolution::Closed {
            execution: Execution {
                side: OrderSide::Sell,
                date,
                size,
                price,
                value: position.entry_price * size as f64,
                commission,
            },
            trade: TradeRecord {
                entry_date: position.entry_date,
                entry_price: position.entry_price,
                entry_commission: position.entry_commission,
                exit_date: date,
                exit_price: price,
                exit_commission: commission,
                size,
                gross_pnl,
                net_pnl,
                bars_held: position.bars_held,
            },
        }
    }
}
