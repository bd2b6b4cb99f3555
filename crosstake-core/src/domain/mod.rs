//! Domain types for crosstake

pub mod account;
pub mod bar;
pub mod decision;
pub mod order;
pub mod position;
pub mod trade;

pub use account::{Account, DEFAULT_COMMISSION_RATE};
pub use bar::{Bar, BarError, BarSeries};
pub use decision::{DecisionKind, DecisionLogEntry};
pub use order::{Execution, OrderSide, PendingOrder, RejectReason};
pub use position::Position;
pub use trade::TradeRecord;
