//! Bar-by-bar strategy state machine.
//!
//! Per bar, in date order:
//! 1. Reject a non-finite or non-positive close (the run aborts).
//! 2. Push the close through the crossover tracker. The fast/mid difference
//!    is tracked as soon as both averages exist; signals start once the slow
//!    window is full.
//! 3. With no order in flight: when flat, a `Down` cross creates a buy sized
//!    by the sizing policy; when long, a close at or above the take-profit
//!    price creates a sell for the whole position.
//! 4. The broker resolves the order at this same bar's close and the slot is
//!    cleared.

use crate::domain::{Account, Bar, BarSeries, DecisionLogEntry, PendingOrder, TradeRecord};
use crate::indicators::{CrossoverTracker, Signal};
use tracing::debug;

use super::broker::{Resolution, SimBroker};
use super::config::StrategyConfig;
use super::state::{EngineOutcome, EngineState};
use super::EngineError;

pub struct StrategyEngine {
    config: StrategyConfig,
    tracker: CrossoverTracker,
    broker: SimBroker,
    account: Account,
    state: EngineState,
    pending: Option<PendingOrder>,
    decision_log: Vec<DecisionLogEntry>,
    trades: Vec<TradeRecord>,
    bar_count: usize,
    last_close: Option<f64>,
}

impl StrategyEngine {
    pub fn new(config: StrategyConfig, starting_cash: f64) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            tracker: CrossoverTracker::new(config.windows),
            broker: SimBroker,
            account: Account::new(starting_cash, config.commission_rate),
            state: EngineState::Flat,
            pending: None,
            decision_log: Vec::new(),
            trades: Vec::new(),
            bar_count: 0,
            last_close: None,
            config,
        })
    }

    pub fn on_bar(&mut self, bar: &Bar) -> Result<(), EngineError> {
        if !bar.has_tradable_close() {
            return Err(EngineError::BadBar {
                date: bar.date,
                close: bar.close,
            });
        }
        self.bar_count += 1;
        self.last_close = Some(bar.close);

        if let EngineState::Long(position) = &mut self.state {
            position.bars_held += 1;
        }

        let signal = self.tracker.update(bar.close);

        if self.pending.is_none() {
            self.pending = self.decide(bar, signal);
        }

        if let Some(order) = self.pending.take() {
            self.settle(&order, bar.close);
        }
        Ok(())
    }

    fn decide(&mut self, bar: &Bar, signal: Signal) -> Option<PendingOrder> {
        match &self.state {
            EngineState::Flat => {
                if signal != Signal::Down {
                    return None;
                }
                let size = self.config.sizing.size(
                    self.account.cash,
                    bar.close,
                    self.config.commission_rate,
                );
                if size == 0 {
                    debug!(date = %bar.date, cash = self.account.cash, "buy signal skipped, size is zero");
                    return None;
                }
                if let Some(avg) = self.tracker.averages() {
                    debug!(
                        date = %bar.date,
                        fast = avg.fast,
                        mid = avg.mid,
                        slow = avg.slow,
                        "down cross"
                    );
                }
                let order = PendingOrder::buy(size, bar.date);
                self.log(DecisionLogEntry::order_created(bar.date, order.side, bar.close));
                Some(order)
            }
            EngineState::Long(position) => {
                let target = position.take_profit_price(self.config.take_profit_percent);
                if bar.close < target {
                    return None;
                }
                let order = PendingOrder::sell(position.size, bar.date);
                self.log(DecisionLogEntry::order_created(bar.date, order.side, bar.close));
                Some(order)
            }
        }
    }

    fn settle(&mut self, order: &PendingOrder, price: f64) {
        let date = order.created;
        let resolution =
            self.broker
                .resolve(order, price, &mut self.account, self.state.position());

        match resolution {
            Resolution::Opened { execution, position } => {
                self.log(DecisionLogEntry::executed(&execution));
                self.state = EngineState::Long(position);
            }
            Resolution::Closed { execution, trade } => {
                self.log(DecisionLogEntry::executed(&execution));
                self.log(DecisionLogEntry::trade_closed(date, trade.gross_pnl, trade.net_pnl));
                self.trades.push(trade);
                self.state = EngineState::Flat;
            }
            Resolution::Rejected(reason) => {
                self.log(DecisionLogEntry::rejected(date, reason));
            }
        }
    }

    fn log(&mut self, entry: DecisionLogEntry) {
        debug!(date = %entry.date, kind = entry.kind.as_str(), "{}", entry.message);
        self.decision_log.push(entry);
    }

    // ── Accessors ──

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn pending(&self) -> Option<&PendingOrder> {
        self.pending.as_ref()
    }

    pub fn decision_log(&self) -> &[DecisionLogEntry] {
        &self.decision_log
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    pub fn finish(self) -> EngineOutcome {
        EngineOutcome {
            account: self.account,
            state: self.state,
            decision_log: self.decision_log,
            trades: self.trades,
            bar_count: self.bar_count,
            last_close: self.last_close,
        }
    }
}

/// Run the strategy over every bar of `series`.
pub fn run_strategy(
    config: StrategyConfig,
    series: &BarSeries,
    starting_cash: f64,
) -> Result<EngineOutcome, EngineError> {
    let warmup = config.windows.warmup_bars();
    if series.len() <= warmup {
        debug!(
            symbol = series.symbol(),
            bars = series.len(),
            warmup,
            "series too short for a crossover signal"
        );
    }
    let mut engine = StrategyEngine::new(config, starting_cash)?;
    for bar in series {
        engine.on_bar(bar)?;
    }
    Ok(engine.finish())
}
