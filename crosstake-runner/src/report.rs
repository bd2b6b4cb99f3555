//! Reporting and export: profit summary, decision-log CSV, result JSON.

use std::path::Path;

use anyhow::{Context, Result};
use crosstake_core::domain::DecisionLogEntry;
use serde::{Deserialize, Serialize};

use crate::simulation::SimulationResult;

/// Profit or loss of one run against its budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitSummary {
    pub symbol: String,
    pub budget: f64,
    pub final_value: f64,
    pub profit_loss: f64,
    pub profit_loss_pct: f64,
    pub trade_count: usize,
    pub winning_trades: usize,
}

impl ProfitSummary {
    pub fn from_result(result: &SimulationResult) -> Self {
        let profit_loss = result.profit_loss();
        Self {
            symbol: result.symbol.clone(),
            budget: result.starting_cash,
            final_value: result.final_portfolio_value,
            profit_loss,
            profit_loss_pct: profit_loss / result.starting_cash * 100.0,
            trade_count: result.trades.len(),
            winning_trades: result.trades.iter().filter(|t| t.is_winner()).count(),
        }
    }
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Render a decision log as CSV with `Date,Kind,Log` columns.
pub fn decision_log_csv(log: &[DecisionLogEntry]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["Date", "Kind", "Log"])?;
    for entry in log {
        wtr.write_record([
            entry.date.format("%Y-%m-%d").to_string().as_str(),
            entry.kind.as_str(),
            entry.message.as_str(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

pub fn write_decision_log_csv(path: &Path, log: &[DecisionLogEntry]) -> Result<()> {
    let csv = decision_log_csv(log)?;
    std::fs::write(path, csv)
        .with_context(|| format!("failed to write decision log: {}", path.display()))
}

// ─── JSON export ────────────────────────────────────────────────────

pub fn write_result_json(path: &Path, result: &SimulationResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result)
        .context("failed to serialize SimulationResult to JSON")?;
    std::fs::write(path, json).with_context(|| format!("failed to write result: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::Valuation;
    use chrono::NaiveDate;
    use crosstake_core::domain::OrderSide;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 22).unwrap()
    }

    fn result(final_value: f64) -> SimulationResult {
        SimulationResult {
            symbol: "ACME".into(),
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            starting_cash: 1_000.0,
            final_portfolio_value: final_value,
            final_cash: final_value,
            open_position: None,
            last_close: 120.0,
            bar_count: 43,
            valuation: Valuation::CashOnly,
            decision_log: vec![DecisionLogEntry::order_created(date(), OrderSide::Buy, 100.0)],
            trades: vec![],
        }
    }

    #[test]
    fn profit_summary_math() {
        let summary = ProfitSummary::from_result(&result(1_170.1));
        assert!((summary.profit_loss - 170.1).abs() < 1e-9);
        assert!((summary.profit_loss_pct - 17.01).abs() < 1e-9);

        assert_eq!(summary.trade_count, 0);

        let loss = ProfitSummary::from_result(&result(900.0));
        assert_eq!(loss.profit_loss, -100.0);
        assert_eq!(loss.profit_loss_pct, -10.0);
    }

    #[test]
    fn decision_log_csv_layout() {
        let csv = decision_log_csv(&result(1_000.0).decision_log).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("Date,Kind,Log"));
        assert_eq!(lines.next(), Some("2024-02-22,buy_created,\"BUY CREATE, 100.00\""));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn writes_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let res = result(1_000.0);

        let log_path = dir.path().join("log.csv");
        write_decision_log_csv(&log_path, &res.decision_log).unwrap();
        assert!(std::fs::read_to_string(&log_path).unwrap().starts_with("Date,Kind,Log"));

        let json_path = dir.path().join("result.json");
        write_result_json(&json_path, &res).unwrap();
        let back: SimulationResult =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(back, res);
    }
}
