//! crosstake CLI: moving-average crossover simulations from the command line.
//!
//! Commands:
//! - `run`: simulate symbols (or a folder of ticker lists) over a lookback
//!   window ending today, optionally exporting decision logs and results
//! - `fetch`: load bars for a window through the cache
//! - `cache-key`: show the cache key and entry path for a window

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use crosstake_core::data::{
    CacheKey, CacheStore, CsvProvider, DataProvider, FileCache, MarketData, YahooProvider,
};
use crosstake_runner::{
    load_tickers_from_dir, write_decision_log_csv, write_result_json, DataSection,
    ProfitSummary, Simulation, SimulationConfig, SimulationResult, SourceKind, Valuation,
};

const LOG_ENV: &str = "CROSSTAKE_LOG";

#[derive(Parser)]
#[command(
    name = "crosstake",
    about = "Moving-average crossover with take-profit, simulated per symbol"
)]
struct Cli {
    /// Log filter used when CROSSTAKE_LOG is unset (e.g. "info", "crosstake_core=debug")
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// TOML config file; every field is optional
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum SourceArg {
    Yahoo,
    Csv,
}

impl From<SourceArg> for SourceKind {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Yahoo => SourceKind::Yahoo,
            SourceArg::Csv => SourceKind::Csv,
        }
    }
}

/// Flags that override the `[data]` section of the config.
#[derive(clap::Args, Debug, Default)]
struct DataArgs {
    /// Cache directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Where bars come from on a cache miss
    #[arg(long, value_enum)]
    source: Option<SourceArg>,

    /// Folder of `{SYMBOL}.csv` files for the csv source
    #[arg(long)]
    csv_dir: Option<PathBuf>,
}

impl DataArgs {
    fn apply(&self, data: &mut DataSection) {
        if let Some(dir) = &self.cache_dir {
            data.cache_dir = dir.clone();
        }
        if let Some(source) = self.source {
            data.source = source.into();
        }
        if let Some(dir) = &self.csv_dir {
            data.csv_dir = dir.clone();
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate one or more symbols over a lookback window ending today
    Run {
        /// Symbols to simulate
        symbols: Vec<String>,

        /// Also simulate every ticker listed in the CSV files of this folder
        #[arg(long)]
        tickers_dir: Option<PathBuf>,

        /// Lookback in years (365 days each)
        #[arg(long, default_value_t = 1)]
        years: u32,

        /// Starting cash per symbol
        #[arg(long, default_value_t = 1000.0)]
        budget: f64,

        /// Take-profit percent, 1..=100 (config value if omitted)
        #[arg(long)]
        take_profit: Option<f64>,

        /// Value open positions at the last close instead of ignoring them
        #[arg(long)]
        mark_to_market: bool,

        /// Write `{SYMBOL}_log.csv` and `{SYMBOL}_result.json` here
        #[arg(long)]
        output_dir: Option<PathBuf>,

        #[command(flatten)]
        data: DataArgs,
    },
    /// Fetch bars through the cache and report what was stored
    Fetch {
        symbol: String,

        /// First date, inclusive (YYYY-MM-DD)
        start: String,

        /// Last date, exclusive (YYYY-MM-DD)
        end: String,

        #[command(flatten)]
        data: DataArgs,
    },
    /// Print the cache key and entry path for a request
    CacheKey {
        symbol: String,
        start: String,
        end: String,

        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_format)?;

    let mut config = match &cli.config {
        Some(path) => SimulationConfig::from_file(path)?,
        None => SimulationConfig::default(),
    };

    match cli.command {
        Commands::Run {
            symbols,
            tickers_dir,
            years,
            budget,
            take_profit,
            mark_to_market,
            output_dir,
            data,
        } => {
            data.apply(&mut config.data);
            if mark_to_market {
                config.simulation.valuation = Valuation::MarkToMarket;
            }
            let symbols = collect_symbols(symbols, tickers_dir.as_deref())?;
            let take_profit = take_profit.unwrap_or(config.simulation.take_profit_percent);
            let failed = run_simulations(
                &config,
                &symbols,
                years,
                budget,
                take_profit,
                output_dir.as_deref(),
            )?;
            if failed > 0 {
                eprintln!("{failed} of {} symbols failed", symbols.len());
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Fetch {
            symbol,
            start,
            end,
            data,
        } => {
            data.apply(&mut config.data);
            run_fetch(&config.data, &symbol, parse_date(&start)?, parse_date(&end)?)
        }
        Commands::CacheKey {
            symbol,
            start,
            end,
            cache_dir,
        } => {
            let cache = FileCache::new(cache_dir.unwrap_or(config.data.cache_dir));
            let key = CacheKey::new(&symbol, parse_date(&start)?, parse_date(&end)?);
            println!("{}", key.digest());
            println!("{}", cache.entry_path(&key).display());
            Ok(())
        }
    }
}

/// Install the global subscriber. `CROSSTAKE_LOG` wins over `--log-level`.
fn init_tracing(log_level: &str, format: LogFormat) -> Result<()> {
    let directive = std::env::var(LOG_ENV).unwrap_or_else(|_| log_level.to_string());
    let filter = EnvFilter::try_new(&directive)
        .with_context(|| format!("invalid log filter '{directive}'"))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
    Ok(())
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{s}', expected YYYY-MM-DD"))
}

fn collect_symbols(mut symbols: Vec<String>, tickers_dir: Option<&Path>) -> Result<Vec<String>> {
    if let Some(dir) = tickers_dir {
        symbols.extend(load_tickers_from_dir(dir)?);
    }
    let mut seen = std::collections::HashSet::new();
    symbols.retain(|s| seen.insert(s.clone()));
    if symbols.is_empty() {
        bail!("no symbols given; pass symbols or --tickers-dir");
    }
    Ok(symbols)
}

fn build_source(data: &DataSection) -> Result<Box<dyn DataProvider>> {
    Ok(match data.source {
        SourceKind::Yahoo => Box::new(YahooProvider::new(Duration::from_secs(data.timeout_secs))?),
        SourceKind::Csv => Box::new(CsvProvider::new(&data.csv_dir)),
    })
}

/// Runs every symbol and prints one summary line each. Returns the number of
/// symbols that failed.
fn run_simulations(
    config: &SimulationConfig,
    symbols: &[String],
    years: u32,
    budget: f64,
    take_profit: f64,
    output_dir: Option<&Path>,
) -> Result<usize> {
    let cache: Arc<dyn CacheStore> = Arc::new(FileCache::new(&config.data.cache_dir));
    let sim = Simulation::from_config(config, build_source(&config.data)?, cache)?;

    if let Some(dir) = output_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output dir: {}", dir.display()))?;
    }

    let mut failed = 0;
    let mut rows = Vec::new();
    for (symbol, outcome) in sim.run_batch(symbols, years, budget, take_profit) {
        match outcome {
            Ok(result) => {
                print_result(&result);
                if let Some(dir) = output_dir {
                    if let Err(e) = save_outputs(dir, &result) {
                        eprintln!("Error writing outputs for {symbol}: {e:#}");
                        failed += 1;
                    }
                }
                rows.push(ProfitSummary::from_result(&result));
            }
            Err(e) => {
                eprintln!("Error for {symbol}: {e}");
                failed += 1;
            }
        }
    }

    if rows.len() > 1 {
        println!();
        println!("{:<10} {:>14} {:>12} {:>9}", "Symbol", "Final value", "P/L", "P/L %");
        println!("{}", "-".repeat(48));
        for row in &rows {
            println!(
                "{:<10} {:>14.2} {:>12.2} {:>8.2}%",
                row.symbol, row.final_value, row.profit_loss, row.profit_loss_pct
            );
        }
    }
    Ok(failed)
}

fn print_result(result: &SimulationResult) {
    let summary = ProfitSummary::from_result(result);
    println!("== {} ({} to {}) ==", result.symbol, result.start, result.end);
    println!("Starting Portfolio Value: {:.2}", result.starting_cash);
    for entry in &result.decision_log {
        println!("  {}, {}", entry.date, entry.message);
    }
    for trade in &result.trades {
        println!(
            "  trade: {} -> {}, {} shares, net {:.2} ({:.2}%)",
            trade.entry_date,
            trade.exit_date,
            trade.size,
            trade.net_pnl,
            trade.return_pct() * 100.0
        );
    }
    if let Some(position) = &result.open_position {
        println!(
            "  open position: {} shares @ {:.2} since {}",
            position.size, position.entry_price, position.entry_date
        );
    }
    println!(
        "Final Portfolio Value: {:.2}  Profit/Loss: {:.2} ({:.2}%)  Trades: {} ({} winning)",
        summary.final_value,
        summary.profit_loss,
        summary.profit_loss_pct,
        summary.trade_count,
        summary.winning_trades
    );
}

fn save_outputs(dir: &Path, result: &SimulationResult) -> Result<()> {
    let stem = file_stem(&result.symbol);
    write_decision_log_csv(&dir.join(format!("{stem}_log.csv")), &result.decision_log)?;
    write_result_json(&dir.join(format!("{stem}_result.json")), result)
}

/// Symbol as a single path component: anything outside `[A-Za-z0-9._-]`
/// becomes `_` (`BRK/B` -> `BRK_B`).
fn file_stem(symbol: &str) -> String {
    let stem: String = symbol
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    match stem.trim_matches('.') {
        "" => "_".to_string(),
        _ => stem,
    }
}

fn run_fetch(data: &DataSection, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<()> {
    let cache = Arc::new(FileCache::new(&data.cache_dir));
    let market = MarketData::new(build_source(data)?, cache.clone());
    let series = market
        .fetch(symbol, start, end)
        .with_context(|| format!("fetching {symbol}"))?;

    let key = CacheKey::new(symbol, start, end);
    println!(
        "{symbol}: {} bars from {} to {} via {}",
        series.len(),
        series.first_date(),
        series.last_date(),
        market.source().name()
    );
    println!("cached at {}", cache.entry_path(&key).display());
    Ok(())
}
