//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvDataAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::config_validation::{
    STRATEGY_SMA_CROSSOVER, STRATEGY_WEINSTEIN, initial_capital, liquidate_at_end, parse_date,
    parse_positive_int, risk_free_rate, strategy_type, validate_backtest_config,
    validate_strategy_config,
};
use crate::domain::error::BacktestError;
use crate::domain::metrics::MetricsBundle;
use crate::domain::risk_reward;
use crate::domain::signal::{CrossoverKind, crossovers};
use crate::domain::strategy::{
    DEFAULT_BARS_PER_WEEK, DEFAULT_MA_WEEKS, DEFAULT_SLOPE_LAG, Strategy,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::MarketDataPort;
use crate::ports::report_port::ReportPort;

/// Rows shown in the recent signals table.
const RECENT_SIGNAL_ROWS: usize = 10;

#[derive(Parser, Debug)]
#[command(
    name = "stagetrader",
    about = "Moving-average crossover and Weinstein stage backtester"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest against buy-and-hold
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        /// Directory for CSV reports
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Annualized return, volatility and Sharpe ratio per symbol
    RiskReward {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated symbols, overriding the config
        #[arg(long)]
        symbols: Option<String>,
        /// Every symbol with a CSV file in the data directory
        #[arg(long, conflicts_with = "symbols")]
        all: bool,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            symbol,
            output,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config, symbol.as_deref())
            } else {
                run_backtest(&config, symbol.as_deref(), output.as_deref())
            }
        }
        Command::Validate { config } => run_validate(&config),
        Command::RiskReward {
            config,
            symbols,
            all,
        } => run_risk_reward(&config, symbols.as_deref(), all),
    }
}

fn fail(err: BacktestError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(fail)
}

fn load_validated(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    eprintln!("Loading config from {}", path.display());
    let adapter = load_config(path)?;
    validate_backtest_config(&adapter).map_err(fail)?;
    validate_strategy_config(&adapter).map_err(fail)?;
    Ok(adapter)
}

fn run_backtest(config_path: &Path, symbol: Option<&str>, output: Option<&Path>) -> ExitCode {
    let adapter = match load_validated(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let (start_date, end_date) = match resolve_date_range(&adapter) {
        Ok(range) => range,
        Err(e) => return fail(e),
    };
    let symbols = resolve_symbols(symbol, &adapter);
    if symbols.is_empty() {
        eprintln!("error: no symbols configured");
        return ExitCode::from(2);
    }

    let data_port = CsvDataAdapter::new(data_dir(&adapter));
    eprintln!("Strategy: {}", bt_config.strategy);

    let mut exit = ExitCode::SUCCESS;
    let mut failed = false;
    for sym in &symbols {
        let result = data_port
            .get_price_series(sym, start_date, end_date)
            .and_then(|series| backtest_engine::run_backtest(&series, &bt_config));

        match result {
            Ok(result) => {
                print_summary(&result);
                if let Some(dir) = output {
                    if let Err(e) = CsvReportAdapter::new().write(&result, dir) {
                        eprintln!("error: failed to write report for {sym}: {e}");
                        if !failed {
                            exit = (&e).into();
                            failed = true;
                        }
                    }
                }
            }
            Err(e) => {
                eprintln!("error: {sym}: {e}");
                if !failed {
                    exit = (&e).into();
                    failed = true;
                }
            }
        }
    }

    if let Some(dir) = output {
        if !failed {
            eprintln!("\nReports written to: {}", dir.display());
        }
    }
    exit
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, BacktestError> {
    Ok(BacktestConfig {
        strategy: build_strategy(adapter)?,
        initial_capital: initial_capital(adapter)?,
        risk_free_rate: risk_free_rate(adapter)?,
        periods_per_year: periods_per_year(adapter)?,
        liquidate_at_end: liquidate_at_end(adapter)?,
    })
}

fn window(
    adapter: &dyn ConfigPort,
    key: &str,
    default: Option<usize>,
) -> Result<usize, BacktestError> {
    match adapter.get_string("strategy", key) {
        Some(raw) => parse_positive_int(&raw, key),
        None => default.ok_or_else(|| BacktestError::ConfigMissing {
            section: "strategy".into(),
            key: key.into(),
        }),
    }
}

pub fn build_strategy(adapter: &dyn ConfigPort) -> Result<Strategy, BacktestError> {
    let kind = strategy_type(adapter)?;
    let strategy = match kind.as_str() {
        STRATEGY_SMA_CROSSOVER => Strategy::SmaCrossover {
            short_window: window(adapter, "short_window", None)?,
            long_window: window(adapter, "long_window", None)?,
        },
        STRATEGY_WEINSTEIN => Strategy::Weinstein {
            ma_window: window(adapter, "ma_window", Some(DEFAULT_MA_WEEKS))?,
            slope_lag: window(adapter, "slope_lag", Some(DEFAULT_SLOPE_LAG))?,
            bars_per_week: window(adapter, "bars_per_week", Some(DEFAULT_BARS_PER_WEEK))?,
        },
        other => {
            return Err(BacktestError::ConfigInvalid {
                section: "strategy".into(),
                key: "type".into(),
                reason: format!("unknown strategy '{}'", other),
            });
        }
    };
    strategy.validate()?;
    Ok(strategy)
}

pub fn resolve_date_range(adapter: &dyn ConfigPort) -> Result<(NaiveDate, NaiveDate), BacktestError> {
    let start = parse_date(
        adapter.get_string("backtest", "start_date").as_deref(),
        "start_date",
    )?;
    let end = parse_date(
        adapter.get_string("backtest", "end_date").as_deref(),
        "end_date",
    )?;
    Ok((start, end))
}

fn data_dir(adapter: &dyn ConfigPort) -> PathBuf {
    PathBuf::from(
        adapter
            .get_string("backtest", "data_dir")
            .unwrap_or_else(|| ".".to_string())
            .trim(),
    )
}

fn split_symbols(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn resolve_symbols(symbol_override: Option<&str>, config: &dyn ConfigPort) -> Vec<String> {
    if let Some(s) = symbol_override {
        return split_symbols(s);
    }

    if let Some(list) = config.get_string("backtest", "symbols") {
        let symbols = split_symbols(&list);
        if !symbols.is_empty() {
            return symbols;
        }
    }

    config
        .get_string("backtest", "symbol")
        .map(|s| split_symbols(&s))
        .unwrap_or_default()
}

fn format_win_rate(m: &MetricsBundle) -> String {
    match m.win_rate {
        Some(w) => format!("{:.1}%", w * 100.0),
        None => "n/a".to_string(),
    }
}

fn format_sharpe(m: &MetricsBundle) -> String {
    if m.sharpe_degenerate {
        format!("{:.2} (degenerate)", m.sharpe_ratio)
    } else {
        format!("{:.2}", m.sharpe_ratio)
    }
}

fn print_summary(result: &BacktestResult) {
    let s = &result.strategy_metrics;
    let b = &result.buy_and_hold_metrics;

    eprintln!(
        "\n=== {}: {} ({} to {}, {} bars) ===",
        result.symbol,
        result.strategy.name(),
        result.dates.first().map(|d| d.to_string()).unwrap_or_default(),
        result.dates.last().map(|d| d.to_string()).unwrap_or_default(),
        result.dates.len()
    );
    eprintln!("{:<18}{:>18}{:>18}", "", "Strategy", "Buy & Hold");
    eprintln!(
        "{:<18}{:>17.2}%{:>17.2}%",
        "Total Return:",
        s.total_return * 100.0,
        b.total_return * 100.0
    );
    eprintln!(
        "{:<18}{:>17.2}%{:>17.2}%",
        "Annualized:",
        s.annualized_return * 100.0,
        b.annualized_return * 100.0
    );
    eprintln!(
        "{:<18}{:>17.2}%{:>17.2}%",
        "Volatility:",
        s.annualized_volatility * 100.0,
        b.annualized_volatility * 100.0
    );
    eprintln!(
        "{:<18}{:>18}{:>18}",
        "Sharpe Ratio:",
        format_sharpe(s),
        format_sharpe(b)
    );
    eprintln!(
        "{:<18}{:>17.1}%{:>17.1}%",
        "Max Drawdown:",
        s.max_drawdown * 100.0,
        b.max_drawdown * 100.0
    );
    eprintln!(
        "{:<18}{:>18}{:>18}",
        "Trades:", s.trade_count, b.trade_count
    );
    eprintln!(
        "{:<18}{:>18}{:>18}",
        "Win Rate:",
        format_win_rate(s),
        format_win_rate(b)
    );
    eprintln!("Outperformance:   {:+.2}%", result.outperformance() * 100.0);
    match result.signals.first_defined() {
        Some(i) => eprintln!("First signal:     {} (bar {})", result.dates[i], i),
        None => eprintln!("First signal:     none (series shorter than warmup)"),
    }

    let events = crossovers(&result.signals, &result.dates);
    let golden = events
        .iter()
        .filter(|e| e.kind == CrossoverKind::Golden)
        .count();
    eprintln!(
        "Signal changes:   {} entries, {} exits",
        golden,
        events.len() - golden
    );

    eprintln!("\n=== Recent Signals ===");
    for row in result.recent_signals(RECENT_SIGNAL_ROWS) {
        let overlays: Vec<String> = row
            .overlays
            .iter()
            .map(|(label, value)| match value {
                Some(v) => format!("{}={:.2}", label, v),
                None => format!("{}=-", label),
            })
            .collect();
        let signal = row.signal.map(|s| s.to_string()).unwrap_or_else(|| "-".into());
        let stage = row.stage.map(|s| format!("  {}", s)).unwrap_or_default();
        eprintln!(
            "  {}  {:>10.2}  {}  {}{}",
            row.date,
            row.adjusted_close,
            overlays.join("  "),
            signal,
            stage
        );
    }
}

pub fn run_dry_run(config_path: &Path, symbol: Option<&str>) -> ExitCode {
    let adapter = match load_validated(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    eprintln!("Config validated successfully");

    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let (start_date, end_date) = match resolve_date_range(&adapter) {
        Ok(range) => range,
        Err(e) => return fail(e),
    };

    eprintln!("\nStrategy: {}", bt_config.strategy);
    eprintln!("  minimum bars:     {}", bt_config.strategy.minimum_bars());
    eprintln!("  initial capital:  {}", bt_config.initial_capital);
    eprintln!("  risk-free rate:   {}", bt_config.risk_free_rate);
    match bt_config.periods_per_year {
        Some(p) => eprintln!("  periods per year: {}", p),
        None => eprintln!("  periods per year: inferred from data"),
    }
    eprintln!("  liquidate at end: {}", bt_config.liquidate_at_end);

    let symbols = resolve_symbols(symbol, &adapter);
    if symbols.is_empty() {
        eprintln!("error: no symbols configured");
        return ExitCode::from(2);
    }
    eprintln!("\nUniverse:");
    eprintln!("  symbols:   {}", symbols.join(", "));
    eprintln!("  range:     {} to {}", start_date, end_date);
    eprintln!("  data dir:  {}", data_dir(&adapter).display());

    eprintln!("\nDry run complete: configuration is valid");
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    let adapter = match load_validated(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    match build_strategy(&adapter) {
        Ok(strategy) => {
            eprintln!("Strategy: {}", strategy);
            eprintln!("\nConfiguration is valid.");
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn run_risk_reward(config_path: &Path, symbols: Option<&str>, all: bool) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_backtest_config(&adapter) {
        return fail(e);
    }
    let (start_date, end_date) = match resolve_date_range(&adapter) {
        Ok(range) => range,
        Err(e) => return fail(e),
    };
    let periods_per_year = match periods_per_year(&adapter) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };

    let data_port = CsvDataAdapter::new(data_dir(&adapter));
    let symbols = if all {
        match data_port.list_symbols() {
            Ok(s) => s,
            Err(e) => return fail(e),
        }
    } else {
        resolve_symbols(symbols, &adapter)
    };
    if symbols.is_empty() {
        eprintln!("error: no symbols configured");
        return ExitCode::from(2);
    }

    let mut series = Vec::with_capacity(symbols.len());
    for sym in &symbols {
        match data_port.get_price_series(sym, start_date, end_date) {
            Ok(s) => series.push(s),
            Err(e) => return fail(e),
        }
    }

    let risk_free_rate = match risk_free_rate(&adapter) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };
    let rows = match risk_reward::summarize(&series, risk_free_rate, periods_per_year) {
        Ok(rows) => rows,
        Err(e) => return fail(e),
    };

    println!("symbol,annualized_return,annualized_volatility,sharpe_ratio,sharpe_degenerate");
    for row in &rows {
        println!(
            "{},{:.6},{:.6},{:.6},{}",
            row.symbol,
            row.annualized_return,
            row.annualized_volatility,
            row.sharpe_ratio,
            row.sharpe_degenerate
        );
    }

    if let Some(best) = risk_reward::best_sharpe(&rows) {
        eprintln!("Best Sharpe:       {} ({:.2})", best.symbol, best.sharpe_ratio);
    }
    if let Some(calm) = risk_reward::lowest_volatility(&rows) {
        eprintln!(
            "Lowest volatility: {} ({:.2}%)",
            calm.symbol,
            calm.annualized_volatility * 100.0
        );
    }
    ExitCode::SUCCESS
}

fn periods_per_year(adapter: &dyn ConfigPort) -> Result<Option<f64>, BacktestError> {
    match adapter.get_string("backtest", "periods_per_year") {
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| BacktestError::ConfigInvalid {
                section: "backtest".into(),
                key: "periods_per_year".into(),
                reason: format!("expected a number, got '{}'", raw.trim()),
            }),
        None => Ok(None),
    }
}
