//! CSV report adapter implementing ReportPort.
//!
//! Writes three files per symbol into the output directory:
//! `<SYMBOL>_equity.csv`, `<SYMBOL>_trades.csv` and `<SYMBOL>_metrics.csv`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::backtest::BacktestResult;
use crate::domain::error::BacktestError;
use crate::domain::metrics::MetricsBundle;
use crate::ports::report_port::ReportPort;
use tracing::info;

#[derive(Debug, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

fn csv_error(e: csv::Error) -> BacktestError {
    BacktestError::Io(std::io::Error::other(e))
}

fn format_optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn write_equity(result: &BacktestResult, path: &Path) -> Result<(), BacktestError> {
    let mut wtr = csv::Writer::from_path(path).map_err(csv_error)?;
    wtr.write_record(["date", "strategy", "buy_and_hold", "signal"])
        .map_err(csv_error)?;

    let strategy = &result.strategy_curve.points;
    let benchmark = &result.buy_and_hold_curve.points;
    for (i, (s, b)) in strategy.iter().zip(benchmark).enumerate() {
        let signal = result.signals.values[i]
            .map(|sig| sig.to_string())
            .unwrap_or_default();
        wtr.write_record([
            s.date.to_string(),
            s.equity.to_string(),
            b.equity.to_string(),
            signal,
        ])
        .map_err(csv_error)?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_trades(result: &BacktestResult, path: &Path) -> Result<(), BacktestError> {
    let mut wtr = csv::Writer::from_path(path).map_err(csv_error)?;
    wtr.write_record([
        "entry_date",
        "entry_price",
        "exit_date",
        "exit_price",
        "status",
        "return",
    ])
    .map_err(csv_error)?;

    for trade in &result.trades {
        wtr.write_record([
            trade.entry_date.to_string(),
            trade.entry_price.to_string(),
            trade.exit_date.map(|d| d.to_string()).unwrap_or_default(),
            format_optional(trade.exit_price),
            trade.status().to_string(),
            trade.return_pct().to_string(),
        ])
        .map_err(csv_error)?;
    }
    wtr.flush()?;
    Ok(())
}

fn metric_rows(m: &MetricsBundle) -> Vec<(&'static str, String)> {
    vec![
        ("total_return", m.total_return.to_string()),
        ("annualized_return", m.annualized_return.to_string()),
        ("annualized_volatility", m.annualized_volatility.to_string()),
        ("sharpe_ratio", m.sharpe_ratio.to_string()),
        ("sharpe_degenerate", m.sharpe_degenerate.to_string()),
        ("max_drawdown", m.max_drawdown.to_string()),
        ("max_drawdown_duration", m.max_drawdown_duration.to_string()),
        ("win_rate", format_optional(m.win_rate)),
        ("trade_count", m.trade_count.to_string()),
    ]
}

fn write_metrics(result: &BacktestResult, path: &Path) -> Result<(), BacktestError> {
    let mut wtr = csv::Writer::from_path(path).map_err(csv_error)?;
    wtr.write_record(["metric", "strategy", "buy_and_hold"])
        .map_err(csv_error)?;

    let strategy = metric_rows(&result.strategy_metrics);
    let benchmark = metric_rows(&result.buy_and_hold_metrics);
    for ((name, s), (_, b)) in strategy.into_iter().zip(benchmark) {
        wtr.write_record([name, s.as_str(), b.as_str()])
            .map_err(csv_error)?;
    }
    wtr.write_record([
        "outperformance",
        result.outperformance().to_string().as_str(),
        "",
    ])
    .map_err(csv_error)?;
    wtr.flush()?;
    Ok(())
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, result: &BacktestResult, output_dir: &Path) -> Result<(), BacktestError> {
        fs::create_dir_all(output_dir)?;

        let file = |suffix: &str| -> PathBuf {
            output_dir.join(format!("{}_{}.csv", result.symbol, suffix))
        };
        write_equity(result, &file("equity"))?;
        write_trades(result, &file("trades"))?;
        write_metrics(result, &file("metrics"))?;

        info!(
            symbol = %result.symbol,
            dir = %output_dir.display(),
            "report written"
        );
        Ok(())
    }
}
