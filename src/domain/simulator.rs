//! Position simulation (signal walk-forward).
//!
//! Fills happen at the close of the bar on which the signal changes, so the
//! position held through bar i is the signal of bar i-1. While long the
//! strategy carries full notional in the asset; while flat it holds cash at
//! zero return. Each bar's equity depends only on the previous equity, the
//! bar's return and the prior signal.

use crate::domain::equity::EquityCurve;
use crate::domain::error::BacktestError;
use crate::domain::price_series::PriceSeries;
use crate::domain::signal::{Signal, SignalSeries};
use crate::domain::trade::Trade;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub initial_capital: f64,
    /// Close a position still open at the final bar instead of leaving it
    /// marked-to-market.
    pub liquidate_at_end: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            initial_capital: 1.0,
            liquidate_at_end: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Simulation {
    pub strategy_curve: EquityCurve,
    pub buy_and_hold_curve: EquityCurve,
    pub trades: Vec<Trade>,
    pub buy_and_hold_trades: Vec<Trade>,
}

pub fn simulate(
    series: &PriceSeries,
    signals: &SignalSeries,
    config: &SimulationConfig,
) -> Result<Simulation, BacktestError> {
    if !(config.initial_capital.is_finite() && config.initial_capital > 0.0) {
        return Err(BacktestError::configuration(format!(
            "initial_capital must be positive, got {}",
            config.initial_capital
        )));
    }
    if signals.len() != series.len() {
        return Err(BacktestError::configuration(format!(
            "signal series has {} values for {} bars",
            signals.len(),
            series.len()
        )));
    }

    let bars = series.bars();
    let capital = config.initial_capital;
    let first_close = bars[0].adjusted_close;

    let mut strategy_curve = EquityCurve::with_capacity(bars.len());
    let mut buy_and_hold_curve = EquityCurve::with_capacity(bars.len());
    let mut trades = Vec::new();
    let mut open: Option<Trade> = None;
    let mut equity = capital;

    for (i, bar) in bars.iter().enumerate() {
        if i > 0 && signals.position_at(i - 1) == Signal::Long {
            equity *= bar.adjusted_close / bars[i - 1].adjusted_close;
        }
        strategy_curve.record(bar.date, equity);
        buy_and_hold_curve.record(bar.date, capital * bar.adjusted_close / first_close);

        match (open.take(), signals.position_at(i)) {
            (None, Signal::Long) => {
                debug!(date = %bar.date, price = bar.adjusted_close, "open long");
                open = Some(Trade::open_long(bar.date, bar.adjusted_close));
            }
            (Some(mut trade), Signal::Flat) => {
                debug!(date = %bar.date, price = bar.adjusted_close, "close long");
                trade.close(bar.date, bar.adjusted_close);
                trades.push(trade);
            }
            (still_open, _) => open = still_open,
        }
    }

    let last = &bars[bars.len() - 1];
    if let Some(trade) = open {
        trades.push(finish_open_trade(trade, last.date, last.adjusted_close, config));
    }
    let buy_and_hold_trades = vec![finish_open_trade(
        Trade::open_long(bars[0].date, first_close),
        last.date,
        last.adjusted_close,
        config,
    )];

    Ok(Simulation {
        strategy_curve,
        buy_and_hold_curve,
        trades,
        buy_and_hold_trades,
    })
}

fn finish_open_trade(
    mut trade: Trade,
    date: chrono::NaiveDate,
    price: f64,
    config: &SimulationConfig,
) -> Trade {
    if config.liquidate_at_end {
        trade.close(date, price);
    } else {
        trade.mark_price = price;
    }
    trade
}
