//! Backtest engine: signals -> simulation -> metrics for one series.

use chrono::NaiveDate;
use tracing::info;

use crate::domain::equity::EquityCurve;
use crate::domain::error::BacktestError;
use crate::domain::metrics::{MetricsBundle, MetricsConfig};
use crate::domain::price_series::PriceSeries;
use crate::domain::signal::{Signal, SignalSeries, crossovers};
use crate::domain::simulator::{SimulationConfig, simulate};
use crate::domain::stage::Stage;
use crate::domain::strategy::Strategy;
use crate::domain::trade::Trade;

/// Everything a single run depends on besides the price series.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub strategy: Strategy,
    pub initial_capital: f64,
    /// Annualized.
    pub risk_free_rate: f64,
    /// Overrides the frequency inferred from the series when set.
    pub periods_per_year: Option<f64>,
    pub liquidate_at_end: bool,
}

impl BacktestConfig {
    pub fn new(strategy: Strategy) -> Self {
        BacktestConfig {
            strategy,
            initial_capital: 1.0,
            risk_free_rate: 0.0,
            periods_per_year: None,
            liquidate_at_end: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub symbol: String,
    pub strategy: Strategy,
    pub dates: Vec<NaiveDate>,
    pub adjusted_closes: Vec<f64>,
    pub signals: SignalSeries,
    pub strategy_curve: EquityCurve,
    pub buy_and_hold_curve: EquityCurve,
    pub trades: Vec<Trade>,
    pub buy_and_hold_trades: Vec<Trade>,
    pub strategy_metrics: MetricsBundle,
    pub buy_and_hold_metrics: MetricsBundle,
}

/// One display row of the most recent bars.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalRow {
    pub date: NaiveDate,
    pub adjusted_close: f64,
    /// `(label, value)` for each moving average the strategy evaluated.
    pub overlays: Vec<(String, Option<f64>)>,
    pub signal: Option<Signal>,
    pub stage: Option<Stage>,
}

impl BacktestResult {
    /// Strategy total return minus buy-and-hold total return.
    pub fn outperformance(&self) -> f64 {
        self.strategy_metrics.total_return - self.buy_and_hold_metrics.total_return
    }

    pub fn recent_signals(&self, count: usize) -> Vec<SignalRow> {
        let start = self.dates.len().saturating_sub(count);
        (start..self.dates.len())
            .map(|i| SignalRow {
                date: self.dates[i],
                adjusted_close: self.adjusted_closes[i],
                overlays: self
                    .signals
                    .overlays
                    .iter()
                    .map(|o| (o.indicator_type.to_string(), o.get(i)))
                    .collect(),
                signal: self.signals.values[i],
                stage: self.signals.stage_at(i),
            })
            .collect()
    }
}

pub fn run_backtest(
    series: &PriceSeries,
    config: &BacktestConfig,
) -> Result<BacktestResult, BacktestError> {
    config.strategy.validate()?;
    validate_rates(config)?;

    info!(
        symbol = series.symbol(),
        strategy = %config.strategy,
        bars = series.len(),
        "starting backtest"
    );

    let signals = config.strategy.generate_signals(series)?;
    let dates = series.dates();
    let events = crossovers(&signals, &dates);
    info!(
        symbol = series.symbol(),
        transitions = events.len(),
        "signals generated"
    );

    let simulation = simulate(
        series,
        &signals,
        &SimulationConfig {
            initial_capital: config.initial_capital,
            liquidate_at_end: config.liquidate_at_end,
        },
    )?;

    let metrics_config = MetricsConfig {
        risk_free_rate: config.risk_free_rate,
        periods_per_year: config
            .periods_per_year
            .unwrap_or_else(|| series.sampling_frequency().periods_per_year()),
    };
    let strategy_metrics =
        MetricsBundle::compute(&simulation.strategy_curve, &simulation.trades, &metrics_config)?;
    let buy_and_hold_metrics = MetricsBundle::compute(
        &simulation.buy_and_hold_curve,
        &simulation.buy_and_hold_trades,
        &metrics_config,
    )?;

    info!(
        symbol = series.symbol(),
        trades = simulation.trades.len(),
        total_return = strategy_metrics.total_return,
        buy_and_hold_return = buy_and_hold_metrics.total_return,
        "backtest complete"
    );

    Ok(BacktestResult {
        symbol: series.symbol().to_string(),
        strategy: config.strategy,
        dates,
        adjusted_closes: series.adjusted_closes(),
        signals,
        strategy_curve: simulation.strategy_curve,
        buy_and_hold_curve: simulation.buy_and_hold_curve,
        trades: simulation.trades,
        buy_and_hold_trades: simulation.buy_and_hold_trades,
        strategy_metrics,
        buy_and_hold_metrics,
    })
}

fn validate_rates(config: &BacktestConfig) -> Result<(), BacktestError> {
    if !config.risk_free_rate.is_finite() {
        return Err(BacktestError::configuration("risk_free_rate must be finite"));
    }
    match config.periods_per_year {
        Some(ppy) if !(ppy.is_finite() && ppy > 0.0) => Err(BacktestError::configuration(
            format!("periods_per_year must be positive, got {}", ppy),
        )),
        _ => Ok(()),
    }
}
