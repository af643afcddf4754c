//! Risk vs reward summary across independently loaded symbols.
//!
//! Each row is derived from the symbol's buy-and-hold curve; symbols share
//! nothing, so rows can be computed in any order.

use crate::domain::equity::EquityCurve;
use crate::domain::error::BacktestError;
use crate::domain::metrics::{MetricsBundle, MetricsConfig};
use crate::domain::price_series::PriceSeries;

#[derive(Debug, Clone, PartialEq)]
pub struct RiskReward {
    pub symbol: String,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    pub sharpe_ratio: f64,
    pub sharpe_degenerate: bool,
}

/// One row per series, sorted by symbol. `periods_per_year` falls back to
/// each series' own sampling frequency.
pub fn summarize(
    series: &[PriceSeries],
    risk_free_rate: f64,
    periods_per_year: Option<f64>,
) -> Result<Vec<RiskReward>, BacktestError> {
    let mut rows = series
        .iter()
        .map(|s| summarize_one(s, risk_free_rate, periods_per_year))
        .collect::<Result<Vec<_>, _>>()?;
    rows.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    Ok(rows)
}

fn summarize_one(
    series: &PriceSeries,
    risk_free_rate: f64,
    periods_per_year: Option<f64>,
) -> Result<RiskReward, BacktestError> {
    let mut curve = EquityCurve::with_capacity(series.len());
    for bar in series.bars() {
        curve.record(bar.date, bar.adjusted_close);
    }

    let config = MetricsConfig {
        risk_free_rate,
        periods_per_year: periods_per_year
            .unwrap_or_else(|| series.sampling_frequency().periods_per_year()),
    };
    let metrics = MetricsBundle::compute(&curve, &[], &config)?;

    Ok(RiskReward {
        symbol: series.symbol().to_string(),
        annualized_return: metrics.annualized_return,
        annualized_volatility: metrics.annualized_volatility,
        sharpe_ratio: metrics.sharpe_ratio,
        sharpe_degenerate: metrics.sharpe_degenerate,
    })
}

/// Highest Sharpe ratio among non-degenerate rows.
pub fn best_sharpe(rows: &[RiskReward]) -> Option<&RiskReward> {
    rows.iter()
        .filter(|r| !r.sharpe_degenerate)
        .max_by(|a, b| a.sharpe_ratio.total_cmp(&b.sharpe_ratio))
}

pub fn lowest_volatility(rows: &[RiskReward]) -> Option<&RiskReward> {
    rows.iter()
        .min_by(|a, b| a.annualized_volatility.total_cmp(&b.annualized_volatility))
}
