//! Performance metrics for an equity curve and its trade log.

use crate::domain::equity::EquityCurve;
use crate::domain::error::BacktestError;
use crate::domain::trade::Trade;

/// Standard deviations below this are treated as zero.
const DEGENERATE_STDDEV: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsConfig {
    /// Annualized risk-free rate, subtracted per period before the Sharpe ratio.
    pub risk_free_rate: f64,
    pub periods_per_year: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        MetricsConfig {
            risk_free_rate: 0.0,
            periods_per_year: 252.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsBundle {
    pub total_return: f64,
    /// Mean periodic return scaled by periods per year.
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    /// Zero when `sharpe_degenerate` is set.
    pub sharpe_ratio: f64,
    /// Returns had (effectively) zero dispersion, so no Sharpe ratio exists.
    pub sharpe_degenerate: bool,
    /// Non-positive fraction, e.g. -0.25 for a 25% peak-to-trough loss.
    pub max_drawdown: f64,
    /// Longest run of bars spent below a prior peak.
    pub max_drawdown_duration: usize,
    /// `None` when no trade has been closed.
    pub win_rate: Option<f64>,
    pub trade_count: usize,
}

impl MetricsBundle {
    pub fn compute(
        curve: &EquityCurve,
        trades: &[Trade],
        config: &MetricsConfig,
    ) -> Result<Self, BacktestError> {
        let values = curve.values();
        let returns = periodic_returns(&values)?;

        let total_return = values[values.len() - 1] / values[0] - 1.0;
        let ppy = config.periods_per_year;

        let mean_return = mean(&returns);
        let stddev = sample_stddev(&returns);
        let (sharpe_ratio, sharpe_degenerate) =
            sharpe(mean_return, stddev, config.risk_free_rate, ppy);
        let (max_drawdown, max_drawdown_duration) = compute_drawdown(&values);

        Ok(MetricsBundle {
            total_return,
            annualized_return: mean_return * ppy,
            annualized_volatility: stddev * ppy.sqrt(),
            sharpe_ratio,
            sharpe_degenerate,
            max_drawdown,
            max_drawdown_duration,
            win_rate: win_rate(trades),
            trade_count: trades.len(),
        })
    }
}

/// r[i] = v[i] / v[i-1] - 1 for i in 1..n.
pub fn periodic_returns(values: &[f64]) -> Result<Vec<f64>, BacktestError> {
    if values.len() < 2 {
        return Err(BacktestError::DegenerateSeries {
            points: values.len(),
        });
    }
    Ok(values.windows(2).map(|w| w[1] / w[0] - 1.0).collect())
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator); zero for fewer than two values.
fn sample_stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Returns `(sharpe, degenerate)`. Subtracting a constant per-period rate
/// leaves the dispersion unchanged, so only the mean is adjusted.
fn sharpe(mean_return: f64, stddev: f64, risk_free_rate: f64, ppy: f64) -> (f64, bool) {
    if stddev < DEGENERATE_STDDEV {
        return (0.0, true);
    }
    let excess = mean_return - risk_free_rate / ppy;
    (excess / stddev * ppy.sqrt(), false)
}

/// Returns `(max_drawdown, longest_underwater_run)`; drawdown is <= 0.
fn compute_drawdown(values: &[f64]) -> (f64, usize) {
    let Some(&first) = values.first() else {
        return (0.0, 0);
    };

    let mut peak = first;
    let mut max_dd = 0.0_f64;
    let mut run = 0usize;
    let mut max_run = 0usize;

    for &v in values {
        if v >= peak {
            peak = v;
            run = 0;
        } else {
            let dd = v / peak - 1.0;
            if dd < max_dd {
                max_dd = dd;
            }
            run += 1;
            max_run = max_run.max(run);
        }
    }

    (max_dd, max_run)
}

/// Share of closed trades that exited above entry. Open trades are excluded.
fn win_rate(trades: &[Trade]) -> Option<f64> {
    let closed: Vec<bool> = trades.iter().filter_map(Trade::is_win).collect();
    if closed.is_empty() {
        return None;
    }
    let wins = closed.iter().filter(|&&w| w).count();
    Some(wins as f64 / closed.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn make_equity_curve(values: &[f64]) -> EquityCurve {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut curve = EquityCurve::default();
        for (i, &v) in values.iter().enumerate() {
            curve.record(start + chrono::Duration::days(i as i64), v);
        }
        curve
    }

    fn make_trade(entry: f64, exit: Option<f64>) -> Trade {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut trade = Trade::open_long(date, entry);
        if let Some(exit) = exit {
            trade.close(date + chrono::Duration::days(5), exit);
        }
        trade
    }

    fn compute(values: &[f64], trades: &[Trade]) -> MetricsBundle {
        MetricsBundle::compute(&make_equity_curve(values), trades, &MetricsConfig::default())
            .unwrap()
    }

    #[test]
    fn total_return_positive_and_negative() {
        assert_relative_eq!(compute(&[100.0, 110.0], &[]).total_return, 0.10, epsilon = 1e-12);
        assert_relative_eq!(compute(&[100.0, 90.0], &[]).total_return, -0.10, epsilon = 1e-12);
    }

    #[test]
    fn single_point_is_degenerate() {
        let err = MetricsBundle::compute(
            &make_equity_curve(&[1.0]),
            &[],
            &MetricsConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, BacktestError::DegenerateSeries { points: 1 }));

        let err = periodic_returns(&[]).unwrap_err();
        assert!(matches!(err, BacktestError::DegenerateSeries { points: 0 }));
    }

    #[test]
    fn periodic_returns_values() {
        let r = periodic_returns(&[100.0, 110.0, 99.0]).unwrap();
        assert_eq!(r.len(), 2);
        assert_relative_eq!(r[0], 0.10, epsilon = 1e-12);
        assert_relative_eq!(r[1], -0.10, epsilon = 1e-12);
    }

    #[test]
    fn volatility_uses_sample_stddev() {
        // returns +10%, -10%: mean 0, sample stddev sqrt(0.02)
        let m = compute(&[100.0, 110.0, 99.0], &[]);
        assert_relative_eq!(
            m.annualized_volatility,
            0.02_f64.sqrt() * 252.0_f64.sqrt(),
            epsilon = 1e-9
        );
        assert!(!m.sharpe_degenerate);
    }

    #[test]
    fn sharpe_positive_for_noisy_uptrend() {
        let values: Vec<f64> = (0..253)
            .map(|i| 100.0 * (1.0 + 0.001 * i as f64) + if i % 2 == 0 { 0.05 } else { 0.0 })
            .collect();
        let m = compute(&values, &[]);
        assert!(m.sharpe_ratio > 0.0);
        assert!(!m.sharpe_degenerate);
    }

    #[test]
    fn risk_free_rate_lowers_sharpe() {
        let curve = make_equity_curve(&[100.0, 101.0, 100.5, 102.0, 101.8, 103.0]);
        let base = MetricsBundle::compute(&curve, &[], &MetricsConfig::default()).unwrap();
        let with_rf = MetricsBundle::compute(
            &curve,
            &[],
            &MetricsConfig {
                risk_free_rate: 0.05,
                periods_per_year: 252.0,
            },
        )
        .unwrap();
        assert!(with_rf.sharpe_ratio < base.sharpe_ratio);
        assert_relative_eq!(
            with_rf.annualized_volatility,
            base.annualized_volatility,
            epsilon = 1e-15
        );
    }

    #[test]
    fn flat_curve_is_degenerate_not_nan() {
        let m = compute(&[1.0; 30], &[]);
        assert_eq!(m.sharpe_ratio, 0.0);
        assert!(m.sharpe_degenerate);
        assert_eq!(m.annualized_volatility, 0.0);
        assert_eq!(m.max_drawdown, 0.0);
        assert_eq!(m.win_rate, None);
        assert_eq!(m.trade_count, 0);
    }

    #[test]
    fn max_drawdown_peak_to_trough() {
        let (dd, _) = compute_drawdown(&[100.0, 110.0, 90.0, 95.0, 80.0, 100.0]);
        assert_relative_eq!(dd, 80.0 / 110.0 - 1.0, epsilon = 1e-12);
        assert!(dd < 0.0);
    }

    #[test]
    fn max_drawdown_zero_for_non_decreasing() {
        let (dd, duration) = compute_drawdown(&[1.0, 1.0, 1.2, 1.5, 1.5]);
        assert_eq!(dd, 0.0);
        assert_eq!(duration, 0);
    }

    #[test]
    fn max_drawdown_duration() {
        let (_, duration) = compute_drawdown(&[100.0, 110.0, 100.0, 90.0, 85.0, 95.0, 111.0]);
        assert_eq!(duration, 4);
    }

    #[test]
    fn win_rate_counts_closed_trades_only() {
        let trades = vec![
            make_trade(100.0, Some(110.0)),
            make_trade(100.0, Some(90.0)),
            make_trade(100.0, Some(100.0)),
            make_trade(100.0, Some(120.0)),
            make_trade(100.0, None),
        ];
        let m = compute(&[1.0, 1.1], &trades);
        assert_eq!(m.trade_count, 5);
        assert_relative_eq!(m.win_rate.unwrap(), 0.5);
    }

    #[test]
    fn win_rate_none_with_only_open_trade() {
        let m = compute(&[1.0, 1.1], &[make_trade(100.0, None)]);
        assert_eq!(m.trade_count, 1);
        assert_eq!(m.win_rate, None);
    }

    #[test]
    fn annualized_return_scales_mean() {
        let m = MetricsBundle::compute(
            &make_equity_curve(&[100.0, 101.0, 102.01]),
            &[],
            &MetricsConfig {
                risk_free_rate: 0.0,
                periods_per_year: 52.0,
            },
        )
        .unwrap();
        assert_relative_eq!(m.annualized_return, 0.52, epsilon = 1e-9);
    }
}
