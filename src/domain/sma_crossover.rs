//! Short/long simple moving average crossover.
//!
//! LONG while SMA(S) > SMA(L), FLAT while SMA(S) < SMA(L). An exact tie keeps
//! the previous signal so equal averages never flip the position.

use crate::domain::error::BacktestError;
use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::price_series::PriceSeries;
use crate::domain::signal::{Signal, SignalSeries};
use tracing::debug;

pub fn validate_windows(short_window: usize, long_window: usize) -> Result<(), BacktestError> {
    if short_window < 2 || long_window < 2 {
        return Err(BacktestError::configuration(format!(
            "moving average windows must be at least 2, got {}/{}",
            short_window, long_window
        )));
    }
    if short_window >= long_window {
        return Err(BacktestError::configuration(format!(
            "short_window ({}) must be less than long_window ({})",
            short_window, long_window
        )));
    }
    Ok(())
}

pub fn generate_signals(
    series: &PriceSeries,
    short_window: usize,
    long_window: usize,
) -> Result<SignalSeries, BacktestError> {
    validate_windows(short_window, long_window)?;

    let short_ma = IndicatorSeries::compute(series, IndicatorType::Sma(short_window));
    let long_ma = IndicatorSeries::compute(series, IndicatorType::Sma(long_window));

    let mut values = vec![None; series.len()];

    // A series no longer than the long window yields no signals at all.
    if series.len() > long_window {
        let mut prev: Option<Signal> = None;
        for (i, slot) in values.iter_mut().enumerate().skip(long_window - 1) {
            let (Some(s), Some(l)) = (short_ma.get(i), long_ma.get(i)) else {
                continue;
            };
            let signal = if s > l {
                Signal::Long
            } else if s < l {
                Signal::Flat
            } else {
                prev.unwrap_or(Signal::Flat)
            };
            *slot = Some(signal);
            prev = Some(signal);
        }
    } else {
        debug!(
            symbol = series.symbol(),
            bars = series.len(),
            long_window,
            "series too short for crossover signals"
        );
    }

    Ok(SignalSeries {
        values,
        overlays: vec![short_ma, long_ma],
        stages: None,
    })
}
