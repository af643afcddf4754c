//! Strategy selection and the shared signal-generation entry point.

use crate::domain::error::BacktestError;
use crate::domain::price_series::PriceSeries;
use crate::domain::signal::SignalSeries;
use crate::domain::{sma_crossover, weinstein};
use std::fmt;

pub const DEFAULT_MA_WEEKS: usize = 30;
pub const DEFAULT_SLOPE_LAG: usize = 1;
pub const DEFAULT_BARS_PER_WEEK: usize = 5;

/// The recognized strategies. Each variant is an independent pure rule
/// behind [`Strategy::generate_signals`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    SmaCrossover {
        short_window: usize,
        long_window: usize,
    },
    /// Stan Weinstein's stage strategy on a `ma_window`-week moving average.
    Weinstein {
        ma_window: usize,
        slope_lag: usize,
        bars_per_week: usize,
    },
}

impl Strategy {
    pub fn weinstein() -> Self {
        Strategy::Weinstein {
            ma_window: DEFAULT_MA_WEEKS,
            slope_lag: DEFAULT_SLOPE_LAG,
            bars_per_week: DEFAULT_BARS_PER_WEEK,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::SmaCrossover { .. } => "SMA Crossover",
            Strategy::Weinstein { .. } => "Weinstein Stage",
        }
    }

    pub fn validate(&self) -> Result<(), BacktestError> {
        match *self {
            Strategy::SmaCrossover {
                short_window,
                long_window,
            } => sma_crossover::validate_windows(short_window, long_window),
            Strategy::Weinstein {
                ma_window,
                slope_lag,
                bars_per_week,
            } => weinstein::validate_params(ma_window, bars_per_week, slope_lag),
        }
    }

    /// Bars needed before the first signal can be produced.
    pub fn minimum_bars(&self) -> usize {
        match *self {
            Strategy::SmaCrossover { long_window, .. } => long_window + 1,
            Strategy::Weinstein {
                ma_window,
                slope_lag,
                bars_per_week,
            } => ma_window * bars_per_week + slope_lag,
        }
    }

    pub fn generate_signals(&self, series: &PriceSeries) -> Result<SignalSeries, BacktestError> {
        match *self {
            Strategy::SmaCrossover {
                short_window,
                long_window,
            } => sma_crossover::generate_signals(series, short_window, long_window),
            Strategy::Weinstein {
                ma_window,
                slope_lag,
                bars_per_week,
            } => weinstein::generate_signals(series, ma_window, bars_per_week, slope_lag),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::SmaCrossover {
                short_window,
                long_window,
            } => write!(f, "SMA Crossover ({}/{})", short_window, long_window),
            Strategy::Weinstein {
                ma_window,
                slope_lag,
                ..
            } => write!(f, "Weinstein Stage (MA{}W, slope lag {})", ma_window, slope_lag),
        }
    }
}
