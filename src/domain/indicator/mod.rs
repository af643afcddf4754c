//! Moving-average indicators aligned to a [`PriceSeries`].
//!
//! - `IndicatorType`: indicator identity + parameters, also used as the overlay label
//! - `IndicatorSeries`: per-bar values, absent during warmup

pub mod sma;

use crate::domain::price_series::PriceSeries;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    /// Simple moving average over `n` bars.
    Sma(usize),
    /// Simple moving average over `weeks` weeks of `bars_per_week` bars each.
    WeeklySma { weeks: usize, bars_per_week: usize },
}

impl IndicatorType {
    /// Trailing window length in bars.
    pub fn window(&self) -> usize {
        match *self {
            IndicatorType::Sma(period) => period,
            IndicatorType::WeeklySma {
                weeks,
                bars_per_week,
            } => weeks * bars_per_week,
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::WeeklySma { weeks, .. } => write!(f, "MA{}W", weeks),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<Option<f64>>,
}

impl IndicatorSeries {
    /// Computes the indicator over the adjusted closes of `series`.
    pub fn compute(series: &PriceSeries, indicator_type: IndicatorType) -> Self {
        let closes = series.adjusted_closes();
        Self {
            indicator_type,
            values: sma::calculate_sma(&closes, indicator_type.window()),
        }
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
