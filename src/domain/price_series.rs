//! Daily price bars and the immutable per-symbol series built from them.

use crate::domain::error::BacktestError;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adjusted_close: f64,
    pub volume: i64,
}

/// Sampling frequency of a series, used to annualize per-period statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingFrequency {
    Daily,
    Weekly,
    Monthly,
}

impl SamplingFrequency {
    pub fn periods_per_year(self) -> f64 {
        match self {
            SamplingFrequency::Daily => 252.0,
            SamplingFrequency::Weekly => 52.0,
            SamplingFrequency::Monthly => 12.0,
        }
    }
}

/// Ordered bars for one symbol. Dates are strictly increasing and every
/// adjusted close is a positive finite number.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<PriceBar>) -> Result<Self, BacktestError> {
        let symbol = symbol.into();
        if bars.is_empty() {
            return Err(BacktestError::InvalidSeries {
                symbol,
                reason: "series has no bars".into(),
            });
        }

        for (i, bar) in bars.iter().enumerate() {
            if !(bar.adjusted_close.is_finite() && bar.adjusted_close > 0.0) {
                return Err(BacktestError::InvalidSeries {
                    symbol,
                    reason: format!(
                        "adjusted close on {} must be positive, got {}",
                        bar.date, bar.adjusted_close
                    ),
                });
            }
            if i > 0 && bar.date <= bars[i - 1].date {
                return Err(BacktestError::InvalidSeries {
                    symbol,
                    reason: format!(
                        "dates must be strictly increasing: {} follows {}",
                        bar.date,
                        bars[i - 1].date
                    ),
                });
            }
        }

        Ok(Self { symbol, bars })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn start_date(&self) -> NaiveDate {
        self.bars[0].date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.bars[self.bars.len() - 1].date
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn adjusted_closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.adjusted_close).collect()
    }

    /// Infers the sampling frequency from the median gap between bars.
    pub fn sampling_frequency(&self) -> SamplingFrequency {
        if self.bars.len() < 2 {
            return SamplingFrequency::Daily;
        }

        let mut gaps: Vec<i64> = self
            .bars
            .windows(2)
            .map(|w| (w[1].date - w[0].date).num_days())
            .collect();
        gaps.sort_unstable();
        let median = gaps[gaps.len() / 2];

        match median {
            0..=4 => SamplingFrequency::Daily,
            5..=10 => SamplingFrequency::Weekly,
            _ => SamplingFrequency::Monthly,
        }
    }
}
