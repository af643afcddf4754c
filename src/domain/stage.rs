//! Weinstein stage classification.
//!
//! Each bar is labelled from the adjusted close relative to a long weekly
//! moving average and the sign of that average's slope over `slope_lag` bars:
//!
//! | price vs MA | slope  | stage           |
//! |-------------|--------|-----------------|
//! | above       | > 0    | 2 (advance)     |
//! | above       | <= 0   | 3 (top)         |
//! | below       | < 0    | 4 (decline)     |
//! | below       | >= 0   | 1 (base)        |
//! | equal       | any    | previous stage  |
//!
//! A price exactly on the average keeps the previous label; with no previous
//! label it is read as a base.

use crate::domain::error::BacktestError;
use crate::domain::indicator::sma::difference;
use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::price_series::PriceSeries;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Base,
    Advance,
    Top,
    Decline,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Base => write!(f, "STAGE_1_BASE"),
            Stage::Advance => write!(f, "STAGE_2_ADVANCE"),
            Stage::Top => write!(f, "STAGE_3_TOP"),
            Stage::Decline => write!(f, "STAGE_4_DECLINE"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageClassification {
    pub stages: Vec<Option<Stage>>,
    pub moving_average: IndicatorSeries,
    pub slope: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageClassifier {
    ma: IndicatorType,
    slope_lag: usize,
}

impl StageClassifier {
    pub fn new(weeks: usize, bars_per_week: usize, slope_lag: usize) -> Self {
        Self {
            ma: IndicatorType::WeeklySma {
                weeks,
                bars_per_week,
            },
            slope_lag,
        }
    }

    pub fn minimum_bars(&self) -> usize {
        self.ma.window() + self.slope_lag
    }

    pub fn classify(&self, series: &PriceSeries) -> Result<StageClassification, BacktestError> {
        let minimum = self.minimum_bars();
        if series.len() < minimum {
            return Err(BacktestError::InsufficientData {
                symbol: series.symbol().to_string(),
                bars: series.len(),
                minimum,
            });
        }

        let moving_average = IndicatorSeries::compute(series, self.ma);
        let slope = difference(&moving_average.values, self.slope_lag);

        let mut stages = Vec::with_capacity(series.len());
        let mut previous: Option<Stage> = None;
        for (i, bar) in series.bars().iter().enumerate() {
            let stage = match (moving_average.get(i), slope[i]) {
                (Some(ma), Some(s)) => Some(classify_point(bar.adjusted_close, ma, s, previous)),
                _ => None,
            };
            if stage.is_some() {
                previous = stage;
            }
            stages.push(stage);
        }

        Ok(StageClassification {
            stages,
            moving_average,
            slope,
        })
    }
}

fn classify_point(price: f64, ma: f64, slope: f64, previous: Option<Stage>) -> Stage {
    if price > ma {
        if slope > 0.0 { Stage::Advance } else { Stage::Top }
    } else if price < ma {
        if slope < 0.0 { Stage::Decline } else { Stage::Base }
    } else {
        previous.unwrap_or(Stage::Base)
    }
}
