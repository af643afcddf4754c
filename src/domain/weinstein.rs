//! Weinstein stage strategy signals.
//!
//! Enter on a stage 1 -> stage 2 transition, exit on entering stage 3 or 4.
//! After an exit, no new entry is taken until the next fresh 1 -> 2
//! transition. Stage 2 -> 1 while long keeps the position.

use crate::domain::error::BacktestError;
use crate::domain::price_series::PriceSeries;
use crate::domain::signal::{Signal, SignalSeries};
use crate::domain::stage::{Stage, StageClassifier};
use tracing::debug;

pub fn validate_params(
    ma_window: usize,
    bars_per_week: usize,
    slope_lag: usize,
) -> Result<(), BacktestError> {
    if ma_window == 0 || bars_per_week == 0 {
        return Err(BacktestError::configuration(
            "ma_window and bars_per_week must be at least 1",
        ));
    }
    if ma_window * bars_per_week < 2 {
        return Err(BacktestError::configuration(format!(
            "moving average must span at least 2 bars, got {}",
            ma_window * bars_per_week
        )));
    }
    if slope_lag == 0 {
        return Err(BacktestError::configuration("slope_lag must be at least 1"));
    }
    Ok(())
}

pub fn generate_signals(
    series: &PriceSeries,
    ma_window: usize,
    bars_per_week: usize,
    slope_lag: usize,
) -> Result<SignalSeries, BacktestError> {
    validate_params(ma_window, bars_per_week, slope_lag)?;

    let classification = StageClassifier::new(ma_window, bars_per_week, slope_lag).classify(series)?;

    let mut values = Vec::with_capacity(series.len());
    let mut position = Signal::Flat;
    let mut previous: Option<Stage> = None;

    for stage in &classification.stages {
        let Some(stage) = *stage else {
            values.push(None);
            continue;
        };

        position = match (previous, stage) {
            (Some(Stage::Base), Stage::Advance) => Signal::Long,
            (_, Stage::Top | Stage::Decline) => Signal::Flat,
            _ => position,
        };
        previous = Some(stage);
        values.push(Some(position));
    }

    debug!(
        symbol = series.symbol(),
        classified = classification.stages.iter().flatten().count(),
        "stage classification complete"
    );

    Ok(SignalSeries {
        values,
        overlays: vec![classification.moving_average],
        stages: Some(classification.stages),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price_series::PriceBar;
    use chrono::NaiveDate;

    fn series(prices: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let bars = prices
            .iter()
            .enumerate()
            .map(|(i, &p)| PriceBar {
                date: start + chrono::Duration::days(i as i64),
                open: p,
                high: p,
                low: p,
                close: p,
                adjusted_close: p,
                volume: 100,
            })
            .collect();
        PriceSeries::new("TEST", bars).unwrap()
    }

    // 3-bar average, 1-bar slope. Stages from index 3:
    // Base, Adv, Adv, Adv, Base, Decl, Top, Adv, Base, Adv
    const PRICES: [f64; 13] = [
        8.0, 9.0, 10.0, 9.0, 10.5, 11.0, 12.0, 11.0, 10.0, 11.5, 12.0, 10.0, 12.0,
    ];

    #[test]
    fn enters_on_base_to_advance_and_exits_on_decline() {
        let out = generate_signals(&series(&PRICES), 1, 3, 1).unwrap();

        use Signal::*;
        let expected = vec![
            None,
            None,
            None,
            Some(Flat),
            Some(Long),
            Some(Long),
            Some(Long),
            Some(Long),
            Some(Flat),
            Some(Flat),
            Some(Flat),
            Some(Flat),
            Some(Long),
        ];
        assert_eq!(out.values, expected);
    }

    #[test]
    fn advance_after_top_does_not_reenter() {
        let out = generate_signals(&series(&PRICES), 1, 3, 1).unwrap();
        assert_eq!(out.stage_at(9), Some(Stage::Top));
        assert_eq!(out.stage_at(10), Some(Stage::Advance));
        assert_eq!(out.values[10], Some(Signal::Flat));
    }

    #[test]
    fn first_classified_advance_is_not_an_entry() {
        let prices: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        let out = generate_signals(&series(&prices), 1, 3, 1).unwrap();
        assert!(out.values.iter().flatten().all(|s| *s == Signal::Flat));
    }

    #[test]
    fn attaches_stages_and_overlay() {
        let out = generate_signals(&series(&PRICES), 1, 3, 1).unwrap();
        assert_eq!(out.overlays.len(), 1);
        assert_eq!(out.overlays[0].indicator_type.to_string(), "MA1W");
        assert_eq!(out.stages.as_ref().map(|s| s.len()), Some(PRICES.len()));
    }

    #[test]
    fn short_series_is_insufficient_data() {
        let err = generate_signals(&series(&[100.0; 100]), 30, 5, 1).unwrap_err();
        assert!(matches!(err, BacktestError::InsufficientData { .. }));
    }

    #[test]
    fn invalid_params_are_configuration_errors() {
        let s = series(&PRICES);
        assert!(matches!(
            generate_signals(&s, 1, 3, 0),
            Err(BacktestError::Configuration { .. })
        ));
        assert!(matches!(
            generate_signals(&s, 30, 0, 1),
            Err(BacktestError::Configuration { .. })
        ));
    }
}
