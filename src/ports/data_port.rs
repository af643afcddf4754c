//! Market data port trait.

use crate::domain::error::BacktestError;
use crate::domain::price_series::PriceSeries;
use chrono::NaiveDate;

/// Source of daily price history. Failures surface as
/// [`BacktestError::DataUnavailable`] and are not retried by the engine.
pub trait MarketDataPort {
    fn get_price_series(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, BacktestError>;
}
