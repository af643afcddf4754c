#![allow(dead_code)]

use chrono::NaiveDate;
use stagetrader::domain::error::BacktestError;
pub use stagetrader::domain::price_series::{PriceBar, PriceSeries};
use stagetrader::ports::data_port::MarketDataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl MarketDataPort for MockDataPort {
    fn get_price_series(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, BacktestError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(BacktestError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            });
        }
        let bars: Vec<PriceBar> = self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        if bars.is_empty() {
            return Err(BacktestError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: "no data in range".to_string(),
            });
        }
        PriceSeries::new(symbol, bars)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(date: NaiveDate, close: f64) -> PriceBar {
    PriceBar {
        date,
        open: close,
        high: close * 1.01,
        low: close * 0.99,
        close,
        adjusted_close: close,
        volume: 1_000_000,
    }
}

/// One bar per calendar day starting 2024-01-01.
pub fn daily_bars(prices: &[f64]) -> Vec<PriceBar> {
    let start = date(2024, 1, 1);
    prices
        .iter()
        .enumerate()
        .map(|(i, &p)| make_bar(start + chrono::Duration::days(i as i64), p))
        .collect()
}

pub fn make_series(symbol: &str, prices: &[f64]) -> PriceSeries {
    PriceSeries::new(symbol, daily_bars(prices)).unwrap()
}

/// `n` bars compounding at `rate` per bar from 100.
pub fn compounding_prices(n: usize, rate: f64) -> Vec<f64> {
    (0..n).map(|i| 100.0 * (1.0 + rate).powi(i as i32)).collect()
}

/// CSV body in the layout read by the CSV data adapter.
pub fn price_csv(bars: &[PriceBar]) -> String {
    let mut out = String::from("date,open,high,low,close,adj_close,volume\n");
    for b in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            b.date, b.open, b.high, b.low, b.close, b.adjusted_close, b.volume
        ));
    }
    out
}
