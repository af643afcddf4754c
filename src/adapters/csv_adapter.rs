//! CSV file market data adapter.
//!
//! Reads `<data_dir>/<SYMBOL>.csv` with a `date,open,high,low,close,adj_close,volume`
//! header. Column lookup is by header name, so `Adj Close` style exports work too.

use crate::domain::error::BacktestError;
use crate::domain::price_series::{PriceBar, PriceSeries};
use crate::ports::data_port::MarketDataPort;
use chrono::NaiveDate;
use csv::StringRecord;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

pub struct CsvDataAdapter {
    base_path: PathBuf,
}

struct Columns {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    adj_close: Option<usize>,
    volume: Option<usize>,
}

impl CsvDataAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// `<SYMBOL>.csv`, falling back to a file whose stem matches ignoring case.
    fn csv_path(&self, symbol: &str) -> PathBuf {
        let exact = self.base_path.join(format!("{}.csv", symbol));
        if exact.is_file() {
            return exact;
        }
        self.csv_files()
            .ok()
            .and_then(|files| {
                files
                    .into_iter()
                    .find(|(stem, _)| stem.eq_ignore_ascii_case(symbol))
            })
            .map(|(_, path)| path)
            .unwrap_or(exact)
    }

    fn csv_files(&self) -> Result<Vec<(String, PathBuf)>, BacktestError> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("csv") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    files.push((stem.to_string(), path.clone()));
                }
            }
        }
        Ok(files)
    }

    /// Symbols with a CSV file in the data directory, sorted.
    pub fn list_symbols(&self) -> Result<Vec<String>, BacktestError> {
        let mut symbols: Vec<String> = self.csv_files()?.into_iter().map(|(stem, _)| stem).collect();
        symbols.sort();
        Ok(symbols)
    }
}

fn unavailable(symbol: &str, reason: impl Into<String>) -> BacktestError {
    BacktestError::DataUnavailable {
        symbol: symbol.to_string(),
        reason: reason.into(),
    }
}

fn normalize_header(name: &str) -> String {
    name.trim().to_lowercase().replace([' ', '-'], "_")
}

fn resolve_columns(symbol: &str, headers: &StringRecord) -> Result<Columns, BacktestError> {
    let names: Vec<String> = headers.iter().map(normalize_header).collect();
    let find = |wanted: &[&str]| names.iter().position(|n| wanted.contains(&n.as_str()));
    let require = |wanted: &str| {
        find(&[wanted]).ok_or_else(|| unavailable(symbol, format!("missing {} column", wanted)))
    };

    Ok(Columns {
        date: require("date")?,
        open: require("open")?,
        high: require("high")?,
        low: require("low")?,
        close: require("close")?,
        adj_close: find(&["adj_close", "adjusted_close", "adjclose"]),
        volume: find(&["volume"]),
    })
}

fn parse_price(
    symbol: &str,
    record: &StringRecord,
    index: usize,
    name: &str,
) -> Result<f64, BacktestError> {
    let raw = record
        .get(index)
        .ok_or_else(|| unavailable(symbol, format!("missing {} value", name)))?;
    raw.trim()
        .parse()
        .map_err(|e| unavailable(symbol, format!("invalid {} value '{}': {}", name, raw, e)))
}

fn parse_row(symbol: &str, record: &StringRecord, cols: &Columns) -> Result<PriceBar, BacktestError> {
    let date_str = record
        .get(cols.date)
        .ok_or_else(|| unavailable(symbol, "missing date value"))?;
    let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
        .map_err(|e| unavailable(symbol, format!("invalid date '{}': {}", date_str, e)))?;

    let close = parse_price(symbol, record, cols.close, "close")?;
    let adjusted_close = match cols.adj_close {
        Some(i) if record.get(i).is_some_and(|v| !v.trim().is_empty()) => {
            parse_price(symbol, record, i, "adj_close")?
        }
        _ => close,
    };
    let volume = match cols.volume.and_then(|i| record.get(i)) {
        Some(v) if !v.trim().is_empty() => v
            .trim()
            .parse::<f64>()
            .map(|v| v as i64)
            .map_err(|e| unavailable(symbol, format!("invalid volume value '{}': {}", v, e)))?,
        _ => 0,
    };

    Ok(PriceBar {
        date,
        open: parse_price(symbol, record, cols.open, "open")?,
        high: parse_price(symbol, record, cols.high, "high")?,
        low: parse_price(symbol, record, cols.low, "low")?,
        close,
        adjusted_close,
        volume,
    })
}

impl MarketDataPort for CsvDataAdapter {
    fn get_price_series(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, BacktestError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path)
            .map_err(|e| unavailable(symbol, format!("failed to read {}: {}", path.display(), e)))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| unavailable(symbol, format!("CSV header error: {}", e)))?
            .clone();
        let cols = resolve_columns(symbol, &headers)?;

        let mut bars = Vec::new();
        for result in rdr.records() {
            let record =
                result.map_err(|e| unavailable(symbol, format!("CSV parse error: {}", e)))?;
            let bar = parse_row(symbol, &record, &cols)?;
            if bar.date < start_date || bar.date > end_date {
                continue;
            }
            bars.push(bar);
        }

        if bars.is_empty() {
            return Err(unavailable(
                symbol,
                format!("no data between {} and {}", start_date, end_date),
            ));
        }

        bars.sort_by_key(|b| b.date);
        debug!(symbol, bars = bars.len(), path = %path.display(), "loaded price data");
        PriceSeries::new(symbol, bars)
    }
}
