//! Configuration validation.
//!
//! Validates all config fields before a backtest runs.

use crate::domain::error::BacktestError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const STRATEGY_SMA_CROSSOVER: &str = "sma_crossover";
pub const STRATEGY_WEINSTEIN: &str = "weinstein";

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    validate_initial_capital(config)?;
    validate_risk_free_rate(config)?;
    liquidate_at_end(config)?;
    validate_periods_per_year(config)?;
    validate_dates(config)?;
    validate_data_dir(config)?;
    validate_symbols(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    match strategy_type(config)?.as_str() {
        STRATEGY_SMA_CROSSOVER => {
            let short = required_window(config, "short_window")?;
            let long = required_window(config, "long_window")?;
            if short >= long {
                return Err(BacktestError::configuration(format!(
                    "short_window ({}) must be less than long_window ({})",
                    short, long
                )));
            }
        }
        STRATEGY_WEINSTEIN => {
            optional_positive_int(config, "ma_window")?;
            optional_positive_int(config, "slope_lag")?;
            optional_positive_int(config, "bars_per_week")?;
        }
        other => {
            return Err(invalid(
                "strategy",
                "type",
                format!(
                    "unknown strategy '{}', expected {} or {}",
                    other, STRATEGY_SMA_CROSSOVER, STRATEGY_WEINSTEIN
                ),
            ));
        }
    }
    Ok(())
}

/// Lower-cased `[strategy] type`.
pub fn strategy_type(config: &dyn ConfigPort) -> Result<String, BacktestError> {
    match config.get_string("strategy", "type") {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_lowercase()),
        _ => Err(BacktestError::ConfigMissing {
            section: "strategy".to_string(),
            key: "type".to_string(),
        }),
    }
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> BacktestError {
    BacktestError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    initial_capital(config).map(|_| ())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    risk_free_rate(config).map(|_| ())
}

/// `[backtest] initial_capital`, default 1.0. Must be a positive number.
pub fn initial_capital(config: &dyn ConfigPort) -> Result<f64, BacktestError> {
    let Some(raw) = config.get_string("backtest", "initial_capital") else {
        return Ok(1.0);
    };
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(invalid(
            "backtest",
            "initial_capital",
            format!("initial_capital must be a positive number, got '{}'", raw.trim()),
        )),
    }
}

/// `[backtest] risk_free_rate`, default 0.0. Must be a fraction in [0, 1).
pub fn risk_free_rate(config: &dyn ConfigPort) -> Result<f64, BacktestError> {
    let Some(raw) = config.get_string("backtest", "risk_free_rate") else {
        return Ok(0.0);
    };
    match raw.trim().parse::<f64>() {
        Ok(v) if (0.0..1.0).contains(&v) => Ok(v),
        _ => Err(invalid(
            "backtest",
            "risk_free_rate",
            format!(
                "risk_free_rate must be a number between 0 and 1, got '{}'",
                raw.trim()
            ),
        )),
    }
}

/// `[backtest] liquidate_at_end`, default false.
pub fn liquidate_at_end(config: &dyn ConfigPort) -> Result<bool, BacktestError> {
    let Some(raw) = config.get_string("backtest", "liquidate_at_end") else {
        return Ok(false);
    };
    parse_bool(&raw).ok_or_else(|| {
        invalid(
            "backtest",
            "liquidate_at_end",
            format!("liquidate_at_end must be true or false, got '{}'", raw.trim()),
        )
    })
}

pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

fn validate_periods_per_year(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let Some(raw) = config.get_string("backtest", "periods_per_year") else {
        return Ok(());
    };
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(()),
        _ => Err(invalid(
            "backtest",
            "periods_per_year",
            "periods_per_year must be a positive number",
        )),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let start_str = config.get_string("backtest", "start_date");
    let end_str = config.get_string("backtest", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date >= end_date {
        return Err(invalid(
            "backtest",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, BacktestError> {
    match value {
        None => Err(BacktestError::ConfigMissing {
            section: "backtest".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            invalid(
                "backtest",
                field,
                format!("invalid {} format, expected YYYY-MM-DD", field),
            )
        }),
    }
}

fn validate_data_dir(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    match config.get_string("backtest", "data_dir") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(BacktestError::ConfigMissing {
            section: "backtest".to_string(),
            key: "data_dir".to_string(),
        }),
    }
}

fn validate_symbols(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let symbols = config.get_string("backtest", "symbols");
    let symbol = config.get_string("backtest", "symbol");

    match (symbols, symbol) {
        (Some(s), _) if !s.trim().is_empty() => Ok(()),
        (_, Some(s)) if !s.trim().is_empty() => Ok(()),
        _ => Err(BacktestError::ConfigMissing {
            section: "backtest".to_string(),
            key: "symbol".to_string(),
        }),
    }
}

fn required_window(config: &dyn ConfigPort, key: &str) -> Result<usize, BacktestError> {
    let raw = config
        .get_string("strategy", key)
        .ok_or_else(|| BacktestError::ConfigMissing {
            section: "strategy".to_string(),
            key: key.to_string(),
        })?;
    let value = parse_positive_int(&raw, key)?;
    if value < 2 {
        return Err(BacktestError::configuration(format!(
            "{} must be at least 2, got {}",
            key, value
        )));
    }
    Ok(value)
}

fn optional_positive_int(config: &dyn ConfigPort, key: &str) -> Result<(), BacktestError> {
    match config.get_string("strategy", key) {
        Some(raw) => parse_positive_int(&raw, key).map(|_| ()),
        None => Ok(()),
    }
}

pub fn parse_positive_int(raw: &str, key: &str) -> Result<usize, BacktestError> {
    match raw.trim().parse::<usize>() {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(invalid(
            "strategy",
            key,
            format!("{} must be a positive integer, got '{}'", key, raw.trim()),
        )),
    }
}
