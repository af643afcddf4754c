//! Core domain types and logic: price data, signal generation, simulation, metrics.

pub mod error;
pub mod price_series;
pub mod indicator;
pub mod signal;
pub mod stage;
pub mod sma_crossover;
pub mod weinstein;
pub mod strategy;
pub mod trade;
pub mod equity;
pub mod simulator;
pub mod metrics;
pub mod backtest;
pub mod risk_reward;
pub mod config_validation;
