//! CLI integration tests for command orchestration.
//!
//! Tests cover:
//! - Config parsing (build_backtest_config, build_strategy, resolve_date_range)
//! - Symbol resolution logic (resolve_symbols)
//! - Validate, dry-run, backtest and risk-reward commands with real INI and CSV files on disk
//! - Exit codes for config, data and insufficient-data failures

mod common;

use common::*;
use stagetrader::adapters::file_config_adapter::FileConfigAdapter;
use stagetrader::cli::{self, Cli, Command};
use stagetrader::domain::error::BacktestError;
use stagetrader::domain::strategy::Strategy;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tempfile::TempDir;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn same_code(actual: ExitCode, expected: u8) -> bool {
    format!("{:?}", actual) == format!("{:?}", ExitCode::from(expected))
}

fn is_success(code: ExitCode) -> bool {
    format!("{:?}", code) == format!("{:?}", ExitCode::SUCCESS)
}

/// Writes `<SYMBOL>.csv` files into a fresh data directory.
fn data_dir(files: &[(&str, Vec<f64>)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (symbol, prices) in files {
        std::fs::write(
            dir.path().join(format!("{symbol}.csv")),
            price_csv(&daily_bars(prices)),
        )
        .unwrap();
    }
    dir
}

fn sma_ini(data_dir: &Path, symbols: &str) -> String {
    format!(
        r#"
[backtest]
symbols = {symbols}
start_date = 2024-01-01
end_date = 2024-12-31
data_dir = {}
initial_capital = 10000

[strategy]
type = sma_crossover
short_window = 5
long_window = 20
"#,
        data_dir.display()
    )
}

const VALID_INI: &str = r#"
[backtest]
symbol = NVDA
start_date = 2020-01-01
end_date = 2024-12-31
data_dir = /tmp/prices
initial_capital = 10000.0
risk_free_rate = 0.02
liquidate_at_end = true

[strategy]
type = weinstein
ma_window = 30
slope_lag = 2
bars_per_week = 5
"#;

mod config_loading {
    use super::*;

    #[test]
    fn build_backtest_config_valid_full() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let config = cli::build_backtest_config(&adapter).unwrap();

        assert_eq!(
            config.strategy,
            Strategy::Weinstein {
                ma_window: 30,
                slope_lag: 2,
                bars_per_week: 5
            }
        );
        assert!((config.initial_capital - 10_000.0).abs() < f64::EPSILON);
        assert!((config.risk_free_rate - 0.02).abs() < f64::EPSILON);
        assert!(config.liquidate_at_end);
        assert_eq!(config.periods_per_year, None);
    }

    #[test]
    fn build_backtest_config_rejects_bad_periods() {
        let ini = VALID_INI.replace(
            "liquidate_at_end = true",
            "liquidate_at_end = true\nperiods_per_year = daily",
        );
        let adapter = FileConfigAdapter::from_string(&ini).unwrap();
        let err = cli::build_backtest_config(&adapter).unwrap_err();
        assert!(matches!(err, BacktestError::ConfigInvalid { key, .. } if key == "periods_per_year"));
    }

    #[test]
    fn build_strategy_unknown_type() {
        let adapter = FileConfigAdapter::from_string("[strategy]\ntype = turtle\n").unwrap();
        let err = cli::build_strategy(&adapter).unwrap_err();
        assert!(matches!(err, BacktestError::ConfigInvalid { key, .. } if key == "type"));
    }

    #[test]
    fn resolve_date_range_reads_backtest_section() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let (start, end) = cli::resolve_date_range(&adapter).unwrap();
        assert_eq!(start, date(2020, 1, 1));
        assert_eq!(end, date(2024, 12, 31));
    }

    #[test]
    fn resolve_symbols_splits_and_uppercases() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\nsymbols = nvda, , spy ,tsla\n").unwrap();
        assert_eq!(
            cli::resolve_symbols(None, &adapter),
            vec!["NVDA", "SPY", "TSLA"]
        );
        assert_eq!(cli::resolve_symbols(Some("amzn,msft"), &adapter), vec!["AMZN", "MSFT"]);
    }
}

mod commands {
    use super::*;

    fn run(command: Command) -> ExitCode {
        cli::run(Cli { command })
    }

    #[test]
    fn validate_accepts_valid_config() {
        let file = write_temp_ini(VALID_INI);
        let code = run(Command::Validate {
            config: file.path().to_path_buf(),
        });
        assert!(is_success(code));
    }

    #[test]
    fn validate_reports_config_exit_code() {
        let file = write_temp_ini(&VALID_INI.replace("slope_lag = 2", "slope_lag = 0"));
        let code = run(Command::Validate {
            config: file.path().to_path_buf(),
        });
        assert!(same_code(code, 2));
    }

    #[test]
    fn missing_config_file_is_config_error() {
        let code = run(Command::Validate {
            config: PathBuf::from("/nonexistent/stagetrader.ini"),
        });
        assert!(same_code(code, 2));
    }

    #[test]
    fn dry_run_does_not_need_data() {
        let file = write_temp_ini(VALID_INI);
        let code = run(Command::Backtest {
            config: file.path().to_path_buf(),
            symbol: None,
            output: None,
            dry_run: true,
        });
        assert!(is_success(code));
    }

    #[test]
    fn backtest_writes_reports_per_symbol() {
        let data = data_dir(&[
            ("NVDA", compounding_prices(60, 0.01)),
            ("SPY", compounding_prices(60, -0.002)),
        ]);
        let out = TempDir::new().unwrap();
        let file = write_temp_ini(&sma_ini(data.path(), "NVDA,SPY"));

        let code = run(Command::Backtest {
            config: file.path().to_path_buf(),
            symbol: None,
            output: Some(out.path().to_path_buf()),
            dry_run: false,
        });

        assert!(is_success(code));
        for name in ["NVDA_equity.csv", "NVDA_trades.csv", "SPY_equity.csv", "SPY_metrics.csv"] {
            assert!(out.path().join(name).exists(), "missing {name}");
        }
    }

    #[test]
    fn backtest_symbol_override() {
        let data = data_dir(&[("TSLA", compounding_prices(60, 0.01))]);
        let out = TempDir::new().unwrap();
        let file = write_temp_ini(&sma_ini(data.path(), "NVDA"));

        let code = run(Command::Backtest {
            config: file.path().to_path_buf(),
            symbol: Some("tsla".into()),
            output: Some(out.path().to_path_buf()),
            dry_run: false,
        });

        assert!(is_success(code));
        assert!(out.path().join("TSLA_equity.csv").exists());
    }

    #[test]
    fn lower_case_data_file_matches_symbol() {
        let data = TempDir::new().unwrap();
        std::fs::write(
            data.path().join("nvda.csv"),
            price_csv(&daily_bars(&compounding_prices(60, 0.01))),
        )
        .unwrap();
        let out = TempDir::new().unwrap();
        let file = write_temp_ini(&sma_ini(data.path(), "NVDA"));

        let code = run(Command::Backtest {
            config: file.path().to_path_buf(),
            symbol: Some("nvda".into()),
            output: Some(out.path().to_path_buf()),
            dry_run: false,
        });

        assert!(is_success(code));
        assert!(out.path().join("NVDA_equity.csv").exists());
    }

    #[test]
    fn malformed_risk_free_rate_exits_with_config_code() {
        let file = write_temp_ini(&VALID_INI.replace("risk_free_rate = 0.02", "risk_free_rate = 5%"));
        let code = run(Command::Validate {
            config: file.path().to_path_buf(),
        });
        assert!(same_code(code, 2));
    }

    #[test]
    fn backtest_missing_data_exits_with_data_code() {
        let data = data_dir(&[]);
        let file = write_temp_ini(&sma_ini(data.path(), "NOPE"));

        let code = run(Command::Backtest {
            config: file.path().to_path_buf(),
            symbol: None,
            output: None,
            dry_run: false,
        });
        assert!(same_code(code, 5));
    }

    #[test]
    fn weinstein_on_short_history_exits_with_data_code() {
        let data = data_dir(&[("NVDA", compounding_prices(100, 0.01))]);
        let ini = VALID_INI.replace("/tmp/prices", &data.path().display().to_string());
        let file = write_temp_ini(&ini);

        let code = run(Command::Backtest {
            config: file.path().to_path_buf(),
            symbol: None,
            output: None,
            dry_run: false,
        });
        assert!(same_code(code, 5));
    }

    #[test]
    fn risk_reward_reads_all_symbols() {
        let data = data_dir(&[
            ("AMZN", vec![100.0, 101.0, 103.0, 102.0, 104.0]),
            ("NVDA", vec![100.0, 110.0, 95.0, 120.0, 105.0]),
        ]);
        let file = write_temp_ini(&sma_ini(data.path(), "AMZN"));

        let code = run(Command::RiskReward {
            config: file.path().to_path_buf(),
            symbols: None,
            all: true,
        });
        assert!(is_success(code));
    }

    #[test]
    fn risk_reward_single_bar_is_degenerate() {
        let data = data_dir(&[("ONE", vec![100.0])]);
        let file = write_temp_ini(&sma_ini(data.path(), "ONE"));

        let code = run(Command::RiskReward {
            config: file.path().to_path_buf(),
            symbols: None,
            all: false,
        });
        assert!(same_code(code, 4));
    }
}
