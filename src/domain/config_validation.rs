//! Configuration validation and typed config construction.
//!
//! Raw INI values are read through `ConfigPort` as strings so that a present
//! but malformed value is an error rather than a silent fallback to the
//! default. Every builder returns a fresh, validated value.

use std::path::PathBuf;

use chrono::NaiveDate;

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::TraderError;
use crate::domain::strategy::{Preset, StrategyId, StrategyParams};
use crate::domain::sweep::SweepGrid;
use crate::ports::config_port::ConfigPort;

const BACKTEST: &str = "backtest";
const STRATEGY: &str = "strategy";
const DATA: &str = "data";
const SWEEP: &str = "sweep";

pub const DEFAULT_SEED: u64 = 42;

const KNOWN_KEYS: [(&str, &[&str]); 4] = [
    (
        BACKTEST,
        &[
            "starting_balance",
            "position_fraction",
            "stop_loss",
            "take_profit",
            "minimum_order_amount",
            "warmup_bars",
            "slippage_enabled",
        ],
    ),
    (
        STRATEGY,
        &[
            "id",
            "rsi_period",
            "rsi_oversold",
            "rsi_overbought",
            "macd_fast",
            "macd_slow",
            "macd_signal",
            "seed",
        ],
    ),
    (DATA, &["path", "start", "end"]),
    (
        SWEEP,
        &[
            "starting_balance",
            "rsi_oversold",
            "position_fraction",
            "stop_loss",
            "take_profit",
            "min_trades",
        ],
    ),
];

/// Where to read bars from and which dates to keep.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSettings {
    pub path: PathBuf,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Checks every section a backtest run needs.
pub fn validate_config(config: &dyn ConfigPort) -> Result<(), TraderError> {
    let id = strategy_id_from(config)?;
    strategy_params_from(config)?;
    seed_from(config)?;
    backtest_config_from(config, &id.preset())?;
    data_settings_from(config)?;
    Ok(())
}

/// Keys in the known sections that nothing reads, as `section.key`.
/// Usually a typo.
pub fn unknown_keys(config: &dyn ConfigPort) -> Vec<String> {
    KNOWN_KEYS
        .iter()
        .flat_map(|(section, known)| {
            config
                .keys(section)
                .into_iter()
                .filter(move |key| !known.contains(&key.as_str()))
                .map(move |key| format!("{section}.{key}"))
        })
        .collect()
}

/// `[strategy] id`, as a number or a slug.
pub fn strategy_id_from(config: &dyn ConfigPort) -> Result<StrategyId, TraderError> {
    match read_str(config, STRATEGY, "id") {
        Some(raw) => raw.parse(),
        None => Err(TraderError::ConfigMissing {
            section: STRATEGY.to_string(),
            key: "id".to_string(),
        }),
    }
}

pub fn seed_from(config: &dyn ConfigPort) -> Result<u64, TraderError> {
    Ok(read_parsed::<u64>(config, STRATEGY, "seed", "a non-negative integer")?
        .unwrap_or(DEFAULT_SEED))
}

pub fn strategy_params_from(config: &dyn ConfigPort) -> Result<StrategyParams, TraderError> {
    let d = StrategyParams::default();
    let params = StrategyParams {
        rsi_period: read_usize(config, STRATEGY, "rsi_period")?.unwrap_or(d.rsi_period),
        rsi_oversold: read_f64(config, STRATEGY, "rsi_oversold")?.unwrap_or(d.rsi_oversold),
        rsi_overbought: read_f64(config, STRATEGY, "rsi_overbought")?
            .unwrap_or(d.rsi_overbought),
        macd_fast: read_usize(config, STRATEGY, "macd_fast")?.unwrap_or(d.macd_fast),
        macd_slow: read_usize(config, STRATEGY, "macd_slow")?.unwrap_or(d.macd_slow),
        macd_signal: read_usize(config, STRATEGY, "macd_signal")?.unwrap_or(d.macd_signal),
    };
    validate_params(&params)?;
    Ok(params)
}

fn validate_params(params: &StrategyParams) -> Result<(), TraderError> {
    for (key, period) in [
        ("rsi_period", params.rsi_period),
        ("macd_fast", params.macd_fast),
        ("macd_slow", params.macd_slow),
        ("macd_signal", params.macd_signal),
    ] {
        if period == 0 {
            return Err(TraderError::invalid(STRATEGY, key, "period must be at least 1"));
        }
    }
    if params.macd_fast >= params.macd_slow {
        return Err(TraderError::invalid(
            STRATEGY,
            "macd_fast",
            "macd_fast must be shorter than macd_slow",
        ));
    }
    for (key, level) in [
        ("rsi_oversold", params.rsi_oversold),
        ("rsi_overbought", params.rsi_overbought),
    ] {
        if !(0.0..=100.0).contains(&level) {
            return Err(TraderError::invalid(STRATEGY, key, "must be between 0 and 100"));
        }
    }
    if params.rsi_oversold >= params.rsi_overbought {
        return Err(TraderError::invalid(
            STRATEGY,
            "rsi_oversold",
            "rsi_oversold must be below rsi_overbought",
        ));
    }
    Ok(())
}

/// `[backtest]` over the preset's recommended stop-loss and take-profit.
pub fn backtest_config_from(
    config: &dyn ConfigPort,
    preset: &Preset,
) -> Result<BacktestConfig, TraderError> {
    let d = BacktestConfig::from_preset(preset);
    let built = BacktestConfig {
        starting_balance: read_f64(config, BACKTEST, "starting_balance")?
            .unwrap_or(d.starting_balance),
        position_fraction: read_f64(config, BACKTEST, "position_fraction")?
            .unwrap_or(d.position_fraction),
        stop_loss: read_f64(config, BACKTEST, "stop_loss")?.unwrap_or(d.stop_loss),
        take_profit: read_f64(config, BACKTEST, "take_profit")?.unwrap_or(d.take_profit),
        minimum_order_amount: read_f64(config, BACKTEST, "minimum_order_amount")?
            .unwrap_or(d.minimum_order_amount),
        warmup_bars: read_usize(config, BACKTEST, "warmup_bars")?.unwrap_or(d.warmup_bars),
        slippage_enabled: read_bool(config, BACKTEST, "slippage_enabled")?
            .unwrap_or(d.slippage_enabled),
    };
    built.validate()?;
    Ok(built)
}

pub fn data_settings_from(config: &dyn ConfigPort) -> Result<DataSettings, TraderError> {
    let path = read_str(config, DATA, "path").ok_or_else(|| TraderError::ConfigMissing {
        section: DATA.to_string(),
        key: "path".to_string(),
    })?;
    let start = read_date(config, DATA, "start")?;
    let end = read_date(config, DATA, "end")?;

    if let (Some(s), Some(e)) = (start, end) {
        if s > e {
            return Err(TraderError::invalid(DATA, "start", "start must not be after end"));
        }
    }

    Ok(DataSettings {
        path: PathBuf::from(path),
        start,
        end,
    })
}

/// `[sweep]` axes as comma-separated lists. A missing axis sweeps only the
/// base value.
pub fn sweep_grid_from(
    config: &dyn ConfigPort,
    params: &StrategyParams,
    base: &BacktestConfig,
) -> Result<SweepGrid, TraderError> {
    let single = SweepGrid::single(params, base);
    Ok(SweepGrid {
        starting_balance: read_list(config, SWEEP, "starting_balance")?
            .unwrap_or(single.starting_balance),
        rsi_oversold: read_list(config, SWEEP, "rsi_oversold")?.unwrap_or(single.rsi_oversold),
        position_fraction: read_list(config, SWEEP, "position_fraction")?
            .unwrap_or(single.position_fraction),
        stop_loss: read_list(config, SWEEP, "stop_loss")?.unwrap_or(single.stop_loss),
        take_profit: read_list(config, SWEEP, "take_profit")?.unwrap_or(single.take_profit),
    })
}

pub fn sweep_min_trades_from(config: &dyn ConfigPort) -> Result<Option<usize>, TraderError> {
    read_usize(config, SWEEP, "min_trades")
}

fn read_str(config: &dyn ConfigPort, section: &str, key: &str) -> Option<String> {
    config
        .get_string(section, key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn read_parsed<T: std::str::FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    expected: &str,
) -> Result<Option<T>, TraderError> {
    match read_str(config, section, key) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| TraderError::invalid(section, key, format!("expected {expected}, got '{raw}'"))),
    }
}

fn read_f64(config: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<f64>, TraderError> {
    match read_parsed::<f64>(config, section, key, "a number")? {
        Some(v) if !v.is_finite() => Err(TraderError::invalid(section, key, "must be finite")),
        other => Ok(other),
    }
}

fn read_usize(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<usize>, TraderError> {
    read_parsed(config, section, key, "a non-negative integer")
}

fn read_bool(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<bool>, TraderError> {
    match read_str(config, section, key) {
        None => Ok(None),
        Some(raw) => match raw.to_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(Some(true)),
            "false" | "no" | "0" => Ok(Some(false)),
            _ => Err(TraderError::invalid(
                section,
                key,
                format!("expected true/false, got '{raw}'"),
            )),
        },
    }
}

fn read_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<NaiveDate>, TraderError> {
    match read_str(config, section, key) {
        None => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                TraderError::invalid(section, key, "invalid date format, expected YYYY-MM-DD")
            }),
    }
}

fn read_list(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<Vec<f64>>, TraderError> {
    let Some(raw) = read_str(config, section, key) else {
        return Ok(None);
    };
    raw.split(',')
        .map(|item| {
            let item = item.trim();
            item.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| {
                    TraderError::invalid(section, key, format!("'{item}' is not a number"))
                })
        })
        .collect::<Result<Vec<f64>, TraderError>>()
        .map(Some)
}
