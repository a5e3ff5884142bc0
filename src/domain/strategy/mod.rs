//! Strategy contract, shared decision helpers and the concrete variants.
//!
//! A strategy reads an indicator-augmented prefix of bars (never anything
//! past the current bar) and returns a [`Signal`]. Position state is owned by
//! the simulation loop, not by strategies.

pub mod control;
pub mod registry;
pub mod reversion;
pub mod trend;

pub use control::{AlwaysBuy, RandomMonkey};
pub use registry::{Interval, Preset, StrategyId, build_strategy};
pub use reversion::{BuyTheDip, Contrarian, MeanReversion, Scalping};
pub use trend::{MacdOnly, Momentum, MoonShot, TrendFollowing};

use crate::domain::indicator::{IndicatorSettings, attach_standard_indicators};
use crate::domain::ohlcv::Bar;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy => write!(f, "buy"),
            Signal::Sell => write!(f, "sell"),
            Signal::Hold => write!(f, "hold"),
        }
    }
}

pub trait Strategy {
    fn name(&self) -> &str;

    /// Periods used by the default indicator provider.
    fn indicator_settings(&self) -> IndicatorSettings {
        IndicatorSettings::default()
    }

    /// Returns the series with indicator columns attached.
    fn compute_indicators(&self, bars: Vec<Bar>) -> Vec<Bar> {
        attach_standard_indicators(bars, &self.indicator_settings())
    }

    /// Decision for the last bar of `prefix`. Prefixes shorter than the
    /// strategy's lookback yield `Hold`.
    fn signal(&mut self, prefix: &[Bar]) -> Signal;
}

/// Tunable parameters shared by the indicator-driven strategies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyParams {
    pub rsi_period: usize,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
}

impl Default for StrategyParams {
    fn default() -> Self {
        let ind = IndicatorSettings::default();
        StrategyParams {
            rsi_period: ind.rsi_period,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            macd_fast: ind.macd_fast,
            macd_slow: ind.macd_slow,
            macd_signal: ind.macd_signal,
        }
    }
}

impl StrategyParams {
    pub fn indicator_settings(&self) -> IndicatorSettings {
        IndicatorSettings {
            rsi_period: self.rsi_period,
            macd_fast: self.macd_fast,
            macd_slow: self.macd_slow,
            macd_signal: self.macd_signal,
            ..IndicatorSettings::default()
        }
    }
}

/// Named boolean sub-conditions evaluated independently, then counted
/// against a quorum.
#[derive(Debug, Default, Clone)]
pub struct Conditions {
    hits: Vec<&'static str>,
}

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, name: &'static str, hit: bool) -> &mut Self {
        if hit {
            self.hits.push(name);
        }
        self
    }

    pub fn count(&self) -> usize {
        self.hits.len()
    }

    pub fn has(&self, name: &str) -> bool {
        self.hits.contains(&name)
    }

    pub fn meets(&self, quorum: usize) -> bool {
        self.count() >= quorum
    }

    pub fn hits(&self) -> &[&'static str] {
        &self.hits
    }
}

/// Resolves two independently decided sides. Both firing is a conflict and
/// resolves to `Hold`.
pub fn resolve(buy: bool, sell: bool) -> Signal {
    match (buy, sell) {
        (true, false) => Signal::Buy,
        (false, true) => Signal::Sell,
        _ => Signal::Hold,
    }
}

/// Indicator column as a number; undefined columns become NaN so that every
/// comparison against them is false.
pub(crate) fn col(value: Option<f64>) -> f64 {
    value.unwrap_or(f64::NAN)
}

pub(crate) fn crossed_above(left: f64, right: f64, prev_left: f64, prev_right: f64) -> bool {
    left > right && prev_left <= prev_right
}

pub(crate) fn crossed_below(left: f64, right: f64, prev_left: f64, prev_right: f64) -> bool {
    left < right && prev_left >= prev_right
}

/// Last two bars of the prefix as `(previous, current)`.
pub(crate) fn last_two(prefix: &[Bar]) -> Option<(&Bar, &Bar)> {
    match prefix {
        [.., prev, cur] => Some((prev, cur)),
        _ => None,
    }
}

/// Mean volume over the last `window` bars of the prefix, current bar included.
pub(crate) fn average_volume(prefix: &[Bar], window: usize) -> f64 {
    let tail = &prefix[prefix.len().saturating_sub(window)..];
    if tail.is_empty() {
        return f64::NAN;
    }
    tail.iter().map(|b| b.volume).sum::<f64>() / tail.len() as f64
}
