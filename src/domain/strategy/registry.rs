//! Strategy registry: identifiers, recommended presets and construction.

use std::fmt;
use std::str::FromStr;

use crate::domain::error::TraderError;
use crate::domain::strategy::{
    AlwaysBuy, BuyTheDip, Contrarian, MacdOnly, MeanReversion, Momentum, MoonShot, RandomMonkey,
    Scalping, Strategy, StrategyParams, TrendFollowing,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyId {
    MeanReversion,
    TrendFollowing,
    Scalping,
    MacdOnly,
    Momentum,
    Contrarian,
    Random,
    AlwaysBuy,
    BuyTheDip,
    MoonShot,
}

/// Candle interval a strategy was tuned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    Day,
    Minute60,
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interval::Day => write!(f, "day"),
            Interval::Minute60 => write!(f, "minute60"),
        }
    }
}

/// Recommended settings for a strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub interval: Interval,
}

impl StrategyId {
    pub const ALL: [StrategyId; 10] = [
        StrategyId::MeanReversion,
        StrategyId::TrendFollowing,
        StrategyId::Scalping,
        StrategyId::MacdOnly,
        StrategyId::Momentum,
        StrategyId::Contrarian,
        StrategyId::Random,
        StrategyId::AlwaysBuy,
        StrategyId::BuyTheDip,
        StrategyId::MoonShot,
    ];

    pub fn number(self) -> u8 {
        match self {
            StrategyId::MeanReversion => 1,
            StrategyId::TrendFollowing => 2,
            StrategyId::Scalping => 3,
            StrategyId::MacdOnly => 4,
            StrategyId::Momentum => 5,
            StrategyId::Contrarian => 6,
            StrategyId::Random => 7,
            StrategyId::AlwaysBuy => 8,
            StrategyId::BuyTheDip => 9,
            StrategyId::MoonShot => 10,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.number() == n)
    }

    pub fn slug(self) -> &'static str {
        match self {
            StrategyId::MeanReversion => "mean_reversion",
            StrategyId::TrendFollowing => "trend_following",
            StrategyId::Scalping => "scalping",
            StrategyId::MacdOnly => "macd_only",
            StrategyId::Momentum => "momentum",
            StrategyId::Contrarian => "contrarian",
            StrategyId::Random => "random",
            StrategyId::AlwaysBuy => "always_buy",
            StrategyId::BuyTheDip => "buy_the_dip",
            StrategyId::MoonShot => "moon_shot",
        }
    }

    pub fn preset(self) -> Preset {
        let (name, description, stop_loss, take_profit, interval) = match self {
            StrategyId::MeanReversion => (
                "Mean Reversion",
                "RSI oversold rebound near the lower band",
                0.015,
                0.07,
                Interval::Day,
            ),
            StrategyId::TrendFollowing => (
                "Trend Following",
                "ride golden crosses, exit on MA20 breakdown",
                0.02,
                0.10,
                Interval::Day,
            ),
            StrategyId::Scalping => (
                "Scalping",
                "short-term band touches",
                0.005,
                0.015,
                Interval::Minute60,
            ),
            StrategyId::MacdOnly => (
                "MACD Only",
                "MACD signal-line crosses only",
                0.02,
                0.08,
                Interval::Day,
            ),
            StrategyId::Momentum => (
                "Momentum",
                "volume explosion with rising price",
                0.03,
                0.15,
                Interval::Day,
            ),
            StrategyId::Contrarian => (
                "Contrarian",
                "buy extreme fear only",
                0.01,
                0.20,
                Interval::Day,
            ),
            StrategyId::Random => (
                "Random Monkey",
                "random control group",
                0.02,
                0.05,
                Interval::Day,
            ),
            StrategyId::AlwaysBuy => (
                "Always Buy",
                "buy whenever flat, no stop-loss",
                0.0,
                0.50,
                Interval::Day,
            ),
            StrategyId::BuyTheDip => (
                "Buy The Dip",
                "buy one-bar drops over 5%",
                0.03,
                0.12,
                Interval::Day,
            ),
            StrategyId::MoonShot => (
                "Moon Shot",
                "chase breakouts on heavy volume",
                0.05,
                0.25,
                Interval::Day,
            ),
        };
        Preset {
            name,
            description,
            stop_loss,
            take_profit,
            interval,
        }
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}

impl FromStr for StrategyId {
    type Err = TraderError;

    /// Accepts a numeric id (`1`..=`10`) or a slug (`mean_reversion`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        let found = match key.parse::<u8>() {
            Ok(n) => Self::from_number(n),
            Err(_) => {
                let slug = key.to_ascii_lowercase().replace('-', "_");
                Self::ALL.into_iter().find(|id| id.slug() == slug)
            }
        };
        found.ok_or_else(|| TraderError::UnknownStrategy { id: key.to_string() })
    }
}

/// Builds a fresh strategy instance. `seed` feeds the random control only.
pub fn build_strategy(id: StrategyId, params: &StrategyParams, seed: u64) -> Box<dyn Strategy> {
    let params = *params;
    match id {
        StrategyId::MeanReversion => Box::new(MeanReversion::new(params)),
        StrategyId::TrendFollowing => Box::new(TrendFollowing::new(params)),
        StrategyId::Scalping => Box::new(Scalping::new(params)),
        StrategyId::MacdOnly => Box::new(MacdOnly::new(params)),
        StrategyId::Momentum => Box::new(Momentum::new(params)),
        StrategyId::Contrarian => Box::new(Contrarian::new(params)),
        StrategyId::Random => Box::new(RandomMonkey::new(seed)),
        StrategyId::AlwaysBuy => Box::new(AlwaysBuy),
        StrategyId::BuyTheDip => Box::new(BuyTheDip),
        StrategyId::MoonShot => Box::new(MoonShot::new(params)),
    }
}
