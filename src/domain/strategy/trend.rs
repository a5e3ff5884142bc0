//! Strategies that follow strength: crosses, momentum and breakouts.

use crate::domain::indicator::IndicatorSettings;
use crate::domain::ohlcv::Bar;
use crate::domain::strategy::{
    Conditions, Signal, Strategy, StrategyParams, average_volume, col, crossed_above,
    crossed_below, last_two, resolve,
};

const VOLUME_WINDOW: usize = 20;

fn last_two_of_three(prefix: &[Bar]) -> Option<(&Bar, &Bar)> {
    if prefix.len() < 3 {
        return None;
    }
    last_two(prefix)
}

/// Golden-cross trend rider.
///
/// Buys when the 5/20 golden cross or a close back above MA20 is confirmed
/// by one more condition, or when any three conditions agree. Sells on the
/// 5/20 dead cross or a close back below MA20.
#[derive(Debug, Clone)]
pub struct TrendFollowing {
    params: StrategyParams,
}

impl TrendFollowing {
    pub fn new(params: StrategyParams) -> Self {
        TrendFollowing { params }
    }
}

impl Strategy for TrendFollowing {
    fn name(&self) -> &str {
        "Trend Following"
    }

    fn indicator_settings(&self) -> IndicatorSettings {
        self.params.indicator_settings()
    }

    fn signal(&mut self, prefix: &[Bar]) -> Signal {
        let Some((prev, cur)) = last_two_of_three(prefix) else {
            return Signal::Hold;
        };
        let (p, c) = (&prev.indicators, &cur.indicators);

        let mut buys = Conditions::new();
        buys.check(
            "golden_cross",
            crossed_above(col(c.ma_5), col(c.ma_20), col(p.ma_5), col(p.ma_20)),
        )
        .check("uptrend", col(c.ma_20) > col(c.ma_60))
        .check(
            "macd_golden",
            crossed_above(col(c.macd), col(c.macd_signal), col(p.macd), col(p.macd_signal)),
        )
        .check(
            "ma20_support",
            crossed_above(cur.close, col(c.ma_20), prev.close, col(p.ma_20)),
        )
        .check("volume_surge", cur.volume > prev.volume * 1.3);

        let dead_cross = crossed_below(col(c.ma_5), col(c.ma_20), col(p.ma_5), col(p.ma_20));
        let ma20_breakdown = crossed_below(cur.close, col(c.ma_20), prev.close, col(p.ma_20));

        let confirmed = (buys.has("golden_cross") || buys.has("ma20_support")) && buys.meets(2);
        resolve(confirmed || buys.meets(3), dead_cross || ma20_breakdown)
    }
}

/// MACD line crossing its signal line, nothing else.
#[derive(Debug, Clone)]
pub struct MacdOnly {
    params: StrategyParams,
}

impl MacdOnly {
    pub fn new(params: StrategyParams) -> Self {
        MacdOnly { params }
    }
}

impl Strategy for MacdOnly {
    fn name(&self) -> &str {
        "MACD Only"
    }

    fn indicator_settings(&self) -> IndicatorSettings {
        self.params.indicator_settings()
    }

    fn signal(&mut self, prefix: &[Bar]) -> Signal {
        let Some((prev, cur)) = last_two(prefix) else {
            return Signal::Hold;
        };
        let (p, c) = (&prev.indicators, &cur.indicators);
        let lines = (col(c.macd), col(c.macd_signal), col(p.macd), col(p.macd_signal));
        if crossed_above(lines.0, lines.1, lines.2, lines.3) {
            Signal::Buy
        } else if crossed_below(lines.0, lines.1, lines.2, lines.3) {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }
}

/// Volume explosion with rising price and RSI.
#[derive(Debug, Clone)]
pub struct Momentum {
    params: StrategyParams,
}

impl Momentum {
    pub fn new(params: StrategyParams) -> Self {
        Momentum { params }
    }
}

impl Strategy for Momentum {
    fn name(&self) -> &str {
        "Momentum"
    }

    fn indicator_settings(&self) -> IndicatorSettings {
        self.params.indicator_settings()
    }

    fn signal(&mut self, prefix: &[Bar]) -> Signal {
        let Some((prev, cur)) = last_two_of_three(prefix) else {
            return Signal::Hold;
        };
        let avg_volume = average_volume(prefix, VOLUME_WINDOW);
        let (rsi, prev_rsi) = (col(cur.indicators.rsi), col(prev.indicators.rsi));

        if cur.volume > avg_volume * 2.0 && cur.close > prev.close && rsi > prev_rsi {
            Signal::Buy
        } else if cur.volume < avg_volume * 0.5 || rsi > 75.0 {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }
}

/// Chases bars already up more than 3% on heavy volume with strong RSI.
#[derive(Debug, Clone)]
pub struct MoonShot {
    params: StrategyParams,
}

impl MoonShot {
    pub fn new(params: StrategyParams) -> Self {
        MoonShot { params }
    }
}

impl Strategy for MoonShot {
    fn name(&self) -> &str {
        "Moon Shot"
    }

    fn indicator_settings(&self) -> IndicatorSettings {
        self.params.indicator_settings()
    }

    fn signal(&mut self, prefix: &[Bar]) -> Signal {
        let Some((prev, cur)) = last_two_of_three(prefix) else {
            return Signal::Hold;
        };
        let avg_volume = average_volume(prefix, VOLUME_WINDOW);
        let change = cur.change_pct(prev);
        let rsi = col(cur.indicators.rsi);

        if change > 3.0 && cur.volume > avg_volume * 1.5 && rsi > 60.0 {
            Signal::Buy
        } else if change < -2.0 || rsi < 50.0 {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }
}
