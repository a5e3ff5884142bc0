//! Strategies that buy weakness and sell recovery.

use tracing::trace;

use crate::domain::indicator::IndicatorSettings;
use crate::domain::ohlcv::Bar;
use crate::domain::strategy::{
    Conditions, Signal, Strategy, StrategyParams, col, crossed_below, last_two, resolve,
};

const QUORUM: usize = 2;

/// RSI oversold rebound near the lower Bollinger band.
///
/// Buy on at least two of: RSI below the oversold level; close under MA20
/// while MACD rises; close within 10% above the lower band; price falling
/// while RSI rises below `oversold + 15`. Sell on at least two of: RSI above
/// the overbought level; MACD dead cross; close above the upper band.
#[derive(Debug, Clone)]
pub struct MeanReversion {
    params: StrategyParams,
}

impl MeanReversion {
    pub fn new(params: StrategyParams) -> Self {
        MeanReversion { params }
    }

    fn buy_conditions(&self, prev: &Bar, cur: &Bar) -> Conditions {
        let (p, c) = (&prev.indicators, &cur.indicators);
        let oversold = self.params.rsi_oversold;
        let mut conds = Conditions::new();
        conds
            .check("rsi_oversold", col(c.rsi) < oversold)
            .check(
                "below_ma20_macd_rising",
                cur.close < col(c.ma_20) && col(c.macd) > col(p.macd),
            )
            .check("near_bb_lower", cur.close < col(c.bb_lower) * 1.10)
            .check(
                "rsi_divergence",
                cur.close < prev.close && col(c.rsi) > col(p.rsi) && col(c.rsi) < oversold + 15.0,
            );
        conds
    }

    fn sell_conditions(&self, prev: &Bar, cur: &Bar) -> Conditions {
        let (p, c) = (&prev.indicators, &cur.indicators);
        let mut conds = Conditions::new();
        conds
            .check("rsi_overbought", col(c.rsi) > self.params.rsi_overbought)
            .check(
                "macd_dead_cross",
                crossed_below(col(c.macd), col(c.macd_signal), col(p.macd), col(p.macd_signal)),
            )
            .check("bb_upper_break", cur.close > col(c.bb_upper));
        conds
    }
}

impl Strategy for MeanReversion {
    fn name(&self) -> &str {
        "Mean Reversion"
    }

    fn indicator_settings(&self) -> IndicatorSettings {
        self.params.indicator_settings()
    }

    fn signal(&mut self, prefix: &[Bar]) -> Signal {
        let Some((prev, cur)) = last_two(prefix) else {
            return Signal::Hold;
        };
        let buys = self.buy_conditions(prev, cur);
        let sells = self.sell_conditions(prev, cur);
        trace!(buy = ?buys.hits(), sell = ?sells.hits(), "mean reversion conditions");
        resolve(buys.meets(QUORUM), sells.meets(QUORUM))
    }
}

/// Lower-band touch with weak RSI; exits at the middle band or neutral RSI.
#[derive(Debug, Clone)]
pub struct Scalping {
    params: StrategyParams,
}

impl Scalping {
    pub fn new(params: StrategyParams) -> Self {
        Scalping { params }
    }
}

impl Strategy for Scalping {
    fn name(&self) -> &str {
        "Scalping"
    }

    fn indicator_settings(&self) -> IndicatorSettings {
        self.params.indicator_settings()
    }

    fn signal(&mut self, prefix: &[Bar]) -> Signal {
        let Some((_, cur)) = last_two(prefix) else {
            return Signal::Hold;
        };
        let ind = &cur.indicators;
        if cur.close <= col(ind.bb_lower) && col(ind.rsi) < 35.0 {
            Signal::Buy
        } else if cur.close >= col(ind.bb_middle) || col(ind.rsi) > 55.0 {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }
}

/// Buys only extreme fear: RSI under 20 or close 10% below the lower band.
#[derive(Debug, Clone)]
pub struct Contrarian {
    params: StrategyParams,
}

impl Contrarian {
    pub fn new(params: StrategyParams) -> Self {
        Contrarian { params }
    }
}

impl Strategy for Contrarian {
    fn name(&self) -> &str {
        "Contrarian"
    }

    fn indicator_settings(&self) -> IndicatorSettings {
        self.params.indicator_settings()
    }

    fn signal(&mut self, prefix: &[Bar]) -> Signal {
        let Some((_, cur)) = last_two(prefix) else {
            return Signal::Hold;
        };
        let ind = &cur.indicators;
        if col(ind.rsi) < 20.0 || cur.close < col(ind.bb_lower) * 0.90 {
            Signal::Buy
        } else if col(ind.rsi) > 50.0 {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }
}

/// Buys a one-bar drop of more than 5%, sells a one-bar rise of more than 5%.
#[derive(Debug, Clone, Default)]
pub struct BuyTheDip;

const DIP_PCT: f64 = 5.0;

impl Strategy for BuyTheDip {
    fn name(&self) -> &str {
        "Buy The Dip"
    }

    fn signal(&mut self, prefix: &[Bar]) -> Signal {
        let Some((prev, cur)) = last_two(prefix) else {
            return Signal::Hold;
        };
        let change = cur.change_pct(prev);
        if change < -DIP_PCT {
            Signal::Buy
        } else if change > DIP_PCT {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }
}
