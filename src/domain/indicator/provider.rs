//! Built-in indicator provider: attaches the standard columns onto bars.

use crate::domain::indicator::{
    IndicatorValue, bollinger, calculate_bollinger, calculate_macd, calculate_rsi, calculate_sma,
    macd, rsi,
};
use crate::domain::ohlcv::Bar;
use tracing::trace;

/// Periods used when attaching indicator columns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorSettings {
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bb_period: usize,
    pub bb_mult_x100: u32,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        IndicatorSettings {
            rsi_period: rsi::DEFAULT_PERIOD,
            macd_fast: macd::DEFAULT_FAST,
            macd_slow: macd::DEFAULT_SLOW,
            macd_signal: macd::DEFAULT_SIGNAL,
            bb_period: bollinger::DEFAULT_PERIOD,
            bb_mult_x100: bollinger::DEFAULT_MULT_X100,
        }
    }
}

const MA_PERIODS: [usize; 4] = [5, 20, 60, 120];

/// Computes RSI, MACD, Bollinger and the 5/20/60/120 SMAs and writes them
/// into each bar's `indicators`. Columns stay `None` through their warmup.
pub fn attach_standard_indicators(mut bars: Vec<Bar>, settings: &IndicatorSettings) -> Vec<Bar> {
    let rsi = calculate_rsi(&bars, settings.rsi_period);
    let macd = calculate_macd(
        &bars,
        settings.macd_fast,
        settings.macd_slow,
        settings.macd_signal,
    );
    let bands = calculate_bollinger(&bars, settings.bb_period, settings.bb_mult_x100);
    let [ma_5, ma_20, ma_60, ma_120] = MA_PERIODS.map(|p| calculate_sma(&bars, p));
    for series in [&rsi, &macd, &bands, &ma_5, &ma_20, &ma_60, &ma_120] {
        trace!(indicator = %series.indicator_type, bars = bars.len(), "indicator computed");
    }

    for (i, bar) in bars.iter_mut().enumerate() {
        let ind = &mut bar.indicators;
        ind.rsi = rsi.simple_at(i);

        if let Some(IndicatorValue::Macd {
            line,
            signal,
            histogram,
        }) = macd.valid_at(i)
        {
            ind.macd = Some(line);
            ind.macd_signal = Some(signal);
            ind.macd_diff = Some(histogram);
        }

        if let Some(IndicatorValue::Bollinger {
            upper,
            middle,
            lower,
        }) = bands.valid_at(i)
        {
            ind.bb_upper = Some(upper);
            ind.bb_middle = Some(middle);
            ind.bb_lower = Some(lower);
        }

        ind.ma_5 = ma_5.simple_at(i);
        ind.ma_20 = ma_20.simple_at(i);
        ind.ma_60 = ma_60.simple_at(i);
        ind.ma_120 = ma_120.simple_at(i);
    }

    bars
}
