//! OHLCV bar representation and the indicator columns attached to it.

use chrono::NaiveDateTime;

/// Indicator columns attached to a bar by the indicator provider.
///
/// `None` means the value is undefined at this bar (warm-up). Strategies
/// treat any comparison against `None` as false.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Indicators {
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_diff: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_lower: Option<f64>,
    pub ma_5: Option<f64>,
    pub ma_20: Option<f64>,
    pub ma_60: Option<f64>,
    pub ma_120: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub indicators: Indicators,
}

impl Bar {
    pub fn new(
        timestamp: NaiveDateTime,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Bar {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            indicators: Indicators::default(),
        }
    }

    /// Close-to-close change against `prev`, in percent.
    pub fn change_pct(&self, prev: &Bar) -> f64 {
        (self.close / prev.close - 1.0) * 100.0
    }
}

/// Return on holding the whole series: last close / first close - 1.
///
/// Zero for an empty series.
pub fn buy_and_hold_return(bars: &[Bar]) -> f64 {
    match (bars.first(), bars.last()) {
        (Some(first), Some(last)) if first.close > 0.0 => last.close / first.close - 1.0,
        _ => 0.0,
    }
}

/// Checks that timestamps are strictly ascending.
pub fn is_strictly_ascending(bars: &[Bar]) -> bool {
    bars.windows(2).all(|w| w[0].timestamp < w[1].timestamp)
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 11, day)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn bar(day: u32, close: f64) -> Bar {
        Bar::new(ts(day), close, close, close, close, 1.0)
    }

    #[test]
    fn new_bar_has_no_indicators() {
        let b = bar(1, 100.0);
        assert_eq!(b.indicators, Indicators::default());
        assert!(b.indicators.rsi.is_none());
    }

    #[test]
    fn change_pct_down() {
        let prev = bar(1, 100.0);
        let cur = bar(2, 94.0);
        assert!((cur.change_pct(&prev) - (-6.0)).abs() < 1e-9);
    }

    #[test]
    fn buy_and_hold_uses_first_and_last_close() {
        let bars = vec![bar(1, 100.0), bar(2, 50.0), bar(3, 120.0)];
        assert!((buy_and_hold_return(&bars) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn buy_and_hold_empty_is_zero() {
        assert_eq!(buy_and_hold_return(&[]), 0.0);
    }

    #[test]
    fn ascending_check_rejects_duplicates() {
        assert!(is_strictly_ascending(&[bar(1, 1.0), bar(2, 1.0)]));
        assert!(!is_strictly_ascending(&[bar(2, 1.0), bar(2, 1.0)]));
        assert!(!is_strictly_ascending(&[bar(3, 1.0), bar(2, 1.0)]));
    }
}
