#![allow(dead_code)]

use bartrader::domain::error::TraderError;
use bartrader::domain::ohlcv::Bar;
use bartrader::domain::strategy::{Signal, Strategy};
use bartrader::ports::data_port::DataPort;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::io::Write;

pub struct MockDataPort {
    pub bars: Vec<Bar>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new(bars: Vec<Bar>) -> Self {
        Self { bars, error: None }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            bars: Vec::new(),
            error: Some(reason.to_string()),
        }
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Bar>, TraderError> {
        if let Some(reason) = &self.error {
            return Err(TraderError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .bars
            .iter()
            .filter(|b| {
                let d = b.timestamp.date();
                start.is_none_or(|s| d >= s) && end.is_none_or(|e| d <= e)
            })
            .cloned()
            .collect())
    }
}

pub fn ts(day: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 1)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
        + Duration::days(day)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Daily bars from closes, open=high=low=close, constant volume.
pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Bar::new(ts(i as i64), c, c, c, c, 1000.0))
        .collect()
}

/// 40 flat bars at 100 with a two-bar dip to 90 and 88 at bars 35-36.
pub fn dip_closes() -> Vec<f64> {
    let mut closes = vec![100.0; 40];
    closes[35] = 90.0;
    closes[36] = 88.0;
    closes
}

/// Closes 100, 101, ... for `n` bars.
pub fn rising_closes(n: usize) -> Vec<f64> {
    (0..n).map(|i| 100.0 + i as f64).collect()
}

/// Deterministic zig-zag walk, useful when a strategy needs indicator
/// movement in both directions.
pub fn wave_closes(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            100.0 + 8.0 * (t / 5.0).sin() + 3.0 * (t / 1.7).cos() + t * 0.05
        })
        .collect()
}

pub fn bars_csv(bars: &[Bar]) -> String {
    let mut out = String::from("timestamp,open,high,low,close,volume\n");
    for b in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.timestamp.format("%Y-%m-%d %H:%M:%S"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        ));
    }
    out
}

pub fn write_temp(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// Emits fixed signals keyed by bar index; everything else is `Hold`.
pub struct ScriptedStrategy {
    pub signals: HashMap<usize, Signal>,
}

impl ScriptedStrategy {
    pub fn new(signals: &[(usize, Signal)]) -> Self {
        Self {
            signals: signals.iter().copied().collect(),
        }
    }
}

impl Strategy for ScriptedStrategy {
    fn name(&self) -> &str {
        "Scripted"
    }

    fn compute_indicators(&self, bars: Vec<Bar>) -> Vec<Bar> {
        bars
    }

    fn signal(&mut self, prefix: &[Bar]) -> Signal {
        self.signals
            .get(&(prefix.len() - 1))
            .copied()
            .unwrap_or(Signal::Hold)
    }
}
