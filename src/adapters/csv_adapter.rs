//! CSV file data adapter.
//!
//! Expected header: `timestamp,open,high,low,close,volume`. Timestamps are
//! `YYYY-MM-DD HH:MM:SS` (`T` separator also accepted) or a bare date, which
//! is read as midnight.

use crate::domain::error::TraderError;
use crate::domain::ohlcv::Bar;
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::path::PathBuf;
use tracing::debug;

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

pub struct CsvAdapter {
    path: PathBuf,
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn field(record: &csv::StringRecord, index: usize, name: &str, line: u64) -> Result<f64, TraderError> {
    let raw = record
        .get(index)
        .ok_or_else(|| TraderError::data(format!("line {line}: missing {name} column")))?;
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|e| TraderError::data(format!("line {line}: invalid {name} value '{raw}': {e}")))?;
    if !value.is_finite() {
        return Err(TraderError::data(format!("line {line}: {name} is not finite")));
    }
    Ok(value)
}

fn price(record: &csv::StringRecord, index: usize, name: &str, line: u64) -> Result<f64, TraderError> {
    let value = field(record, index, name, line)?;
    if value <= 0.0 {
        return Err(TraderError::data(format!(
            "line {line}: {name} must be positive, got {value}"
        )));
    }
    Ok(value)
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Bar>, TraderError> {
        let mut rdr = csv::Reader::from_path(&self.path).map_err(|e| {
            TraderError::data(format!("failed to read {}: {}", self.path.display(), e))
        })?;

        let mut bars: Vec<Bar> = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| TraderError::data(format!("CSV parse error: {e}")))?;
            let line = record.position().map_or(0, |p| p.line());

            let raw_ts = record
                .get(0)
                .ok_or_else(|| TraderError::data(format!("line {line}: missing timestamp column")))?;
            let timestamp = parse_timestamp(raw_ts).ok_or_else(|| {
                TraderError::data(format!("line {line}: invalid timestamp '{raw_ts}'"))
            })?;

            let date = timestamp.date();
            if start.is_some_and(|s| date < s) || end.is_some_and(|e| date > e) {
                continue;
            }

            if let Some(prev) = bars.last() {
                if timestamp <= prev.timestamp {
                    return Err(TraderError::data(format!(
                        "line {line}: timestamp {timestamp} is not after {}",
                        prev.timestamp
                    )));
                }
            }

            let volume = field(&record, 5, "volume", line)?;
            if volume < 0.0 {
                return Err(TraderError::data(format!(
                    "line {line}: volume must not be negative, got {volume}"
                )));
            }
            bars.push(Bar::new(
                timestamp,
                price(&record, 1, "open", line)?,
                price(&record, 2, "high", line)?,
                price(&record, 3, "low", line)?,
                price(&record, 4, "close", line)?,
                volume,
            ));
        }

        debug!(path = %self.path.display(), bars = bars.len(), "loaded bars");
        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_csv(content: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bars.csv");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    const DAILY: &str = "timestamp,open,high,low,close,volume\n\
        2024-01-15,100.0,110.0,90.0,105.0,50000\n\
        2024-01-16,105.0,115.0,100.0,110.0,60000.5\n\
        2024-01-17,110.0,120.0,105.0,115.0,55000\n";

    #[test]
    fn fetch_bars_returns_correct_data() {
        let (_dir, path) = write_csv(DAILY);
        let bars = CsvAdapter::new(path).fetch_bars(None, None).unwrap();

        assert_eq!(bars.len(), 3);
        assert_eq!(
            bars[0].timestamp,
            NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
        assert_eq!(bars[0].open, 100.0);
        assert_eq!(bars[0].high, 110.0);
        assert_eq!(bars[0].low, 90.0);
        assert_eq!(bars[0].close, 105.0);
        assert_eq!(bars[1].volume, 60000.5);
        assert!(bars[0].indicators.rsi.is_none());
    }

    #[test]
    fn fetch_bars_filters_by_inclusive_dates() {
        let (_dir, path) = write_csv(DAILY);
        let day = NaiveDate::from_ymd_opt(2024, 1, 16);
        let bars = CsvAdapter::new(path).fetch_bars(day, day).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, 110.0);
    }

    #[test]
    fn hourly_timestamps_parse() {
        let (_dir, path) = write_csv(
            "timestamp,open,high,low,close,volume\n\
             2024-01-15 09:00:00,1,1,1,1,1\n\
             2024-01-15T10:00:00,2,2,2,2,2\n",
        );
        let bars = CsvAdapter::new(path).fetch_bars(None, None).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].timestamp.format("%H").to_string(), "10");
    }

    #[test]
    fn duplicate_timestamp_is_rejected() {
        let (_dir, path) = write_csv(
            "timestamp,open,high,low,close,volume\n\
             2024-01-15,1,1,1,1,1\n\
             2024-01-15,2,2,2,2,2\n",
        );
        let err = CsvAdapter::new(path).fetch_bars(None, None).unwrap_err();
        assert!(matches!(err, TraderError::Data { .. }));
    }

    #[test]
    fn descending_timestamps_are_rejected() {
        let (_dir, path) = write_csv(
            "timestamp,open,high,low,close,volume\n\
             2024-01-16,1,1,1,1,1\n\
             2024-01-15,2,2,2,2,2\n",
        );
        assert!(CsvAdapter::new(path).fetch_bars(None, None).is_err());
    }

    #[test]
    fn bad_number_names_the_column() {
        let (_dir, path) = write_csv(
            "timestamp,open,high,low,close,volume\n\
             2024-01-15,1,1,1,abc,1\n",
        );
        let err = CsvAdapter::new(path).fetch_bars(None, None).unwrap_err();
        assert!(err.to_string().contains("close"));
    }

    #[test]
    fn zero_close_is_rejected_with_line_number() {
        let (_dir, path) = write_csv(
            "timestamp,open,high,low,close,volume\n\
             2024-01-15,100,100,100,100,1\n\
             2024-01-16,100,100,100,0,1\n",
        );
        let err = CsvAdapter::new(path).fetch_bars(None, None).unwrap_err();
        assert!(matches!(err, TraderError::Data { .. }));
        let msg = err.to_string();
        assert!(msg.contains("line 3"), "{msg}");
        assert!(msg.contains("close"), "{msg}");
    }

    #[test]
    fn negative_low_is_rejected() {
        let (_dir, path) = write_csv(
            "timestamp,open,high,low,close,volume\n\
             2024-01-15,100,100,-1,100,1\n",
        );
        let err = CsvAdapter::new(path).fetch_bars(None, None).unwrap_err();
        assert!(err.to_string().contains("low"));
    }

    #[test]
    fn zero_volume_is_accepted() {
        let (_dir, path) = write_csv(
            "timestamp,open,high,low,close,volume\n\
             2024-01-15,100,100,100,100,0\n",
        );
        let bars = CsvAdapter::new(path).fetch_bars(None, None).unwrap();
        assert_eq!(bars[0].volume, 0.0);
    }

    #[test]
    fn missing_file_is_a_data_error() {
        let adapter = CsvAdapter::new(PathBuf::from("/nonexistent/bars.csv"));
        let err = adapter.fetch_bars(None, None).unwrap_err();
        assert!(matches!(err, TraderError::Data { .. }));
    }
}
