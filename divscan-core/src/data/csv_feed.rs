//! Bar feed that replays the tail of a local CSV file.
//!
//! Expected header: `timestamp,open,high,low,close[,volume]`. Timestamps are
//! RFC 3339 or unix seconds. The file is re-read on every fetch, so an
//! external process can append bars while the bot is running.

use super::provider::{take_last, DataError, MarketDataFeed};
use crate::domain::{Bar, Timeframe};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct CsvRecord {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: Option<f64>,
}

/// Parse an RFC 3339 string or integer unix seconds.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<i64>() {
        return DateTime::<Utc>::from_timestamp(secs, 0);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

pub struct CsvFeed {
    path: PathBuf,
}

impl CsvFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every bar in the file, oldest first.
    pub fn read_all(&self) -> Result<Vec<Bar>, DataError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|e| csv_error(e, 0))?;

        let headers = reader.headers().map_err(|e| csv_error(e, 1))?.clone();
        let mut raw = csv::StringRecord::new();
        let mut bars = Vec::new();

        loop {
            let more = reader.read_record(&mut raw).map_err(|e| {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                csv_error(e, line)
            })?;
            if !more {
                break;
            }
            let line = raw.position().map(|p| p.line()).unwrap_or(0);
            let record: CsvRecord = raw
                .deserialize(Some(&headers))
                .map_err(|e| csv_error(e, line))?;

            let timestamp =
                parse_timestamp(&record.timestamp).ok_or_else(|| DataError::MalformedRecord {
                    line,
                    reason: format!("unparseable timestamp '{}'", record.timestamp),
                })?;

            bars.push(Bar {
                timestamp,
                open: record.open,
                high: record.high,
                low: record.low,
                close: record.close,
                volume: record.volume.unwrap_or(0.0),
            });
        }
        Ok(bars)
    }
}

fn csv_error(err: csv::Error, line: u64) -> DataError {
    if err.is_io_error() {
        match err.into_kind() {
            csv::ErrorKind::Io(io) => DataError::Io(io),
            other => DataError::Other(format!("{other:?}")),
        }
    } else {
        DataError::MalformedRecord {
            line,
            reason: err.to_string(),
        }
    }
}

impl MarketDataFeed for CsvFeed {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<Bar>, DataError> {
        let bars = take_last(self.read_all()?, count);
        tracing::debug!(
            feed = self.name(),
            path = %self.path.display(),
            symbol,
            timeframe = %timeframe,
            received = bars.len(),
            "read bars from file"
        );
        Ok(bars)
    }
}
