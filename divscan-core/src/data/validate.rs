//! Structural checks on a fetched bar series.
//!
//! Feeds are trusted for content but not for shape: a series that is out of
//! order or carries void bars would silently misalign every derived series.

use crate::domain::Bar;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("bar {index} has a missing OHLC value")]
    VoidBar { index: usize },

    #[error("bar {index} has high {high} below low {low}")]
    InvertedRange { index: usize, high: f64, low: f64 },

    #[error("bar {index} has non-positive close {close}")]
    NonPositiveClose { index: usize, close: f64 },

    #[error("bar {index} timestamp does not increase on the previous bar")]
    OutOfOrder { index: usize },
}

/// Validate shape: no void bars, high >= low, positive closes, strictly
/// increasing timestamps.
pub fn validate_bars(bars: &[Bar]) -> Result<(), SeriesError> {
    for (index, bar) in bars.iter().enumerate() {
        if bar.is_void() {
            return Err(SeriesError::VoidBar { index });
        }
        if bar.high < bar.low {
            return Err(SeriesError::InvertedRange {
                index,
                high: bar.high,
                low: bar.low,
            });
        }
        if bar.close <= 0.0 {
            return Err(SeriesError::NonPositiveClose {
                index,
                close: bar.close,
            });
        }
        if index > 0 && bar.timestamp <= bars[index - 1].timestamp {
            return Err(SeriesError::OutOfOrder { index });
        }
    }
    Ok(())
}
