//! Market data feed trait and structured error types.
//!
//! The `MarketDataFeed` trait abstracts over bar sources (Yahoo Finance, CSV
//! replay) so the runner can swap implementations and tests can mock them.

use crate::domain::{Bar, Timeframe};
use thiserror::Error;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("timeframe {timeframe} is not supported by {provider}")]
    UnsupportedTimeframe {
        timeframe: Timeframe,
        provider: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed record at line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },

    #[error("data error: {0}")]
    Other(String),
}

/// Source of OHLC bars for one symbol and timeframe.
///
/// Implementations return bars oldest first with the most recent (possibly
/// still forming) bar last, and at most `count` of them. Returning fewer is
/// allowed; the caller decides whether that is enough.
pub trait MarketDataFeed: Send + Sync {
    /// Human-readable name of this feed.
    fn name(&self) -> &str;

    /// Fetch the most recent `count` bars.
    fn fetch_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<Bar>, DataError>;

    /// Startup reachability check. The default fetches a couple of bars.
    fn probe(&self, symbol: &str, timeframe: Timeframe) -> Result<(), DataError> {
        let bars = self.fetch_bars(symbol, timeframe, 2)?;
        if bars.is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        Ok(())
    }
}

/// Keep only the newest `count` bars.
pub(crate) fn take_last(mut bars: Vec<Bar>, count: usize) -> Vec<Bar> {
    if bars.len() > count {
        bars.drain(..bars.len() - count);
    }
    bars
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    struct EmptyFeed;

    impl MarketDataFeed for EmptyFeed {
        fn name(&self) -> &str {
            "empty"
        }

        fn fetch_bars(&self, _: &str, _: Timeframe, _: usize) -> Result<Vec<Bar>, DataError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn default_probe_rejects_empty_feed() {
        let err = EmptyFeed.probe("EURUSD", Timeframe::M15).unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { .. }));
    }

    #[test]
    fn take_last_keeps_newest() {
        let bars = make_bars(&[1.0, 2.0, 3.0, 4.0]);
        let kept = take_last(bars, 2);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].close, 3.0);
        assert_eq!(kept[1].close, 4.0);
        assert_eq!(take_last(make_bars(&[1.0]), 5).len(), 1);
    }

    #[test]
    fn errors_display_context() {
        let err = DataError::UnsupportedTimeframe {
            timeframe: Timeframe::H4,
            provider: "yahoo_finance".into(),
        };
        assert_eq!(err.to_string(), "timeframe H4 is not supported by yahoo_finance");
    }
}
