//! Yahoo Finance bar feed.
//!
//! Fetches intraday or daily OHLC bars from Yahoo's v8 chart API. Handles rate
//! limiting, retries with exponential backoff, response parsing, and the
//! circuit breaker.
//!
//! Yahoo caps intraday history (7 days of 1m bars, 60 days of 5m-30m bars,
//! 730 days of hourly bars), so the requested span is clamped accordingly and
//! the feed may return fewer bars than asked for.

use super::circuit_breaker::CircuitBreaker;
use super::provider::{take_last, DataError, MarketDataFeed};
use crate::domain::{Bar, Timeframe};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// Map a timeframe to Yahoo's `interval` parameter and its history cap.
fn interval_for(timeframe: Timeframe) -> Option<(&'static str, Option<i64>)> {
    const DAY: i64 = 24 * 60 * 60;
    match timeframe {
        Timeframe::M1 => Some(("1m", Some(7 * DAY))),
        Timeframe::M5 => Some(("5m", Some(59 * DAY))),
        Timeframe::M15 => Some(("15m", Some(59 * DAY))),
        Timeframe::M30 => Some(("30m", Some(59 * DAY))),
        Timeframe::H1 => Some(("60m", Some(729 * DAY))),
        Timeframe::H4 => None,
        Timeframe::D1 => Some(("1d", None)),
    }
}

/// Yahoo Finance bar feed.
pub struct YahooFeed {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    base_url: String,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooFeed {
    pub fn new(circuit_breaker: Arc<CircuitBreaker>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(20))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            circuit_breaker,
            base_url: DEFAULT_BASE_URL.to_string(),
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    /// Point the feed at a different host (proxy or test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retries(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.base_delay = base_delay;
        self
    }

    /// Build the chart API URL for a symbol, interval and unix-time range.
    fn chart_url(&self, symbol: &str, interval: &str, period1: i64, period2: i64) -> String {
        format!(
            "{}/v8/finance/chart/{symbol}?period1={period1}&period2={period2}&interval={interval}",
            self.base_url
        )
    }

    /// Start of the request window: enough calendar time to cover `count`
    /// bars through weekends and holidays, clamped to Yahoo's history cap.
    fn window_start(now: i64, timeframe: Timeframe, count: usize, cap: Option<i64>) -> i64 {
        let wanted = timeframe.seconds().saturating_mul(count as i64).saturating_mul(3);
        let span = match cap {
            Some(cap) => wanted.min(cap),
            None => wanted,
        };
        now - span
    }

    /// Parse the chart API response into bars, oldest first.
    ///
    /// Bars with any missing OHLC value are dropped, as are bars whose
    /// timestamp does not advance (Yahoo occasionally repeats the live bar).
    fn parse_response(symbol: &str, resp: ChartResponse) -> Result<Vec<Bar>, DataError> {
        let result = resp.chart.result.ok_or_else(|| {
            if let Some(err) = resp.chart.error {
                if err.code == "Not Found" {
                    DataError::SymbolNotFound {
                        symbol: symbol.to_string(),
                    }
                } else {
                    DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
                }
            } else {
                DataError::ResponseFormatChanged("empty result with no error".into())
            }
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        let timestamps = data
            .timestamp
            .ok_or_else(|| DataError::ResponseFormatChanged("no timestamps".into()))?;

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let mut bars: Vec<Bar> = Vec::with_capacity(timestamps.len());
        let mut dropped = 0usize;

        for (i, &ts) in timestamps.iter().enumerate() {
            let timestamp = DateTime::<Utc>::from_timestamp(ts, 0).ok_or_else(|| {
                DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
            })?;

            let open = quote.open.get(i).copied().flatten();
            let high = quote.high.get(i).copied().flatten();
            let low = quote.low.get(i).copied().flatten();
            let close = quote.close.get(i).copied().flatten();
            let volume = quote.volume.get(i).copied().flatten().unwrap_or(0.0);

            let (Some(open), Some(high), Some(low), Some(close)) = (open, high, low, close) else {
                dropped += 1;
                continue;
            };

            if bars.last().is_some_and(|prev| prev.timestamp >= timestamp) {
                dropped += 1;
                continue;
            }

            bars.push(Bar {
                timestamp,
                open,
                high,
                low,
                close,
                volume,
            });
        }

        if dropped > 0 {
            tracing::debug!(symbol, dropped, "dropped incomplete or repeated bars");
        }

        if bars.is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        Ok(bars)
    }

    /// Execute a single HTTP request with retry and circuit breaker logic.
    fn fetch_with_retry(&self, symbol: &str, url: &str) -> Result<Vec<Bar>, DataError> {
        if !self.circuit_breaker.is_allowed() {
            return Err(DataError::CircuitBreakerTripped);
        }

        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                tracing::debug!(symbol, attempt, delay_ms = delay.as_millis() as u64, "retrying bar fetch");
                std::thread::sleep(delay);
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            match self.client.get(url).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::FORBIDDEN {
                        self.circuit_breaker.trip();
                        return Err(DataError::CircuitBreakerTripped);
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        self.circuit_breaker.record_failure();
                        let retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(60);
                        last_error = Some(DataError::RateLimited {
                            retry_after_secs: retry_after,
                        });
                        continue;
                    }

                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(DataError::SymbolNotFound {
                            symbol: symbol.to_string(),
                        });
                    }

                    if !status.is_success() {
                        self.circuit_breaker.record_failure();
                        last_error = Some(DataError::Other(format!("HTTP {status} for {symbol}")));
                        continue;
                    }

                    let chart: ChartResponse = resp.json().map_err(|e| {
                        DataError::ResponseFormatChanged(format!(
                            "failed to parse response for {symbol}: {e}"
                        ))
                    })?;

                    let bars = Self::parse_response(symbol, chart)?;
                    self.circuit_breaker.record_success();
                    return Ok(bars);
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                        continue;
                    }
                    return Err(DataError::NetworkUnreachable(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

impl MarketDataFeed for YahooFeed {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<Bar>, DataError> {
        let (interval, cap) =
            interval_for(timeframe).ok_or_else(|| DataError::UnsupportedTimeframe {
                timeframe,
                provider: self.name().to_string(),
            })?;

        let now = Utc::now().timestamp();
        let start = Self::window_start(now, timeframe, count, cap);
        let url = self.chart_url(symbol, interval, start, now);

        let bars = self.fetch_with_retry(symbol, &url)?;
        let bars = take_last(bars, count);
        tracing::debug!(
            feed = self.name(),
            symbol,
            timeframe = %timeframe,
            requested = count,
            received = bars.len(),
            "fetched bars"
        );
        Ok(bars)
    }
}
