//! Relative Strength Index (RSI).
//!
//! Simple-moving-average variant: average gain and average loss are the plain
//! means of the last `period` bar-to-bar changes (no Wilder smoothing).
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: period.
//! Edge cases: avg_loss == 0 → RSI = 100; both zero → RSI = 50; avg_gain == 0 → RSI = 0.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        rsi_series(&closes, self.period)
    }
}

/// RSI over a raw close series.
///
/// Each value is computed from its own window of `period` changes rather than
/// a running sum, so a zero-loss window yields exactly 100 with no drift.
/// Cost is O(n * period).
pub fn rsi_series(closes: &[f64], period: usize) -> Vec<f64> {
    let n = closes.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period + 1 {
        return result;
    }

    let p = period as f64;
    for i in period..n {
        let mut gain = 0.0;
        let mut loss = 0.0;
        let mut has_nan = false;

        for j in (i + 1 - period)..=i {
            let change = closes[j] - closes[j - 1];
            if change.is_nan() {
                has_nan = true;
                break;
            }
            if change > 0.0 {
                gain += change;
            } else {
                loss -= change;
            }
        }

        if !has_nan {
            result[i] = compute_rsi(gain / p, loss / p);
        }
    }

    result
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0 // no movement
    } else if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
