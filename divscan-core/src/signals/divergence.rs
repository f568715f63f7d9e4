//! Price/RSI divergence detection over a sliding window.
//!
//! For each eligible bar `i` two overlapping windows are compared: `[i-W, i)`
//! and `[i-W+1, i]`. Each window's swing low (and swing high) is its first
//! minimum (maximum) close. A bullish divergence is a lower swing low in price
//! paired with a higher oscillator reading at that swing; bearish is the
//! mirror image at the swing highs.
//!
//! Only indices in `[W, len-2]` are evaluated. The final bar is the one still
//! forming and never carries a verdict.
//!
//! Each bar costs O(W), so a full scan is O(N * W). Hundreds of bars with W
//! around 20 is cheap; a monotonic-deque window would make it O(N) if that
//! ever stops being true.

use crate::indicators::{argmax_first, argmin_first};
use serde::{Deserialize, Serialize};

/// Divergence verdict for one bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivergenceFlags {
    pub bullish: bool,
    pub bearish: bool,
}

impl DivergenceFlags {
    pub fn any(&self) -> bool {
        self.bullish || self.bearish
    }

    /// Both directions flagged on the same bar.
    pub fn is_conflicted(&self) -> bool {
        self.bullish && self.bearish
    }
}

/// Sliding-window divergence detector.
#[derive(Debug, Clone)]
pub struct DivergenceDetector {
    window: usize,
}

impl DivergenceDetector {
    pub fn new(window: usize) -> Self {
        assert!(window >= 1, "divergence window must be >= 1");
        Self { window }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Whether bar `i` of a `len`-bar series gets evaluated at all.
    pub fn is_eligible(&self, i: usize, len: usize) -> bool {
        i >= self.window && i + 1 < len
    }

    /// Flags for every bar of the series. Ineligible bars are all-false.
    ///
    /// # Panics
    /// If `prices` and `oscillator` differ in length.
    pub fn detect(&self, prices: &[f64], oscillator: &[f64]) -> Vec<DivergenceFlags> {
        assert_eq!(
            prices.len(),
            oscillator.len(),
            "price and oscillator series must be aligned"
        );

        let n = prices.len();
        let mut flags = vec![DivergenceFlags::default(); n];
        if n < self.window + 1 {
            return flags;
        }

        for (i, slot) in flags.iter_mut().enumerate().take(n - 1).skip(self.window) {
            *slot = self.evaluate_at(prices, oscillator, i);
        }
        flags
    }

    /// Flags for a single bar, using only data up to and including `i`.
    pub fn flags_at(&self, prices: &[f64], oscillator: &[f64], i: usize) -> DivergenceFlags {
        assert_eq!(
            prices.len(),
            oscillator.len(),
            "price and oscillator series must be aligned"
        );
        if !self.is_eligible(i, prices.len()) {
            return DivergenceFlags::default();
        }
        self.evaluate_at(prices, oscillator, i)
    }

    fn evaluate_at(&self, prices: &[f64], oscillator: &[f64], i: usize) -> DivergenceFlags {
        let prev_start = i - self.window;
        let curr_start = prev_start + 1;
        let prev = &prices[prev_start..i];
        let curr = &prices[curr_start..=i];

        // A NaN oscillator at either swing makes both comparisons false, which
        // excludes the bar without special casing.
        let bullish = match (argmin_first(prev), argmin_first(curr)) {
            (Some(a), Some(b)) => {
                let (low1, low2) = (prev_start + a, curr_start + b);
                prices[low2] < prices[low1] && oscillator[low2] > oscillator[low1]
            }
            _ => false,
        };

        let bearish = match (argmax_first(prev), argmax_first(curr)) {
            (Some(a), Some(b)) => {
                let (high1, high2) = (prev_start + a, curr_start + b);
                prices[high2] > prices[high1] && oscillator[high2] < oscillator[high1]
            }
            _ => false,
        };

        DivergenceFlags { bullish, bearish }
    }
}
