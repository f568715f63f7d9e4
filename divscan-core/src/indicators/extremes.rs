//! Window extremes: swing-point lookup and trailing high/low.
//!
//! NaN values never win a comparison and are skipped. Ties resolve to the
//! earliest index so results are deterministic.

use crate::domain::Bar;

/// Index of the first minimum in `values`, ignoring NaN.
pub fn argmin_first(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v >= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Index of the first maximum in `values`, ignoring NaN.
pub fn argmax_first(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Lowest low over the last `window` bars, clamped to the bars available.
pub fn lowest_low(bars: &[Bar], window: usize) -> Option<f64> {
    let start = bars.len().saturating_sub(window);
    bars[start..]
        .iter()
        .map(|b| b.low)
        .filter(|v| !v.is_nan())
        .reduce(f64::min)
}

/// Highest high over the last `window` bars, clamped to the bars available.
pub fn highest_high(bars: &[Bar], window: usize) -> Option<f64> {
    let start = bars.len().saturating_sub(window);
    bars[start..]
        .iter()
        .map(|b| b.high)
        .filter(|v| !v.is_nan())
        .reduce(f64::max)
}
