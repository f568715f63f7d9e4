//! Property tests for the evaluation pipeline.
//!
//! Uses proptest to verify:
//! 1. RSI bounds: every defined value lies in [0, 100]
//! 2. Determinism: identical input yields identical flags
//! 3. No look-ahead: flags for a prefix match the full-series flags
//! 4. Risk/reward: take-profit distance is R times the stop distance
//! 5. Short series: fewer than W + 1 bars never flag

use chrono::{TimeZone, Utc};
use divscan_core::config::StrategyConfig;
use divscan_core::domain::{Bar, Instrument, OrderSide};
use divscan_core::engine::evaluate;
use divscan_core::indicators::rsi_series;
use divscan_core::signals::DivergenceDetector;
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

/// A random walk of closes around 1.1 with 5-digit precision.
fn arb_closes(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-0.002..0.002_f64, min_len..max_len).prop_map(|steps| {
        let mut price = 1.1_f64;
        steps
            .into_iter()
            .map(|step| {
                price = (price + step).max(0.5);
                (price * 100_000.0).round() / 100_000.0
            })
            .collect()
    })
}

fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: base + chrono::Duration::minutes(15 * i as i64),
                open,
                high: open.max(close) + 0.0003,
                low: open.min(close) - 0.0003,
                close,
                volume: 0.0,
            }
        })
        .collect()
}

fn config(rsi_period: usize, window: usize, risk_reward: f64) -> StrategyConfig {
    StrategyConfig {
        instrument: Instrument::new("EURUSD", 5, 0.01),
        rsi_period,
        window,
        risk_reward,
        ..StrategyConfig::default()
    }
}

// ── 1. RSI bounds ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn rsi_is_bounded(closes in arb_closes(0, 120), period in 1usize..20) {
        let rsi = rsi_series(&closes, period);
        prop_assert_eq!(rsi.len(), closes.len());
        for (i, v) in rsi.iter().enumerate() {
            if i < period {
                prop_assert!(v.is_nan(), "warmup value at {} should be NaN", i);
            } else {
                prop_assert!((0.0..=100.0).contains(v), "rsi[{}] = {} out of range", i, v);
            }
        }
    }
}

// ── 2. Determinism ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn detection_is_deterministic(
        closes in arb_closes(0, 120),
        period in 1usize..10,
        window in 1usize..25,
    ) {
        let rsi = rsi_series(&closes, period);
        let detector = DivergenceDetector::new(window);
        prop_assert_eq!(detector.detect(&closes, &rsi), detector.detect(&closes, &rsi));
    }
}

// ── 3. No look-ahead ─────────────────────────────────────────────────

proptest! {
    /// Flags at index i may only use data at indices <= i. The last index of
    /// the prefix is never evaluated, so compare everything before it.
    #[test]
    fn prefix_flags_match_full_series(
        closes in arb_closes(2, 120),
        period in 1usize..10,
        window in 1usize..25,
        cut in 0.0..1.0_f64,
    ) {
        let detector = DivergenceDetector::new(window);
        let full = detector.detect(&closes, &rsi_series(&closes, period));

        let m = 1 + ((closes.len() - 1) as f64 * cut) as usize;
        let prefix = &closes[..m];
        let partial = detector.detect(prefix, &rsi_series(prefix, period));

        prop_assert_eq!(partial.len(), m);
        prop_assert_eq!(&partial[..m - 1], &full[..m - 1]);
        prop_assert!(!partial[m - 1].any(), "forming bar must never be flagged");
    }
}

// ── 4. Risk/reward identity ──────────────────────────────────────────

proptest! {
    #[test]
    fn take_profit_is_r_times_risk(
        closes in arb_closes(30, 150),
        period in 2usize..8,
        window in 3usize..12,
        risk_reward in 0.5..4.0_f64,
    ) {
        let cfg = config(period, window, risk_reward);
        let bars = bars_from_closes(&closes);
        let tolerance = cfg.instrument.point();

        for n in cfg.min_bars()..=bars.len() {
            if let Some(order) = evaluate(&bars[..n], &cfg) {
                match order.side {
                    OrderSide::Buy => {
                        prop_assert!(order.stop_loss < order.price);
                        prop_assert!(order.take_profit > order.price);
                    }
                    OrderSide::Sell => {
                        prop_assert!(order.stop_loss > order.price);
                        prop_assert!(order.take_profit < order.price);
                    }
                }
                let expected = order.risk() * risk_reward;
                prop_assert!(
                    (order.reward() - expected).abs() <= tolerance,
                    "reward {} vs risk {} * R {}",
                    order.reward(), order.risk(), risk_reward
                );
            }
        }
    }
}

// ── 5. Short series ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn short_series_never_flags(window in 1usize..30, extra in 0usize..30) {
        let len = window.min(extra);
        let closes: Vec<f64> = (0..len).map(|i| 1.0 + ((i * 7) % 5) as f64 * 0.01).collect();
        let flags = DivergenceDetector::new(window).detect(&closes, &rsi_series(&closes, 3));
        prop_assert_eq!(flags.len(), len);
        prop_assert!(flags.iter().all(|f| !f.any()));
    }
}
