//! End-to-end scenarios: engineered closes through RSI, detection and
//! translation.
//!
//! The bullish series falls to 98.0 at bar 10 with RSI pinned at 0, bounces,
//! then makes a lower low of 97.5 at bar 15 while RSI only drops to ~11.1.
//! That is the only divergence anywhere in the 30 bars. The bearish series is
//! its mirror image around 100.

use chrono::{TimeZone, Utc};
use divscan_core::config::{ConflictPolicy, StrategyConfig};
use divscan_core::domain::{Bar, Instrument, OrderSide};
use divscan_core::engine::{evaluate, evaluate_detailed, scan};
use divscan_core::signals::{Decision, DivergenceFlags};

// ── Fixtures ─────────────────────────────────────────────────────────

fn bullish_closes() -> Vec<f64> {
    let mut closes = vec![
        100.0, 101.0, 102.0, 103.0, 104.0, // 0-4: rally
        103.0, 102.0, 101.0, 100.0, 99.0, 98.0, // 5-10: first swing low
        100.0, 101.0, 101.5, // 11-13: bounce
        99.5, 97.5, // 14-15: lower low, weaker selling
    ];
    closes.extend((0..14).map(|k| 98.0 + 0.5 * k as f64)); // 16-29: recovery
    closes
}

fn bearish_closes() -> Vec<f64> {
    bullish_closes().iter().map(|p| 200.0 - p).collect()
}

/// open = previous close, wicks 0.25 beyond the body, 15-minute spacing.
fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    let base = Utc.with_ymd_and_hms(2024, 3, 4, 8, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: base + chrono::Duration::minutes(15 * i as i64),
                open,
                high: open.max(close) + 0.25,
                low: open.min(close) - 0.25,
                close,
                volume: 0.0,
            }
        })
        .collect()
}

fn scenario_config() -> StrategyConfig {
    StrategyConfig {
        instrument: Instrument::new("TEST", 5, 0.01),
        rsi_period: 3,
        window: 5,
        ..StrategyConfig::default()
    }
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

// ── Bullish ──────────────────────────────────────────────────────────

#[test]
fn bullish_divergence_flags_only_bar_15() {
    let bars = bars_from_closes(&bullish_closes());
    let report = scan(&bars, &scenario_config()).unwrap();

    let flagged: Vec<(usize, DivergenceFlags)> = report.flagged().collect();
    assert_eq!(
        flagged,
        vec![(
            15,
            DivergenceFlags {
                bullish: true,
                bearish: false
            }
        )]
    );

    // RSI is 0 at the first low and recovers at the second.
    assert_close(report.rsi[10], 0.0);
    assert!(report.rsi[15] > 11.0 && report.rsi[15] < 11.2);
}

#[test]
fn bullish_divergence_emits_buy_with_window_low_stop() {
    let cfg = scenario_config();
    let bars = bars_from_closes(&bullish_closes());
    let live = &bars[..=16];

    let evaluation = evaluate_detailed(live, &cfg).unwrap();
    assert_eq!(evaluation.signal_bar, 15);
    assert!(evaluation.flags.bullish);

    let order = evaluation.order().cloned().expect("expected a buy order");
    assert_eq!(order.side, OrderSide::Buy);
    assert_eq!(order.symbol, "TEST");
    assert_close(order.price, 98.0);
    // Lowest low of bars 12..=16 is 97.25 (bars 15 and 16).
    assert_close(order.stop_loss, 97.25);
    assert_close(order.take_profit, 99.5);
    assert_close(order.volume, 0.1);
    assert_eq!(order.magic, 123_456);
    assert_eq!(order.deviation, 20);
    assert_eq!(order.comment, "RSI Divergence");

    assert_eq!(evaluate(live, &cfg), Some(order));
}

#[test]
fn only_the_cycle_whose_signal_bar_is_15_trades() {
    let cfg = scenario_config();
    let bars = bars_from_closes(&bullish_closes());
    let trading_lengths: Vec<usize> = (cfg.min_bars()..=bars.len())
        .filter(|&n| evaluate(&bars[..n], &cfg).is_some())
        .collect();
    assert_eq!(trading_lengths, vec![17]);
}

// ── Bearish ──────────────────────────────────────────────────────────

#[test]
fn bearish_mirror_emits_sell_with_window_high_stop() {
    let cfg = scenario_config();
    let bars = bars_from_closes(&bearish_closes());

    let report = scan(&bars, &cfg).unwrap();
    let flagged: Vec<usize> = report.flagged().map(|(i, _)| i).collect();
    assert_eq!(flagged, vec![15]);
    assert!(report.flags[15].bearish);
    assert!(!report.flags[15].bullish);

    let order = evaluate(&bars[..=16], &cfg).expect("expected a sell order");
    assert_eq!(order.side, OrderSide::Sell);
    assert_close(order.price, 102.0);
    assert_close(order.stop_loss, 102.75);
    assert_close(order.take_profit, 100.5);
}

// ── No signal ────────────────────────────────────────────────────────

#[test]
fn rising_prices_never_trade() {
    let cfg = scenario_config();
    let closes: Vec<f64> = (0..60).map(|i| 1.1 + 0.0005 * i as f64).collect();
    let bars = bars_from_closes(&closes);

    let report = scan(&bars, &cfg).unwrap();
    assert_eq!(report.flagged().count(), 0);

    for n in cfg.min_bars()..=bars.len() {
        let evaluation = evaluate_detailed(&bars[..n], &cfg).unwrap();
        assert_eq!(evaluation.decision, Decision::NoSignal);
    }
}

#[test]
fn series_shorter_than_minimum_is_skipped() {
    let cfg = scenario_config();
    let bars = bars_from_closes(&bullish_closes());
    assert!(evaluate(&bars[..cfg.min_bars() - 1], &cfg).is_none());
    assert!(evaluate(&[], &cfg).is_none());
}

// ── Determinism & policy ─────────────────────────────────────────────

#[test]
fn repeated_evaluation_is_identical() {
    let cfg = scenario_config();
    let bars = bars_from_closes(&bullish_closes());
    let first = scan(&bars, &cfg).unwrap();
    let second = scan(&bars, &cfg).unwrap();
    assert_eq!(first.flags, second.flags);
    assert_eq!(evaluate(&bars[..=16], &cfg), evaluate(&bars[..=16], &cfg));
}

#[test]
fn conflict_policy_does_not_affect_single_sided_signal() {
    let bars = bars_from_closes(&bullish_closes());
    for policy in [
        ConflictPolicy::BullishFirst,
        ConflictPolicy::BearishFirst,
        ConflictPolicy::Skip,
    ] {
        let cfg = StrategyConfig {
            conflict_policy: policy,
            ..scenario_config()
        };
        let order = evaluate(&bars[..=16], &cfg).expect("single-sided signal trades");
        assert_eq!(order.side, OrderSide::Buy);
    }
}

#[test]
fn risk_reward_ratio_scales_take_profit() {
    let cfg = StrategyConfig {
        risk_reward: 3.0,
        ..scenario_config()
    };
    let bars = bars_from_closes(&bullish_closes());
    let order = evaluate(&bars[..=16], &cfg).unwrap();
    assert_close(order.take_profit, 98.0 + 0.75 * 3.0);
    assert_close(order.reward(), order.risk() * 3.0);
}
