//! One evaluation cycle over a freshly fetched series.

use crate::config::{StrategyConfig, StrategyConfigError};
use crate::data::validate::{validate_bars, SeriesError};
use crate::domain::{closes, Bar, OrderRequest};
use crate::indicators::{Indicator, Rsi};
use crate::signals::{Decision, DivergenceDetector, DivergenceFlags, OrderTranslator};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Why a series could not be evaluated. None of these are fatal to the bot;
/// the cycle is skipped.
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("insufficient bars: need {needed}, got {got}")]
    InsufficientBars { needed: usize, got: usize },

    #[error("malformed bars: {0}")]
    MalformedBars(#[from] SeriesError),

    #[error("invalid strategy config: {0}")]
    Config(#[from] StrategyConfigError),
}

/// Full result of evaluating the signal bar.
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    /// Index of the last completed bar, the one the flags belong to.
    pub signal_bar: usize,
    pub signal_time: DateTime<Utc>,
    pub flags: DivergenceFlags,
    /// RSI at the signal bar (NaN if undefined).
    pub rsi: f64,
    pub decision: Decision,
}

impl Evaluation {
    pub fn order(&self) -> Option<&OrderRequest> {
        match &self.decision {
            Decision::Order(request) => Some(request),
            _ => None,
        }
    }
}

/// Every bar's RSI and flags, for inspection.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub rsi: Vec<f64>,
    pub flags: Vec<DivergenceFlags>,
}

impl ScanReport {
    /// Indices with any flag set.
    pub fn flagged(&self) -> impl Iterator<Item = (usize, DivergenceFlags)> + '_ {
        self.flags
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, f)| f.any())
    }
}

/// Pure entry point: at most one order for this series.
///
/// Unusable input (too few bars, malformed bars) yields `None` after a
/// warning; use [`evaluate_detailed`] to see why.
pub fn evaluate(bars: &[Bar], config: &StrategyConfig) -> Option<OrderRequest> {
    match evaluate_detailed(bars, config) {
        Ok(evaluation) => evaluation.decision.into_order(),
        Err(e) => {
            tracing::warn!(error = %e, bars = bars.len(), "skipping evaluation");
            None
        }
    }
}

/// Evaluate the signal bar (`len - 2`) and translate its flags.
pub fn evaluate_detailed(
    bars: &[Bar],
    config: &StrategyConfig,
) -> Result<Evaluation, EvaluationError> {
    config.validate()?;

    let needed = config.min_bars();
    if bars.len() < needed {
        return Err(EvaluationError::InsufficientBars {
            needed,
            got: bars.len(),
        });
    }
    validate_bars(bars)?;

    let prices = closes(bars);
    let rsi = Rsi::new(config.rsi_period).compute(bars);
    let detector = DivergenceDetector::new(config.window);

    let signal_bar = bars.len() - 2;
    let flags = detector.flags_at(&prices, &rsi, signal_bar);
    let decision = OrderTranslator::new(config).translate(bars, flags);

    tracing::debug!(
        signal_bar,
        signal_time = %bars[signal_bar].timestamp,
        close = prices[signal_bar],
        rsi = rsi[signal_bar],
        bullish = flags.bullish,
        bearish = flags.bearish,
        "evaluated signal bar"
    );

    Ok(Evaluation {
        signal_bar,
        signal_time: bars[signal_bar].timestamp,
        flags,
        rsi: rsi[signal_bar],
        decision,
    })
}

/// RSI and flags across the whole series, without translating anything.
pub fn scan(bars: &[Bar], config: &StrategyConfig) -> Result<ScanReport, EvaluationError> {
    config.validate()?;
    validate_bars(bars)?;

    let prices = closes(bars);
    let rsi = Rsi::new(config.rsi_period).compute(bars);
    let flags = DivergenceDetector::new(config.window).detect(&prices, &rsi);
    Ok(ScanReport { rsi, flags })
}
