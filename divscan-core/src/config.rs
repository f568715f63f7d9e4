//! Immutable strategy configuration passed into every evaluation.
//!
//! Defaults reproduce the bot's stock parameters: RSI(14), a 20-bar
//! divergence window, 1:2 risk/reward, 0.1 lots on EURUSD.

use crate::domain::{Instrument, InstrumentError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How to resolve a bar flagged both bullish and bearish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Take the buy.
    #[default]
    BullishFirst,
    /// Take the sell.
    BearishFirst,
    /// Emit nothing.
    Skip,
}

/// Static fields stamped onto every order request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderDefaults {
    /// Volume in lots.
    pub volume: f64,
    /// Accepted slippage in points.
    pub deviation: u32,
    pub magic: u64,
    pub comment: String,
}

impl Default for OrderDefaults {
    fn default() -> Self {
        Self {
            volume: 0.1,
            deviation: 20,
            magic: 123_456,
            comment: "RSI Divergence".to_string(),
        }
    }
}

/// Everything `evaluate` needs besides the bars themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub instrument: Instrument,
    pub rsi_period: usize,
    /// Divergence lookback window W; also the stop-loss extreme window.
    pub window: usize,
    pub risk_reward: f64,
    pub conflict_policy: ConflictPolicy,
    pub order: OrderDefaults,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            instrument: Instrument::new("EURUSD", 5, 0.01),
            rsi_period: 14,
            window: 20,
            risk_reward: 2.0,
            conflict_policy: ConflictPolicy::default(),
            order: OrderDefaults::default(),
        }
    }
}

impl StrategyConfig {
    /// Fewest bars for which the signal bar can carry a defined verdict.
    ///
    /// The signal bar sits at `len - 2` and must be at least `window`; the
    /// oldest swing point it compares against (`signal - window`) must be
    /// past the RSI warmup.
    pub fn min_bars(&self) -> usize {
        self.window + self.rsi_period + 2
    }

    /// Check parameter ranges and that the order volume fits the instrument.
    pub fn validate(&self) -> Result<(), StrategyConfigError> {
        if self.rsi_period == 0 {
            return Err(StrategyConfigError::ZeroRsiPeriod);
        }
        if self.window == 0 {
            return Err(StrategyConfigError::ZeroWindow);
        }
        if !self.risk_reward.is_finite() || self.risk_reward <= 0.0 {
            return Err(StrategyConfigError::InvalidRiskReward(self.risk_reward));
        }
        if self.instrument.symbol.trim().is_empty() {
            return Err(StrategyConfigError::EmptySymbol);
        }
        self.instrument.validate_volume(self.order.volume)?;
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum StrategyConfigError {
    #[error("rsi_period must be >= 1")]
    ZeroRsiPeriod,

    #[error("window must be >= 1")]
    ZeroWindow,

    #[error("risk_reward must be a positive number, got {0}")]
    InvalidRiskReward(f64),

    #[error("instrument symbol must not be empty")]
    EmptySymbol,

    #[error("order volume: {0}")]
    Volume(#[from] InstrumentError),
}
