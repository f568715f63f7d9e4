use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Instrument metadata: price precision and volume step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Instrument {
    pub symbol: String,
    /// Decimal places of a quoted price (5 for EURUSD).
    #[serde(default = "default_digits")]
    pub digits: u32,
    /// Smallest tradable volume increment, in lots.
    #[serde(default = "default_volume_step")]
    pub volume_step: f64,
}

fn default_digits() -> u32 {
    5
}

fn default_volume_step() -> f64 {
    0.01
}

impl Instrument {
    pub fn new(symbol: impl Into<String>, digits: u32, volume_step: f64) -> Self {
        Self {
            symbol: symbol.into(),
            digits,
            volume_step,
        }
    }

    /// Size of one price point (10^-digits).
    pub fn point(&self) -> f64 {
        10f64.powi(-(self.digits as i32))
    }

    /// Round a price to the instrument's decimal precision.
    pub fn round_price(&self, price: f64) -> f64 {
        let factor = 10f64.powi(self.digits as i32);
        (price * factor).round() / factor
    }

    /// Validate that a volume is positive and a whole number of volume steps.
    pub fn validate_volume(&self, volume: f64) -> Result<f64, InstrumentError> {
        if !volume.is_finite() || volume <= 0.0 {
            return Err(InstrumentError::NonPositiveVolume { volume });
        }
        if !self.volume_step.is_finite() || self.volume_step <= 0.0 {
            return Err(InstrumentError::InvalidVolumeStep {
                volume_step: self.volume_step,
            });
        }

        let steps = volume / self.volume_step;
        if (steps - steps.round()).abs() > 1e-9 {
            return Err(InstrumentError::InvalidVolumeStep {
                volume_step: self.volume_step,
            });
        }
        Ok(steps.round() * self.volume_step)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum InstrumentError {
    #[error("volume {volume} must be positive and finite")]
    NonPositiveVolume { volume: f64 },

    #[error("volume does not respect volume_step {volume_step}")]
    InvalidVolumeStep { volume_step: f64 },
}
