//! Divergence detection and the signal-to-order decision.

pub mod divergence;
pub mod translator;

pub use divergence::{DivergenceDetector, DivergenceFlags};
pub use translator::{Decision, OrderTranslator};
