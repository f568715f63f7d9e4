//! Evaluation entry points: bars plus configuration in, decision out.
//!
//! Nothing here knows about time, feeds or gateways. The runner crate owns the
//! polling loop and calls into this module once per cycle.

pub mod evaluate;

pub use evaluate::{evaluate, evaluate_detailed, scan, Evaluation, EvaluationError, ScanReport};
