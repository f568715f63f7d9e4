//! divscan core: RSI divergence detection and order translation.
//!
//! This crate contains everything a polling cycle needs:
//! - Domain types (bars, instruments, timeframes, order requests and outcomes)
//! - Simple-moving-average RSI and window extremes
//! - Swing-based bullish/bearish divergence detection
//! - Signal-to-order translation with stop-loss, take-profit and rounding
//! - Market data feeds (Yahoo chart API, CSV replay)
//! - Order gateways (HTTP bridge, paper)

pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod execution;
pub mod indicators;
pub mod signals;

pub use config::{ConflictPolicy, OrderDefaults, StrategyConfig};
pub use engine::{evaluate, evaluate_detailed, scan};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything the runner shares across the polling
    /// loop is Send + Sync, so feeds and gateways can sit behind `Arc<dyn _>`.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::Instrument>();
        require_sync::<domain::Instrument>();
        require_send::<domain::OrderRequest>();
        require_sync::<domain::OrderRequest>();
        require_send::<domain::OrderOutcome>();
        require_sync::<domain::OrderOutcome>();

        // Strategy
        require_send::<config::StrategyConfig>();
        require_sync::<config::StrategyConfig>();
        require_send::<signals::DivergenceDetector>();
        require_sync::<signals::DivergenceDetector>();
        require_send::<signals::Decision>();
        require_sync::<signals::Decision>();
        require_send::<engine::Evaluation>();
        require_sync::<engine::Evaluation>();

        // Collaborators
        require_send::<data::YahooFeed>();
        require_sync::<data::YahooFeed>();
        require_send::<data::CsvFeed>();
        require_sync::<data::CsvFeed>();
        require_send::<data::CircuitBreaker>();
        require_sync::<data::CircuitBreaker>();
        require_send::<execution::HttpGateway>();
        require_sync::<execution::HttpGateway>();
        require_send::<execution::PaperGateway>();
        require_sync::<execution::PaperGateway>();
    }

    /// Architecture contract: evaluation takes bars and configuration only.
    ///
    /// No feed, gateway, clock or prior-cycle state reaches `evaluate`, so two
    /// calls with the same input always agree.
    #[test]
    fn evaluate_is_a_pure_function_of_its_inputs() {
        fn _check_signature(
            bars: &[domain::Bar],
            config: &StrategyConfig,
        ) -> Option<domain::OrderRequest> {
            evaluate(bars, config)
        }
    }
}
