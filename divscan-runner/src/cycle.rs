//! One polling cycle: fetch, evaluate, submit at most one order.
//!
//! Nothing here is fatal. A cycle that cannot fetch or evaluate is skipped,
//! and a rejected or failed submission is reported once and never retried.

use divscan_core::config::StrategyConfig;
use divscan_core::data::MarketDataFeed;
use divscan_core::domain::{OrderOutcome, Timeframe};
use divscan_core::engine::evaluate_detailed;
use divscan_core::execution::OrderGateway;
use divscan_core::signals::Decision;

/// Per-cycle inputs derived from the bot configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleSettings {
    pub strategy: StrategyConfig,
    /// Ticker passed to the feed; may differ from the broker symbol.
    pub feed_symbol: String,
    pub timeframe: Timeframe,
    pub bars: usize,
}

/// What happened in one cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Bars could not be fetched or evaluated.
    Skipped { reason: String },
    /// Evaluation ran but produced no order.
    NoTrade(Decision),
    /// The gateway executed the order.
    Filled(OrderOutcome),
    /// The gateway answered with a rejection.
    Rejected(OrderOutcome),
    /// The gateway could not be reached or replied with garbage.
    GatewayFailed { reason: String },
}

impl CycleOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            CycleOutcome::Skipped { .. } => "skipped",
            CycleOutcome::NoTrade(_) => "no_trade",
            CycleOutcome::Filled(_) => "filled",
            CycleOutcome::Rejected(_) => "rejected",
            CycleOutcome::GatewayFailed { .. } => "gateway_failed",
        }
    }
}

pub fn run_cycle(
    feed: &dyn MarketDataFeed,
    gateway: &dyn OrderGateway,
    settings: &CycleSettings,
) -> CycleOutcome {
    let bars = match feed.fetch_bars(&settings.feed_symbol, settings.timeframe, settings.bars) {
        Ok(bars) => bars,
        Err(e) => {
            tracing::warn!(feed = feed.name(), error = %e, "bar fetch failed, skipping cycle");
            return CycleOutcome::Skipped {
                reason: e.to_string(),
            };
        }
    };

    let evaluation = match evaluate_detailed(&bars, &settings.strategy) {
        Ok(evaluation) => evaluation,
        Err(e) => {
            tracing::warn!(bars = bars.len(), error = %e, "evaluation skipped");
            return CycleOutcome::Skipped {
                reason: e.to_string(),
            };
        }
    };

    let request = match evaluation.decision {
        Decision::Order(request) => request,
        other => {
            tracing::debug!(signal_time = %evaluation.signal_time, decision = ?other, "no trade this cycle");
            return CycleOutcome::NoTrade(other);
        }
    };

    tracing::info!(
        side = %request.side,
        symbol = %request.symbol,
        price = request.price,
        sl = request.stop_loss,
        tp = request.take_profit,
        rsi = evaluation.rsi,
        signal_time = %evaluation.signal_time,
        "divergence signal, submitting order"
    );

    match gateway.submit_order(request) {
        Ok(outcome) if outcome.is_done() => {
            tracing::info!(
                gateway = gateway.name(),
                retcode = ?outcome.retcode,
                order_id = ?outcome.order_id,
                "order executed"
            );
            CycleOutcome::Filled(outcome)
        }
        Ok(outcome) => {
            tracing::warn!(
                gateway = gateway.name(),
                retcode = ?outcome.retcode,
                detail = %outcome.detail,
                "order rejected"
            );
            CycleOutcome::Rejected(outcome)
        }
        Err(e) => {
            tracing::error!(gateway = gateway.name(), error = %e, "order submission failed");
            CycleOutcome::GatewayFailed {
                reason: e.to_string(),
            }
        }
    }
}
