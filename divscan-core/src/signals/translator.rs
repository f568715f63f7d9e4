//! Signal-to-order translation.
//!
//! Turns the signal bar's divergence flags into at most one market order.
//! Entry is the close of the final (forming) bar, i.e. the live quote. The
//! stop sits at the extreme of the trailing window and the target is the stop
//! distance scaled by the risk/reward ratio.

use super::divergence::DivergenceFlags;
use crate::config::{ConflictPolicy, StrategyConfig};
use crate::domain::{Bar, FillPolicy, OrderRequest, OrderSide, TimeInForce, TradeAction};
use crate::indicators::{highest_high, lowest_low};
use serde::{Deserialize, Serialize};

/// Outcome of one translation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Decision {
    /// An order should be submitted.
    Order(OrderRequest),
    /// Neither flag was set.
    NoSignal,
    /// Both flags were set and the conflict policy is `Skip`.
    Conflict,
    /// The stop would sit on or beyond the entry after rounding.
    DegenerateRisk {
        side: OrderSide,
        entry: f64,
        stop_loss: f64,
    },
}

impl Decision {
    pub fn into_order(self) -> Option<OrderRequest> {
        match self {
            Decision::Order(request) => Some(request),
            _ => None,
        }
    }

    pub fn is_order(&self) -> bool {
        matches!(self, Decision::Order(_))
    }
}

/// Pick the trade direction for a set of flags under a conflict policy.
///
/// `Err(())` means the flags conflict and the policy says to stand aside.
fn resolve_side(
    flags: DivergenceFlags,
    policy: ConflictPolicy,
) -> Result<Option<OrderSide>, ()> {
    match (flags.bullish, flags.bearish) {
        (false, false) => Ok(None),
        (true, false) => Ok(Some(OrderSide::Buy)),
        (false, true) => Ok(Some(OrderSide::Sell)),
        (true, true) => match policy {
            ConflictPolicy::BullishFirst => Ok(Some(OrderSide::Buy)),
            ConflictPolicy::BearishFirst => Ok(Some(OrderSide::Sell)),
            ConflictPolicy::Skip => Err(()),
        },
    }
}

/// Builds order requests from flags and recent bars.
#[derive(Debug, Clone)]
pub struct OrderTranslator<'a> {
    config: &'a StrategyConfig,
}

impl<'a> OrderTranslator<'a> {
    pub fn new(config: &'a StrategyConfig) -> Self {
        Self { config }
    }

    /// Decide what to do given the signal bar's flags.
    ///
    /// `bars` is the full fetched series; its last element provides the entry
    /// price and its trailing `window` bars (fewer if not available) provide
    /// the stop-loss extreme.
    pub fn translate(&self, bars: &[Bar], flags: DivergenceFlags) -> Decision {
        let side = match resolve_side(flags, self.config.conflict_policy) {
            Ok(Some(side)) => side,
            Ok(None) => return Decision::NoSignal,
            Err(()) => return Decision::Conflict,
        };

        let Some(last) = bars.last() else {
            return Decision::NoSignal;
        };

        let instrument = &self.config.instrument;
        let window = self.config.window;
        let rr = self.config.risk_reward;
        let entry = instrument.round_price(last.close);

        let extreme = match side {
            OrderSide::Buy => lowest_low(bars, window),
            OrderSide::Sell => highest_high(bars, window),
        };
        let stop_loss = match extreme {
            Some(v) => instrument.round_price(v),
            None => f64::NAN,
        };

        let risk_ok = match side {
            OrderSide::Buy => stop_loss < entry,
            OrderSide::Sell => stop_loss > entry,
        };
        if !risk_ok {
            tracing::warn!(
                side = %side,
                entry,
                stop_loss,
                "stop-loss does not bound the entry, skipping order"
            );
            return Decision::DegenerateRisk {
                side,
                entry,
                stop_loss,
            };
        }

        let take_profit = match side {
            OrderSide::Buy => instrument.round_price(entry + (entry - stop_loss) * rr),
            OrderSide::Sell => instrument.round_price(entry - (stop_loss - entry) * rr),
        };

        let defaults = &self.config.order;
        Decision::Order(OrderRequest {
            action: TradeAction::Deal,
            symbol: instrument.symbol.clone(),
            side,
            volume: defaults.volume,
            price: entry,
            stop_loss,
            take_profit,
            deviation: defaults.deviation,
            magic: defaults.magic,
            comment: defaults.comment.clone(),
            time_in_force: TimeInForce::Gtc,
            fill_policy: FillPolicy::Ioc,
        })
    }
}
