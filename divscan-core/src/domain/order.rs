//! Order request and gateway outcome types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a market order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Trade action requested from the gateway. Only immediate deals are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeAction {
    Deal,
}

/// How long an order stays working at the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeInForce {
    /// Good till cancelled.
    Gtc,
}

/// Fill policy for the market order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillPolicy {
    /// Immediate or cancel: fill what is available, drop the rest.
    Ioc,
}

/// A market order with attached stop-loss and take-profit.
///
/// Built fresh for each signal and handed to the gateway by value; nothing
/// mutates it after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub action: TradeAction,
    pub symbol: String,
    pub side: OrderSide,
    pub volume: f64,
    /// Expected entry price (the live quote at decision time).
    pub price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    /// Maximum accepted slippage from `price`, in points.
    pub deviation: u32,
    /// Numeric tag identifying this bot's orders at the broker.
    pub magic: u64,
    pub comment: String,
    pub time_in_force: TimeInForce,
    pub fill_policy: FillPolicy,
}

impl OrderRequest {
    /// Absolute distance between entry and stop-loss.
    pub fn risk(&self) -> f64 {
        (self.price - self.stop_loss).abs()
    }

    /// Absolute distance between entry and take-profit.
    pub fn reward(&self) -> f64 {
        (self.take_profit - self.price).abs()
    }
}

/// Whether the gateway executed the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Done,
    Rejected,
}

/// What the gateway reported back for one submitted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderOutcome {
    pub status: OrderStatus,
    /// Broker return code, when the gateway exposes one.
    pub retcode: Option<u32>,
    pub detail: String,
    /// Broker-side order ticket, when the order was accepted.
    pub order_id: Option<u64>,
}

impl OrderOutcome {
    pub fn done(retcode: Option<u32>, detail: impl Into<String>, order_id: Option<u64>) -> Self {
        Self {
            status: OrderStatus::Done,
            retcode,
            detail: detail.into(),
            order_id,
        }
    }

    pub fn rejected(retcode: Option<u32>, detail: impl Into<String>) -> Self {
        Self {
            status: OrderStatus::Rejected,
            retcode,
            detail: detail.into(),
            order_id: None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.status == OrderStatus::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buy_request() -> OrderRequest {
        OrderRequest {
            action: TradeAction::Deal,
            symbol: "EURUSD".into(),
            side: OrderSide::Buy,
            volume: 0.1,
            price: 1.1000,
            stop_loss: 1.0950,
            take_profit: 1.1100,
            deviation: 20,
            magic: 123_456,
            comment: "RSI Divergence".into(),
            time_in_force: TimeInForce::Gtc,
            fill_policy: FillPolicy::Ioc,
        }
    }

    #[test]
    fn risk_and_reward_are_absolute_distances() {
        let req = buy_request();
        assert!((req.risk() - 0.0050).abs() < 1e-12);
        assert!((req.reward() - 0.0100).abs() < 1e-12);
    }

    #[test]
    fn side_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&OrderSide::Sell).unwrap(), "\"sell\"");
        assert_eq!(OrderSide::Buy.to_string(), "BUY");
    }

    #[test]
    fn outcome_constructors() {
        let ok = OrderOutcome::done(Some(10009), "done", Some(42));
        assert!(ok.is_done());
        let rejected = OrderOutcome::rejected(Some(10019), "no money");
        assert!(!rejected.is_done());
        assert_eq!(rejected.order_id, None);
    }
}
