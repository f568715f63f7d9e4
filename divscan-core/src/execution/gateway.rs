//! Order gateway trait and transport errors.
//!
//! A `GatewayError` means the request never got a verdict (network down,
//! unreadable reply). A broker that answered "no" is not an error; it is an
//! `OrderOutcome` with `OrderStatus::Rejected`.

use crate::domain::{OrderOutcome, OrderRequest};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway unreachable: {0}")]
    Unreachable(String),

    #[error("gateway returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("unreadable gateway response: {0}")]
    InvalidResponse(String),

    #[error("gateway credentials missing: environment variable {var} is not set")]
    MissingCredentials { var: String },

    #[error("gateway error: {0}")]
    Other(String),
}

/// Destination for order requests.
pub trait OrderGateway: Send + Sync {
    /// Human-readable name of this gateway.
    fn name(&self) -> &str;

    /// Startup check that the gateway is reachable and ready.
    fn health_check(&self) -> Result<(), GatewayError>;

    /// Submit one market order. Called at most once per request; callers do
    /// not retry rejections.
    fn submit_order(&self, request: OrderRequest) -> Result<OrderOutcome, GatewayError>;
}
