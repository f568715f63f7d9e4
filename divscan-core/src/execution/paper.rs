//! Paper gateway: accepts every order and keeps a copy.

use super::gateway::{GatewayError, OrderGateway};
use super::http::TRADE_RETCODE_DONE;
use crate::domain::{OrderOutcome, OrderRequest};
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct PaperGateway {
    submitted: Mutex<Vec<OrderRequest>>,
}

impl PaperGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Orders accepted so far, oldest first.
    pub fn submitted(&self) -> Vec<OrderRequest> {
        self.submitted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl OrderGateway for PaperGateway {
    fn name(&self) -> &str {
        "paper"
    }

    fn health_check(&self) -> Result<(), GatewayError> {
        Ok(())
    }

    fn submit_order(&self, request: OrderRequest) -> Result<OrderOutcome, GatewayError> {
        let mut submitted = self
            .submitted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let ticket = submitted.len() as u64 + 1;

        tracing::info!(
            gateway = "paper",
            ticket,
            side = %request.side,
            symbol = %request.symbol,
            volume = request.volume,
            price = request.price,
            sl = request.stop_loss,
            tp = request.take_profit,
            "paper order filled"
        );

        submitted.push(request);
        Ok(OrderOutcome::done(
            Some(TRADE_RETCODE_DONE),
            "paper fill",
            Some(ticket),
        ))
    }
}
