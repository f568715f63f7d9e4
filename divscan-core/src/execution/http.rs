//! HTTP/JSON bridge to a MetaTrader-style terminal.
//!
//! `POST {base_url}/order` carries the trade request; the bridge answers with
//! the terminal's return code. Only `success_retcode` (10009, "request
//! completed", by default) counts as executed. `GET {base_url}/health` must
//! return 2xx before the bot starts polling.

use super::gateway::{GatewayError, OrderGateway};
use crate::domain::{
    FillPolicy, OrderOutcome, OrderRequest, OrderSide, TimeInForce, TradeAction,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Terminal return code for a completed request.
pub const TRADE_RETCODE_DONE: u32 = 10009;

#[derive(Debug, Serialize)]
struct WireOrder<'a> {
    action: TradeAction,
    symbol: &'a str,
    volume: f64,
    #[serde(rename = "type")]
    side: OrderSide,
    price: f64,
    sl: f64,
    tp: f64,
    deviation: u32,
    magic: u64,
    comment: &'a str,
    type_time: TimeInForce,
    type_filling: FillPolicy,
}

impl<'a> From<&'a OrderRequest> for WireOrder<'a> {
    fn from(r: &'a OrderRequest) -> Self {
        Self {
            action: r.action,
            symbol: &r.symbol,
            volume: r.volume,
            side: r.side,
            price: r.price,
            sl: r.stop_loss,
            tp: r.take_profit,
            deviation: r.deviation,
            magic: r.magic,
            comment: &r.comment,
            type_time: r.time_in_force,
            type_filling: r.fill_policy,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireResult {
    retcode: u32,
    #[serde(default)]
    comment: String,
    #[serde(default)]
    order: Option<u64>,
}

impl WireResult {
    fn into_outcome(self, success_retcode: u32) -> OrderOutcome {
        if self.retcode == success_retcode {
            OrderOutcome::done(Some(self.retcode), self.comment, self.order)
        } else {
            OrderOutcome::rejected(Some(self.retcode), self.comment)
        }
    }
}

pub struct HttpGateway {
    client: reqwest::blocking::Client,
    base_url: String,
    token: Option<String>,
    success_retcode: u32,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            success_retcode: TRADE_RETCODE_DONE,
        })
    }

    /// Send `Authorization: Bearer <token>` on every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Read the bearer token from an environment variable.
    pub fn with_token_from_env(self, var: &str) -> Result<Self, GatewayError> {
        let token = std::env::var(var).map_err(|_| GatewayError::MissingCredentials {
            var: var.to_string(),
        })?;
        Ok(self.with_token(token))
    }

    pub fn with_success_retcode(mut self, retcode: u32) -> Self {
        self.success_retcode = retcode;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(
        &self,
        builder: reqwest::blocking::RequestBuilder,
    ) -> reqwest::blocking::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

fn transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_connect() || e.is_timeout() {
        GatewayError::Unreachable(e.to_string())
    } else {
        GatewayError::Other(e.to_string())
    }
}

fn check_status(resp: reqwest::blocking::Response) -> Result<reqwest::blocking::Response, GatewayError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    Err(GatewayError::Http {
        status: status.as_u16(),
        body,
    })
}

impl OrderGateway for HttpGateway {
    fn name(&self) -> &str {
        "http_bridge"
    }

    fn health_check(&self) -> Result<(), GatewayError> {
        let url = format!("{}/health", self.base_url);
        let resp = self
            .authorize(self.client.get(&url))
            .send()
            .map_err(transport_error)?;
        check_status(resp)?;
        tracing::debug!(url, "gateway health check passed");
        Ok(())
    }

    fn submit_order(&self, request: OrderRequest) -> Result<OrderOutcome, GatewayError> {
        let url = format!("{}/order", self.base_url);
        let body = WireOrder::from(&request);
        let resp = self
            .authorize(self.client.post(&url).json(&body))
            .send()
            .map_err(transport_error)?;
        let resp = check_status(resp)?;

        let result: WireResult = resp
            .json()
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        let outcome = result.into_outcome(self.success_retcode);

        tracing::debug!(
            retcode = ?outcome.retcode,
            status = ?outcome.status,
            order_id = ?outcome.order_id,
            "bridge replied"
        );
        Ok(outcome)
    }
}
