//! Order gateways: where translated orders go.

pub mod gateway;
pub mod http;
pub mod paper;

pub use gateway::{GatewayError, OrderGateway};
pub use http::{HttpGateway, TRADE_RETCODE_DONE};
pub use paper::PaperGateway;
