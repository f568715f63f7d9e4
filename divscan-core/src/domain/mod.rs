//! Domain types for divscan

pub mod bar;
pub mod instrument;
pub mod order;
pub mod timeframe;

pub use bar::{closes, Bar};
pub use instrument::{Instrument, InstrumentError};
pub use order::{
    FillPolicy, OrderOutcome, OrderRequest, OrderSide, OrderStatus, TimeInForce, TradeAction,
};
pub use timeframe::Timeframe;
