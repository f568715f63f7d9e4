//! Bar feeds and series validation

pub mod circuit_breaker;
pub mod csv_feed;
pub mod provider;
pub mod validate;
pub mod yahoo;

pub use circuit_breaker::CircuitBreaker;
pub use csv_feed::CsvFeed;
pub use provider::{DataError, MarketDataFeed};
pub use validate::{validate_bars, SeriesError};
pub use yahoo::YahooFeed;
