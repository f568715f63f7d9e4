//! divscan runner: configuration file, polling cycle, scheduling loop.
//!
//! This crate builds on `divscan-core` to provide:
//! - `BotConfig`, loaded from TOML, which builds the feed and gateway
//! - `run_cycle`, one fetch/evaluate/submit pass
//! - `Poller`, the startup checks and fixed-interval loop

pub mod config;
pub mod cycle;
pub mod poller;

pub use config::{BotConfig, ConfigError, FeedKind, GatewayKind};
pub use cycle::{run_cycle, CycleOutcome, CycleSettings};
pub use poller::{PollSummary, Poller, StartupError};
