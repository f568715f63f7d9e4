//! Fixed-interval polling loop.
//!
//! Startup checks (feed probe, gateway health) are the only fatal step. Once
//! polling, cycles run back to back with a sleep in between until the
//! optional cycle limit is reached or the process is terminated.

use divscan_core::data::{DataError, MarketDataFeed};
use divscan_core::execution::{GatewayError, OrderGateway};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::ConfigError;
use crate::cycle::{run_cycle, CycleOutcome, CycleSettings};

/// Failures that stop the bot before the first cycle.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("market data feed unavailable: {0}")]
    Feed(#[source] DataError),

    #[error("order gateway unavailable: {0}")]
    Gateway(#[source] GatewayError),
}

/// Tally of cycle outcomes across a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub cycles: u64,
    pub skipped: u64,
    pub no_trade: u64,
    pub filled: u64,
    pub rejected: u64,
    pub gateway_failed: u64,
}

impl PollSummary {
    fn record(&mut self, outcome: &CycleOutcome) {
        self.cycles += 1;
        match outcome {
            CycleOutcome::Skipped { .. } => self.skipped += 1,
            CycleOutcome::NoTrade(_) => self.no_trade += 1,
            CycleOutcome::Filled(_) => self.filled += 1,
            CycleOutcome::Rejected(_) => self.rejected += 1,
            CycleOutcome::GatewayFailed { .. } => self.gateway_failed += 1,
        }
    }
}

pub struct Poller {
    feed: Arc<dyn MarketDataFeed>,
    gateway: Arc<dyn OrderGateway>,
    settings: CycleSettings,
    interval: Duration,
    max_cycles: Option<u64>,
}

impl Poller {
    pub fn new(
        feed: Arc<dyn MarketDataFeed>,
        gateway: Arc<dyn OrderGateway>,
        settings: CycleSettings,
        interval: Duration,
    ) -> Self {
        Self {
            feed,
            gateway,
            settings,
            interval,
            max_cycles: None,
        }
    }

    /// Stop after `n` cycles instead of running forever.
    pub fn with_max_cycles(mut self, n: u64) -> Self {
        self.max_cycles = Some(n);
        self
    }

    /// Verify both collaborators answer before trading.
    pub fn startup(&self) -> Result<(), StartupError> {
        self.feed
            .probe(&self.settings.feed_symbol, self.settings.timeframe)
            .map_err(StartupError::Feed)?;
        self.gateway.health_check().map_err(StartupError::Gateway)?;

        tracing::info!(
            feed = self.feed.name(),
            gateway = self.gateway.name(),
            symbol = %self.settings.strategy.instrument.symbol,
            feed_symbol = %self.settings.feed_symbol,
            timeframe = %self.settings.timeframe,
            interval_secs = self.interval.as_secs(),
            "startup checks passed"
        );
        Ok(())
    }

    /// Run the startup checks, then poll.
    pub fn run(&self) -> Result<PollSummary, StartupError> {
        self.run_with(|_, _| {})
    }

    /// Like [`Poller::run`], calling `on_cycle` after each cycle.
    pub fn run_with<F>(&self, mut on_cycle: F) -> Result<PollSummary, StartupError>
    where
        F: FnMut(u64, &CycleOutcome),
    {
        self.startup()?;

        let mut summary = PollSummary::default();
        loop {
            let started = chrono::Utc::now();
            let outcome = run_cycle(self.feed.as_ref(), self.gateway.as_ref(), &self.settings);
            summary.record(&outcome);

            tracing::debug!(
                cycle = summary.cycles,
                outcome = outcome.label(),
                started = %started,
                "cycle finished"
            );
            on_cycle(summary.cycles, &outcome);

            if self.max_cycles.is_some_and(|max| summary.cycles >= max) {
                break;
            }
            std::thread::sleep(self.interval);
        }

        tracing::info!(
            cycles = summary.cycles,
            filled = summary.filled,
            rejected = summary.rejected,
            skipped = summary.skipped,
            "polling stopped"
        );
        Ok(summary)
    }
}
