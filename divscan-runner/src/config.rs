//! Bot configuration file.
//!
//! Every section and field is optional; omitted values fall back to the
//! stock EURUSD M15 setup. A minimal file only needs to say where bars come
//! from and where orders go:
//!
//! ```toml
//! [feed]
//! kind = "yahoo"
//! symbol = "EURUSD=X"
//!
//! [gateway]
//! kind = "http"
//! base_url = "http://127.0.0.1:8420"
//! token_env = "DIVSCAN_BRIDGE_TOKEN"
//! ```

use divscan_core::config::{ConflictPolicy, OrderDefaults, StrategyConfig, StrategyConfigError};
use divscan_core::data::{CircuitBreaker, CsvFeed, MarketDataFeed, YahooFeed};
use divscan_core::domain::{Instrument, Timeframe};
use divscan_core::execution::{HttpGateway, OrderGateway, PaperGateway, TRADE_RETCODE_DONE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::cycle::CycleSettings;
use crate::poller::StartupError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid strategy settings: {0}")]
    Strategy(#[from] StrategyConfigError),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Divergence and risk parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategySection {
    pub rsi_period: usize,
    pub window: usize,
    pub risk_reward: f64,
    pub conflict_policy: ConflictPolicy,
}

impl Default for StrategySection {
    fn default() -> Self {
        let stock = StrategyConfig::default();
        Self {
            rsi_period: stock.rsi_period,
            window: stock.window,
            risk_reward: stock.risk_reward,
            conflict_policy: stock.conflict_policy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedKind {
    #[default]
    Yahoo,
    Csv,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedSection {
    pub kind: FeedKind,
    /// Ticker as the feed knows it (Yahoo quotes EURUSD as `EURUSD=X`).
    /// Defaults to the instrument symbol.
    pub symbol: Option<String>,
    pub timeframe: Timeframe,
    /// Bars requested per cycle.
    pub bars: usize,
    /// CSV file, required for `kind = "csv"`.
    pub path: Option<PathBuf>,
    /// Alternate chart API host for the Yahoo feed.
    pub base_url: Option<String>,
    /// Consecutive failures before the Yahoo circuit breaker opens.
    pub breaker_threshold: u32,
    pub breaker_cooldown_secs: u64,
}

impl Default for FeedSection {
    fn default() -> Self {
        Self {
            kind: FeedKind::Yahoo,
            symbol: None,
            timeframe: Timeframe::M15,
            bars: 500,
            path: None,
            base_url: None,
            breaker_threshold: 3,
            breaker_cooldown_secs: 600,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayKind {
    #[default]
    Paper,
    Http,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySection {
    pub kind: GatewayKind,
    /// Bridge root URL, required for `kind = "http"`.
    pub base_url: Option<String>,
    /// Environment variable holding the bridge bearer token.
    pub token_env: Option<String>,
    pub timeout_secs: u64,
    /// Return code that means "executed".
    pub success_retcode: u32,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            kind: GatewayKind::Paper,
            base_url: None,
            token_env: None,
            timeout_secs: 10,
            success_retcode: TRADE_RETCODE_DONE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSection {
    pub poll_interval_secs: u64,
}

impl Default for ScheduleSection {
    fn default() -> Self {
        Self {
            poll_interval_secs: 60,
        }
    }
}

/// Complete bot configuration as loaded from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub instrument: Instrument,
    pub strategy: StrategySection,
    pub order: OrderDefaults,
    pub feed: FeedSection,
    pub gateway: GatewaySection,
    pub schedule: ScheduleSection,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            instrument: StrategyConfig::default().instrument,
            strategy: StrategySection::default(),
            order: OrderDefaults::default(),
            feed: FeedSection::default(),
            gateway: GatewaySection::default(),
            schedule: ScheduleSection::default(),
        }
    }
}

impl BotConfig {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let strategy = self.strategy_config();
        strategy.validate()?;

        if self.feed.bars < strategy.min_bars() {
            return Err(ConfigError::Invalid(format!(
                "feed.bars = {} is below the {} bars one evaluation needs",
                self.feed.bars,
                strategy.min_bars()
            )));
        }
        if self.feed.kind == FeedKind::Csv && self.feed.path.is_none() {
            return Err(ConfigError::Invalid(
                "feed.path is required when feed.kind = \"csv\"".into(),
            ));
        }
        if self.gateway.kind == GatewayKind::Http && self.gateway.base_url.is_none() {
            return Err(ConfigError::Invalid(
                "gateway.base_url is required when gateway.kind = \"http\"".into(),
            ));
        }
        if self.gateway.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "gateway.timeout_secs must be >= 1".into(),
            ));
        }
        Ok(())
    }

    /// Replace the traded symbol. The feed ticker is reset too, since an
    /// override for the old symbol would no longer match.
    pub fn override_symbol(&mut self, symbol: impl Into<String>) {
        self.instrument.symbol = symbol.into();
        self.feed.symbol = None;
    }

    /// Route orders to the paper gateway regardless of the file.
    pub fn force_paper(&mut self) {
        self.gateway.kind = GatewayKind::Paper;
    }

    pub fn strategy_config(&self) -> StrategyConfig {
        StrategyConfig {
            instrument: self.instrument.clone(),
            rsi_period: self.strategy.rsi_period,
            window: self.strategy.window,
            risk_reward: self.strategy.risk_reward,
            conflict_policy: self.strategy.conflict_policy,
            order: self.order.clone(),
        }
    }

    pub fn feed_symbol(&self) -> &str {
        self.feed
            .symbol
            .as_deref()
            .unwrap_or(&self.instrument.symbol)
    }

    pub fn cycle_settings(&self) -> CycleSettings {
        CycleSettings {
            strategy: self.strategy_config(),
            feed_symbol: self.feed_symbol().to_string(),
            timeframe: self.feed.timeframe,
            bars: self.feed.bars,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.schedule.poll_interval_secs)
    }

    pub fn build_feed(&self) -> Result<Arc<dyn MarketDataFeed>, StartupError> {
        match self.feed.kind {
            FeedKind::Yahoo => {
                let breaker = Arc::new(CircuitBreaker::new(
                    Duration::from_secs(self.feed.breaker_cooldown_secs),
                    self.feed.breaker_threshold,
                ));
                let mut feed = YahooFeed::new(breaker).map_err(StartupError::Feed)?;
                if let Some(url) = &self.feed.base_url {
                    feed = feed.with_base_url(url.clone());
                }
                Ok(Arc::new(feed))
            }
            FeedKind::Csv => {
                let path = self.feed.path.clone().ok_or_else(|| {
                    StartupError::Config(ConfigError::Invalid("feed.path is not set".into()))
                })?;
                Ok(Arc::new(CsvFeed::new(path)))
            }
        }
    }

    pub fn build_gateway(&self) -> Result<Arc<dyn OrderGateway>, StartupError> {
        match self.gateway.kind {
            GatewayKind::Paper => Ok(Arc::new(PaperGateway::new())),
            GatewayKind::Http => {
                let base_url = self.gateway.base_url.clone().ok_or_else(|| {
                    StartupError::Config(ConfigError::Invalid("gateway.base_url is not set".into()))
                })?;
                let mut gateway =
                    HttpGateway::new(base_url, Duration::from_secs(self.gateway.timeout_secs))
                        .map_err(StartupError::Gateway)?
                        .with_success_retcode(self.gateway.success_retcode);
                if let Some(var) = &self.gateway.token_env {
                    gateway = gateway
                        .with_token_from_env(var)
                        .map_err(StartupError::Gateway)?;
                }
                Ok(Arc::new(gateway))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_stock_setup() {
        let cfg = BotConfig::from_toml("").unwrap();
        assert_eq!(cfg, BotConfig::default());
        assert_eq!(cfg.instrument.symbol, "EURUSD");
        assert_eq!(cfg.feed.timeframe, Timeframe::M15);
        assert_eq!(cfg.feed.bars, 500);
        assert_eq!(cfg.order.magic, 123_456);
        assert_eq!(cfg.gateway.kind, GatewayKind::Paper);
        assert_eq!(cfg.gateway.success_retcode, 10009);
        assert_eq!(cfg.poll_interval(), Duration::from_secs(60));
        assert_eq!(cfg.strategy_config(), StrategyConfig::default());
    }

    #[test]
    fn full_file_round_trips_into_strategy() {
        let cfg = BotConfig::from_toml(
            r#"
            [instrument]
            symbol = "GBPUSD"
            digits = 5

            [strategy]
            rsi_period = 10
            window = 15
            risk_reward = 1.5
            conflict_policy = "skip"

            [order]
            volume = 0.25
            comment = "div"

            [feed]
            kind = "csv"
            path = "bars.csv"
            timeframe = "H1"
            bars = 200

            [gateway]
            kind = "http"
            base_url = "http://127.0.0.1:8420"
            token_env = "BRIDGE_TOKEN"
            success_retcode = 0

            [schedule]
            poll_interval_secs = 30
            "#,
        )
        .unwrap();

        let strategy = cfg.strategy_config();
        assert_eq!(strategy.instrument.symbol, "GBPUSD");
        assert_eq!(strategy.rsi_period, 10);
        assert_eq!(strategy.window, 15);
        assert_eq!(strategy.conflict_policy, ConflictPolicy::Skip);
        assert_eq!(strategy.order.volume, 0.25);
        assert_eq!(strategy.order.deviation, 20);
        assert_eq!(cfg.feed.kind, FeedKind::Csv);
        assert_eq!(cfg.feed.timeframe, Timeframe::H1);
        assert_eq!(cfg.gateway.success_retcode, 0);
        assert_eq!(cfg.poll_interval(), Duration::from_secs(30));
    }

    #[test]
    fn feed_symbol_defaults_to_instrument() {
        let mut cfg = BotConfig::default();
        assert_eq!(cfg.feed_symbol(), "EURUSD");
        cfg.feed.symbol = Some("EURUSD=X".into());
        assert_eq!(cfg.feed_symbol(), "EURUSD=X");
        assert_eq!(cfg.cycle_settings().feed_symbol, "EURUSD=X");

        cfg.override_symbol("USDJPY");
        assert_eq!(cfg.feed_symbol(), "USDJPY");
        assert_eq!(cfg.strategy_config().instrument.symbol, "USDJPY");
    }

    #[test]
    fn csv_feed_requires_path() {
        let err = BotConfig::from_toml("[feed]\nkind = \"csv\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn http_gateway_requires_url() {
        let err = BotConfig::from_toml("[gateway]\nkind = \"http\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn too_few_bars_is_rejected() {
        let err = BotConfig::from_toml("[feed]\nbars = 20\n").unwrap_err();
        assert!(err.to_string().contains("below"));
    }

    #[test]
    fn bad_strategy_values_are_rejected() {
        let err = BotConfig::from_toml("[strategy]\nwindow = 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Strategy(StrategyConfigError::ZeroWindow)
        ));
    }

    #[test]
    fn unknown_kind_is_a_parse_error() {
        let err = BotConfig::from_toml("[gateway]\nkind = \"fax\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn force_paper_overrides_http() {
        let mut cfg = BotConfig::from_toml(
            "[gateway]\nkind = \"http\"\nbase_url = \"http://localhost:1\"\n",
        )
        .unwrap();
        cfg.force_paper();
        let gateway = cfg.build_gateway().unwrap();
        assert_eq!(gateway.name(), "paper");
    }

    #[test]
    fn missing_config_file_is_io_error() {
        let err = BotConfig::from_file(Path::new("/nonexistent/divscan.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn default_config_serializes() {
        let text = BotConfig::default().to_toml().unwrap();
        assert_eq!(BotConfig::from_toml(&text).unwrap(), BotConfig::default());
    }
}
