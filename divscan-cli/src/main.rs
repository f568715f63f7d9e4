//! divscan CLI: run the bot, inspect a series, check a config file.
//!
//! Commands:
//! - `run`: startup checks, then poll forever (or `--once`)
//! - `scan`: fetch one series and print every divergence in it
//! - `check-config`: load, validate and print the effective configuration

mod logging;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use divscan_core::engine::{evaluate_detailed, scan};
use divscan_runner::{BotConfig, Poller};
use logging::{init_logging, LogFormat};
use serde_json::json;
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when `--config` is absent.
const DEFAULT_CONFIG_FILE: &str = "divscan.toml";

#[derive(Parser)]
#[command(name = "divscan", about = "divscan: RSI divergence signal bot")]
struct Cli {
    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the feed and submit orders on divergence.
    Run {
        /// Path to a TOML config file. Defaults to ./divscan.toml if present.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Run a single cycle and exit.
        #[arg(long, default_value_t = false)]
        once: bool,

        /// Stop after this many cycles.
        #[arg(long, conflicts_with = "once")]
        max_cycles: Option<u64>,

        /// Send orders to the paper gateway whatever the config says.
        #[arg(long, default_value_t = false)]
        paper: bool,

        /// Override the traded symbol.
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Fetch bars once and report RSI divergences across the series.
    Scan {
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        symbol: Option<String>,

        /// Print JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Validate a config file and print the effective settings.
    CheckConfig {
        #[arg(long)]
        config: Option<PathBuf>,

        /// Also probe the feed and the gateway.
        #[arg(long, default_value_t = false)]
        probe: bool,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.log_format);

    match cli.command {
        Commands::Run {
            config,
            once,
            max_cycles,
            paper,
            symbol,
        } => run_bot(config.as_deref(), once, max_cycles, paper, symbol),
        Commands::Scan {
            config,
            symbol,
            json,
        } => run_scan(config.as_deref(), symbol, json),
        Commands::CheckConfig { config, probe } => run_check_config(config.as_deref(), probe),
    }
}

fn load_config(path: Option<&Path>) -> Result<BotConfig> {
    let path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => {
            let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
            fallback.exists().then_some(fallback)
        }
    };

    match path {
        Some(p) => {
            tracing::info!(path = %p.display(), "loading config");
            BotConfig::from_file(&p).with_context(|| format!("loading {}", p.display()))
        }
        None => {
            tracing::info!("no config file, using stock settings");
            Ok(BotConfig::default())
        }
    }
}

fn run_bot(
    config: Option<&Path>,
    once: bool,
    max_cycles: Option<u64>,
    paper: bool,
    symbol: Option<String>,
) -> Result<()> {
    let mut cfg = load_config(config)?;
    if let Some(symbol) = symbol {
        cfg.override_symbol(symbol);
    }
    if paper {
        cfg.force_paper();
    }
    cfg.validate().context("invalid configuration")?;

    let mut poller = Poller::new(
        cfg.build_feed()?,
        cfg.build_gateway()?,
        cfg.cycle_settings(),
        cfg.poll_interval(),
    );
    if once {
        poller = poller.with_max_cycles(1);
    } else if let Some(n) = max_cycles {
        poller = poller.with_max_cycles(n);
    }

    let summary = poller.run().context("startup failed")?;
    println!(
        "{} cycle(s): {} filled, {} rejected, {} gateway failures, {} skipped, {} without trade",
        summary.cycles,
        summary.filled,
        summary.rejected,
        summary.gateway_failed,
        summary.skipped,
        summary.no_trade
    );
    Ok(())
}

fn run_scan(config: Option<&Path>, symbol: Option<String>, as_json: bool) -> Result<()> {
    let mut cfg = load_config(config)?;
    if let Some(symbol) = symbol {
        cfg.override_symbol(symbol);
    }
    let settings = cfg.cycle_settings();

    let feed = cfg.build_feed()?;
    let bars = feed
        .fetch_bars(&settings.feed_symbol, settings.timeframe, settings.bars)
        .with_context(|| format!("fetching {} from {}", settings.feed_symbol, feed.name()))?;
    let report = scan(&bars, &settings.strategy)?;
    let evaluation = evaluate_detailed(&bars, &settings.strategy);

    if as_json {
        let flagged: Vec<_> = report
            .flagged()
            .map(|(i, flags)| {
                json!({
                    "index": i,
                    "timestamp": bars[i].timestamp,
                    "close": bars[i].close,
                    "rsi": report.rsi[i],
                    "bullish": flags.bullish,
                    "bearish": flags.bearish,
                })
            })
            .collect();
        let out = json!({
            "symbol": settings.feed_symbol,
            "timeframe": settings.timeframe.as_str(),
            "bars": bars.len(),
            "flagged": flagged,
            "evaluation": evaluation.as_ref().ok(),
            "evaluation_error": evaluation.as_ref().err().map(|e| e.to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!(
        "{} {}: {} bars, RSI({}), window {}",
        settings.feed_symbol,
        settings.timeframe,
        bars.len(),
        settings.strategy.rsi_period,
        settings.strategy.window
    );
    println!("{:<6} {:<26} {:>12} {:>8}  signal", "bar", "time", "close", "rsi");
    for (i, flags) in report.flagged() {
        let label = match (flags.bullish, flags.bearish) {
            (true, true) => "bullish+bearish",
            (true, false) => "bullish",
            _ => "bearish",
        };
        println!(
            "{:<6} {:<26} {:>12.5} {:>8.2}  {}",
            i,
            bars[i].timestamp.to_rfc3339(),
            bars[i].close,
            report.rsi[i],
            label
        );
    }

    match evaluation {
        Ok(eval) => match eval.order() {
            Some(order) => println!(
                "signal bar {}: {} {} @ {:.5} sl {:.5} tp {:.5}",
                eval.signal_bar,
                order.side,
                order.volume,
                order.price,
                order.stop_loss,
                order.take_profit
            ),
            None => println!("signal bar {}: {:?}", eval.signal_bar, eval.decision),
        },
        Err(e) => println!("signal bar not evaluated: {e}"),
    }
    Ok(())
}

fn run_check_config(config: Option<&Path>, probe: bool) -> Result<()> {
    let cfg = load_config(config)?;
    print!("{}", cfg.to_toml()?);

    let strategy = cfg.strategy_config();
    println!(
        "# ok: {} bars needed per evaluation, {} fetched",
        strategy.min_bars(),
        cfg.feed.bars
    );

    if probe {
        let poller = Poller::new(
            cfg.build_feed()?,
            cfg.build_gateway()?,
            cfg.cycle_settings(),
            cfg.poll_interval(),
        );
        poller.startup().context("startup checks failed")?;
        println!("# feed and gateway reachable");
    }
    Ok(())
}
