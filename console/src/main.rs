mod actions;
mod broker;
mod cache;
mod config;
mod error;
mod logfeed;
mod metrics;
mod render;
mod scheduler;
mod status;
mod types;

use crate::actions::PositionActionController;
use crate::broker::{AlpacaGateway, Broker};
use crate::cache::PerformanceCache;
use crate::config::Config;
use crate::error::CloseError;
use crate::logfeed::LogFeed;
use crate::scheduler::RefreshScheduler;
use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{watch, Notify};
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "sniperhq", about = "Operations console for the Sniper trading bot")]
struct Cli {
    /// Run one refresh cycle then exit
    #[arg(long)]
    once: bool,

    /// Override refresh interval (seconds)
    #[arg(long)]
    interval: Option<u64>,

    /// Load config from a specific .env file
    #[arg(long)]
    config_file: Option<String>,
}

const ACTIVITY_TAIL: usize = 20;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut cfg = Config::from_env_file(cli.config_file.as_deref())
        .context("loading configuration (APCA_API_KEY_ID / APCA_API_SECRET_KEY required)")?;

    if let Some(interval) = cli.interval {
        cfg.refresh_interval_secs = interval;
    }

    info!("══════════════════════════════════════════════════════");
    info!("  SNIPER BOT HQ — operations console");
    info!("  Venue: {} (paper)", cfg.trading_api_base);
    info!("  Symbols: {}", cfg.symbols.join(", "));
    info!(
        "  Refresh: {}s | Perf cache TTL: {}s | 1W column: {}",
        cfg.refresh_interval_secs,
        cfg.perf_cache_ttl_secs,
        if cfg.show_week_change { "on" } else { "off" }
    );
    info!("  Commands: close <SYMBOL> | quit   Stop: Ctrl+C");
    info!("══════════════════════════════════════════════════════");

    let broker: Arc<dyn Broker> = Arc::new(AlpacaGateway::new(
        &cfg.credentials,
        &cfg.trading_api_base,
        &cfg.data_api_base,
        Duration::from_secs(cfg.request_timeout_secs),
    )?);

    let refresh = Arc::new(Notify::new());
    let controller = Arc::new(PositionActionController::new(
        Arc::clone(&broker),
        Arc::clone(&refresh),
    ));
    let feed = LogFeed::new(&cfg.log_feed_path);
    let cache = PerformanceCache::new(Duration::from_secs(cfg.perf_cache_ttl_secs));

    // Graceful shutdown: Ctrl+C or a `quit` command
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let stop_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("STOP SIGNAL (Ctrl+C)");
        stop_tx.send(true).ok();
    });

    spawn_command_reader(controller, shutdown_tx);

    let mut scheduler = RefreshScheduler::new(broker, cache, &cfg, refresh, shutdown_rx);

    if cli.once {
        let view = scheduler.run_cycle().await;
        println!("{}", render::render(&view, &feed.tail(ACTIVITY_TAIL)));
        return Ok(());
    }

    scheduler
        .run(|view| {
            let logs = feed.tail(ACTIVITY_TAIL);
            info!("\n{}", render::render(view, &logs));
        })
        .await;

    Ok(())
}

/// Operator command channel: one line per command on stdin.
/// `close <SYMBOL>` fires the kill switch, `quit` shuts the console down.
fn spawn_command_reader(
    controller: Arc<PositionActionController>,
    shutdown_tx: watch::Sender<bool>,
) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let mut parts = line.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some("close"), Some(symbol)) => {
                    let symbol = symbol.to_uppercase();
                    match controller.request_close(&symbol).await {
                        Ok(request) => {
                            info!(
                                "close {symbol}: {:?} (request {})",
                                request.state, request.id
                            );
                        }
                        Err(CloseError::Busy(_)) => {
                            warn!("close for {symbol} already in flight, ignoring");
                        }
                        Err(CloseError::Broker(e)) => {
                            error!("close for {symbol} failed: {e}");
                        }
                    }
                }
                (Some("quit"), _) => {
                    info!("STOP SIGNAL (quit command)");
                    shutdown_tx.send(true).ok();
                    break;
                }
                (Some(other), _) => {
                    warn!("unknown command '{other}' (try: close <SYMBOL> | quit)");
                }
                (None, _) => {}
            }
        }
    });
}
