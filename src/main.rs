//! UNDERCUT — Marketplace listing price monitor
//!
//! Entry point. Loads configuration, initialises structured logging,
//! logs in to the marketplace and runs the check→undercut loop on a
//! fixed interval with graceful shutdown.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use undercut::config::AppConfig;
use undercut::engine::monitor::{MonitorSettings, PriceMonitor};
use undercut::marketplace::http::HttpMarketplaceClient;
use undercut::notify::telegram::TelegramNotifier;
use undercut::notify::Notifier;

const BANNER: &str = r#"
 _   _ _   _ ____  _____ ____   ____ _   _ _____
| | | | \ | |  _ \| ____|  _ \ / ___| | | |_   _|
| | | |  \| | | | |  _| | |_) | |   | | | | | |
| |_| | |\  | |_| | |___|  _ <| |___| |_| | | |
 \___/|_| \_|____/|_____|_| \_\\____|\___/  |_|

  Listing price monitor — v0.1.0
"#;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let cfg = AppConfig::load(&config_path)
        .with_context(|| format!("Failed to load configuration from {config_path}"))?;

    init_logging(&cfg)?;

    println!("{BANNER}");
    info!(
        game_id = %cfg.game_id,
        server_id = %cfg.server_id,
        lot_id = %cfg.lot_id,
        min_price = %cfg.min_price.unwrap_or_default(),
        decrease = %cfg.price_decrease_amount,
        whitelist = cfg.whitelist.len(),
        dry_run = cfg.dry_run,
        "UNDERCUT starting up"
    );

    // -- Initialise components -------------------------------------------

    let client = HttpMarketplaceClient::new(
        &cfg.marketplace.base_url,
        std::time::Duration::from_secs(cfg.marketplace.timeout_secs),
    )?;

    let notifier: Option<Box<dyn Notifier>> = match cfg.telegram() {
        Some((token, chat_id)) => Some(Box::new(TelegramNotifier::new(token, chat_id)?)),
        None => None,
    };

    let settings = MonitorSettings {
        scope: cfg.scope(),
        pricing: cfg.pricing(),
        credentials: cfg.credentials()?,
        currency: cfg.currency.clone(),
        check_interval_minutes: cfg.check_interval_minutes,
        dry_run: cfg.dry_run,
    };

    let mut monitor = PriceMonitor::new(Box::new(client), notifier, settings);

    monitor
        .login()
        .await
        .context("Failed to log in to marketplace, exiting")?;

    // -- Main loop -------------------------------------------------------

    let mut interval = tokio::time::interval(cfg.check_interval());
    // A cycle that overruns the interval swallows the ticks it missed.
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        interval_minutes = cfg.check_interval_minutes,
        "Monitor started. Press Ctrl+C to stop."
    );
    monitor.startup_notify().await;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let outcome = monitor.run_cycle().await;
                if outcome.is_abort() {
                    warn!(outcome = %outcome, "Cycle aborted, retrying next tick");
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    info!(cycles = monitor.cycle_count(), "UNDERCUT shut down cleanly.");
    Ok(())
}

/// Initialise the `tracing` subscriber: console (text or JSON) plus an
/// optional plain-text log file.
fn init_logging(cfg: &AppConfig) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("undercut=info"));

    let console = if std::env::var("UNDERCUT_LOG_JSON").is_ok() {
        fmt::layer().json().with_target(true).with_thread_ids(true).boxed()
    } else {
        fmt::layer().with_target(true).boxed()
    };

    let file = match cfg.logging.file.as_deref() {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {path}"))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(file)
        .init();

    Ok(())
}
