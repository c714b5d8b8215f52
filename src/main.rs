//! Fare watch - airfare lowest-price tracker
//!
//! Polls fare listings for a configured set of travel days and routes, keeps
//! the lowest price ever seen per route and per day, and posts a webhook
//! notification whenever a day's lowest price improves.
//!
//! Module structure:
//! - `domain/` - Core types (Fare, Route, tracking state, listing parser)
//! - `io/` - External interfaces (page-data provider, webhook, state file)
//! - `services/` - Business logic (route/day tracking, cycle, runner)
//! - `infra/` - Infrastructure (Config)

use clap::Parser;
use fare_watch::infra::Config;
use fare_watch::io::{HttpListingProvider, JsonFileStore, LogNotifier, Notifier, WebhookNotifier};
use fare_watch::services::Runner;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Fare watch - lowest airfare tracker
#[derive(Parser, Debug)]
#[command(name = "fare-watch", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, env = "CONFIG_FILE", default_value = "config/dev.toml")]
    config: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

fn init_logging(json: bool) {
    // Default: INFO, use RUST_LOG=debug for per-fare visibility
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Resolves once Ctrl+C or SIGTERM is received
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "sigterm_handler_unavailable");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await.ok();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.json_logs);

    info!(version = env!("CARGO_PKG_VERSION"), git = env!("GIT_HASH"), "fare-watch starting");

    // Invalid configuration is fatal: never enter the polling loop
    let config = match Config::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "config_invalid");
            return Err(e);
        }
    };

    info!(
        config_file = %config.config_file(),
        days = %config.days().len(),
        routes = %config.route_count(),
        interval_secs = %config.poll_interval_secs(),
        provider_url = %config.provider_url(),
        notifier_enabled = %config.notifier_enabled(),
        notifier_format = %config.notifier_format().as_str(),
        state_file = %config.state_file(),
        "config_loaded"
    );

    let provider = Arc::new(HttpListingProvider::new(
        config.provider_url(),
        config.provider_timeout_ms(),
    )?);

    let notifier: Arc<dyn Notifier> = match config.webhook_url() {
        Some(url) if config.notifier_enabled() => Arc::new(WebhookNotifier::new(
            url,
            config.notifier_format().clone(),
            config.notifier_timeout_ms(),
        )?),
        _ => Arc::new(LogNotifier),
    };

    let persistence = Arc::new(JsonFileStore::new(config.state_file()));

    let runner = Runner::init(&config, provider, notifier, persistence);

    // Create shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown_signal_received");
        let _ = shutdown_tx.send(true);
    });

    let final_state = runner.run(shutdown_rx).await;

    info!(days = %final_state.days.len(), "fare-watch shutdown complete");
    Ok(())
}
