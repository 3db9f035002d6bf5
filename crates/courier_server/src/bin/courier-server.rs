//! Courier relay server.
//!
//! Loads configuration, opens the channel store, starts the forwarding
//! engine's background loops and serves the liveness/status endpoint until
//! CTRL+C.

use clap::Parser;
use courier_forward::Forwarder;
use courier_rate_limit::CourierConfig;
use courier_server::{ApiState, LogOnlyClient, ServerSettings, TracingSink, create_router};
use courier_store::JsonChannelStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Command-line arguments for the relay server.
#[derive(Parser, Debug)]
#[command(name = "courier-server")]
#[command(about = "Courier - rate-limit aware message relay")]
#[command(version)]
struct Args {
    /// Path to server settings file
    #[arg(short, long, default_value = "courier_server.toml")]
    settings: PathBuf,

    /// Forwarding configuration file (defaults to the standard search path)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for the liveness endpoint
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Channel data file
    #[arg(long, env = "COURIER_DATA_FILE")]
    data_file: Option<PathBuf>,

    /// Validate configuration and exit
    #[arg(long)]
    dry_run: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if args.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("Starting Courier relay");

    let mut settings = ServerSettings::load_or_default(&args.settings)?;
    if let Some(port) = args.port {
        settings.port = port;
    }
    if let Some(data_file) = args.data_file {
        settings.data_file = data_file;
    }
    settings.dry_run |= args.dry_run;

    let config = match &args.config {
        Some(path) => CourierConfig::from_file(path)?,
        None => CourierConfig::load()?,
    };
    info!(
        port = settings.port,
        data_file = %settings.data_file.display(),
        retry_interval_secs = config.forwarding.retry_interval_secs,
        bulk_interval_secs = config.forwarding.bulk_interval_secs,
        "Configuration loaded"
    );

    if settings.dry_run {
        info!("DRY RUN MODE - configuration validated, exiting");
        return Ok(());
    }

    let store = JsonChannelStore::open(&settings.data_file).await?;
    let forwarder = Forwarder::new(
        Arc::new(LogOnlyClient::new()),
        Arc::new(store),
        Arc::new(TracingSink::new()),
        config.forwarding,
    )?;

    let tasks = forwarder.spawn_background();
    forwarder
        .notify(
            "✅ **Relay is running!**\n\n\
             **Commands:**\n\
             /add <channel_id> - Add channel to monitor\n\
             /rem <channel_id> - Remove channel\n\
             /dump <channel_id> - Set dump channel\n\
             /all <channel_id> - Forward all messages from channel\n\
             /status - Relay status",
        )
        .await;

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", settings.port)).await?;
    info!(port = settings.port, "Liveness endpoint listening. Press CTRL+C to shutdown.");

    axum::serve(listener, create_router(ApiState::new(forwarder)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown signal received, stopping gracefully...");
    tasks.shutdown().await;
    info!("Courier relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for CTRL+C");
        std::future::pending::<()>().await;
    }
}
