//! procwatch server - streams process start/end events over WebSocket.
//!
//! Every WebSocket client gets its own polling session. Events are JSON text
//! frames of the form `["processesStarted", {"name", "pid", "date"}]`.

mod channel;
mod handler;
mod origin;
mod server;

use anyhow::Result;
use clap::Parser;
use origin::OriginPolicy;
use procwatch_core::{
    ServerConfig, SubscriptionManager, SysinfoSource, WatchConfig, WatchOptions,
};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "procwatch-server")]
#[command(about = "Stream process start/end events to WebSocket clients")]
struct Args {
    /// Port to listen on (0 = auto-assign)
    #[arg(short, long, env = "PROCWATCH_PORT", default_value_t = ServerConfig::DEFAULT_PORT)]
    port: u16,

    /// Host to bind to
    #[arg(long, env = "PROCWATCH_HOST", default_value = ServerConfig::DEFAULT_HOST)]
    host: String,

    /// Origin allowed to open a WebSocket ("*" allows any); repeatable
    #[arg(
        long = "allowed-origin",
        env = "PROCWATCH_ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_value = ServerConfig::DEFAULT_ALLOWED_ORIGIN
    )]
    allowed_origins: Vec<String>,

    /// Milliseconds between two process table polls
    #[arg(
        long,
        env = "PROCWATCH_INTERVAL_MS",
        default_value_t = WatchConfig::DEFAULT_POLL_INTERVAL.as_millis() as u64
    )]
    interval_ms: u64,

    /// Give up on a single process table poll after this many milliseconds
    #[arg(
        long,
        env = "PROCWATCH_FETCH_TIMEOUT_MS",
        default_value_t = WatchConfig::DEFAULT_FETCH_TIMEOUT.as_millis() as u64
    )]
    fetch_timeout_ms: u64,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    info!("Starting procwatch server");

    let options = WatchOptions::from_millis(args.interval_ms, args.fetch_timeout_ms)?;
    let origins = OriginPolicy::from_origins(&args.allowed_origins);
    info!(
        "Polling every {:?}, allowed origins: {}",
        options.interval, origins
    );

    let manager = SubscriptionManager::new(Arc::new(SysinfoSource::new()), options)?;
    let (addr, state) = server::start_server(manager, origins, &args.host, args.port).await?;

    info!("Process events available at ws://{}{}", addr, ServerConfig::WS_PATH);

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting");
    state.manager.shutdown().await;

    Ok(())
}
