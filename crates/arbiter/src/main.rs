//! Chess relay server binary.
//!
//! Loads layered settings, applies CLI overrides, installs the
//! Prometheus recorder, and serves the relay router.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use arbiter_server::engine::RelayEngine;
use arbiter_server::hub::TopicHub;
use arbiter_server::settings::RelaySettings;
use arbiter_server::ws::{AppState, router};

/// Real-time relay for two-player chess over WebSocket.
#[derive(Debug, Parser)]
#[command(name = "arbiter", version, about)]
struct Cli {
    /// Bind address (overrides settings).
    #[arg(long)]
    host: Option<String>,

    /// Listen port (overrides settings).
    #[arg(long)]
    port: Option<u16>,

    /// Path to a settings JSON file.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Log filter, e.g. `info` or `arbiter_server=debug`.
    #[arg(long, default_value = "info")]
    log: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_env("ARBITER_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(cli.log.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut settings = RelaySettings::load_or_default(cli.settings.as_deref());
    if let Some(host) = cli.host {
        settings.server.host = host;
    }
    if let Some(port) = cli.port {
        settings.server.port = port;
    }

    let metrics = arbiter_server::metrics::install_recorder();
    let state = AppState {
        engine: Arc::new(RelayEngine::new()),
        hub: Arc::new(TopicHub::new()),
        metrics,
        outbound_queue: settings.relay.outbound_queue,
    };

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %listener.local_addr()?, "relay listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;
    Ok(())
}
