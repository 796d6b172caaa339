//! Grafana proxy
//!
//! ```text
//!  Dashboard                    grafana-proxy                         Grafana
//!  ─────────  GET /proxy/p?q  ┌──────────────────────────────┐
//!            ────────────────▶│ route table (http/server.rs) │
//!                             │   → security::path           │  GET {base}/p?q
//!                             │   → security::headers        │  Authorization: ...
//!                             │   → GrafanaClient::send      │─────────────────▶
//!            ◀────────────────│   ← allowlisted headers      │◀─────────────────
//!             status + body   └──────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use grafana_proxy::config::ConfigWatcher;
use grafana_proxy::lifecycle::{signals, startup};
use grafana_proxy::observability::{logging, metrics};
use grafana_proxy::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "grafana-proxy")]
#[command(about = "Reverse proxy that injects Grafana credentials", long_about = None)]
struct Cli {
    /// TOML configuration file. Without it, settings come from GRAFANA_API_* variables.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = startup::load_configuration(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "grafana-proxy starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        grafana = %config.grafana.api_url,
        auth_method = ?config.grafana.api_auth_method,
        upstream_timeout_secs = config.timeouts.upstream_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    // Keep the watcher alive for the lifetime of the server.
    let (_watcher, config_updates) = match cli.config.as_deref() {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(signals::shutdown_on_signal(shutdown));

    let server = HttpServer::from_config(config)?;
    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
