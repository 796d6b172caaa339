//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router from an explicit route table
//! - Wire up middleware (request id, tracing, timeout, body limit)
//! - Hold the active Grafana client and swap it on config reload
//! - Serve until the shutdown broadcast fires

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    routing::{any, get},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::validation::check_upstream_fits;
use crate::config::ProxyConfig;
use crate::grafana::GrafanaClient;
use crate::http::handlers::{grafana_url, health, proxy_handler, validate};
use crate::http::request::{make_span, propagate_request_id_layer, set_request_id_layer};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    client: Arc<ArcSwap<GrafanaClient>>,
    max_body_size: usize,
    request_secs: u64,
}

impl AppState {
    /// `limits` and `timeouts.request_secs` are fixed for the life of the
    /// router; only the client is swapped on reload.
    pub fn new(client: GrafanaClient, config: &ProxyConfig) -> Self {
        Self {
            client: Arc::new(ArcSwap::from_pointee(client)),
            max_body_size: config.limits.max_body_size,
            request_secs: config.timeouts.request_secs,
        }
    }

    /// Snapshot of the current client; unaffected by later reloads.
    pub fn client(&self) -> Arc<GrafanaClient> {
        self.client.load_full()
    }

    pub fn max_body_size(&self) -> usize {
        self.max_body_size
    }

    /// Rebuild the Grafana client from `config` and swap it in.
    ///
    /// The new upstream timeout must still fit inside the inbound deadline
    /// the router was built with. On failure the current client stays active.
    pub fn reload(&self, config: &ProxyConfig) -> Result<(), crate::Error> {
        check_upstream_fits(config.timeouts.upstream_secs, self.request_secs)?;
        let client = GrafanaClient::from_config(config)?;
        tracing::info!(
            base_url = %client.base_url(),
            auth_method = ?client.config().credentials().method(),
            "Grafana client reloaded"
        );
        self.client.store(Arc::new(client));
        Ok(())
    }
}

/// HTTP server for the Grafana proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a server around an already-built Grafana client.
    ///
    /// `config` is expected to have passed `validate_config`.
    pub fn new(config: ProxyConfig, client: GrafanaClient) -> Self {
        let state = AppState::new(client, &config);
        let router = Self::build_router(&config, state.clone());
        Self {
            router,
            config,
            state,
        }
    }

    /// Validate the Grafana settings and create the server.
    pub fn from_config(config: ProxyConfig) -> Result<Self, crate::Error> {
        let client = GrafanaClient::from_config(&config)?;
        Ok(Self::new(config, client))
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/proxy", any(proxy_handler))
            .route("/proxy/", any(proxy_handler))
            .route("/proxy/{*path}", any(proxy_handler))
            .route("/url", get(grafana_url))
            .route("/validation/{uid}", get(validate))
            .route("/health", get(health))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(make_span::<Body>))
            .layer(set_request_id_layer())
    }

    /// The router, for serving in-process (tests, embedding).
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Validated configs arriving on `config_updates` replace the Grafana
    /// client; the listener itself is not rebound.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<ProxyConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            grafana = %self.state.client().base_url(),
            "HTTP server starting"
        );

        let reloader = spawn_reloader(self.state.clone(), config_updates, shutdown.resubscribe());

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Draining in-flight requests");
            })
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn spawn_reloader(
    state: AppState,
    mut updates: mpsc::UnboundedReceiver<ProxyConfig>,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                update = updates.recv() => {
                    let Some(config) = update else { break };
                    if let Err(e) = state.reload(&config) {
                        tracing::error!(error = %e, "Rejected config update, keeping current Grafana client");
                    }
                }
            }
        }
    })
}
