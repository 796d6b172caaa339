//! Shared utilities for integration testing: a mock Grafana and a proxy launcher.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, RawQuery, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use grafana_proxy::config::{GrafanaConfig, ProxyConfig};
use grafana_proxy::{HttpServer, Shutdown};

/// What the mock Grafana observed.
#[derive(Clone, Default)]
pub struct MockGrafana {
    hits: Arc<AtomicUsize>,
    last_headers: Arc<Mutex<HeaderMap>>,
}

#[allow(dead_code)]
impl MockGrafana {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn last_header(&self, name: &str) -> Option<String> {
        self.last_headers
            .lock()
            .unwrap()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }
}

/// Mimics a Grafana mounted under `/mocked/`.
///
/// - `status/{code}` answers with that status
/// - `slow` answers after 3 seconds
/// - `echo-query` returns the raw query string
/// - `echo-body` returns "METHOD body"
/// - `api/dashboards/uid/known` exists, every other uid is 404
/// - `redirect-in` answers 302 to an absolute URL under `/mocked/`,
///   `redirect-relative` to a root-relative one, `redirect-away` to another host
/// - anything else: "Static Content at path {path}" plus a `foo: bar` header
async fn mocked(
    State(mock): State<MockGrafana>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    method: Method,
    headers: HeaderMap,
    body: String,
) -> Response {
    mock.hits.fetch_add(1, Ordering::SeqCst);
    let host = headers
        .get("host")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    *mock.last_headers.lock().unwrap() = headers;

    if let Some(code) = path.strip_prefix("status/") {
        let status = code
            .parse::<u16>()
            .ok()
            .and_then(|c| StatusCode::from_u16(c).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, format!("upstream says {}", status.as_u16())).into_response();
    }

    if let Some(uid) = path.strip_prefix("api/dashboards/uid/") {
        return if uid == "known" {
            (StatusCode::OK, r#"{"dashboard":{"uid":"known"}}"#).into_response()
        } else {
            (StatusCode::NOT_FOUND, r#"{"message":"Dashboard not found"}"#).into_response()
        };
    }

    match path.as_str() {
        "slow" => {
            tokio::time::sleep(Duration::from_secs(3)).await;
            "finally".into_response()
        }
        "echo-query" => query.unwrap_or_default().into_response(),
        "echo-body" => format!("{} {}", method, body).into_response(),
        "redirect-in" => redirect(&format!("http://{}/mocked/login?from=%2Fd%2Fabc", host)),
        "redirect-relative" => redirect("/mocked/d/abc"),
        "redirect-away" => redirect("http://grafana.internal:3000/grafana/login"),
        _ => (
            [
                ("foo", "bar"),
                ("content-type", "text/plain; charset=utf-8"),
            ],
            format!("Static Content at path {}", path),
        )
            .into_response(),
    }
}

fn redirect(location: &str) -> Response {
    (StatusCode::FOUND, [("location", location.to_string())], "").into_response()
}

/// Start the mock Grafana on `addr` (port 0 for any free port).
pub async fn start_mock_grafana(addr: &str) -> (SocketAddr, MockGrafana) {
    let mock = MockGrafana::default();
    let app = Router::new()
        .route("/mocked/{*path}", any(mocked))
        .with_state(mock.clone());

    let listener = TcpListener::bind(addr).await.unwrap();
    let local = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (local, mock)
}

/// Password-mode settings pointing at `base_url`.
pub fn password_config(base_url: &str) -> ProxyConfig {
    ProxyConfig {
        grafana: GrafanaConfig {
            api_url: base_url.to_string(),
            api_username: Some("admin".into()),
            api_password: Some("admin".into()),
            ..GrafanaConfig::default()
        },
        ..ProxyConfig::default()
    }
}

/// A running proxy instance.
#[allow(dead_code)]
pub struct ProxyHandle {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub config_updates: mpsc::UnboundedSender<ProxyConfig>,
}

impl ProxyHandle {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start the proxy on a free port.
pub async fn start_proxy(config: ProxyConfig) -> ProxyHandle {
    let server = HttpServer::from_config(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let (config_updates, updates_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let _ = server.run(listener, updates_rx, server_shutdown).await;
    });

    ProxyHandle {
        addr,
        shutdown,
        config_updates,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}
