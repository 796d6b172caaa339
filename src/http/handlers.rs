//! Route handlers.
//!
//! | Method | Path                 | Handler            |
//! |--------|----------------------|--------------------|
//! | ANY    | `/proxy/{*path}`     | `proxy_handler`    |
//! | GET    | `/url`               | `grafana_url`      |
//! | GET    | `/validation/{uid}`  | `validate`         |
//! | GET    | `/health`            | `health`           |

use axum::{
    body::Body,
    extract::{Path, State},
    http::Request,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::http::request::RequestIdExt;
use crate::http::server::AppState;
use crate::proxy::{forward, validate_dashboard, ProxyError, ProxyRequest};

/// Mount point of the proxy route.
pub const PROXY_PREFIX: &str = "/proxy";

#[derive(Debug, Serialize)]
pub struct GrafanaUrl {
    pub instance: String,
}

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
}

/// Forward everything under `/proxy` to Grafana.
///
/// The path is taken from the raw URI, not the decoded capture, so it reaches
/// Grafana exactly as the browser sent it.
pub async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let request_id = request.request_id().to_string();
    let (parts, body) = request.into_parts();

    let path = parts
        .uri
        .path()
        .strip_prefix(PROXY_PREFIX)
        .unwrap_or_default()
        .to_string();

    let body = match axum::body::to_bytes(body, state.max_body_size()).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Failed to read request body");
            return ProxyError::BodyTooLarge.into_response();
        }
    };

    let proxy_request = ProxyRequest {
        method: parts.method,
        path,
        query: parts.uri.query().map(str::to_string),
        headers: parts.headers,
        body,
    };

    tracing::debug!(
        request_id = %request_id,
        method = %proxy_request.method,
        path = %proxy_request.path,
        "Proxying request"
    );

    let client = state.client();
    match forward(&client, proxy_request).await {
        Ok(response) => response.into_response(),
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Proxy request failed");
            e.into_response()
        }
    }
}

/// Report the configured Grafana base URL so the UI can build links.
pub async fn grafana_url(State(state): State<AppState>) -> Json<GrafanaUrl> {
    Json(GrafanaUrl {
        instance: state.client().base_url().to_string(),
    })
}

/// Return Grafana's status code for `GET /api/dashboards/uid/{uid}`.
pub async fn validate(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<Json<u16>, ProxyError> {
    let client = state.client();
    let status = validate_dashboard(&client, &uid).await?;
    Ok(Json(status.as_u16()))
}

pub async fn health() -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
    })
}
