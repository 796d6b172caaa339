//! Request forwarding to Grafana.
//!
//! # Responsibilities
//! - Rewrite the inbound path and query against the configured base URL
//! - Forward method, allowlisted headers and body with injected credentials
//! - Relay status and body verbatim, headers through the allowlist
//! - Rewrite same-origin redirects under `/proxy`, drop the rest
//! - Map transport failures to gateway errors
//!
//! # Design Decisions
//! - Non-2xx answers from Grafana are passed through untouched
//! - No retries: every call is issued exactly once
//! - Timed-out requests return 504 Gateway Timeout, other failures 502

use std::time::Instant;

use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use url::Url;

use crate::grafana::{GrafanaClient, UpstreamError};
use crate::http::handlers::PROXY_PREFIX;
use crate::observability::metrics;
use crate::proxy::request::{ProxyRequest, ProxyResponse};
use crate::security::headers::{
    outbound_request_headers, relayed_response_headers, rewrite_location,
};
use crate::security::path::{target_url, PathError};

/// Errors produced while handling a proxied call.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Invalid proxy path: {0}")]
    InvalidPath(#[from] PathError),

    #[error("Invalid dashboard uid '{0}'")]
    InvalidDashboardUid(String),

    #[error("Request body too large")]
    BodyTooLarge,

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl ProxyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::InvalidPath(_) | ProxyError::InvalidDashboardUid(_) => {
                StatusCode::BAD_REQUEST
            }
            ProxyError::BodyTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::Upstream(e) => e.status_code(),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}

/// Forward one request to Grafana and relay the answer.
pub async fn forward(
    client: &GrafanaClient,
    request: ProxyRequest,
) -> Result<ProxyResponse, ProxyError> {
    let start_time = Instant::now();
    let target = target_url(client.base_url(), &request.path, request.query.as_deref())?;
    let headers = outbound_request_headers(&request.headers);
    let method = request.method;

    tracing::debug!(method = %method, target = %target, "Forwarding to Grafana");

    let upstream = match client.send(method.clone(), target.clone(), headers, request.body).await {
        Ok(upstream) => upstream,
        Err(e) => {
            tracing::error!(method = %method, path = %request.path, error = %e, "Upstream error");
            metrics::record_upstream_error(e.kind());
            metrics::record_request(method.as_str(), e.status_code().as_u16(), start_time);
            return Err(e.into());
        }
    };

    if !upstream.status.is_success() {
        tracing::warn!(
            method = %method,
            path = %request.path,
            status = %upstream.status,
            "Grafana returned non-success status, passing through"
        );
    }

    metrics::record_request(method.as_str(), upstream.status.as_u16(), start_time);

    Ok(ProxyResponse {
        status: upstream.status,
        headers: response_headers(client, &target, &upstream.headers),
        body: upstream.body,
    })
}

fn response_headers(client: &GrafanaClient, target: &Url, upstream: &HeaderMap) -> HeaderMap {
    let mut headers = relayed_response_headers(upstream);

    if let Some(location) = upstream.get(header::LOCATION) {
        match rewrite_location(location, target, client.base_url(), PROXY_PREFIX) {
            Some(rewritten) => {
                headers.insert(header::LOCATION, rewritten);
            }
            None => tracing::warn!(
                location = ?location,
                "Dropping Grafana redirect that leaves the proxied instance"
            ),
        }
    }

    headers
}

/// Ask Grafana whether the dashboard `uid` exists.
pub async fn validate_dashboard(
    client: &GrafanaClient,
    uid: &str,
) -> Result<StatusCode, ProxyError> {
    let valid_uid = !uid.is_empty()
        && uid
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid_uid {
        return Err(ProxyError::InvalidDashboardUid(uid.to_string()));
    }

    let target = target_url(client.base_url(), &format!("api/dashboards/uid/{}", uid), None)?;
    let status = client.dashboard_status(target).await?;

    tracing::debug!(uid = %uid, status = %status, "Dashboard validation");
    Ok(status)
}
