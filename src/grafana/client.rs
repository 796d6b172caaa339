//! Outbound HTTP client for the Grafana instance.
//!
//! # Responsibilities
//! - Hold the validated `ClientConfig` and a pooled reqwest client
//! - Enforce connect and request timeouts on every upstream call
//! - Inject the `Authorization` header, replacing anything the caller sent
//! - Classify transport failures (timeout vs. everything else)

use std::time::Duration;

use axum::http::{header::AUTHORIZATION, HeaderMap, Method, StatusCode};
use axum::body::Bytes;
use thiserror::Error;
use url::Url;

use crate::config::schema::{ProxyConfig, TimeoutConfig};
use crate::config::validation::validate_config;
use crate::grafana::credentials::ClientConfig;

/// Failures talking to Grafana. Non-2xx responses are not errors.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The upstream call exceeded the configured timeout.
    #[error("Grafana did not respond within {0:?}")]
    Timeout(Duration),

    /// Connection refused, DNS failure, TLS failure, broken body stream.
    #[error("Grafana request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The underlying HTTP client could not be constructed.
    #[error("Failed to build Grafana HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl UpstreamError {
    fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout(timeout)
        } else {
            UpstreamError::Transport(err)
        }
    }

    /// Status code reported to the dashboard for this failure.
    pub fn status_code(&self) -> StatusCode {
        match self {
            UpstreamError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            UpstreamError::Transport(_) => StatusCode::BAD_GATEWAY,
            UpstreamError::Client(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::Timeout(_) => "timeout",
            UpstreamError::Transport(_) => "transport",
            UpstreamError::Client(_) => "client",
        }
    }
}

/// Raw upstream answer before header filtering.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Authenticated client bound to one Grafana instance.
#[derive(Debug, Clone)]
pub struct GrafanaClient {
    config: ClientConfig,
    http: reqwest::Client,
    timeout: Duration,
}

impl GrafanaClient {
    /// Build a client from an already-validated configuration.
    pub fn new(
        config: ClientConfig,
        timeouts: &TimeoutConfig,
        ssl_verify: bool,
    ) -> Result<Self, UpstreamError> {
        let timeout = Duration::from_secs(timeouts.upstream_secs);

        if !ssl_verify {
            tracing::warn!(
                base_url = %config.base_url(),
                "TLS certificate verification disabled for Grafana"
            );
        }

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .timeout(timeout)
            .danger_accept_invalid_certs(!ssl_verify)
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy()
            .build()
            .map_err(UpstreamError::Client)?;

        Ok(Self {
            config,
            http,
            timeout,
        })
    }

    /// Validate the full proxy configuration and build a client from it.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, crate::Error> {
        let client_config = validate_config(config)?;
        Ok(Self::new(client_config, &config.timeouts, config.grafana.ssl_verify)?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn base_url(&self) -> &Url {
        self.config.base_url()
    }

    /// Issue an authenticated request and buffer the response.
    ///
    /// Dropping the returned future aborts the upstream request.
    pub async fn send(
        &self,
        method: Method,
        url: Url,
        mut headers: HeaderMap,
        body: Bytes,
    ) -> Result<UpstreamResponse, UpstreamError> {
        headers.insert(AUTHORIZATION, self.config.authorization().clone());

        let response = self
            .http
            .request(method, url)
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(|e| UpstreamError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::from_reqwest(e, self.timeout))?;

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }

    /// Check whether a dashboard exists; returns the upstream status code.
    pub async fn dashboard_status(&self, url: Url) -> Result<StatusCode, UpstreamError> {
        let response = self
            .send(Method::GET, url, HeaderMap::new(), Bytes::new())
            .await?;
        Ok(response.status)
    }
}
