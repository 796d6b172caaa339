//! Credential validation and client configuration.
//!
//! # Responsibilities
//! - Validate the Grafana base URL (absolute, http/https, host present)
//! - Pick exactly one authentication mode (basic or bearer)
//! - Precompute the `Authorization` header injected into every upstream call
//!
//! # Design Decisions
//! - Validation happens once, at construction; a `ClientConfig` is always valid
//! - Mode selection is explicit: supplying both a password pair and a token fails
//! - Secrets never appear in `Debug` output

use axum::http::HeaderValue;
use base64::{engine::general_purpose, Engine as _};
use thiserror::Error;
use url::Url;

use crate::config::schema::{AuthMethod, GrafanaConfig};

/// Errors raised while building a [`ClientConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// Base URL is empty or not an absolute http(s) URL.
    #[error("No URL configured for Grafana: '{0}' is not an absolute http(s) URL")]
    NoUrl(String),

    /// Password mode requested without a complete username/password pair.
    #[error("username and/or password not configured for Grafana")]
    MissingPassword,

    /// Token mode requested with an empty token.
    #[error("token not configured for Grafana")]
    EmptyToken,

    /// Both a password pair and a token were supplied.
    #[error("both username/password and token configured for Grafana; select one authentication method")]
    AmbiguousCredentials,

    /// Credentials contain bytes that cannot travel in an HTTP header.
    #[error("Grafana credentials contain characters not allowed in an HTTP header")]
    InvalidCredentials,
}

/// Authentication material for the upstream Grafana.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// HTTP Basic authentication.
    Password { username: String, password: String },
    /// Bearer token authentication.
    Token(String),
}

impl Credentials {
    /// The auth method this credential set corresponds to.
    pub fn method(&self) -> AuthMethod {
        match self {
            Credentials::Password { .. } => AuthMethod::Password,
            Credentials::Token(_) => AuthMethod::Token,
        }
    }

    fn header_value(&self) -> Result<HeaderValue, ConfigurationError> {
        let raw = match self {
            Credentials::Password { username, password } => {
                let encoded = general_purpose::STANDARD.encode(format!("{}:{}", username, password));
                format!("Basic {}", encoded)
            }
            Credentials::Token(token) => format!("Bearer {}", token),
        };
        let mut value =
            HeaderValue::from_str(&raw).map_err(|_| ConfigurationError::InvalidCredentials)?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Credentials::Token(_) => f.debug_tuple("Token").field(&"<redacted>").finish(),
        }
    }
}

/// Validated, immutable description of how to reach Grafana.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: Url,
    credentials: Credentials,
    authorization: HeaderValue,
}

impl ClientConfig {
    /// Validate the inputs and build a client configuration.
    ///
    /// The URL is checked first, then the credentials. A token supplied as an
    /// empty string is only reported as such when no username or password was
    /// given at all; a half-filled pair is reported as a password problem.
    pub fn build(
        base_url: &str,
        username: Option<&str>,
        password: Option<&str>,
        token: Option<&str>,
    ) -> Result<Self, ConfigurationError> {
        let base_url = parse_base_url(base_url)?;

        let pair = match (username, password) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => Some((u, p)),
            _ => None,
        };
        let token = token.map(str::trim);
        let pair_attempted = username.is_some() || password.is_some();

        let credentials = match (pair, token) {
            (Some(_), Some(t)) if !t.is_empty() => {
                return Err(ConfigurationError::AmbiguousCredentials)
            }
            (Some((username, password)), _) => Credentials::Password {
                username: username.to_string(),
                password: password.to_string(),
            },
            (None, Some(t)) if !t.is_empty() => Credentials::Token(t.to_string()),
            (None, Some(_)) if !pair_attempted => return Err(ConfigurationError::EmptyToken),
            (None, _) => return Err(ConfigurationError::MissingPassword),
        };

        let authorization = credentials.header_value()?;

        Ok(Self {
            base_url,
            credentials,
            authorization,
        })
    }

    /// Build from settings, passing only the credentials of the selected method.
    pub fn from_settings(settings: &GrafanaConfig) -> Result<Self, ConfigurationError> {
        match settings.api_auth_method {
            AuthMethod::Password => Self::build(
                &settings.api_url,
                settings.api_username.as_deref(),
                settings.api_password.as_deref(),
                None,
            ),
            AuthMethod::Token => Self::build(
                &settings.api_url,
                None,
                None,
                Some(settings.api_token.as_deref().unwrap_or_default()),
            ),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// The `Authorization` header value sent upstream (marked sensitive).
    pub fn authorization(&self) -> &HeaderValue {
        &self.authorization
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigurationError> {
    let trimmed = raw.trim();
    let no_url = || ConfigurationError::NoUrl(raw.to_string());

    if trimmed.is_empty() {
        return Err(no_url());
    }

    let mut url = Url::parse(trimmed).map_err(|_| no_url())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(no_url());
    }
    if url.host_str().map(str::is_empty).unwrap_or(true) {
        return Err(no_url());
    }

    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}
