//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject Grafana settings that cannot produce a `ClientConfig`
//! - Validate timeout ranges (all > 0, inbound deadline above the upstream one)
//!
//! # Design Decisions
//! - Validation is a pure function over `ProxyConfig`
//! - Runs before config is accepted into the system, at startup and on reload
//! - The inbound deadline must outlast the upstream one so a slow Grafana
//!   surfaces as 504 from the client, not 408 from the timeout layer

use thiserror::Error;

use crate::config::schema::{ProxyConfig, TimeoutConfig};
use crate::grafana::{ClientConfig, ConfigurationError};

/// A configuration that parses but cannot be run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error(transparent)]
    Grafana(#[from] ConfigurationError),

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error(
        "timeouts.request_secs ({request}s) must be greater than timeouts.upstream_secs ({upstream}s)"
    )]
    RequestTimeoutTooShort { request: u64, upstream: u64 },
}

/// Validate the configuration and build the client configuration it describes.
pub fn validate_config(config: &ProxyConfig) -> Result<ClientConfig, ValidationError> {
    validate_timeouts(&config.timeouts)?;
    Ok(ClientConfig::from_settings(&config.grafana)?)
}

/// Timeouts must be non-zero and leave the upstream call room to finish
/// inside the inbound deadline.
pub fn validate_timeouts(timeouts: &TimeoutConfig) -> Result<(), ValidationError> {
    let named = [
        ("connect_secs", timeouts.connect_secs),
        ("upstream_secs", timeouts.upstream_secs),
        ("request_secs", timeouts.request_secs),
    ];
    if let Some((name, _)) = named.iter().find(|(_, secs)| *secs == 0) {
        return Err(ValidationError::ZeroTimeout(*name));
    }

    check_upstream_fits(timeouts.upstream_secs, timeouts.request_secs)
}

/// `upstream` must finish strictly before the inbound `request` deadline.
pub fn check_upstream_fits(upstream: u64, request: u64) -> Result<(), ValidationError> {
    if request <= upstream {
        return Err(ValidationError::RequestTimeoutTooShort { request, upstream });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GrafanaConfig;

    fn config() -> ProxyConfig {
        ProxyConfig {
            grafana: GrafanaConfig {
                api_url: "http://localhost:3000/".into(),
                api_username: Some("admin".into()),
                api_password: Some("admin".into()),
                ..GrafanaConfig::default()
            },
            ..ProxyConfig::default()
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_config(&config()).is_ok());
    }

    #[test]
    fn test_zero_timeouts_rejected() {
        let mut c = config();
        c.timeouts.connect_secs = 0;
        assert_eq!(
            validate_config(&c).unwrap_err(),
            ValidationError::ZeroTimeout("connect_secs")
        );

        let mut c = config();
        c.timeouts.upstream_secs = 0;
        assert_eq!(
            validate_config(&c).unwrap_err(),
            ValidationError::ZeroTimeout("upstream_secs")
        );

        let mut c = config();
        c.timeouts.request_secs = 0;
        assert_eq!(
            validate_config(&c).unwrap_err(),
            ValidationError::ZeroTimeout("request_secs")
        );
    }

    #[test]
    fn test_request_timeout_must_exceed_upstream() {
        let mut c = config();
        c.timeouts.upstream_secs = 5;
        c.timeouts.request_secs = 1;
        assert_eq!(
            validate_config(&c).unwrap_err(),
            ValidationError::RequestTimeoutTooShort { request: 1, upstream: 5 }
        );

        c.timeouts.request_secs = 5;
        assert!(matches!(
            validate_config(&c),
            Err(ValidationError::RequestTimeoutTooShort { .. })
        ));

        c.timeouts.request_secs = 6;
        assert!(validate_config(&c).is_ok());
    }

    #[test]
    fn test_timeouts_checked_before_credentials() {
        let mut c = config();
        c.grafana.api_password = None;
        assert_eq!(
            validate_config(&c).unwrap_err(),
            ValidationError::Grafana(ConfigurationError::MissingPassword)
        );

        c.timeouts.upstream_secs = 0;
        assert_eq!(
            validate_config(&c).unwrap_err(),
            ValidationError::ZeroTimeout("upstream_secs")
        );
    }
}
