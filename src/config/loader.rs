//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variables that override the `[grafana]` section.
pub const ENV_API_URL: &str = "GRAFANA_API_URL";
pub const ENV_API_USERNAME: &str = "GRAFANA_API_USERNAME";
pub const ENV_API_PASSWORD: &str = "GRAFANA_API_PASSWORD";
pub const ENV_API_TOKEN: &str = "GRAFANA_API_TOKEN";
pub const ENV_API_AUTH_METHOD: &str = "GRAFANA_API_AUTH_METHOD";
pub const ENV_API_SSL_VERIFY: &str = "GRAFANA_API_SSL_VERIFY";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {name}: {reason}")]
    Env { name: &'static str, reason: String },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),
}

/// Load configuration from a TOML file, apply environment overrides and validate.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: ProxyConfig = toml::from_str(&content)?;

    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    validate_config(&config)?;

    Ok(config)
}

/// Build configuration from defaults and environment only.
pub fn load_from_env() -> Result<ProxyConfig, ConfigError> {
    let mut config = ProxyConfig::default();

    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    validate_config(&config)?;

    Ok(config)
}

/// Overlay `GRAFANA_API_*` values onto the config.
///
/// `lookup` abstracts the environment so tests don't touch process state.
pub fn apply_env_overrides<F>(config: &mut ProxyConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let grafana = &mut config.grafana;

    if let Some(url) = lookup(ENV_API_URL) {
        grafana.api_url = url;
    }
    if let Some(username) = lookup(ENV_API_USERNAME) {
        grafana.api_username = Some(username);
    }
    if let Some(password) = lookup(ENV_API_PASSWORD) {
        grafana.api_password = Some(password);
    }
    if let Some(token) = lookup(ENV_API_TOKEN) {
        grafana.api_token = Some(token);
    }
    if let Some(method) = lookup(ENV_API_AUTH_METHOD) {
        grafana.api_auth_method = method.parse().map_err(|reason| ConfigError::Env {
            name: ENV_API_AUTH_METHOD,
            reason,
        })?;
    }
    if let Some(verify) = lookup(ENV_API_SSL_VERIFY) {
        grafana.ssl_verify = parse_bool(&verify).ok_or_else(|| ConfigError::Env {
            name: ENV_API_SSL_VERIFY,
            reason: format!("'{}' is not a boolean", verify),
        })?;
    }

    Ok(())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
