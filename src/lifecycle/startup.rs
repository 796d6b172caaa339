//! Startup orchestration.
//!
//! # Responsibilities
//! - Load configuration from file or environment
//! - Fail fast: invalid Grafana settings abort startup

use std::path::Path;

use crate::config::{load_config, load_from_env, ConfigError, ProxyConfig};

/// Load the configuration the process will start with.
pub fn load_configuration(path: Option<&Path>) -> Result<ProxyConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => load_from_env(),
    }
}
