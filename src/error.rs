//! Top-level error type for starting and running the proxy.

use thiserror::Error;

use crate::config::{ConfigError, ValidationError};
use crate::grafana::UpstreamError;

/// Errors that abort startup or a reload.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
