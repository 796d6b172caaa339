//! Authenticating reverse proxy for an external Grafana instance.
//!
//! The dashboard talks to `/proxy/...`; this crate forwards the call to the
//! configured Grafana base URL with basic-auth or bearer credentials the
//! browser never sees, and relays the answer.

pub mod config;
pub mod error;
pub mod grafana;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod security;

pub use config::schema::ProxyConfig;
pub use error::{Error, Result};
pub use grafana::{ClientConfig, ConfigurationError, GrafanaClient};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use proxy::{forward, ProxyRequest, ProxyResponse};
