//! Proxy forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! ProxyRequest (method, path, raw query, headers, body)
//!     → forwarder.rs
//!         → security::path (join with base URL, reject traversal)
//!         → security::headers (allowlist outbound headers)
//!         → GrafanaClient::send (inject Authorization, timeouts)
//!         → security::headers (allowlist response headers)
//!     → ProxyResponse (status, headers, body)
//! ```

pub mod forwarder;
pub mod request;

pub use forwarder::{forward, validate_dashboard, ProxyError};
pub use request::{ProxyRequest, ProxyResponse};
