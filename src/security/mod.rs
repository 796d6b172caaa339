//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request:
//!     → tower-http body limit (http/server.rs)
//!     → path.rs (reject traversal before building the upstream URL)
//!     → headers.rs (allowlist request headers, drop client credentials)
//!     → Grafana client injects the proxy's own credentials
//!
//! Upstream response:
//!     → headers.rs (allowlist response headers)
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any path check failure
//! - No trust in client input

pub mod headers;
pub mod path;
