//! Grafana upstream subsystem.
//!
//! # Data Flow
//! ```text
//! GrafanaConfig (settings)
//!     → credentials.rs (validate URL + credentials → ClientConfig)
//!     → client.rs (pooled HTTP client with timeouts, auth injection)
//!     → shared by every inbound request, swapped on reload
//! ```
//!
//! # Design Decisions
//! - A `ClientConfig` cannot exist in an invalid state
//! - The browser never sees credentials; they live only in this subsystem

pub mod client;
pub mod credentials;

pub use client::{GrafanaClient, UpstreamError, UpstreamResponse};
pub use credentials::{ClientConfig, ConfigurationError, Credentials};
