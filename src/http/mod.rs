//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, route table)
//!     → request.rs (assign x-request-id, open tracing span)
//!     → handlers.rs (build ProxyRequest / dashboard endpoints)
//!     → proxy::forward (Grafana round trip)
//!     → ProxyResponse → client
//! ```

pub mod handlers;
pub mod request;
pub mod server;

pub use request::{RequestIdExt, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
