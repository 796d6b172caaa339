//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + GRAFANA_API_* environment
//!     → loader.rs (parse, deserialize, apply env overrides)
//!     → validation.rs (timeouts in range, credentials and URL build a ClientConfig)
//!     → ProxyConfig (validated, immutable)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → http server rebuilds the Grafana client
//!     → atomic swap, in-flight requests keep the old client
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Only the `[grafana]` and timeout sections are reloadable; the listener is fixed

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, load_from_env, ConfigError};
pub use schema::{
    AuthMethod, GrafanaConfig, LimitsConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    ProxyConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
pub use watcher::ConfigWatcher;
