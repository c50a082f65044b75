//! # dynconf config
//!
//! Typed configuration for the dynconf engine, and loading of cluster
//! `.properties` files.
//!
//! ## Engine configuration
//!
//! ```toml
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [export]
//! version = "2"
//! expanded = false
//! include_defaults = true
//! include_hidden = false
//!
//! [validation]
//! validate_cluster = true
//! state = "configuring"
//! ```
//!
//! Values are layered by [`ConfigLoader`]: defaults, then a file, then
//! environment variables `DYNCONF__SECTION__KEY` (e.g. `DYNCONF__EXPORT__VERSION=1`).
//! Unknown fields in files are rejected.
//!
//! ## Cluster files
//!
//! [`ClusterLoader`] builds a [`Cluster`](dynconf_model::Cluster) from a
//! properties file and writes one back with the configured export options.

#![warn(missing_docs)]

mod cluster;
mod config;
mod error;
mod loader;
mod schema;

pub use cluster::ClusterLoader;
pub use config::EngineConfig;
pub use error::ConfigError;
pub use loader::{ConfigLoader, ENV_PREFIX};
pub use schema::{ExportConfig, LogFormat, LoggingConfig, ValidationConfig};

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
