//! Observability setup for dynconf.
//!
//! - **Logging**: a `tracing-subscriber` registry with JSON or pretty output
//! - **Metrics**: names and descriptions of the counters recorded through
//!   the `metrics` facade
//!
//! # Example
//!
//! ```rust,ignore
//! use dynconf_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::production())?;
//! dynconf_telemetry::metrics::describe_metrics();
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
