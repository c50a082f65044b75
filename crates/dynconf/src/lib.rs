//! # dynconf
//!
//! Dynamic configuration for clusters of stripes and nodes: which settings
//! exist, where and when each may be read or changed, and how a change lands
//! on the topology.
//!
//! ## Quick Start
//!
//! ```
//! use dynconf::prelude::*;
//!
//! let mut cluster = dynconf::model::fixtures::cluster(2, 2);
//!
//! let change = Configuration::value_of("stripe.1.backup-dir=/backup").unwrap();
//! change.validate(ClusterState::Activated, Operation::Set).unwrap();
//! change.apply(&mut cluster).unwrap();
//!
//! let configured = cluster.nodes().filter(|n| n.backup_dir().is_configured()).count();
//! assert_eq!(configured, 2);
//! ```
//!
//! ## Crates
//!
//! ```text
//! dynconf-core       ids, policy enums, measures, errors
//!      ▲
//! dynconf-model      topology, settings, configurations, factory, validator
//!      ▲
//! dynconf-config     engine configuration, properties files
//! dynconf-telemetry  logging setup, metric names
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Identity, policy and error types
pub use dynconf_core as core;

// Topology and rules engine
pub use dynconf_model as model;

// Engine configuration and file loading
pub use dynconf_config as config;

// Logging and metrics setup
pub use dynconf_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// ```
/// use dynconf::prelude::*;
///
/// let config = EngineConfig::default();
/// assert_eq!(config.validation.state, ClusterState::Configuring);
/// ```
pub mod prelude {
    pub use dynconf_core::{
        ClusterState, DynConfigError, DynConfigResult, ErrorCategory, Measure, MemoryUnit,
        Operation, RawPath, Requirement, Scope, TimeUnit, Uid, Version,
    };

    pub use dynconf_model::{
        Cluster, ClusterFactory, ClusterValidator, Configuration, Endpoint, EndpointKind,
        FailoverPriority, HostPort, LockContext, Node, NodeContext, OptionalConfig, ParsedCluster,
        Properties, Setting, SettingRegistry, Stripe,
    };

    pub use dynconf_config::{ClusterLoader, ConfigError, ConfigLoader, EngineConfig};

    pub use dynconf_telemetry::{init_logging, LogConfig, TelemetryError};
}
