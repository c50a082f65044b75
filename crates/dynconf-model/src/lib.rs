//! # dynconf model
//!
//! Cluster topology and the rules engine deciding which configuration changes
//! are legal, at which level and in which cluster state.
//!
//! # Overview
//!
//! - [`Cluster`], [`Stripe`], [`Node`] - the topology, with 1-based positional ids
//! - [`Setting`] and [`SettingRegistry`] - every setting with its permission
//!   matrix, default, validator and accessors
//! - [`Configuration`] - a parsed `[stripe.<id>.][node.<id>.]<setting>[.<key>][=<value>]`
//!   input that can be validated and applied
//! - [`Endpoint`] - the address a node is reached through
//! - [`ClusterFactory`] and [`ClusterValidator`] - import and whole-cluster checks
//!
//! # Architecture
//!
//! ```text
//!   "stripe.1.node.2.offheap-resources.main=1GB"
//!               │ Configuration::value_of
//!               ▼
//!   ┌────────────────────────┐  lookup   ┌──────────────────┐
//!   │     Configuration      │──────────▶│ SettingRegistry  │
//!   │ scope, ids, key, value │           │ permissions,     │
//!   └───────────┬────────────┘           │ validators       │
//!               │                        └──────────────────┘
//!               │ validate(state, op), apply
//!               ▼
//!   ┌────────────────────────┐
//!   │  Cluster, Stripe, Node │
//!   └────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use dynconf_core::{ClusterState, Operation};
//! use dynconf_model::{fixtures, Configuration};
//!
//! let mut cluster = fixtures::cluster(2, 2);
//! let config = Configuration::value_of("stripe.2.node.1.offheap-resources.main=1GB").unwrap();
//! config.validate(ClusterState::Activated, Operation::Set).unwrap();
//! config.apply(&mut cluster).unwrap();
//!
//! let node = cluster.node(2, 1).unwrap();
//! assert_eq!(node.offheap_resources().get().unwrap()["main"].to_string(), "1GB");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cluster;
mod configuration;
mod context;
pub mod defaults;
mod endpoint;
mod factory;
mod failover;
pub mod fixtures;
mod lock;
mod node;
mod optional;
mod properties;
pub mod setting;
mod stripe;
mod validator;

pub use cluster::Cluster;
pub use configuration::Configuration;
pub use context::NodeContext;
pub use endpoint::{Endpoint, EndpointKind, HostPort};
pub use factory::{ClusterFactory, ParsedCluster};
pub use failover::FailoverPriority;
pub use lock::LockContext;
pub use node::Node;
pub use optional::OptionalConfig;
pub use properties::Properties;
pub use setting::{AllowedUnits, Setting, SettingRegistry, SettingValue, Validator};
pub use stripe::Stripe;
pub use validator::ClusterValidator;
