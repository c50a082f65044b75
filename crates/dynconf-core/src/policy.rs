//! Policy enums: where an operation targets, what it does, and when it is legal.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Granularity a setting targets or a request is issued at.
///
/// `Stripe` is only ever a targeting level. No setting is natively
/// stripe-scoped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// A single node.
    Node,
    /// Every node of one stripe.
    Stripe,
    /// The whole cluster.
    Cluster,
}

impl Scope {
    /// All scopes, narrowest first.
    pub const ALL: [Scope; 3] = [Scope::Node, Scope::Stripe, Scope::Cluster];

    /// Returns the lowercase name of the scope.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Stripe => "stripe",
            Self::Cluster => "cluster",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An operation requested on a setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Read the current value.
    Get,
    /// Assign a value.
    Set,
    /// Clear a value back to its default.
    Unset,
    /// Bulk initial load from a config file.
    Import,
    /// Read back a config-file style dump.
    Config,
}

impl Operation {
    /// All operations.
    pub const ALL: [Operation; 5] = [
        Operation::Get,
        Operation::Set,
        Operation::Unset,
        Operation::Import,
        Operation::Config,
    ];

    /// Returns the lowercase name of the operation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Set => "set",
            Self::Unset => "unset",
            Self::Import => "import",
            Self::Config => "config",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Activation state of a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterState {
    /// Pre-activation: the topology is still being assembled.
    Configuring,
    /// Live: only runtime-changeable settings may move.
    Activated,
}

impl ClusterState {
    /// Both states.
    pub const ALL: [ClusterState; 2] = [ClusterState::Configuring, ClusterState::Activated];

    /// Returns `true` if the operation can ever happen in this state.
    ///
    /// Import is only meaningful while the cluster is being assembled.
    #[must_use]
    pub const fn supports(&self, operation: Operation) -> bool {
        match self {
            Self::Configuring => true,
            Self::Activated => !matches!(operation, Operation::Import),
        }
    }

    /// Returns the lowercase name of the state.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Configuring => "configuring",
            Self::Activated => "activated",
        }
    }
}

impl fmt::Display for ClusterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operational precondition attached to a setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Requirement {
    /// Placeholders must be resolved before the value is imported.
    ResolveEagerly,
    /// Every node must be online for a change.
    ClusterOnline,
    /// A change only takes effect after a full cluster restart.
    ClusterRestart,
    /// A change only takes effect after the node restarts.
    NodeRestart,
    /// Not exported unless hidden settings are requested.
    Hidden,
}

/// Version of the exported properties format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Version {
    /// Original format, without identifiers or lock context.
    #[serde(rename = "1")]
    V1,
    /// Adds UIDs, stripe names and the lock context.
    #[serde(rename = "2")]
    V2,
}

impl Version {
    /// The format written by default.
    pub const CURRENT: Version = Version::V2;

    /// Returns the textual version number.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::V1 => "1",
            Self::V2 => "2",
        }
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::CURRENT
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Version {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "v1" => Ok(Self::V1),
            "2" | "v2" => Ok(Self::V2),
            other => Err(format!("Unsupported format version: '{other}'")),
        }
    }
}
