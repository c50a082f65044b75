//! Error types for dynconf.
//!
//! This module provides the [`DynConfigError`] type, the single error type
//! returned by every fallible operation of the model: parsing a configuration
//! key, validating it against a cluster state, applying it to a topology, and
//! querying the topology shape.
//!
//! Errors are typed by condition. [`ErrorCategory`] groups them so callers can
//! decide how to surface a failure without matching every variant:
//!
//! | `ErrorCategory` | Variants |
//! |---|---|
//! | `Syntax` | `InvalidConfigurationSyntax`, `UnknownSetting` |
//! | `Shape` | `InvalidShape`, `UnknownStripe`, `UnknownNode` |
//! | `Policy` | `IllegalOperation`, `SettingReadOnly`, `SettingRequiresValue`, `InvalidPermission` |
//! | `Ambiguity` | `AmbiguousDuplicate` |
//! | `Validation` | `InvalidValue`, `InvalidMeasure`, `MalformedCluster` |
//! | `Identity` | `InvalidUid` |
//!
//! Nothing in the model retries. A caller receiving any of these errors rejects
//! the proposed change and keeps its previous topology.

use crate::policy::{ClusterState, Operation, Scope};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`DynConfigError`].
pub type DynConfigResult<T> = Result<T, DynConfigError>;

/// Categories of errors for classification and handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Malformed key text or unknown setting name.
    Syntax,
    /// Topology shape mismatch or out-of-range stripe/node id.
    Shape,
    /// Operation not permitted for the setting, scope or cluster state.
    Policy,
    /// Two inputs cannot be judged duplicate or distinct.
    Ambiguity,
    /// A value or a whole cluster failed validation.
    Validation,
    /// A malformed identifier.
    Identity,
}

/// Standard error type for dynconf.
///
/// Policy errors are deliberately verbose: they name the setting, the scope,
/// the operation and the cluster state since their messages are shown to
/// cluster operators as-is.
///
/// # Example
///
/// ```
/// use dynconf_core::{DynConfigError, ErrorCategory};
///
/// let err = DynConfigError::syntax("stripe.0.name=foo", "Expected stripe ID to be greater than 0");
/// assert_eq!(err.category(), ErrorCategory::Syntax);
/// assert!(err.to_string().contains("stripe.0.name=foo"));
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DynConfigError {
    /// The configuration key text is malformed.
    #[error("Invalid input: '{input}'. Reason: {reason}")]
    InvalidConfigurationSyntax {
        /// The raw input that failed to parse.
        input: String,
        /// Why parsing failed.
        reason: String,
    },

    /// The configuration key names a setting that does not exist.
    #[error("Invalid input: '{input}'. Reason: Invalid setting name: '{name}'")]
    UnknownSetting {
        /// The raw input that failed to parse.
        input: String,
        /// The unrecognized setting name.
        name: String,
    },

    /// A single element was requested from a container holding several.
    #[error("Invalid shape: {message}")]
    InvalidShape {
        /// Human-readable description of the mismatch.
        message: String,
    },

    /// A stripe id is out of range.
    #[error("Invalid stripe ID: {stripe_id}. Cluster contains: {stripe_count} stripe(s)")]
    UnknownStripe {
        /// The requested 1-based stripe id.
        stripe_id: usize,
        /// Number of stripes in the cluster.
        stripe_count: usize,
    },

    /// A node id is out of range within its stripe.
    #[error("Invalid node ID: {node_id}. Stripe ID: {stripe_id} contains: {node_count} node(s)")]
    UnknownNode {
        /// The 1-based stripe id holding the node.
        stripe_id: usize,
        /// The requested 1-based node id.
        node_id: usize,
        /// Number of nodes in the stripe.
        node_count: usize,
    },

    /// The operation is not permitted for this setting, scope or state.
    #[error("Invalid input: '{input}'. Reason: {reason}")]
    IllegalOperation {
        /// The raw configuration input.
        input: String,
        /// The setting name.
        setting: String,
        /// The requested operation, if one was requested yet.
        operation: Option<Operation>,
        /// The scope the input targets.
        scope: Scope,
        /// The cluster state, when validated against one.
        state: Option<ClusterState>,
        /// Why the operation is rejected.
        reason: String,
    },

    /// The setting cannot be changed.
    #[error("Invalid input: '{input}'. Reason: Setting '{setting}' cannot be set when cluster is {state}")]
    SettingReadOnly {
        /// The raw configuration input.
        input: String,
        /// The setting name.
        setting: String,
        /// The state in which the change was attempted.
        state: ClusterState,
    },

    /// The operation needs a value and none was given.
    #[error("Invalid input: '{input}'. Reason: Operation {operation} requires a value")]
    SettingRequiresValue {
        /// The raw configuration input.
        input: String,
        /// The setting name.
        setting: String,
        /// The operation requiring a value.
        operation: Operation,
    },

    /// A permission matrix entry is inconsistent.
    #[error("Invalid permission: {reason}")]
    InvalidPermission {
        /// What is inconsistent.
        reason: String,
    },

    /// Two configurations on the same map setting cannot be compared.
    #[error("Unable to compare {first} with {second}")]
    AmbiguousDuplicate {
        /// The first configuration input.
        first: String,
        /// The second configuration input.
        second: String,
    },

    /// A setting value failed validation.
    #[error("Invalid value for setting '{setting}': {reason}")]
    InvalidValue {
        /// The setting name.
        setting: String,
        /// Why the value is invalid.
        reason: String,
    },

    /// A quantity with a unit could not be parsed.
    #[error("Invalid measure: '{input}'. Reason: {reason}")]
    InvalidMeasure {
        /// The raw measure text.
        input: String,
        /// Why it could not be parsed.
        reason: String,
    },

    /// A whole cluster failed a consistency check.
    #[error("Malformed cluster: {reason}")]
    MalformedCluster {
        /// The consistency rule that failed.
        reason: String,
    },

    /// A UID text form could not be decoded.
    #[error("Invalid UID: '{input}'. Reason: {reason}")]
    InvalidUid {
        /// The raw UID text.
        input: String,
        /// Why decoding failed.
        reason: String,
    },
}

impl DynConfigError {
    /// Creates a syntax error for the given raw input.
    #[must_use]
    pub fn syntax(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfigurationSyntax {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Creates a shape error.
    #[must_use]
    pub fn invalid_shape(message: impl Into<String>) -> Self {
        Self::InvalidShape {
            message: message.into(),
        }
    }

    /// Creates an invalid permission error.
    #[must_use]
    pub fn invalid_permission(reason: impl Into<String>) -> Self {
        Self::InvalidPermission {
            reason: reason.into(),
        }
    }

    /// Creates a value validation error.
    #[must_use]
    pub fn invalid_value(setting: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            setting: setting.into(),
            reason: reason.into(),
        }
    }

    /// Creates a measure parsing error.
    #[must_use]
    pub fn invalid_measure(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidMeasure {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Creates a cluster consistency error.
    #[must_use]
    pub fn malformed_cluster(reason: impl Into<String>) -> Self {
        Self::MalformedCluster {
            reason: reason.into(),
        }
    }

    /// Returns the category of this error.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidConfigurationSyntax { .. } | Self::UnknownSetting { .. } => {
                ErrorCategory::Syntax
            }
            Self::InvalidShape { .. } | Self::UnknownStripe { .. } | Self::UnknownNode { .. } => {
                ErrorCategory::Shape
            }
            Self::IllegalOperation { .. }
            | Self::SettingReadOnly { .. }
            | Self::SettingRequiresValue { .. }
            | Self::InvalidPermission { .. } => ErrorCategory::Policy,
            Self::AmbiguousDuplicate { .. } => ErrorCategory::Ambiguity,
            Self::InvalidValue { .. } | Self::InvalidMeasure { .. } | Self::MalformedCluster { .. } => {
                ErrorCategory::Validation
            }
            Self::InvalidUid { .. } => ErrorCategory::Identity,
        }
    }

    /// Returns the raw configuration input this error is about, if any.
    #[must_use]
    pub fn input(&self) -> Option<&str> {
        match self {
            Self::InvalidConfigurationSyntax { input, .. }
            | Self::UnknownSetting { input, .. }
            | Self::IllegalOperation { input, .. }
            | Self::SettingReadOnly { input, .. }
            | Self::SettingRequiresValue { input, .. } => Some(input),
            _ => None,
        }
    }

    /// Returns `true` if the error reports a malformed input.
    #[must_use]
    pub const fn is_syntax(&self) -> bool {
        matches!(self.category(), ErrorCategory::Syntax)
    }

    /// Returns `true` if the error reports a policy violation.
    #[must_use]
    pub const fn is_policy(&self) -> bool {
        matches!(self.category(), ErrorCategory::Policy)
    }
}
