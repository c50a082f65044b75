//! Parsed configuration changes.
//!
//! A [`Configuration`] is the structured form of one `key[=value]` input:
//! which setting, at which scope, on which stripe or node, for which map key,
//! with which value. It is checked in three steps:
//!
//! 1. [`Configuration::value_of`] parses the input and rejects anything the
//!    setting can never accept at that scope.
//! 2. [`Configuration::validate`] checks one operation in one cluster state.
//! 3. [`Configuration::apply`] writes the change into a topology.
//!
//! # Example
//!
//! ```
//! use dynconf_core::{ClusterState, Operation};
//! use dynconf_model::{fixtures, Configuration};
//!
//! let mut cluster = fixtures::cluster(1, 2);
//! let config = Configuration::value_of("tc-properties.foo=bar").unwrap();
//! config.validate(ClusterState::Activated, Operation::Set).unwrap();
//! config.apply(&mut cluster).unwrap();
//!
//! assert!(cluster
//!     .nodes()
//!     .all(|n| n.tc_properties().get().is_some_and(|p| p["foo"] == "bar")));
//! ```

mod parser;

use crate::cluster::Cluster;
use crate::node::Node;
use crate::setting::Setting;
use dynconf_core::{
    contains_placeholders, ClusterState, DynConfigError, DynConfigResult, Operation, Requirement,
    Scope,
};
use std::fmt;
use std::hash::{Hash, Hasher};

/// One parsed configuration change.
///
/// The value is `None` when the input has no `=`, `Some("")` when nothing
/// follows the `=`, and the trimmed text otherwise. Equality and hashing use
/// the raw input only.
#[derive(Debug, Clone)]
pub struct Configuration {
    raw: String,
    setting: &'static Setting,
    scope: Scope,
    stripe_id: Option<usize>,
    node_id: Option<usize>,
    key: Option<String>,
    value: Option<String>,
}

impl Configuration {
    /// Parses and pre-validates an input.
    ///
    /// # Errors
    ///
    /// - [`DynConfigError::InvalidConfigurationSyntax`] or
    ///   [`DynConfigError::UnknownSetting`] when the input cannot be read
    /// - [`DynConfigError::IllegalOperation`] when no operation the input
    ///   could stand for is permitted at its scope
    /// - [`DynConfigError::InvalidValue`] when the value is rejected by the
    ///   setting's validator
    pub fn value_of(input: &str) -> DynConfigResult<Self> {
        let result = Self::parse(input.trim());
        let outcome = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!("dynconf_configurations_parsed_total", "outcome" => outcome).increment(1);
        match &result {
            Ok(config) => tracing::trace!(input = %config.raw, scope = %config.scope, "Parsed configuration"),
            Err(e) => tracing::debug!(input, error = %e, "Rejected configuration"),
        }
        result
    }

    fn parse(input: &str) -> DynConfigResult<Self> {
        let parsed = parser::parse(input)?;
        let scope = match (parsed.stripe_id, parsed.node_id) {
            (Some(_), Some(_)) => Scope::Node,
            (Some(_), None) => Scope::Stripe,
            _ => Scope::Cluster,
        };
        let config = Self {
            raw: input.to_string(),
            setting: parsed.setting,
            scope,
            stripe_id: parsed.stripe_id,
            node_id: parsed.node_id,
            key: parsed.key.map(str::to_string),
            value: parsed.value.map(|v| v.trim().to_string()),
        };
        config.pre_validate()?;
        Ok(config)
    }

    /// Builds the input assigning the setting's default at the given target.
    ///
    /// The target is the node `stripe.<stripe_id>.node.<node_id>` when both
    /// ids are given, else the cluster.
    pub fn of_default(
        setting: &'static Setting,
        stripe_id: Option<usize>,
        node_id: Option<usize>,
    ) -> DynConfigResult<Self> {
        let prefix = match (stripe_id, node_id) {
            (Some(s), Some(n)) => format!("stripe.{s}.node.{n}."),
            (Some(s), None) => format!("stripe.{s}."),
            _ => String::new(),
        };
        let value = setting.default_property().unwrap_or_default();
        Self::value_of(&format!("{prefix}{}={value}", setting.name()))
    }

    fn pre_validate(&self) -> DynConfigResult<()> {
        let setting = self.setting;
        if self.key.is_some() && !setting.is_map() {
            return Err(self.syntax(format!("{setting} is not a map and must not have a key")));
        }
        if self.stripe_id == Some(0) {
            return Err(self.syntax("Expected stripe ID to be greater than 0"));
        }
        if self.node_id == Some(0) {
            return Err(self.syntax("Expected node ID to be greater than 0"));
        }
        if !setting.allows_any_operation_in_scope(self.scope) {
            return Err(self.illegal(
                None,
                None,
                format!("{setting} does not allow any operation at {} level", self.scope),
            ));
        }
        match self.value.as_deref() {
            None => {
                if !setting.allows_operation(Operation::Get) && !setting.allows_operation(Operation::Unset) {
                    return Err(self.illegal(None, None, format!("{setting} cannot be read or cleared")));
                }
            }
            Some("") => {
                if setting.must_be_present() {
                    return Err(self.illegal(None, None, format!("{setting} requires a value")));
                }
                if !setting.allows_operation_in_scope(Operation::Unset, self.scope)
                    && !setting.allows_operation_in_scope(Operation::Config, self.scope)
                {
                    return Err(self.illegal(
                        None,
                        None,
                        format!("{setting} cannot be cleared at {} level", self.scope),
                    ));
                }
            }
            Some(value) => {
                if !setting.allows_operation(Operation::Set) && !setting.allows_operation(Operation::Config) {
                    return Err(self.illegal(None, None, format!("{setting} cannot be set")));
                }
                if !setting.allows_operation_in_scope(Operation::Set, self.scope)
                    && !setting.allows_operation_in_scope(Operation::Config, self.scope)
                {
                    return Err(self.illegal(
                        None,
                        None,
                        format!("{setting} cannot be set at {} level", self.scope),
                    ));
                }
                if !contains_placeholders(value) {
                    setting.validate_value(self.key.as_deref(), value)?;
                }
            }
        }
        Ok(())
    }

    /// Checks that the operation is legal in the given cluster state.
    ///
    /// # Errors
    ///
    /// - [`DynConfigError::SettingReadOnly`] when changing a setting that can
    ///   never change
    /// - [`DynConfigError::IllegalOperation`] when the operation is not
    ///   permitted for the setting, the state or the scope, or when a read or
    ///   clear carries a value
    /// - [`DynConfigError::SettingRequiresValue`] when a value is missing
    pub fn validate(&self, state: ClusterState, operation: Operation) -> DynConfigResult<()> {
        let setting = self.setting;
        let op = Some(operation);
        if matches!(operation, Operation::Set | Operation::Unset) && setting.is_read_only() {
            return Err(DynConfigError::SettingReadOnly {
                input: self.raw.clone(),
                setting: setting.name().to_string(),
                state,
            });
        }
        if !state.supports(operation) {
            return Err(self.illegal(
                op,
                Some(state),
                format!("Operation {operation} is not supported when cluster is {state}"),
            ));
        }
        if !setting.allows_operation(operation) {
            return Err(self.illegal(op, Some(state), format!("{setting} cannot be {operation}")));
        }
        if !setting.allows_in_state(state, operation) {
            return Err(self.illegal(
                op,
                Some(state),
                format!("{setting} cannot be {operation} when {state}"),
            ));
        }
        if !setting.allows_in_state_at(state, operation, self.scope) {
            return Err(self.illegal(
                op,
                Some(state),
                format!("{setting} cannot be {operation} at {} level when {state}", self.scope),
            ));
        }

        let value = self.value.as_deref().filter(|v| !v.is_empty());
        match operation {
            Operation::Get | Operation::Unset => {
                if value.is_some() {
                    return Err(self.illegal(
                        op,
                        Some(state),
                        format!("Operation {operation} must not have a value"),
                    ));
                }
            }
            Operation::Set => {
                if value.is_none() {
                    return Err(self.requires_value(operation));
                }
            }
            Operation::Import => {
                if value.is_none() && setting.must_be_present() {
                    return Err(self.requires_value(operation));
                }
                if setting.requires(Requirement::ResolveEagerly) && value.is_some_and(contains_placeholders) {
                    return Err(self.illegal(op, Some(state), "Placeholders are not allowed"));
                }
            }
            Operation::Config => {
                if value.is_none() && setting.is_required() {
                    return Err(self.requires_value(operation));
                }
            }
        }
        tracing::trace!(input = %self.raw, %state, %operation, "Configuration validated");
        Ok(())
    }

    /// Returns `true` if both inputs change the same thing.
    ///
    /// Inputs on different settings, scopes or targets never duplicate each
    /// other. On a map setting, inputs with the same key duplicate each
    /// other, and so do keyless inputs with the same value. The relation is
    /// symmetric.
    ///
    /// # Errors
    ///
    /// [`DynConfigError::AmbiguousDuplicate`] when two inputs on the same map
    /// cannot be compared: one with a key and one without, or two keyless
    /// inputs with different values.
    pub fn duplicates(&self, other: &Self) -> DynConfigResult<bool> {
        if self.setting != other.setting
            || self.scope != other.scope
            || self.stripe_id != other.stripe_id
            || self.node_id != other.node_id
        {
            return Ok(false);
        }
        if !self.setting.is_map() {
            return Ok(true);
        }
        match (&self.key, &other.key) {
            (Some(a), Some(b)) => Ok(a == b),
            (None, None) if self.value == other.value => Ok(true),
            _ => Err(DynConfigError::AmbiguousDuplicate {
                first: self.raw.clone(),
                second: other.raw.clone(),
            }),
        }
    }

    /// Returns `true` if a property key of an export falls under this input.
    ///
    /// A stripe or node id in this input must match the key's. On a map,
    /// an input with a key only matches that key, and one without a key only
    /// matches keyless properties.
    pub fn matches_config_property_key(&self, property_key: &str) -> DynConfigResult<bool> {
        let other = Self::value_of(property_key)?;
        if other.setting != self.setting {
            return Ok(false);
        }
        if self.stripe_id.is_some() && self.stripe_id != other.stripe_id {
            return Ok(false);
        }
        if self.node_id.is_some() && self.node_id != other.node_id {
            return Ok(false);
        }
        if self.setting.is_map() && self.key != other.key {
            return Ok(false);
        }
        Ok(true)
    }

    /// Writes the change into the cluster.
    ///
    /// Cluster settings change the cluster. Node settings change every node
    /// of the cluster, every node of one stripe, or one node, following the
    /// scope. A clear, with no value or an empty one, skips targets where the
    /// setting is not configured.
    ///
    /// # Errors
    ///
    /// [`DynConfigError::UnknownStripe`] or [`DynConfigError::UnknownNode`]
    /// when the target does not exist, or the setting's error when the value
    /// cannot be written.
    pub fn apply(&self, cluster: &mut Cluster) -> DynConfigResult<()> {
        let setting = self.setting;
        let key = self.key.as_deref();
        let value = self.value.as_deref();
        let clearing = self.is_clear();
        if setting.is_detached() {
            tracing::debug!(input = %self.raw, "Configuration handled outside the topology");
            return Ok(());
        }
        if setting.scope() == Scope::Cluster {
            if !clearing || setting.extract_from_cluster(cluster).is_some() {
                setting.inject_cluster(cluster, key, value)?;
            }
        } else {
            for node in self.target_nodes(cluster)? {
                if !clearing || setting.extract_from_node(node).is_some() {
                    setting.inject_node(node, key, value)?;
                }
            }
        }
        metrics::counter!("dynconf_configurations_applied_total", "setting" => setting.name()).increment(1);
        tracing::debug!(input = %self.raw, "Configuration applied");
        Ok(())
    }

    /// Writes the change into a single node, ignoring stripe and node ids.
    ///
    /// # Errors
    ///
    /// Fails for cluster settings, or when the value cannot be written.
    pub fn apply_to_node(&self, node: &mut Node) -> DynConfigResult<()> {
        if self.is_clear() && self.setting.extract_from_node(node).is_none() {
            return Ok(());
        }
        self.setting
            .inject_node(node, self.key.as_deref(), self.value.as_deref())?;
        metrics::counter!("dynconf_configurations_applied_total", "setting" => self.setting.name()).increment(1);
        tracing::debug!(input = %self.raw, node = node.name(), "Configuration applied to node");
        Ok(())
    }

    /// No value or an empty one.
    fn is_clear(&self) -> bool {
        self.value.as_deref().map_or(true, str::is_empty)
    }

    fn target_nodes<'c>(&self, cluster: &'c mut Cluster) -> DynConfigResult<Vec<&'c mut Node>> {
        let stripe_id = self.stripe_id.unwrap_or_default();
        let stripe_count = cluster.stripe_count();
        match self.scope {
            Scope::Cluster => Ok(cluster.nodes_mut().collect()),
            Scope::Stripe => cluster
                .stripe_mut(stripe_id)
                .map(|s| s.nodes_mut().iter_mut().collect())
                .ok_or(DynConfigError::UnknownStripe {
                    stripe_id,
                    stripe_count,
                }),
            Scope::Node => {
                let node_id = self.node_id.unwrap_or_default();
                let stripe = cluster
                    .stripe_mut(stripe_id)
                    .ok_or(DynConfigError::UnknownStripe {
                        stripe_id,
                        stripe_count,
                    })?;
                let node_count = stripe.node_count();
                let node = stripe.node_mut(node_id).ok_or(DynConfigError::UnknownNode {
                    stripe_id,
                    node_id,
                    node_count,
                })?;
                Ok(vec![node])
            }
        }
    }

    fn syntax(&self, reason: impl Into<String>) -> DynConfigError {
        DynConfigError::syntax(self.raw.as_str(), reason)
    }

    fn illegal(
        &self,
        operation: Option<Operation>,
        state: Option<ClusterState>,
        reason: impl Into<String>,
    ) -> DynConfigError {
        DynConfigError::IllegalOperation {
            input: self.raw.clone(),
            setting: self.setting.name().to_string(),
            operation,
            scope: self.scope,
            state,
            reason: reason.into(),
        }
    }

    fn requires_value(&self, operation: Operation) -> DynConfigError {
        DynConfigError::SettingRequiresValue {
            input: self.raw.clone(),
            setting: self.setting.name().to_string(),
            operation,
        }
    }

    // ---- accessors

    /// Returns the trimmed input.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns the setting.
    pub const fn setting(&self) -> &'static Setting {
        self.setting
    }

    /// Returns the scope targeted by the input.
    pub const fn scope(&self) -> Scope {
        self.scope
    }

    /// Returns the 1-based stripe id, for stripe and node scopes.
    pub const fn stripe_id(&self) -> Option<usize> {
        self.stripe_id
    }

    /// Returns the 1-based node id, for node scope.
    pub const fn node_id(&self) -> Option<usize> {
        self.node_id
    }

    /// Returns the map key, if any.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Returns the value, `Some("")` for an explicit empty value.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Returns `true` if the value still holds placeholders.
    pub fn is_placeholder_value(&self) -> bool {
        self.value.as_deref().is_some_and(contains_placeholders)
    }
}

impl PartialEq for Configuration {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Configuration {}

impl Hash for Configuration {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
