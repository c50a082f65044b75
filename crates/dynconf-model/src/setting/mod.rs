//! The setting registry: one row per configuration key.
//!
//! Each [`Setting`] describes a key completely: its native scope, whether it
//! holds a map, its default, the permission matrix deciding which operations
//! are legal where and when, its requirements, how its values are validated
//! and how they are read from and written to a [`Node`] or a [`Cluster`].
//!
//! Rows are plain structs holding function values. The table is built once
//! into [`SettingRegistry::global`] and never changes afterwards.
//!
//! # Example
//!
//! ```
//! use dynconf_core::{ClusterState, Operation, Scope};
//! use dynconf_model::Setting;
//!
//! let backup = Setting::from_name("backup-dir").unwrap();
//! assert_eq!(backup.scope(), Scope::Node);
//! assert!(backup.allows_in_state_at(ClusterState::Activated, Operation::Set, Scope::Cluster));
//!
//! let name = Setting::from_name("name").unwrap();
//! assert!(!name.allows_in_state_at(ClusterState::Activated, Operation::Unset, Scope::Node));
//! ```

pub mod names;
mod registry;
mod table;
mod validator;

pub use registry::SettingRegistry;

use crate::cluster::Cluster;
use crate::configuration::Configuration;
use crate::context::NodeContext;
use crate::node::Node;
use crate::properties::Properties;
use dynconf_core::{
    contains_placeholders, ClusterState, DynConfigError, DynConfigResult, MemoryUnit, Operation,
    Permission, Requirement, Scope, TimeUnit, Version,
};
use std::fmt;

/// Checks a value (and map key) before it is injected.
pub type Validator = fn(&Setting, Option<&str>, &str) -> DynConfigResult<()>;

pub(crate) type NodeExtractor = fn(&Node) -> Option<SettingValue>;
pub(crate) type NodeInjector = fn(&mut Node, Option<&str>, Option<&str>) -> DynConfigResult<()>;
pub(crate) type ClusterExtractor = fn(&Cluster) -> Option<SettingValue>;
pub(crate) type ClusterInjector =
    fn(&mut Cluster, Option<&str>, Option<&str>) -> DynConfigResult<()>;
pub(crate) type RuntimeVeto = fn(&NodeContext<'_>, &Configuration) -> bool;

/// A value as read from a topology entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    /// A scalar value in its text form.
    Single(String),
    /// Map entries, sorted by key.
    Map(Vec<(String, String)>),
}

impl SettingValue {
    /// Wraps a scalar value.
    pub fn single(value: impl ToString) -> Self {
        Self::Single(value.to_string())
    }

    /// Collects map entries, sorting them by key.
    pub fn map<K: ToString, V: ToString>(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        let mut entries: Vec<(String, String)> = entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        entries.sort();
        Self::Map(entries)
    }

    /// Returns the map entries, empty for a scalar.
    pub fn entries(&self) -> &[(String, String)] {
        match self {
            Self::Single(_) => &[],
            Self::Map(entries) => entries,
        }
    }

    /// Returns `true` for an empty scalar or an empty map.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(value) => value.is_empty(),
            Self::Map(entries) => entries.is_empty(),
        }
    }

    /// Reduces the value to the text written in a properties file.
    ///
    /// Maps become `k1:v1,k2:v2`.
    pub fn to_property_string(&self) -> String {
        match self {
            Self::Single(value) => value.clone(),
            Self::Map(entries) => entries
                .iter()
                .map(|(k, v)| format!("{k}:{v}"))
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_property_string())
    }
}

/// Units a measure setting accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowedUnits {
    /// The setting is not a measure.
    None,
    /// Durations in the listed units.
    Time(&'static [TimeUnit]),
    /// Memory sizes in the listed units.
    Memory(&'static [MemoryUnit]),
}

/// Where a setting's value lives.
#[derive(Clone, Copy)]
pub(crate) enum Binding {
    Node {
        extract: NodeExtractor,
        inject: NodeInjector,
    },
    Cluster {
        extract: ClusterExtractor,
        inject: ClusterInjector,
    },
    /// Accepted and validated, but consumed outside the topology.
    Detached,
}

/// One configuration key of the registry.
///
/// Equality, hashing and display use the key name.
pub struct Setting {
    name: &'static str,
    scope: Scope,
    map: bool,
    versions: &'static [Version],
    default: fn() -> Option<SettingValue>,
    permissions: Vec<Permission>,
    requirements: Vec<Requirement>,
    allowed_values: &'static [&'static str],
    units: AllowedUnits,
    validator: Validator,
    binding: Binding,
    veto: Option<RuntimeVeto>,
}

impl Setting {
    /// Looks a setting up by key name.
    pub fn from_name(name: &str) -> DynConfigResult<&'static Setting> {
        SettingRegistry::global()?
            .get(name)
            .ok_or_else(|| DynConfigError::UnknownSetting {
                input: name.to_string(),
                name: name.to_string(),
            })
    }

    /// Returns the key name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the native scope: [`Scope::Node`] or [`Scope::Cluster`].
    pub const fn scope(&self) -> Scope {
        self.scope
    }

    /// Returns `true` for map settings (`name.key=value`).
    pub const fn is_map(&self) -> bool {
        self.map
    }

    /// Returns the export format versions this setting is part of.
    pub const fn versions(&self) -> &'static [Version] {
        self.versions
    }

    /// Returns the permission matrix.
    pub fn permissions(&self) -> &[Permission] {
        &self.permissions
    }

    /// Returns the declared requirements.
    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// Returns `true` if the requirement is declared.
    pub fn requires(&self, requirement: Requirement) -> bool {
        self.requirements.contains(&requirement)
    }

    /// Returns the literal values accepted, empty when anything goes.
    pub const fn allowed_values(&self) -> &'static [&'static str] {
        self.allowed_values
    }

    /// Returns `true` if the literal value is accepted.
    pub fn allows_value(&self, value: &str) -> bool {
        self.allowed_values.is_empty() || self.allowed_values.contains(&value)
    }

    /// Returns the accepted units of a measure setting.
    pub const fn units(&self) -> AllowedUnits {
        self.units
    }

    /// Returns the default value, computed on each call.
    pub fn default_value(&self) -> Option<SettingValue> {
        (self.default)()
    }

    /// Returns the default in its properties text form.
    pub fn default_property(&self) -> Option<String> {
        self.default_value().map(|v| v.to_property_string())
    }

    /// Returns `true` if a non-empty default exists.
    pub fn has_default(&self) -> bool {
        self.default_value().is_some_and(|v| !v.is_empty())
    }

    /// Returns `true` for settings that never live in the topology.
    pub const fn is_detached(&self) -> bool {
        matches!(self.binding, Binding::Detached)
    }

    /// Returns `true` for settings left out of exports by default.
    pub fn is_hidden(&self) -> bool {
        self.requires(Requirement::Hidden)
    }

    /// Returns `true` if this setting is exported in the given format version.
    pub fn is_exported_in(&self, version: Version) -> bool {
        self.versions.contains(&version)
    }

    // ---- permissions

    /// Returns `true` if the operation is granted somewhere.
    pub fn allows_operation(&self, operation: Operation) -> bool {
        match operation {
            Operation::Config => self.allows_operation(Operation::Import),
            _ => self.permissions.iter().any(|p| p.allows_operation(operation)),
        }
    }

    /// Returns `true` if the operation is granted at the given level, in any state.
    ///
    /// Cluster-scoped settings only accept cluster-level operations. `config`
    /// is legal only at the native scope, where `import` is granted.
    pub fn allows_operation_in_scope(&self, operation: Operation, scope: Scope) -> bool {
        match operation {
            Operation::Config => {
                scope == self.scope && self.allows_operation_in_scope(Operation::Import, scope)
            }
            _ if self.scope == Scope::Cluster && scope != Scope::Cluster => false,
            _ => self
                .permissions
                .iter()
                .any(|p| p.allows_operation_at(operation, scope)),
        }
    }

    /// Returns `true` if at least one operation is granted at the level.
    pub fn allows_any_operation_in_scope(&self, scope: Scope) -> bool {
        Operation::ALL
            .into_iter()
            .any(|op| self.allows_operation_in_scope(op, scope))
    }

    /// Returns `true` if the operation is granted in the given state, at any level.
    pub fn allows_in_state(&self, state: ClusterState, operation: Operation) -> bool {
        match operation {
            Operation::Config => state.supports(operation) && self.allows_operation(operation),
            _ => self
                .permissions
                .iter()
                .any(|p| p.allows_in_state(state, operation)),
        }
    }

    /// Returns `true` if the operation is granted in the given state at the given level.
    pub fn allows_in_state_at(&self, state: ClusterState, operation: Operation, scope: Scope) -> bool {
        match operation {
            Operation::Config => {
                state.supports(operation) && self.allows_operation_in_scope(operation, scope)
            }
            _ if self.scope == Scope::Cluster && scope != Scope::Cluster => false,
            _ => self
                .permissions
                .iter()
                .any(|p| p.allows_in_state_at(state, operation, scope)),
        }
    }

    /// Returns `true` if the setting always holds a value once imported.
    ///
    /// That is the case when it cannot be cleared, or when clearing it
    /// brings back a default. Maps are never mandatory.
    pub fn must_be_present(&self) -> bool {
        !self.map && (!self.allows_operation(Operation::Unset) || self.has_default())
    }

    /// Returns `true` if the user has to provide a value: it must be present
    /// and no default can stand in for it.
    pub fn is_required(&self) -> bool {
        self.must_be_present() && !self.has_default()
    }

    /// Returns `true` if the setting can be set or cleared in the given state.
    pub fn is_writable_when(&self, state: ClusterState) -> bool {
        self.allows_in_state(state, Operation::Set) || self.allows_in_state(state, Operation::Unset)
    }

    /// Returns `true` if the setting can be set or cleared in some state.
    pub fn is_writable(&self) -> bool {
        ClusterState::ALL.into_iter().any(|s| self.is_writable_when(s))
    }

    /// Returns `true` if the setting can never be changed once imported.
    pub fn is_read_only(&self) -> bool {
        !self.is_writable()
    }

    /// Returns `true` if the setting is part of user-facing exports.
    pub fn is_exportable(&self) -> bool {
        !self.is_hidden() && self.allows_operation(Operation::Import)
    }

    // ---- values

    /// Validates a value, and its key for maps.
    pub fn validate_value(&self, key: Option<&str>, value: &str) -> DynConfigResult<()> {
        (self.validator)(self, key, value)
    }

    /// Reads the configured value from a node.
    ///
    /// Returns `None` for cluster-scoped settings.
    pub fn extract_from_node(&self, node: &Node) -> Option<SettingValue> {
        match self.binding {
            Binding::Node { extract, .. } => extract(node),
            _ => None,
        }
    }

    /// Reads the configured value from a cluster.
    ///
    /// Returns `None` for node-scoped settings.
    pub fn extract_from_cluster(&self, cluster: &Cluster) -> Option<SettingValue> {
        match self.binding {
            Binding::Cluster { extract, .. } => extract(cluster),
            _ => None,
        }
    }

    /// Reads the configured value of a node in its properties text form.
    pub fn property_of_node(&self, node: &Node) -> Option<String> {
        self.extract_from_node(node).map(|v| v.to_property_string())
    }

    /// Reads the configured value of a cluster in its properties text form.
    pub fn property_of_cluster(&self, cluster: &Cluster) -> Option<String> {
        self.extract_from_cluster(cluster)
            .map(|v| v.to_property_string())
    }

    /// Validates then writes a value on a node.
    ///
    /// `value` of `None` clears. Values holding placeholders are written
    /// without validation.
    pub fn set_on_node(&self, node: &mut Node, key: Option<&str>, value: Option<&str>) -> DynConfigResult<()> {
        let value = self.checked_value(key, value)?;
        self.inject_node(node, key, value)
    }

    /// Validates then writes a value on a cluster.
    pub fn set_on_cluster(
        &self,
        cluster: &mut Cluster,
        key: Option<&str>,
        value: Option<&str>,
    ) -> DynConfigResult<()> {
        let value = self.checked_value(key, value)?;
        self.inject_cluster(cluster, key, value)
    }

    fn checked_value<'v>(&self, key: Option<&str>, value: Option<&'v str>) -> DynConfigResult<Option<&'v str>> {
        if !self.is_writable() && !self.allows_operation(Operation::Import) {
            return Err(DynConfigError::invalid_value(
                self.name,
                format!("Setting: {self} is not writable"),
            ));
        }
        let value = value.map(str::trim);
        if let Some(v) = value.filter(|v| !v.is_empty()) {
            if !contains_placeholders(v) {
                self.validate_value(key, v)?;
            }
        }
        Ok(value)
    }

    pub(crate) fn inject_node(&self, node: &mut Node, key: Option<&str>, value: Option<&str>) -> DynConfigResult<()> {
        match self.binding {
            Binding::Node { inject, .. } => inject(node, key, value),
            Binding::Detached => Ok(()),
            Binding::Cluster { .. } => Err(DynConfigError::invalid_value(
                self.name,
                format!("Setting: {self} is not a node setting"),
            )),
        }
    }

    pub(crate) fn inject_cluster(
        &self,
        cluster: &mut Cluster,
        key: Option<&str>,
        value: Option<&str>,
    ) -> DynConfigResult<()> {
        match self.binding {
            Binding::Cluster { inject, .. } => inject(cluster, key, value),
            Binding::Detached => Ok(()),
            Binding::Node { .. } => Err(DynConfigError::invalid_value(
                self.name,
                format!("Setting: {self} is not a cluster setting"),
            )),
        }
    }

    /// Writes this setting into an export.
    ///
    /// The configured value is always written, an explicitly empty value
    /// included. Defaults are written only with `include_defaults` and only
    /// when not empty. `expanded` writes one `name.key=value` line per map
    /// entry; a configured empty map is written as `name=`.
    pub fn write_properties(
        &self,
        current: Option<SettingValue>,
        expanded: bool,
        include_defaults: bool,
        out: &mut Properties,
    ) {
        let value = match current {
            Some(value) => value,
            None if include_defaults => match self.default_value() {
                Some(default) if !default.is_empty() => default,
                _ => return,
            },
            None => return,
        };
        match value {
            SettingValue::Map(entries) if expanded && !entries.is_empty() => {
                for (key, v) in entries {
                    out.insert(format!("{}.{}", self.name, key), v);
                }
            }
            value => out.insert(self.name, value.to_property_string()),
        }
    }

    /// Returns `true` if applying the change at runtime is refused and has
    /// to wait for a restart of the node.
    pub fn veto_runtime_change(&self, context: &NodeContext<'_>, configuration: &Configuration) -> bool {
        self.veto.is_some_and(|veto| veto(context, configuration))
    }
}

impl PartialEq for Setting {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Setting {}

impl std::hash::Hash for Setting {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Debug for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
