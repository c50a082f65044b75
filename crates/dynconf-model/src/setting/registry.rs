//! Process-wide table of every [`Setting`].

use super::{table, Binding, Setting};
use dynconf_core::{DynConfigError, DynConfigResult, Operation, Scope, Version};
use indexmap::IndexMap;
use std::sync::OnceLock;

static REGISTRY: OnceLock<Result<SettingRegistry, DynConfigError>> = OnceLock::new();

/// Every setting, in export order.
pub struct SettingRegistry {
    settings: IndexMap<&'static str, Setting>,
}

impl SettingRegistry {
    /// Returns the registry, building it on first use.
    ///
    /// Building fails only if the table itself is inconsistent; the same
    /// error is returned on every call.
    pub fn global() -> DynConfigResult<&'static SettingRegistry> {
        REGISTRY
            .get_or_init(|| Self::build(table::settings()?))
            .as_ref()
            .map_err(Clone::clone)
    }

    fn build(rows: Vec<Setting>) -> DynConfigResult<Self> {
        let mut settings = IndexMap::with_capacity(rows.len());
        for setting in rows {
            check(&setting)?;
            let name = setting.name;
            if settings.insert(name, setting).is_some() {
                return Err(DynConfigError::invalid_permission(format!(
                    "setting {name} is declared twice"
                )));
            }
        }
        tracing::debug!(settings = settings.len(), "Setting registry built");
        Ok(Self { settings })
    }

    /// Looks a setting up by key name.
    pub fn get(&self, name: &str) -> Option<&Setting> {
        self.settings.get(name)
    }

    /// Returns `true` if the name is a setting.
    pub fn contains(&self, name: &str) -> bool {
        self.settings.contains_key(name)
    }

    /// Iterates over every setting in export order.
    pub fn iter(&self) -> impl Iterator<Item = &Setting> {
        self.settings.values()
    }

    /// Number of settings.
    pub fn len(&self) -> usize {
        self.settings.len()
    }

    /// Returns `true` if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }

    /// Settings of the given native scope written by an export.
    pub fn exported(&self, scope: Scope, include_hidden: bool, version: Version) -> impl Iterator<Item = &Setting> {
        self.iter().filter(move |s| {
            s.scope() == scope
                && s.is_exported_in(version)
                && s.allows_operation(Operation::Import)
                && (include_hidden || !s.is_hidden())
        })
    }
}

fn check(setting: &Setting) -> DynConfigResult<()> {
    let invalid = |reason: &str| {
        Err(DynConfigError::invalid_permission(format!(
            "setting {}: {reason}",
            setting.name
        )))
    };
    match (setting.scope, setting.binding) {
        (Scope::Stripe, _) => return invalid("no setting can be stripe-scoped"),
        (Scope::Node, Binding::Cluster { .. }) => return invalid("node setting bound to the cluster"),
        (Scope::Cluster, Binding::Node { .. }) => return invalid("cluster setting bound to nodes"),
        _ => {}
    }
    if setting.permissions.is_empty() {
        return invalid("no permission declared");
    }
    if setting.scope == Scope::Cluster
        && setting
            .permissions
            .iter()
            .any(|p| p.allows_level(Scope::Node) || p.allows_level(Scope::Stripe))
    {
        return invalid("cluster setting granted below cluster level");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setting::names;

    #[test]
    fn test_registry_is_consistent() {
        let registry = SettingRegistry::global().unwrap();
        assert!(!registry.is_empty());
        assert!(registry.contains(names::OFFHEAP_RESOURCES));
        assert!(!registry.contains(names::STRIPE_NAME));
        assert!(registry.iter().all(|s| s.scope() != Scope::Stripe));
    }

    #[test]
    fn test_exported_filters() {
        let registry = SettingRegistry::global().unwrap();
        let v1: Vec<&str> = registry
            .exported(Scope::Node, true, Version::V1)
            .map(Setting::name)
            .collect();
        assert!(!v1.contains(&names::NODE_UID));
        assert!(v1.contains(&names::HOSTNAME));

        let visible: Vec<&str> = registry
            .exported(Scope::Cluster, false, Version::V2)
            .map(Setting::name)
            .collect();
        assert!(visible.contains(&names::CLUSTER_NAME));
        assert!(!visible.contains(&names::CLUSTER_UID));
        assert!(!visible.contains(&names::LICENSE_FILE));

        let hidden: Vec<&str> = registry
            .exported(Scope::Cluster, true, Version::V2)
            .map(Setting::name)
            .collect();
        assert!(hidden.contains(&names::CLUSTER_UID));
        assert!(hidden.contains(&names::LOCK_CONTEXT));
    }
}
