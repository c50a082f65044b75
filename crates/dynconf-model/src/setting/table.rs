//! The rows of the registry, in export order.

use super::{
    names, validator, AllowedUnits, Binding, ClusterExtractor, ClusterInjector, NodeExtractor,
    NodeInjector, RuntimeVeto, Setting, SettingValue, Validator,
};
use crate::configuration::Configuration;
use crate::context::NodeContext;
use crate::defaults;
use crate::failover::FailoverPriority;
use crate::lock::LockContext;
use dynconf_core::{
    ClusterState, DynConfigError, DynConfigResult, Measure, MemoryUnit, Operation, Permission,
    RawPath, Requirement, Scope, TimeUnit, Uid, Unit, Version,
};
use std::collections::BTreeMap;

use ClusterState::{Activated, Configuring};
use Operation::{Get, Import, Set, Unset};
use Requirement::{ClusterOnline, ClusterRestart, Hidden, NodeRestart, ResolveEagerly};

const CONFIGURING: &[ClusterState] = &[Configuring];
const ACTIVATED: &[ClusterState] = &[Activated];
const ANY_STATE: &[ClusterState] = &[Configuring, Activated];

const ALL_VERSIONS: &[Version] = &[Version::V1, Version::V2];
const V2_ONLY: &[Version] = &[Version::V2];

const BOOLEANS: &[&str] = &["true", "false"];
const AUTHC: &[&str] = &["file", "ldap", "certificate"];

const RECONNECT_UNITS: &[TimeUnit] = &[TimeUnit::Seconds, TimeUnit::Minutes, TimeUnit::Hours];
const LEASE_UNITS: &[TimeUnit] = &[
    TimeUnit::Milliseconds,
    TimeUnit::Seconds,
    TimeUnit::Minutes,
    TimeUnit::Hours,
];

fn when(states: &[ClusterState]) -> dynconf_core::PermissionBuilder {
    Permission::when(states)
}

/// Builds every setting.
pub(super) fn settings() -> DynConfigResult<Vec<Setting>> {
    Ok(vec![
        // ---- node identity and addresses
        Row::node(
            names::NODE_UID,
            |n| single(n.uid()),
            |n, _, v| {
                if let Some(v) = scalar(v) {
                    n.set_uid(v.parse::<Uid>()?);
                }
                Ok(())
            },
        )
        .versions(V2_ONLY)
        .default(|| single(Uid::new_uid()))
        .permit(when(ANY_STATE).allow(&[Get]).at_any_levels()?)
        .permit(when(CONFIGURING).allow(&[Import]).at_level(Scope::Node)?)
        .requires(&[ResolveEagerly, Hidden])
        .validator(validator::uid)
        .build(),
        Row::node(
            names::NODE_NAME,
            |n| single(n.name()),
            |n, _, v| {
                if let Some(v) = scalar(v) {
                    n.set_name(v);
                }
                Ok(())
            },
        )
        .default(|| single(defaults::node_name()))
        .permit(when(ANY_STATE).allow(&[Get]).at_any_levels()?)
        .permit(when(CONFIGURING).allow(&[Set, Import]).at_level(Scope::Node)?)
        .requires(&[ResolveEagerly])
        .validator(validator::name)
        .build(),
        Row::node(
            names::HOSTNAME,
            |n| single(n.hostname()),
            |n, _, v| {
                n.set_hostname(scalar(v).unwrap_or(defaults::HOSTNAME));
                Ok(())
            },
        )
        .default(|| single(defaults::HOSTNAME))
        .permit(when(ANY_STATE).allow(&[Get]).at_any_levels()?)
        .permit(when(CONFIGURING).allow(&[Import]).at_level(Scope::Node)?)
        .requires(&[ResolveEagerly])
        .validator(validator::host)
        .build(),
        Row::node(
            names::PORT,
            |n| n.port().get().map(SettingValue::single),
            |n, _, v| {
                n.set_port(port(names::PORT, v)?);
                Ok(())
            },
        )
        .default(|| single(defaults::PORT))
        .permit(when(ANY_STATE).allow(&[Get]).at_any_levels()?)
        .permit(when(CONFIGURING).allow(&[Import]).at_level(Scope::Node)?)
        .validator(validator::port)
        .build(),
        Row::node(
            names::PUBLIC_HOSTNAME,
            |n| n.public_hostname().get().map(SettingValue::single),
            |n, _, v| {
                n.set_public_hostname(scalar(v).map(str::to_string));
                Ok(())
            },
        )
        .permit(when(CONFIGURING).allow(&[Import]).at_level(Scope::Node)?)
        .permit(when(ANY_STATE).allow(&[Get, Set, Unset]).at_any_levels()?)
        .validator(validator::host)
        .build(),
        Row::node(
            names::PUBLIC_PORT,
            |n| n.public_port().get().map(SettingValue::single),
            |n, _, v| {
                n.set_public_port(port(names::PUBLIC_PORT, v)?);
                Ok(())
            },
        )
        .permit(when(CONFIGURING).allow(&[Import]).at_level(Scope::Node)?)
        .permit(when(ANY_STATE).allow(&[Get, Set, Unset]).at_any_levels()?)
        .validator(validator::port)
        .build(),
        Row::node(
            names::GROUP_PORT,
            |n| n.group_port().get().map(SettingValue::single),
            |n, _, v| {
                n.set_group_port(port(names::GROUP_PORT, v)?);
                Ok(())
            },
        )
        .default(|| single(defaults::GROUP_PORT))
        .permit(when(ANY_STATE).allow(&[Get]).at_any_levels()?)
        .permit(when(CONFIGURING).allow(&[Set, Unset]).at_any_levels()?)
        .permit(when(CONFIGURING).allow(&[Import]).at_level(Scope::Node)?)
        .validator(validator::port)
        .build(),
        Row::node(
            names::BIND_ADDRESS,
            |n| n.bind_address().get().map(SettingValue::single),
            |n, _, v| {
                n.set_bind_address(scalar(v).map(str::to_string));
                Ok(())
            },
        )
        .default(|| single(defaults::BIND_ADDRESS))
        .permit(when(ANY_STATE).allow(&[Get]).at_any_levels()?)
        .permit(when(CONFIGURING).allow(&[Set, Unset]).at_any_levels()?)
        .permit(when(CONFIGURING).allow(&[Import]).at_level(Scope::Node)?)
        .validator(validator::address)
        .build(),
        Row::node(
            names::GROUP_BIND_ADDRESS,
            |n| n.group_bind_address().get().map(SettingValue::single),
            |n, _, v| {
                n.set_group_bind_address(scalar(v).map(str::to_string));
                Ok(())
            },
        )
        .default(|| single(defaults::GROUP_BIND_ADDRESS))
        .permit(when(ANY_STATE).allow(&[Get]).at_any_levels()?)
        .permit(when(CONFIGURING).allow(&[Set, Unset]).at_any_levels()?)
        .permit(when(CONFIGURING).allow(&[Import]).at_level(Scope::Node)?)
        .validator(validator::address)
        .build(),
        // ---- cluster identity
        Row::cluster(
            names::CLUSTER_UID,
            |c| single(c.uid()),
            |c, _, v| {
                if let Some(v) = scalar(v) {
                    c.set_uid(v.parse::<Uid>()?);
                }
                Ok(())
            },
        )
        .versions(V2_ONLY)
        .default(|| single(Uid::new_uid()))
        .permit(when(ANY_STATE).allow(&[Get]).at_level(Scope::Cluster)?)
        .permit(when(CONFIGURING).allow(&[Import]).at_level(Scope::Cluster)?)
        .requires(&[ResolveEagerly, Hidden])
        .validator(validator::uid)
        .build(),
        Row::cluster(
            names::CLUSTER_NAME,
            |c| c.name().map(SettingValue::single),
            |c, _, v| {
                c.set_name(scalar(v).map(str::to_string));
                Ok(())
            },
        )
        .permit(when(CONFIGURING).allow_any_operations().at_level(Scope::Cluster)?)
        .permit(when(ACTIVATED).allow(&[Get, Set]).at_level(Scope::Cluster)?)
        .validator(validator::name)
        .build(),
        Row::cluster(
            names::LOCK_CONTEXT,
            |c| c.lock_context().map(SettingValue::single),
            |c, _, v| {
                c.set_lock_context(scalar(v).map(str::parse::<LockContext>).transpose()?);
                Ok(())
            },
        )
        .versions(V2_ONLY)
        .permit(when(CONFIGURING).allow(&[Import]).at_level(Scope::Cluster)?)
        .permit(when(ACTIVATED).allow(&[Set, Unset]).at_level(Scope::Cluster)?)
        .requires(&[Hidden])
        .validator(validator::lock)
        .build(),
        // ---- node directories
        Row::node(
            names::METADATA_DIR,
            |n| n.metadata_dir().get().map(SettingValue::single),
            |n, _, v| {
                n.set_metadata_dir(raw_path(v));
                Ok(())
            },
        )
        .default(|| single(defaults::METADATA_DIR))
        .permit(when(CONFIGURING).allow(&[Import]).at_level(Scope::Node)?)
        .permit(when(CONFIGURING).allow(&[Get, Set, Unset]).at_any_levels()?)
        .permit(when(ACTIVATED).allow(&[Get]).at_any_levels()?)
        .validator(validator::path)
        .build(),
        Row::node(
            names::LOG_DIR,
            |n| n.log_dir().get().map(SettingValue::single),
            |n, _, v| {
                n.set_log_dir(raw_path(v));
                Ok(())
            },
        )
        .default(|| single(defaults::LOG_DIR))
        .permit(when(CONFIGURING).allow(&[Import]).at_level(Scope::Node)?)
        .permit(when(ANY_STATE).allow(&[Get, Set, Unset]).at_any_levels()?)
        .requires(&[NodeRestart])
        .validator(validator::path)
        .build(),
        Row::node(
            names::BACKUP_DIR,
            |n| n.backup_dir().get().map(SettingValue::single),
            |n, _, v| {
                n.set_backup_dir(raw_path(v));
                Ok(())
            },
        )
        .permit(when(CONFIGURING).allow(&[Import]).at_level(Scope::Node)?)
        .permit(when(ANY_STATE).allow(&[Get, Set, Unset]).at_any_levels()?)
        .validator(validator::path)
        .veto(backup_dir_veto)
        .build(),
        // ---- node maps
        Row::node(
            names::TC_PROPERTIES,
            |n| n.tc_properties().get().map(|m| SettingValue::map(m.iter())),
            |n, k, v| {
                let mut map = n.tc_properties().into_configured();
                inject_map(&mut map, BTreeMap::new, k, v, |v| Ok(v.to_string()))?;
                n.set_tc_properties(map);
                Ok(())
            },
        )
        .map()
        .default(|| Some(SettingValue::Map(Vec::new())))
        .permit(when(CONFIGURING).allow(&[Import]).at_level(Scope::Node)?)
        .permit(when(ANY_STATE).allow(&[Get, Set, Unset]).at_any_levels()?)
        .requires(&[ClusterRestart])
        .validator(validator::properties)
        .build(),
        Row::node(
            names::LOGGER_OVERRIDES,
            |n| n.logger_overrides().get().map(|m| SettingValue::map(m.iter())),
            |n, k, v| {
                let mut map = n.logger_overrides().into_configured();
                inject_map(&mut map, BTreeMap::new, k, v, |v| Ok(v.to_ascii_uppercase()))?;
                n.set_logger_overrides(map);
                Ok(())
            },
        )
        .map()
        .default(|| Some(SettingValue::Map(Vec::new())))
        .permit(when(CONFIGURING).allow(&[Import]).at_level(Scope::Node)?)
        .permit(when(ANY_STATE).allow(&[Get, Set, Unset]).at_any_levels()?)
        .validator(validator::logger_overrides)
        .build(),
        // ---- cluster client and failover settings
        Row::cluster(
            names::CLIENT_RECONNECT_WINDOW,
            |c| c.client_reconnect_window().get().map(SettingValue::single),
            |c, _, v| {
                c.set_client_reconnect_window(time(v)?);
                Ok(())
            },
        )
        .default(|| single(defaults::client_reconnect_window()))
        .units(AllowedUnits::Time(RECONNECT_UNITS))
        .permit(when(CONFIGURING).allow(&[Import]).at_level(Scope::Cluster)?)
        .permit(when(ANY_STATE).allow(&[Get, Set, Unset]).at_level(Scope::Cluster)?)
        .validator(validator::time)
        .build(),
        Row::cluster(
            names::FAILOVER_PRIORITY,
            |c| c.failover_priority().map(SettingValue::single),
            |c, _, v| {
                c.set_failover_priority(scalar(v).map(str::parse::<FailoverPriority>).transpose()?);
                Ok(())
            },
        )
        .permit(when(CONFIGURING).allow(&[Import]).at_level(Scope::Cluster)?)
        .permit(when(ANY_STATE).allow(&[Get, Set]).at_level(Scope::Cluster)?)
        .requires(&[ClusterOnline, ClusterRestart, ResolveEagerly])
        .validator(validator::failover)
        .build(),
        Row::cluster(
            names::CLIENT_LEASE_DURATION,
            |c| c.client_lease_duration().get().map(SettingValue::single),
            |c, _, v| {
                c.set_client_lease_duration(time(v)?);
                Ok(())
            },
        )
        .default(|| single(defaults::client_lease_duration()))
        .units(AllowedUnits::Time(LEASE_UNITS))
        .permit(when(CONFIGURING).allow(&[Import]).at_level(Scope::Cluster)?)
        .permit(when(ANY_STATE).allow(&[Get, Set, Unset]).at_level(Scope::Cluster)?)
        .validator(validator::time)
        .build(),
        Row::detached(names::LICENSE_FILE)
            .permit(when(ANY_STATE).allow(&[Set]).at_level(Scope::Cluster)?)
            .validator(validator::path)
            .build(),
        // ---- security
        Row::node(
            names::SECURITY_DIR,
            |n| n.security_dir().get().map(SettingValue::single),
            |n, _, v| {
                n.set_security_dir(raw_path(v));
                Ok(())
            },
        )
        .permit(when(CONFIGURING).allow(&[Import]).at_level(Scope::Node)?)
        .permit(when(ANY_STATE).allow(&[Get, Set, Unset]).at_any_levels()?)
        .requires(&[NodeRestart])
        .validator(validator::path)
        .build(),
        Row::node(
            names::AUDIT_LOG_DIR,
            |n| n.security_audit_log_dir().get().map(SettingValue::single),
            |n, _, v| {
                n.set_security_audit_log_dir(raw_path(v));
                Ok(())
            },
        )
        .permit(when(CONFIGURING).allow(&[Import]).at_level(Scope::Node)?)
        .permit(when(ANY_STATE).allow(&[Get, Set, Unset]).at_any_levels()?)
        .requires(&[NodeRestart])
        .validator(validator::path)
        .build(),
        Row::cluster(
            names::SECURITY_AUTHC,
            |c| c.security_authc().get().map(SettingValue::single),
            |c, _, v| {
                c.set_security_authc(scalar(v).map(str::to_string));
                Ok(())
            },
        )
        .allowed_values(AUTHC)
        .permit(when(CONFIGURING).allow(&[Import]).at_level(Scope::Cluster)?)
        .permit(when(ANY_STATE).allow(&[Get, Set, Unset]).at_level(Scope::Cluster)?)
        .requires(&[ClusterOnline, ClusterRestart])
        .build(),
        Row::cluster(
            names::SECURITY_SSL_TLS,
            |c| c.security_ssl_tls().get().map(SettingValue::single),
            |c, _, v| {
                c.set_security_ssl_tls(flag(names::SECURITY_SSL_TLS, v)?);
                Ok(())
            },
        )
        .default(|| single(false))
        .allowed_values(BOOLEANS)
        .permit(when(CONFIGURING).allow(&[Import]).at_level(Scope::Cluster)?)
        .permit(when(ANY_STATE).allow(&[Get, Set, Unset]).at_level(Scope::Cluster)?)
        .requires(&[ClusterOnline, ClusterRestart])
        .build(),
        Row::cluster(
            names::SECURITY_WHITELIST,
            |c| c.security_whitelist().get().map(SettingValue::single),
            |c, _, v| {
                c.set_security_whitelist(flag(names::SECURITY_WHITELIST, v)?);
                Ok(())
            },
        )
        .default(|| single(false))
        .allowed_values(BOOLEANS)
        .permit(when(CONFIGURING).allow(&[Import]).at_level(Scope::Cluster)?)
        .permit(when(ANY_STATE).allow(&[Get, Set, Unset]).at_level(Scope::Cluster)?)
        .requires(&[ClusterOnline, ClusterRestart])
        .build(),
        // ---- node resources
        Row::node(
            names::OFFHEAP_RESOURCES,
            |n| n.offheap_resources().get().map(|m| SettingValue::map(m.iter())),
            |n, k, v| {
                let mut map = n.offheap_resources().into_configured();
                inject_map(&mut map, defaults::offheap_resources, k, v, Measure::<MemoryUnit>::parse)?;
                n.set_offheap_resources(map);
                Ok(())
            },
        )
        .map()
        .default(|| Some(SettingValue::map(defaults::offheap_resources())))
        .units(AllowedUnits::Memory(MemoryUnit::ALL))
        .permit(when(CONFIGURING).allow(&[Import]).at_level(Scope::Node)?)
        .permit(when(CONFIGURING).allow(&[Get, Set, Unset]).at_any_levels()?)
        .permit(when(ACTIVATED).allow(&[Get, Set]).at_any_levels()?)
        .validator(validator::offheap)
        .build(),
        Row::node(
            names::DATA_DIRS,
            |n| n.data_dirs().get().map(|m| SettingValue::map(m.iter())),
            |n, k, v| {
                let mut map = n.data_dirs().into_configured();
                inject_map(&mut map, defaults::data_dirs, k, v, |v| Ok(RawPath::new(v)))?;
                n.set_data_dirs(map);
                Ok(())
            },
        )
        .map()
        .default(|| Some(SettingValue::map(defaults::data_dirs())))
        .permit(when(CONFIGURING).allow(&[Import]).at_level(Scope::Node)?)
        .permit(when(CONFIGURING).allow(&[Get, Set, Unset]).at_any_levels()?)
        .permit(when(ACTIVATED).allow(&[Get, Set]).at_any_levels()?)
        .validator(validator::data_dirs)
        .build(),
    ])
}

/// A backup directory can be configured at runtime the first time only.
///
/// Clearing it, or moving it elsewhere, waits for a node restart.
fn backup_dir_veto(context: &NodeContext<'_>, configuration: &Configuration) -> bool {
    match configuration.value().filter(|v| !v.is_empty()) {
        None => true,
        Some(next) => context
            .node()
            .backup_dir()
            .get()
            .is_some_and(|current| current.as_str() != next),
    }
}

/// Builder for one registry row.
struct Row(Setting);

impl Row {
    fn new(name: &'static str, scope: Scope, binding: Binding) -> Self {
        Self(Setting {
            name,
            scope,
            map: false,
            versions: ALL_VERSIONS,
            default: || None,
            permissions: Vec::new(),
            requirements: Vec::new(),
            allowed_values: &[],
            units: AllowedUnits::None,
            validator: validator::default,
            binding,
            veto: None,
        })
    }

    fn node(name: &'static str, extract: NodeExtractor, inject: NodeInjector) -> Self {
        Self::new(name, Scope::Node, Binding::Node { extract, inject })
    }

    fn cluster(name: &'static str, extract: ClusterExtractor, inject: ClusterInjector) -> Self {
        Self::new(name, Scope::Cluster, Binding::Cluster { extract, inject })
    }

    fn detached(name: &'static str) -> Self {
        Self::new(name, Scope::Cluster, Binding::Detached)
    }

    fn map(mut self) -> Self {
        self.0.map = true;
        self
    }

    fn versions(mut self, versions: &'static [Version]) -> Self {
        self.0.versions = versions;
        self
    }

    fn default(mut self, default: fn() -> Option<SettingValue>) -> Self {
        self.0.default = default;
        self
    }

    fn permit(mut self, permission: Permission) -> Self {
        self.0.permissions.push(permission);
        self
    }

    fn requires(mut self, requirements: &[Requirement]) -> Self {
        self.0.requirements.extend_from_slice(requirements);
        self
    }

    fn allowed_values(mut self, values: &'static [&'static str]) -> Self {
        self.0.allowed_values = values;
        self
    }

    fn units(mut self, units: AllowedUnits) -> Self {
        self.0.units = units;
        self
    }

    fn validator(mut self, validator: Validator) -> Self {
        self.0.validator = validator;
        self
    }

    fn veto(mut self, veto: RuntimeVeto) -> Self {
        self.0.veto = Some(veto);
        self
    }

    fn build(self) -> Setting {
        self.0
    }
}

fn single(value: impl ToString) -> Option<SettingValue> {
    Some(SettingValue::single(value))
}

fn scalar(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn raw_path(value: Option<&str>) -> Option<RawPath> {
    scalar(value).map(RawPath::new)
}

fn port(setting: &str, value: Option<&str>) -> DynConfigResult<Option<u16>> {
    scalar(value)
        .map(|v| {
            v.parse::<u16>().map_err(|_| {
                DynConfigError::invalid_value(
                    setting,
                    format!("<port> specified in {setting}=<port> must be an integer between 1 and 65535"),
                )
            })
        })
        .transpose()
}

fn flag(setting: &str, value: Option<&str>) -> DynConfigResult<Option<bool>> {
    scalar(value)
        .map(|v| {
            v.parse::<bool>()
                .map_err(|_| DynConfigError::invalid_value(setting, format!("{setting} should be one of: [true, false]")))
        })
        .transpose()
}

fn time(value: Option<&str>) -> DynConfigResult<Option<Measure<TimeUnit>>> {
    scalar(value).map(Measure::parse).transpose()
}

/// Applies a change to a map setting.
///
/// - no key, no value or an empty one: back to unconfigured
/// - key, no value: remove the key
/// - no key, `k1:v1,k2:v2`: merge the entries
/// - key and value: insert or replace the key
///
/// Partial changes start from the default when the map is not configured.
/// Nothing is modified if one entry fails to parse.
fn inject_map<V>(
    current: &mut Option<BTreeMap<String, V>>,
    default: fn() -> BTreeMap<String, V>,
    key: Option<&str>,
    value: Option<&str>,
    parse: fn(&str) -> DynConfigResult<V>,
) -> DynConfigResult<()> {
    match (key.map(str::trim), value.map(str::trim)) {
        (None, None | Some("")) => *current = None,
        (Some(key), None | Some("")) => {
            current.get_or_insert_with(default).remove(key);
        }
        (None, Some(list)) => {
            let entries = list
                .split(',')
                .map(|pair| {
                    let (k, v) = pair.split_once(':').ok_or_else(|| {
                        DynConfigError::syntax(list, "Expected <key>:<value>,<key>:<value>...")
                    })?;
                    Ok((k.trim().to_string(), parse(v.trim())?))
                })
                .collect::<DynConfigResult<Vec<_>>>()?;
            current.get_or_insert_with(default).extend(entries);
        }
        (Some(key), Some(value)) => {
            let parsed = parse(value)?;
            current
                .get_or_insert_with(default)
                .insert(key.to_string(), parsed);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merged(
        start: Option<BTreeMap<String, String>>,
        key: Option<&str>,
        value: Option<&str>,
    ) -> Option<BTreeMap<String, String>> {
        let mut map = start;
        inject_map(&mut map, BTreeMap::new, key, value, |v| Ok(v.to_string())).unwrap();
        map
    }

    fn map_of(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_bulk_assignment_merges() {
        let first = merged(None, None, Some("foo:1,bar:2"));
        let second = merged(first, None, Some("foo:2,baz:3"));
        assert_eq!(second, Some(map_of(&[("foo", "2"), ("bar", "2"), ("baz", "3")])));
    }

    #[test]
    fn test_clear_forms() {
        let start = Some(map_of(&[("a", "1"), ("b", "2")]));
        assert_eq!(merged(start.clone(), None, None), None);
        assert_eq!(merged(start.clone(), None, Some("")), None);
        assert_eq!(merged(start, Some("a"), None), Some(map_of(&[("b", "2")])));
    }

    #[test]
    fn test_partial_change_starts_from_default() {
        let mut map = None;
        inject_map(
            &mut map,
            defaults::data_dirs,
            Some("second"),
            Some("/data/second"),
            |v| Ok(RawPath::new(v)),
        )
        .unwrap();
        let map = map.unwrap();
        assert_eq!(map.len(), 2);
        assert!(map.contains_key(defaults::MAIN));
    }

    #[test]
    fn test_failed_entry_changes_nothing() {
        let mut map = Some(defaults::offheap_resources());
        let result = inject_map(
            &mut map,
            defaults::offheap_resources,
            None,
            Some("second:1GB,third:lots"),
            |v| Measure::<MemoryUnit>::parse(v),
        );
        assert!(result.is_err());
        assert_eq!(map, Some(defaults::offheap_resources()));
    }

    #[test]
    fn test_backup_dir_veto() {
        use crate::fixtures;

        let mut cluster = fixtures::cluster(1, 1);
        let first_time = Configuration::value_of("backup-dir=/backup").unwrap();
        let clear = Configuration::value_of("backup-dir=").unwrap();
        let setting = first_time.setting();
        {
            let context = cluster.node_context(1, 1).unwrap();
            assert!(!setting.veto_runtime_change(&context, &first_time));
            assert!(setting.veto_runtime_change(&context, &clear));
        }

        first_time.apply(&mut cluster).unwrap();
        let same = Configuration::value_of("backup-dir=/backup").unwrap();
        let moved = Configuration::value_of("backup-dir=/elsewhere").unwrap();
        let context = cluster.node_context(1, 1).unwrap();
        assert!(!setting.veto_runtime_change(&context, &same));
        assert!(setting.veto_runtime_change(&context, &moved));
    }
}
