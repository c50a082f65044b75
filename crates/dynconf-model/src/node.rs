//! A server node and its node-scoped settings.

use crate::defaults;
use crate::endpoint::{Endpoint, EndpointKind, HostPort};
use crate::optional::OptionalConfig;
use crate::properties::Properties;
use crate::setting::{names, SettingRegistry};
use dynconf_core::{DynConfigResult, Measure, MemoryUnit, RawPath, Scope, Uid, Version};
use std::collections::BTreeMap;

/// A server node.
///
/// A node knows nothing about the stripe or cluster holding it; membership is
/// found by searching from the cluster. Optional settings are stored as
/// `None` until configured, and their getters return an [`OptionalConfig`]
/// carrying the default.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    uid: Uid,
    name: String,
    hostname: String,
    port: Option<u16>,
    public_hostname: Option<String>,
    public_port: Option<u16>,
    group_port: Option<u16>,
    bind_address: Option<String>,
    group_bind_address: Option<String>,
    metadata_dir: Option<RawPath>,
    log_dir: Option<RawPath>,
    backup_dir: Option<RawPath>,
    security_dir: Option<RawPath>,
    security_audit_log_dir: Option<RawPath>,
    data_dirs: Option<BTreeMap<String, RawPath>>,
    offheap_resources: Option<BTreeMap<String, Measure<MemoryUnit>>>,
    tc_properties: Option<BTreeMap<String, String>>,
    logger_overrides: Option<BTreeMap<String, String>>,
}

impl Node {
    /// Creates a node with a fresh random UID.
    pub fn new(name: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            uid: Uid::new_uid(),
            name: name.into(),
            hostname: hostname.into(),
            port: None,
            public_hostname: None,
            public_port: None,
            group_port: None,
            bind_address: None,
            group_bind_address: None,
            metadata_dir: None,
            log_dir: None,
            backup_dir: None,
            security_dir: None,
            security_audit_log_dir: None,
            data_dirs: None,
            offheap_resources: None,
            tc_properties: None,
            logger_overrides: None,
        }
    }

    // ---- identity

    /// Returns the node UID.
    pub const fn uid(&self) -> Uid {
        self.uid
    }

    /// Replaces the node UID.
    pub fn set_uid(&mut self, uid: Uid) -> &mut Self {
        self.uid = uid;
        self
    }

    /// Returns the node name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the node.
    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }

    // ---- addresses

    /// Returns the internal hostname.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Replaces the internal hostname.
    pub fn set_hostname(&mut self, hostname: impl Into<String>) -> &mut Self {
        self.hostname = hostname.into();
        self
    }

    /// Returns the node port.
    pub fn port(&self) -> OptionalConfig<u16> {
        OptionalConfig::new(names::PORT, self.port, Some(defaults::PORT))
    }

    /// Sets or clears the node port.
    pub fn set_port(&mut self, port: impl Into<Option<u16>>) -> &mut Self {
        self.port = port.into();
        self
    }

    /// Returns the public hostname.
    pub fn public_hostname(&self) -> OptionalConfig<String> {
        OptionalConfig::new(names::PUBLIC_HOSTNAME, self.public_hostname.clone(), None)
    }

    /// Sets or clears the public hostname.
    pub fn set_public_hostname(&mut self, hostname: impl Into<Option<String>>) -> &mut Self {
        self.public_hostname = hostname.into();
        self
    }

    /// Returns the public port.
    pub fn public_port(&self) -> OptionalConfig<u16> {
        OptionalConfig::new(names::PUBLIC_PORT, self.public_port, None)
    }

    /// Sets or clears the public port.
    pub fn set_public_port(&mut self, port: impl Into<Option<u16>>) -> &mut Self {
        self.public_port = port.into();
        self
    }

    /// Returns the group port.
    pub fn group_port(&self) -> OptionalConfig<u16> {
        OptionalConfig::new(names::GROUP_PORT, self.group_port, Some(defaults::GROUP_PORT))
    }

    /// Sets or clears the group port.
    pub fn set_group_port(&mut self, port: impl Into<Option<u16>>) -> &mut Self {
        self.group_port = port.into();
        self
    }

    /// Returns the bind address.
    pub fn bind_address(&self) -> OptionalConfig<String> {
        OptionalConfig::new(
            names::BIND_ADDRESS,
            self.bind_address.clone(),
            Some(defaults::BIND_ADDRESS.to_string()),
        )
    }

    /// Sets or clears the bind address.
    pub fn set_bind_address(&mut self, address: impl Into<Option<String>>) -> &mut Self {
        self.bind_address = address.into();
        self
    }

    /// Returns the group bind address.
    pub fn group_bind_address(&self) -> OptionalConfig<String> {
        OptionalConfig::new(
            names::GROUP_BIND_ADDRESS,
            self.group_bind_address.clone(),
            Some(defaults::GROUP_BIND_ADDRESS.to_string()),
        )
    }

    /// Sets or clears the group bind address.
    pub fn set_group_bind_address(&mut self, address: impl Into<Option<String>>) -> &mut Self {
        self.group_bind_address = address.into();
        self
    }

    // ---- directories

    /// Returns the metadata directory.
    pub fn metadata_dir(&self) -> OptionalConfig<RawPath> {
        OptionalConfig::new(
            names::METADATA_DIR,
            self.metadata_dir.clone(),
            Some(RawPath::new(defaults::METADATA_DIR)),
        )
    }

    /// Sets or clears the metadata directory.
    pub fn set_metadata_dir(&mut self, dir: impl Into<Option<RawPath>>) -> &mut Self {
        self.metadata_dir = dir.into();
        self
    }

    /// Returns the log directory.
    pub fn log_dir(&self) -> OptionalConfig<RawPath> {
        OptionalConfig::new(
            names::LOG_DIR,
            self.log_dir.clone(),
            Some(RawPath::new(defaults::LOG_DIR)),
        )
    }

    /// Sets or clears the log directory.
    pub fn set_log_dir(&mut self, dir: impl Into<Option<RawPath>>) -> &mut Self {
        self.log_dir = dir.into();
        self
    }

    /// Returns the backup directory.
    pub fn backup_dir(&self) -> OptionalConfig<RawPath> {
        OptionalConfig::new(names::BACKUP_DIR, self.backup_dir.clone(), None)
    }

    /// Sets or clears the backup directory.
    pub fn set_backup_dir(&mut self, dir: impl Into<Option<RawPath>>) -> &mut Self {
        self.backup_dir = dir.into();
        self
    }

    /// Returns the security directory.
    pub fn security_dir(&self) -> OptionalConfig<RawPath> {
        OptionalConfig::new(names::SECURITY_DIR, self.security_dir.clone(), None)
    }

    /// Sets or clears the security directory.
    pub fn set_security_dir(&mut self, dir: impl Into<Option<RawPath>>) -> &mut Self {
        self.security_dir = dir.into();
        self
    }

    /// Returns the security audit log directory.
    pub fn security_audit_log_dir(&self) -> OptionalConfig<RawPath> {
        OptionalConfig::new(
            names::AUDIT_LOG_DIR,
            self.security_audit_log_dir.clone(),
            None,
        )
    }

    /// Sets or clears the security audit log directory.
    pub fn set_security_audit_log_dir(&mut self, dir: impl Into<Option<RawPath>>) -> &mut Self {
        self.security_audit_log_dir = dir.into();
        self
    }

    // ---- maps

    /// Returns the data directories.
    pub fn data_dirs(&self) -> OptionalConfig<BTreeMap<String, RawPath>> {
        OptionalConfig::new(
            names::DATA_DIRS,
            self.data_dirs.clone(),
            Some(defaults::data_dirs()),
        )
    }

    /// Replaces or clears all data directories.
    pub fn set_data_dirs(&mut self, dirs: impl Into<Option<BTreeMap<String, RawPath>>>) -> &mut Self {
        self.data_dirs = dirs.into();
        self
    }

    /// Adds or replaces one data directory, starting from the defaults.
    pub fn put_data_dir(&mut self, name: impl Into<String>, path: RawPath) -> &mut Self {
        self.data_dirs
            .get_or_insert_with(defaults::data_dirs)
            .insert(name.into(), path);
        self
    }

    /// Removes one data directory, starting from the defaults.
    pub fn remove_data_dir(&mut self, name: &str) -> &mut Self {
        self.data_dirs
            .get_or_insert_with(defaults::data_dirs)
            .remove(name);
        self
    }

    /// Returns the off-heap resources.
    pub fn offheap_resources(&self) -> OptionalConfig<BTreeMap<String, Measure<MemoryUnit>>> {
        OptionalConfig::new(
            names::OFFHEAP_RESOURCES,
            self.offheap_resources.clone(),
            Some(defaults::offheap_resources()),
        )
    }

    /// Replaces or clears all off-heap resources.
    pub fn set_offheap_resources(
        &mut self,
        resources: impl Into<Option<BTreeMap<String, Measure<MemoryUnit>>>>,
    ) -> &mut Self {
        self.offheap_resources = resources.into();
        self
    }

    /// Adds or replaces one off-heap resource, starting from the defaults.
    pub fn put_offheap_resource(&mut self, name: impl Into<String>, size: Measure<MemoryUnit>) -> &mut Self {
        self.offheap_resources
            .get_or_insert_with(defaults::offheap_resources)
            .insert(name.into(), size);
        self
    }

    /// Removes one off-heap resource, starting from the defaults.
    pub fn remove_offheap_resource(&mut self, name: &str) -> &mut Self {
        self.offheap_resources
            .get_or_insert_with(defaults::offheap_resources)
            .remove(name);
        self
    }

    /// Returns the raw server properties.
    pub fn tc_properties(&self) -> OptionalConfig<BTreeMap<String, String>> {
        OptionalConfig::new(
            names::TC_PROPERTIES,
            self.tc_properties.clone(),
            Some(BTreeMap::new()),
        )
    }

    /// Replaces or clears all raw server properties.
    pub fn set_tc_properties(&mut self, props: impl Into<Option<BTreeMap<String, String>>>) -> &mut Self {
        self.tc_properties = props.into();
        self
    }

    /// Adds or replaces one raw server property.
    pub fn put_tc_property(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.tc_properties
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Removes one raw server property.
    pub fn remove_tc_property(&mut self, key: &str) -> &mut Self {
        self.tc_properties.get_or_insert_with(BTreeMap::new).remove(key);
        self
    }

    /// Returns the logger level overrides.
    pub fn logger_overrides(&self) -> OptionalConfig<BTreeMap<String, String>> {
        OptionalConfig::new(
            names::LOGGER_OVERRIDES,
            self.logger_overrides.clone(),
            Some(BTreeMap::new()),
        )
    }

    /// Replaces or clears all logger level overrides.
    pub fn set_logger_overrides(&mut self, overrides: impl Into<Option<BTreeMap<String, String>>>) -> &mut Self {
        self.logger_overrides = overrides.into();
        self
    }

    /// Overrides the level of one logger. Levels are stored upper-case.
    pub fn put_logger_override(&mut self, logger: impl Into<String>, level: &str) -> &mut Self {
        self.logger_overrides
            .get_or_insert_with(BTreeMap::new)
            .insert(logger.into(), level.to_ascii_uppercase());
        self
    }

    /// Removes the override of one logger.
    pub fn remove_logger_override(&mut self, logger: &str) -> &mut Self {
        self.logger_overrides
            .get_or_insert_with(BTreeMap::new)
            .remove(logger);
        self
    }

    // ---- endpoints

    /// Returns the `hostname:port` address.
    pub fn internal_address(&self) -> HostPort {
        HostPort::new(&self.hostname, self.port.unwrap_or(defaults::PORT))
    }

    /// Returns the public address, when both its parts are configured.
    pub fn public_address(&self) -> Option<HostPort> {
        match (&self.public_hostname, self.public_port) {
            (Some(host), Some(port)) => Some(HostPort::new(host, port)),
            _ => None,
        }
    }

    /// Returns the bind address, unless it is a wildcard.
    pub fn bind_socket_address(&self) -> Option<HostPort> {
        let address = HostPort::new(
            self.bind_address
                .as_deref()
                .unwrap_or(defaults::BIND_ADDRESS),
            self.port.unwrap_or(defaults::PORT),
        );
        (!address.is_wildcard()).then_some(address)
    }

    /// Returns the internal endpoint.
    pub fn internal_endpoint(&self) -> Endpoint {
        self.endpoint(EndpointKind::Internal, self.internal_address())
    }

    /// Returns the public endpoint, if a public address is configured.
    pub fn public_endpoint(&self) -> Option<Endpoint> {
        self.public_address()
            .map(|address| self.endpoint(EndpointKind::Public, address))
    }

    /// Returns the bind endpoint, if the bind address is not a wildcard.
    pub fn bind_endpoint(&self) -> Option<Endpoint> {
        self.bind_socket_address()
            .map(|address| self.endpoint(EndpointKind::Bind, address))
    }

    /// Classifies an address a peer used to reach this node.
    ///
    /// Every matching endpoint is returned, public first, then internal,
    /// then bind. More than one entry means two configured addresses
    /// coincide; callers use the first.
    pub fn find_endpoints(&self, address: &HostPort) -> Vec<Endpoint> {
        [
            self.public_endpoint(),
            Some(self.internal_endpoint()),
            self.bind_endpoint(),
        ]
        .into_iter()
        .flatten()
        .filter(|endpoint| endpoint.address().matches(address))
        .collect()
    }

    /// Returns the preferred endpoint matching the address.
    pub fn find_endpoint(&self, address: &HostPort) -> Option<Endpoint> {
        self.find_endpoints(address).into_iter().next()
    }

    /// Returns `true` if the address is this node's internal or public address.
    pub fn has_address(&self, address: &HostPort) -> bool {
        self.internal_address().matches(address)
            || self
                .public_address()
                .is_some_and(|public| public.matches(address))
    }

    /// Returns the public endpoint if configured, else the internal one.
    pub fn determine_endpoint(&self) -> Endpoint {
        self.public_endpoint()
            .unwrap_or_else(|| self.internal_endpoint())
    }

    /// Returns this node's endpoint of the same kind as `initiator`.
    ///
    /// Falls back to [`determine_endpoint`](Self::determine_endpoint) when
    /// this node has no endpoint of that kind.
    pub fn determine_endpoint_like(&self, initiator: &Endpoint) -> Endpoint {
        match initiator.kind() {
            EndpointKind::Internal => self.internal_endpoint(),
            EndpointKind::Public => self.determine_endpoint(),
            EndpointKind::Bind => self
                .bind_endpoint()
                .unwrap_or_else(|| self.determine_endpoint()),
        }
    }

    fn endpoint(&self, kind: EndpointKind, address: HostPort) -> Endpoint {
        Endpoint::new(self.uid, &self.name, kind, address)
    }

    // ---- serialization

    /// Returns the shape of this node for logs: `name:uid@host:port`.
    pub fn to_shape_string(&self) -> String {
        format!("{}:{}@{}", self.name, self.uid, self.internal_address())
    }

    /// Exports the node-scoped settings as properties.
    ///
    /// `expanded` writes map settings one entry per line. `include_defaults`
    /// writes defaults for settings that are not configured. Hidden settings
    /// and settings newer than `version` are left out unless asked for.
    pub fn to_properties(
        &self,
        expanded: bool,
        include_defaults: bool,
        include_hidden: bool,
        version: Version,
    ) -> DynConfigResult<Properties> {
        let registry = SettingRegistry::global()?;
        let mut props = Properties::new();
        for setting in registry.exported(Scope::Node, include_hidden, version) {
            setting.write_properties(
                setting.extract_from_node(self),
                expanded,
                include_defaults,
                &mut props,
            );
        }
        Ok(props)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node() -> Node {
        let mut node = Node::new("node-1", "localhost");
        node.set_port(9410);
        node
    }

    #[test]
    fn test_defaults_are_not_configured() {
        let node = Node::new("n", "h");
        assert!(!node.port().is_configured());
        assert_eq!(node.port().or_default(), Some(&9410));
        assert_eq!(node.group_port().or_default(), Some(&9430));
        assert_eq!(
            node.bind_address().or_default().map(String::as_str),
            Some("0.0.0.0")
        );
        assert!(node.backup_dir().or_default().is_none());
        assert_eq!(
            node.offheap_resources().or_default().map(BTreeMap::len),
            Some(1)
        );
    }

    #[test]
    fn test_map_puts_start_from_defaults() {
        let mut node = Node::new("n", "h");
        node.put_data_dir("second", RawPath::new("/data/second"));
        let dirs = node.data_dirs().into_configured().unwrap();
        assert_eq!(dirs.len(), 2);
        assert!(dirs.contains_key("main"));

        node.remove_offheap_resource("main");
        assert!(node.offheap_resources().get().unwrap().is_empty());
    }

    #[test]
    fn test_logger_levels_are_uppercased() {
        let mut node = Node::new("n", "h");
        node.put_logger_override("org.store", "debug");
        assert_eq!(
            node.logger_overrides().get().unwrap().get("org.store").map(String::as_str),
            Some("DEBUG")
        );
    }

    #[test]
    fn test_determine_endpoint_without_initiator() {
        let mut node = node();
        assert_eq!(node.determine_endpoint().kind(), EndpointKind::Internal);
        assert_eq!(node.determine_endpoint().address().to_string(), "localhost:9410");

        node.set_public_hostname(Some("public.example.com".to_string()))
            .set_public_port(9510);
        let endpoint = node.determine_endpoint();
        assert_eq!(endpoint.kind(), EndpointKind::Public);
        assert_eq!(endpoint.address().to_string(), "public.example.com:9510");
    }

    #[test]
    fn test_public_address_needs_both_parts() {
        let mut node = node();
        node.set_public_hostname(Some("public".to_string()));
        assert!(node.public_address().is_none());
        assert!(node.public_endpoint().is_none());
    }

    #[test]
    fn test_wildcard_bind_never_matches() {
        let node = node();
        assert!(node.bind_endpoint().is_none());
        assert!(node
            .find_endpoints(&HostPort::new("0.0.0.0", 9410))
            .is_empty());
    }

    #[test]
    fn test_find_endpoints_orders_public_internal_bind() {
        let mut node = Node::new("n", "same");
        node.set_port(9410)
            .set_public_hostname(Some("same".to_string()))
            .set_public_port(9410)
            .set_bind_address(Some("10.0.0.1".to_string()));

        let found = node.find_endpoints(&HostPort::new("same", 9410));
        let kinds: Vec<EndpointKind> = found.iter().map(Endpoint::kind).collect();
        assert_eq!(kinds, vec![EndpointKind::Public, EndpointKind::Internal]);
        assert_eq!(
            node.find_endpoint(&HostPort::new("10.0.0.1", 9410))
                .map(|e| e.kind()),
            Some(EndpointKind::Bind)
        );
        assert!(node.find_endpoint(&HostPort::new("other", 9410)).is_none());
    }

    #[test]
    fn test_determine_endpoint_like() {
        let mut other = Node::new("other", "other-host");
        other
            .set_public_hostname(Some("other-public".to_string()))
            .set_public_port(1)
            .set_bind_address(Some("10.0.0.9".to_string()));

        let mut node = node();
        assert_eq!(
            node.determine_endpoint_like(&other.internal_endpoint()).kind(),
            EndpointKind::Internal
        );
        let public = other.public_endpoint().unwrap();
        assert_eq!(
            node.determine_endpoint_like(&public).kind(),
            EndpointKind::Internal
        );
        let bind = other.bind_endpoint().unwrap();
        assert_eq!(
            node.determine_endpoint_like(&bind).kind(),
            EndpointKind::Internal
        );

        node.set_public_hostname(Some("pub".to_string()))
            .set_public_port(2)
            .set_bind_address(Some("10.0.0.2".to_string()));
        assert_eq!(node.determine_endpoint_like(&public).kind(), EndpointKind::Public);
        assert_eq!(node.determine_endpoint_like(&bind).kind(), EndpointKind::Bind);
    }

    #[test]
    fn test_shape_string() {
        let node = node();
        assert_eq!(
            node.to_shape_string(),
            format!("node-1:{}@localhost:9410", node.uid())
        );
    }
}
