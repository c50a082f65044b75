//! Configuration scenarios run end to end: parse, validate, apply, export.

use dynconf_core::{ClusterState, DynConfigError, Operation, Version};
use dynconf_model::{fixtures, Cluster, ClusterFactory, Configuration, EndpointKind, HostPort, Node};

/// Parses, validates and applies one input.
fn change(cluster: &mut Cluster, input: &str, state: ClusterState, operation: Operation) {
    let config = Configuration::value_of(input).unwrap();
    config.validate(state, operation).unwrap();
    config.apply(cluster).unwrap();
}

fn offheap(node: &Node) -> Vec<(String, String)> {
    node.offheap_resources()
        .get()
        .map(|m| m.iter().map(|(k, v)| (k.clone(), v.to_string())).collect())
        .unwrap_or_default()
}

#[test]
fn node_level_change_touches_a_single_node() {
    let mut cluster = Cluster::named("tc", [fixtures::stripe(1, 3), fixtures::stripe(2, 2)]);
    let before = cluster.clone();

    change(
        &mut cluster,
        "stripe.1.node.2.offheap-resources.main=1GB",
        ClusterState::Activated,
        Operation::Set,
    );

    assert_eq!(
        offheap(cluster.node(1, 2).unwrap()),
        vec![("main".to_string(), "1GB".to_string())]
    );
    for (stripe_id, node_id) in [(1, 1), (1, 3), (2, 1), (2, 2)] {
        assert_eq!(cluster.node(stripe_id, node_id), before.node(stripe_id, node_id));
    }
}

#[test]
fn cluster_level_change_fans_out_to_every_node() {
    let mut cluster = fixtures::cluster(2, 2);
    change(&mut cluster, "tc-properties.foo=bar", ClusterState::Activated, Operation::Set);

    assert_eq!(cluster.nodes().count(), 4);
    for node in cluster.nodes() {
        let props = node.tc_properties().into_configured().unwrap();
        assert_eq!(props.get("foo").map(String::as_str), Some("bar"));
    }
}

#[test]
fn stripe_level_change_fans_out_to_its_nodes() {
    let mut cluster = fixtures::cluster(2, 2);
    change(&mut cluster, "stripe.1.log-dir=/var/logs", ClusterState::Configuring, Operation::Set);

    let dirs: Vec<Option<String>> = cluster
        .nodes()
        .map(|n| n.log_dir().get().map(ToString::to_string))
        .collect();
    assert_eq!(
        dirs,
        vec![Some("/var/logs".into()), Some("/var/logs".into()), None, None]
    );
}

#[test]
fn node_name_cannot_be_unset_when_activated() {
    let config = Configuration::value_of("stripe.1.node.1.name").unwrap();
    let err = config.validate(ClusterState::Activated, Operation::Unset).unwrap_err();
    assert!(matches!(err, DynConfigError::IllegalOperation { .. }), "{err}");
    assert!(err.to_string().contains("name cannot be unset"));
}

#[test]
fn empty_backup_dir_clears_it() {
    let mut cluster = fixtures::cluster(1, 2);
    change(&mut cluster, "backup-dir=/backup", ClusterState::Activated, Operation::Set);
    assert!(cluster.nodes().all(|n| n.backup_dir().is_configured()));

    let clear = Configuration::value_of("backup-dir=").unwrap();
    assert_eq!(clear.value(), Some(""));
    clear.validate(ClusterState::Activated, Operation::Unset).unwrap();
    clear.apply(&mut cluster).unwrap();
    assert!(cluster.nodes().all(|n| !n.backup_dir().is_configured()));
}

#[test]
fn bulk_map_assignments_merge() {
    let mut cluster = fixtures::cluster(1, 1);
    change(&mut cluster, "tc-properties=foo:1,bar:2", ClusterState::Activated, Operation::Set);
    change(&mut cluster, "tc-properties=foo:2,baz:3", ClusterState::Activated, Operation::Set);

    let props = cluster.node(1, 1).unwrap().tc_properties().into_configured().unwrap();
    let entries: Vec<(&str, &str)> = props.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
    assert_eq!(entries, vec![("bar", "2"), ("baz", "3"), ("foo", "2")]);
}

#[test]
fn removing_a_map_key_keeps_the_others() {
    let mut cluster = fixtures::cluster(1, 1);
    change(&mut cluster, "stripe.1.node.1.offheap-resources=second:2GB", ClusterState::Configuring, Operation::Set);
    change(&mut cluster, "stripe.1.node.1.offheap-resources.main", ClusterState::Configuring, Operation::Unset);

    assert_eq!(
        offheap(cluster.node(1, 1).unwrap()),
        vec![("second".to_string(), "2GB".to_string())]
    );
}

#[test]
fn clearing_an_unset_map_changes_nothing() {
    let mut cluster = fixtures::cluster(1, 1);
    let before = cluster.clone();

    for input in [
        "tc-properties.foo=",
        "stripe.1.node.1.offheap-resources.other=",
        "offheap-resources=",
    ] {
        let clear = Configuration::value_of(input).unwrap();
        clear.apply(&mut cluster).unwrap();
        for node in cluster.nodes_mut() {
            clear.apply_to_node(node).unwrap();
        }
    }

    assert_eq!(cluster, before);
    let node = cluster.node(1, 1).unwrap();
    assert!(!node.tc_properties().is_configured());
    assert!(!node.offheap_resources().is_configured());
    let exported = cluster.to_properties(false, false, false, Version::V2).unwrap();
    assert!(!exported.contains_key("stripe.1.node.1.tc-properties"));
}

#[test]
fn clearing_a_map_restores_its_default() {
    let mut cluster = fixtures::cluster(1, 1);
    change(&mut cluster, "offheap-resources=second:1GB", ClusterState::Configuring, Operation::Set);
    assert_eq!(offheap(cluster.node(1, 1).unwrap()).len(), 2);

    change(&mut cluster, "offheap-resources=", ClusterState::Configuring, Operation::Unset);

    let node = cluster.node(1, 1).unwrap();
    assert!(!node.offheap_resources().is_configured());
    let effective: Vec<String> = node
        .offheap_resources()
        .or_default()
        .map(|m| m.keys().cloned().collect())
        .unwrap_or_default();
    assert_eq!(effective, vec!["main".to_string()]);
}

#[test]
fn endpoint_priority_is_public_internal_bind() {
    let mut node = Node::new("node-1", "10.0.0.1");
    node.set_port(9410)
        .set_public_hostname("10.0.0.1".to_string())
        .set_public_port(9410)
        .set_bind_address("10.0.0.1".to_string());
    let address = HostPort::new("10.0.0.1", 9410);

    let kinds: Vec<EndpointKind> = node.find_endpoints(&address).iter().map(|e| e.kind()).collect();
    assert_eq!(
        kinds,
        vec![EndpointKind::Public, EndpointKind::Internal, EndpointKind::Bind]
    );
    assert_eq!(node.find_endpoint(&address).map(|e| e.kind()), Some(EndpointKind::Public));
}

#[test]
fn wildcard_bind_address_is_never_matched() {
    let node = fixtures::node(1, 1);
    let wildcard = HostPort::new("0.0.0.0", 9410);
    assert!(node.find_endpoints(&wildcard).is_empty());
}

#[test]
fn removing_the_last_node_removes_its_stripe() {
    let mut cluster = fixtures::cluster(3, 1);
    let middle = cluster.node(2, 1).unwrap().uid();
    let last_stripe = cluster.stripe(3).unwrap().uid();

    cluster.remove_node(middle).unwrap();

    assert_eq!(cluster.stripe_count(), 2);
    assert_eq!(cluster.stripe(2).map(|s| s.uid()), Some(last_stripe));
    assert_eq!(cluster.node(2, 1).map(Node::name), Some("node-3-1"));
}

#[test]
fn export_then_import_keeps_the_topology() {
    let mut cluster = fixtures::valid_cluster(2, 2);
    change(&mut cluster, "tc-properties.foo=bar", ClusterState::Configuring, Operation::Set);
    change(&mut cluster, "client-lease-duration=20s", ClusterState::Configuring, Operation::Set);

    let exported = cluster.to_properties(false, false, true, Version::V2).unwrap();
    let imported = ClusterFactory::new().create(&exported).unwrap();

    assert_eq!(imported.cluster, cluster);
    assert!(imported.defaults_added.is_empty());
}

#[test]
fn compact_export_keeps_property_values_with_colons() {
    let mut cluster = fixtures::valid_cluster(1, 1);
    change(&mut cluster, "tc-properties.url=http:x", ClusterState::Configuring, Operation::Set);

    let exported = cluster.to_properties(false, false, true, Version::V2).unwrap();
    assert_eq!(exported.get("stripe.1.node.1.tc-properties"), Some("url:http:x"));

    let imported = ClusterFactory::new().create(&exported).unwrap();
    assert_eq!(imported.cluster, cluster);
    let node = imported.cluster.node(1, 1).unwrap();
    assert_eq!(
        node.tc_properties().get().and_then(|m| m.get("url")).map(String::as_str),
        Some("http:x")
    );
}

#[test]
fn runtime_veto_on_backup_dir() {
    let mut cluster = fixtures::cluster(1, 1);
    let setting = Configuration::value_of("backup-dir=/first").unwrap().setting();

    let first = Configuration::value_of("backup-dir=/first").unwrap();
    let context = cluster.node_context(1, 1).unwrap();
    assert!(!setting.veto_runtime_change(&context, &first));
    first.apply(&mut cluster).unwrap();

    let moved = Configuration::value_of("backup-dir=/second").unwrap();
    let context = cluster.node_context(1, 1).unwrap();
    assert!(setting.veto_runtime_change(&context, &moved));
    assert!(!setting.veto_runtime_change(&context, &first));
}
