//! File-based loading of engine configuration and cluster properties.

use std::fs;

use dynconf_config::{ClusterLoader, ConfigError, ConfigLoader, EngineConfig, LogFormat};
use dynconf_core::{ClusterState, Operation, Version};
use dynconf_model::fixtures;
use tempfile::TempDir;

const CLUSTER: &str = "\
# two stripes, three nodes
cluster-name=tc
failover-priority=availability
stripe.1.node.1.name=node-1-1
stripe.1.node.1.hostname=host-1
stripe.1.node.2.name=node-1-2
stripe.1.node.2.hostname=host-2
stripe.2.node.1.name=node-2-1
stripe.2.node.1.hostname=host-3
stripe.2.node.1.offheap-resources=main:512MB
";

#[test]
fn loads_toml_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dynconf.toml");
    fs::write(
        &path,
        r#"
[logging]
level = "dynconf_model=trace,warn"
format = "pretty"

[export]
version = "1"
"#,
    )
    .unwrap();

    let config = ConfigLoader::new().with_file(&path).unwrap().load().unwrap();
    assert_eq!(config.logging.format, LogFormat::Pretty);
    assert_eq!(config.logging.level, "dynconf_model=trace,warn");
    assert_eq!(config.export.version, Version::V1);
    assert_eq!(config.validation.state, ClusterState::Configuring);
}

#[test]
fn loads_json_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dynconf.json");
    fs::write(&path, r#"{"validation": {"state": "activated"}}"#).unwrap();

    let config = ConfigLoader::new().with_file(&path).unwrap().load().unwrap();
    assert_eq!(config.validation.state, ClusterState::Activated);
}

#[test]
fn rejects_unknown_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dynconf.yaml");
    fs::write(&path, "logging: {}").unwrap();

    let err = ConfigLoader::new().with_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError(_)));
}

#[test]
fn rejects_unknown_fields() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dynconf.toml");
    fs::write(&path, "[export]\ncompress = true\n").unwrap();

    let err = ConfigLoader::new().with_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::TomlError(_)));
}

#[test]
fn loads_cluster_properties_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cluster.properties");
    fs::write(&path, CLUSTER).unwrap();

    let config = EngineConfig::default();
    let parsed = ClusterLoader::new(&config).load_file(&path).unwrap();
    let cluster = parsed.cluster;

    assert_eq!(cluster.name(), Some("tc"));
    assert_eq!(cluster.stripe_count(), 2);
    assert_eq!(cluster.node_count(), 3);
    assert_eq!(cluster.node(2, 1).map(|n| n.name()), Some("node-2-1"));
    assert!(parsed
        .defaults_added
        .iter()
        .any(|c| c.setting().name() == "node-uid"));
}

#[test]
fn missing_cluster_file() {
    let dir = TempDir::new().unwrap();
    let config = EngineConfig::default();
    let err = ClusterLoader::new(&config)
        .load_file(dir.path().join("absent.properties"))
        .unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound { .. }));
}

#[test]
fn gap_in_node_ids_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cluster.properties");
    fs::write(
        &path,
        "failover-priority=availability\n\
         stripe.1.node.1.name=a\n\
         stripe.1.node.1.hostname=h1\n\
         stripe.1.node.3.name=c\n\
         stripe.1.node.3.hostname=h3\n",
    )
    .unwrap();

    let config = EngineConfig::default();
    let err = ClusterLoader::new(&config).load_file(&path).unwrap_err();
    assert!(err.to_string().contains("Node ID must end at 2 in stripe 1"), "{err}");
}

#[test]
fn export_then_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("exported.properties");

    let mut config = EngineConfig::default();
    config.export.include_hidden = true;
    config.export.include_defaults = false;
    let loader = ClusterLoader::new(&config);

    let mut cluster = fixtures::valid_cluster(2, 2);
    loader
        .apply(&mut cluster, "tc-properties.foo=bar", Operation::Set)
        .unwrap();
    loader.export_to_file(&cluster, &path).unwrap();

    let reloaded = loader.load_file(&path).unwrap();
    assert_eq!(reloaded.cluster, cluster);
    assert!(reloaded.defaults_added.is_empty());
}
