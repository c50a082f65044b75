//! Property tests over the configuration rules.

use dynconf_core::{Operation, Scope, Uid};
use dynconf_model::{fixtures, Configuration, Node, SettingRegistry};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

const SCOPES: [Scope; 3] = [Scope::Cluster, Scope::Stripe, Scope::Node];

fn target() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        (1..4usize).prop_map(|s| format!("stripe.{s}.")),
        (1..4usize, 1..4usize).prop_map(|(s, n)| format!("stripe.{s}.node.{n}.")),
    ]
}

/// Valid inputs over a few settings of each kind. The scalar settings
/// picked have no default, so they can be cleared.
fn input() -> impl Strategy<Value = String> {
    let scalar = (
        target(),
        prop::sample::select(vec!["backup-dir", "security-dir", "audit-log-dir"]),
        prop::option::of("[a-z]{1,8}"),
    )
        .prop_map(|(target, setting, dir)| match dir {
            Some(dir) => format!("{target}{setting}=/data/{dir}"),
            None => format!("{target}{setting}="),
        });
    let keyed = (
        target(),
        "[a-z]{1,6}",
        prop::option::of(prop::option::of("[a-z0-9]{1,6}")),
    )
        .prop_map(|(target, key, value)| match value {
            None => format!("{target}tc-properties.{key}"),
            Some(None) => format!("{target}tc-properties.{key}="),
            Some(Some(v)) => format!("{target}tc-properties.{key}={v}"),
        });
    let bulk = (target(), prop::collection::btree_map("[a-z]{1,4}", 1..64u32, 1..4))
        .prop_map(|(target, entries)| {
            let pairs: Vec<String> = entries.iter().map(|(k, v)| format!("{k}:{v}MB")).collect();
            format!("{target}offheap-resources={}", pairs.join(","))
        });
    let cluster = prop::sample::select(vec![
        "client-lease-duration=20s",
        "client-reconnect-window=2m",
        "cluster-name=tc",
        "whitelist=true",
        "failover-priority=consistency:3",
    ])
    .prop_map(str::to_string);
    prop_oneof![scalar, keyed, bulk, cluster]
}

/// Inputs sharing a setting, scope and target, to exercise duplicate checks.
fn map_input() -> impl Strategy<Value = String> {
    (
        prop::option::of(prop::sample::select(vec!["a", "b"])),
        prop::sample::select(vec!["", "1", "2"]),
    )
        .prop_map(|(key, value)| match key {
            Some(key) => format!("stripe.1.node.1.tc-properties.{key}={value}"),
            None if value.is_empty() => "stripe.1.node.1.tc-properties=".to_string(),
            None => format!("stripe.1.node.1.tc-properties=k:{value}"),
        })
}

proptest! {
    #[test]
    fn test_display_round_trip(raw in input()) {
        let config = Configuration::value_of(&raw).unwrap();
        let again = Configuration::value_of(&config.to_string()).unwrap();
        prop_assert_eq!(again.to_string(), config.to_string());
        prop_assert_eq!(again, config);
    }

    #[test]
    fn test_clear_is_idempotent(
        target in target(),
        key in "[a-z]{1,6}",
        value in "[a-z]{1,6}",
    ) {
        let mut cluster = fixtures::cluster(3, 3);
        Configuration::value_of(&format!("{target}tc-properties.{key}={value}"))
            .unwrap()
            .apply(&mut cluster)
            .unwrap();

        let clear = Configuration::value_of(&format!("{target}tc-properties.{key}=")).unwrap();
        clear.apply(&mut cluster).unwrap();
        let once = cluster.clone();
        clear.apply(&mut cluster).unwrap();
        prop_assert_eq!(&cluster, &once);
        prop_assert!(cluster
            .nodes()
            .all(|n| n.tc_properties().get().map_or(true, |p| !p.contains_key(&key))));
    }

    #[test]
    fn test_duplicates_is_symmetric(a in map_input(), b in map_input()) {
        let a = Configuration::value_of(&a).unwrap();
        let b = Configuration::value_of(&b).unwrap();
        let ab = a.duplicates(&b);
        let ba = b.duplicates(&a);
        prop_assert_eq!(ab.is_err(), ba.is_err());
        prop_assert_eq!(ab.ok(), ba.ok());
    }

    #[test]
    fn test_new_uids_are_unique(seed in any::<u64>(), count in 1..40usize) {
        let mut cluster = fixtures::cluster(2, 2);
        let mut rng = StdRng::seed_from_u64(seed);
        for i in 0..count {
            let uid = cluster.new_uid_with(&mut rng);
            prop_assert!(!cluster.contains_uid(uid));
            let mut node = Node::new(format!("extra-{i}"), format!("extra-{i}"));
            node.set_uid(uid);
            cluster.stripe_mut(1).unwrap().add_node(node);
        }
        let uids: HashSet<Uid> = cluster.uids().collect();
        prop_assert_eq!(uids.len(), 1 + 2 + 4 + count);
    }
}

#[test]
fn test_new_uid_skips_uids_in_use() {
    let mut cluster = fixtures::cluster(1, 1);
    let taken = Uid::from_rng(&mut StdRng::seed_from_u64(7));
    cluster.set_uid(taken);

    let fresh = cluster.new_uid_with(&mut StdRng::seed_from_u64(7));
    assert_ne!(fresh, taken);
    assert!(!cluster.contains_uid(fresh));
}

#[test]
fn test_scope_widening() {
    let registry = SettingRegistry::global().unwrap();
    for setting in registry.iter() {
        for scope in SCOPES {
            match setting.scope() {
                Scope::Node if setting.allows_operation(Operation::Get) => {
                    assert!(
                        setting.allows_operation_in_scope(Operation::Get, scope),
                        "{setting} should accept get at {scope} level"
                    );
                }
                Scope::Cluster if scope != Scope::Cluster => {
                    for op in [Operation::Get, Operation::Set] {
                        assert!(
                            !setting.allows_operation_in_scope(op, scope),
                            "{setting} should reject {op} at {scope} level"
                        );
                    }
                }
                _ => {}
            }
            if scope != setting.scope() {
                assert!(!setting.allows_operation_in_scope(Operation::Config, scope));
            }
        }
    }
}
