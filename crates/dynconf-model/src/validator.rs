//! Whole-cluster consistency checks.
//!
//! Each value is validated on its own when it is parsed. The checks here look
//! across nodes and settings: UIDs, names and addresses must be unique, settings
//! that are changed on every node at once must be present on all nodes or on
//! none, and security settings depend on each other.

use crate::cluster::Cluster;
use crate::endpoint::HostPort;
use crate::failover::FailoverPriority;
use crate::node::Node;
use crate::setting::names;
use dynconf_core::{DynConfigError, DynConfigResult};
use std::collections::{BTreeSet, HashMap};

/// Validates a cluster as a whole.
///
/// # Example
///
/// ```
/// use dynconf_model::{fixtures, ClusterValidator};
///
/// let cluster = fixtures::valid_cluster(2, 2);
/// ClusterValidator::new(&cluster).validate().unwrap();
///
/// let incomplete = fixtures::cluster(1, 1);
/// assert!(ClusterValidator::new(&incomplete).validate().is_err());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ClusterValidator<'a> {
    cluster: &'a Cluster,
}

impl<'a> ClusterValidator<'a> {
    /// Creates a validator for the cluster.
    pub const fn new(cluster: &'a Cluster) -> Self {
        Self { cluster }
    }

    /// Runs every check, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// [`DynConfigError::MalformedCluster`] naming the broken rule.
    pub fn validate(&self) -> DynConfigResult<()> {
        self.validate_uids()?;
        self.validate_node_names()?;
        self.validate_stripe_names()?;
        self.validate_addresses()?;
        self.validate_backup_dirs()?;
        self.validate_data_dirs()?;
        self.validate_security()?;
        self.validate_failover_priority()?;
        tracing::debug!(
            stripes = self.cluster.stripe_count(),
            nodes = self.cluster.node_count(),
            "Cluster validated"
        );
        Ok(())
    }

    fn validate_uids(&self) -> DynConfigResult<()> {
        match first_duplicate(self.cluster.uids()) {
            Some(uid) => Err(DynConfigError::malformed_cluster(format!("Found duplicate UID: {uid}"))),
            None => Ok(()),
        }
    }

    fn validate_node_names(&self) -> DynConfigResult<()> {
        if self.cluster.nodes().any(|n| n.name().is_empty()) {
            return Err(DynConfigError::malformed_cluster("Found node without name"));
        }
        match first_duplicate(self.cluster.nodes().map(Node::name)) {
            Some(name) => Err(DynConfigError::malformed_cluster(format!(
                "Found duplicate node name: {name}"
            ))),
            None => Ok(()),
        }
    }

    fn validate_stripe_names(&self) -> DynConfigResult<()> {
        let stripes = self.cluster.stripes();
        if stripes.iter().any(|s| s.name().is_empty()) {
            return Err(DynConfigError::malformed_cluster("Found stripe without name"));
        }
        match first_duplicate(stripes.iter().map(|s| s.name())) {
            Some(name) => Err(DynConfigError::malformed_cluster(format!(
                "Found duplicate stripe name: {name}"
            ))),
            None => Ok(()),
        }
    }

    fn validate_addresses(&self) -> DynConfigResult<()> {
        if let Some((address, nodes)) = shared_address(self.cluster.nodes().map(|n| (n.internal_address(), n))) {
            return Err(DynConfigError::malformed_cluster(format!(
                "Nodes with names: {} have the same address: '{address}'",
                nodes.join(", ")
            )));
        }

        if let Some(node) = self
            .cluster
            .nodes()
            .find(|n| n.public_hostname().is_configured() != n.public_port().is_configured())
        {
            let hostname = node.public_hostname().get().cloned().unwrap_or_default();
            let port = node
                .public_port()
                .get()
                .map(ToString::to_string)
                .unwrap_or_default();
            return Err(DynConfigError::malformed_cluster(format!(
                "Public address: '{hostname}:{port}' of node with name: {} isn't well-formed. \
                 Public hostname and port need to be set together",
                node.name()
            )));
        }

        let public = self
            .cluster
            .nodes()
            .filter_map(|n| n.public_address().map(|a| (a, n)));
        if let Some((address, nodes)) = shared_address(public) {
            return Err(DynConfigError::malformed_cluster(format!(
                "Nodes with names: {} have the same public address: '{address}'",
                nodes.join(", ")
            )));
        }

        let missing = self.node_names_where(|n| n.public_address().is_none());
        if !missing.is_empty() && missing.len() != self.cluster.node_count() {
            return Err(DynConfigError::malformed_cluster(format!(
                "Nodes with names: [{}] don't have public addresses defined, but other nodes in the cluster do. \
                 Mutative operations on public addresses must be done simultaneously on every node in the cluster",
                missing.join(", ")
            )));
        }
        Ok(())
    }

    fn validate_backup_dirs(&self) -> DynConfigResult<()> {
        let missing = self.node_names_where(|n| !n.backup_dir().is_configured());
        if !missing.is_empty() && missing.len() != self.cluster.node_count() {
            return Err(DynConfigError::malformed_cluster(format!(
                "Nodes with names: [{}] don't have backup directories defined, but other nodes in the cluster do. \
                 Mutative operations on backup dirs must be done simultaneously on every node in the cluster",
                missing.join(", ")
            )));
        }
        Ok(())
    }

    fn validate_data_dirs(&self) -> DynConfigResult<()> {
        let name_sets: BTreeSet<Vec<String>> = self
            .cluster
            .nodes()
            .map(|n| {
                n.data_dirs()
                    .or_default()
                    .map(|dirs| dirs.keys().cloned().collect())
                    .unwrap_or_default()
            })
            .collect();
        if name_sets.len() > 1 {
            let found: Vec<String> = name_sets
                .iter()
                .map(|names| format!("[{}]", names.join(", ")))
                .collect();
            return Err(DynConfigError::malformed_cluster(format!(
                "Data directory names need to match across the cluster, but found the following mismatches: [{}]. \
                 Mutative operations on data dirs must be done simultaneously on every node in the cluster",
                found.join(", ")
            )));
        }
        Ok(())
    }

    fn validate_security(&self) -> DynConfigResult<()> {
        let cluster = self.cluster;
        let authc = cluster.security_authc();
        let ssl_tls = cluster.security_ssl_tls().or_default().copied().unwrap_or(false);
        let whitelist = cluster.security_whitelist().or_default().copied().unwrap_or(false);

        if authc.get().is_some_and(|a| a == "certificate") && !ssl_tls {
            return Err(DynConfigError::malformed_cluster(format!(
                "{} is required for {}=certificate",
                names::SECURITY_SSL_TLS,
                names::SECURITY_AUTHC
            )));
        }

        for node in cluster.nodes() {
            let security_dir = node.security_dir().is_configured();
            if !security_dir
                && (authc.is_configured() || node.security_audit_log_dir().is_configured() || ssl_tls || whitelist)
            {
                return Err(DynConfigError::malformed_cluster(format!(
                    "{} is mandatory for any of the security configuration, but not found on node with name: {}",
                    names::SECURITY_DIR,
                    node.name()
                )));
            }
            if security_dir && !ssl_tls && !authc.is_configured() && !whitelist {
                return Err(DynConfigError::malformed_cluster(format!(
                    "One of {}, {}, or {} is required for security configuration, but not found on node with name: {}",
                    names::SECURITY_SSL_TLS,
                    names::SECURITY_AUTHC,
                    names::SECURITY_WHITELIST,
                    node.name()
                )));
            }
        }

        let missing = self.node_names_where(|n| !n.security_audit_log_dir().is_configured());
        if !missing.is_empty() && missing.len() != cluster.node_count() {
            return Err(DynConfigError::malformed_cluster(format!(
                "Nodes with names: [{}] don't have audit log directories defined, but other nodes in the cluster do. \
                 Mutative operations on audit log dirs must be done simultaneously on every node in the cluster",
                missing.join(", ")
            )));
        }
        Ok(())
    }

    fn validate_failover_priority(&self) -> DynConfigResult<()> {
        let Some(priority) = self.cluster.failover_priority() else {
            return Err(DynConfigError::malformed_cluster(format!(
                "{} setting is missing",
                names::FAILOVER_PRIORITY
            )));
        };
        if let FailoverPriority::Consistency { voters } = priority {
            let nodes = self.cluster.node_count();
            let sum = voters as usize + nodes;
            if sum % 2 == 0 {
                tracing::warn!(
                    sum,
                    voters,
                    nodes,
                    "The sum of voter count and number of nodes is an even number. \
                     An even-numbered configuration is more likely to experience split-brain situations"
                );
            }
        }
        Ok(())
    }

    fn node_names_where(&self, predicate: impl Fn(&Node) -> bool) -> Vec<&'a str> {
        self.cluster
            .nodes()
            .filter(|n| predicate(n))
            .map(Node::name)
            .collect()
    }
}

fn first_duplicate<T: Ord + Copy>(items: impl Iterator<Item = T>) -> Option<T> {
    let mut seen = BTreeSet::new();
    items.into_iter().find(|item| !seen.insert(*item))
}

/// The first address held by several nodes, with their names.
fn shared_address<'n>(
    addresses: impl Iterator<Item = (HostPort, &'n Node)>,
) -> Option<(HostPort, Vec<&'n str>)> {
    let mut by_address: HashMap<HostPort, Vec<&'n str>> = HashMap::new();
    let mut order = Vec::new();
    for (address, node) in addresses {
        let names = by_address.entry(address.clone()).or_default();
        if names.is_empty() {
            order.push(address);
        }
        names.push(node.name());
    }
    order
        .into_iter()
        .find(|a| by_address.get(a).is_some_and(|names| names.len() > 1))
        .and_then(|a| by_address.remove(&a).map(|names| (a, names)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use dynconf_core::RawPath;

    fn reason(cluster: &Cluster) -> String {
        match ClusterValidator::new(cluster).validate() {
            Err(DynConfigError::MalformedCluster { reason }) => reason,
            other => panic!("expected a malformed cluster, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_cluster() {
        ClusterValidator::new(&fixtures::valid_cluster(2, 3)).validate().unwrap();
    }

    #[test]
    fn test_failover_priority_is_required() {
        assert_eq!(reason(&fixtures::cluster(1, 1)), "failover-priority setting is missing");

        let mut cluster = fixtures::cluster(1, 2);
        cluster.set_failover_priority(FailoverPriority::consistency());
        ClusterValidator::new(&cluster).validate().unwrap();
    }

    #[test]
    fn test_duplicate_names() {
        let mut cluster = fixtures::valid_cluster(1, 2);
        cluster.node_mut_by_ids(1, 2).set_name("node-1-1");
        assert_eq!(reason(&cluster), "Found duplicate node name: node-1-1");

        let mut cluster = fixtures::valid_cluster(2, 1);
        cluster.stripe_mut(2).unwrap().set_name("stripe-1");
        assert_eq!(reason(&cluster), "Found duplicate stripe name: stripe-1");
    }

    #[test]
    fn test_duplicate_uids() {
        let mut cluster = fixtures::valid_cluster(1, 2);
        let uid = cluster.uid();
        cluster.node_mut_by_ids(1, 2).set_uid(uid);
        assert_eq!(reason(&cluster), format!("Found duplicate UID: {uid}"));

        let mut cluster = fixtures::valid_cluster(2, 1);
        let uid = cluster.node(1, 1).unwrap().uid();
        cluster.stripe_mut(2).unwrap().set_uid(uid);
        assert_eq!(reason(&cluster), format!("Found duplicate UID: {uid}"));
    }

    #[test]
    fn test_duplicate_internal_address() {
        let mut cluster = fixtures::valid_cluster(1, 2);
        cluster.node_mut_by_ids(1, 2).set_hostname("host-1-1");
        assert_eq!(
            reason(&cluster),
            "Nodes with names: node-1-1, node-1-2 have the same address: 'host-1-1:9410'"
        );
    }

    #[test]
    fn test_public_addresses() {
        let mut cluster = fixtures::valid_cluster(1, 2);
        cluster
            .node_mut_by_ids(1, 1)
            .set_public_hostname("public".to_string());
        assert!(reason(&cluster).contains("Public hostname and port need to be set together"));

        cluster.node_mut_by_ids(1, 1).set_public_port(9510);
        assert!(reason(&cluster).starts_with("Nodes with names: [node-1-2] don't have public addresses"));

        cluster
            .node_mut_by_ids(1, 2)
            .set_public_hostname("public".to_string())
            .set_public_port(9510);
        assert!(reason(&cluster).contains("have the same public address: 'public:9510'"));

        cluster.node_mut_by_ids(1, 2).set_public_port(9511);
        ClusterValidator::new(&cluster).validate().unwrap();
    }

    #[test]
    fn test_backup_dirs_all_or_none() {
        let mut cluster = fixtures::valid_cluster(1, 2);
        cluster.node_mut_by_ids(1, 1).set_backup_dir(RawPath::new("/backup"));
        assert!(reason(&cluster).starts_with("Nodes with names: [node-1-2] don't have backup directories"));
    }

    #[test]
    fn test_data_dir_names_match() {
        let mut cluster = fixtures::valid_cluster(1, 2);
        cluster
            .node_mut_by_ids(1, 1)
            .put_data_dir("other", RawPath::new("/other"));
        assert!(reason(&cluster).contains("Data directory names need to match"));
    }

    #[test]
    fn test_security_dependencies() {
        let mut cluster = fixtures::valid_cluster(1, 1);
        cluster.set_security_authc("certificate".to_string());
        assert_eq!(reason(&cluster), "ssl-tls is required for authc=certificate");

        cluster.set_security_ssl_tls(true);
        assert!(reason(&cluster).starts_with("security-dir is mandatory"));

        cluster.node_mut_by_ids(1, 1).set_security_dir(RawPath::new("/security"));
        ClusterValidator::new(&cluster).validate().unwrap();

        cluster.set_security_authc(None::<String>).set_security_ssl_tls(false);
        assert!(reason(&cluster).starts_with("One of ssl-tls, authc, or whitelist is required"));
    }

    #[test]
    fn test_audit_log_dirs_all_or_none() {
        let mut cluster = fixtures::valid_cluster(1, 2);
        cluster.set_security_whitelist(true);
        for node in cluster.nodes_mut() {
            node.set_security_dir(RawPath::new("/security"));
        }
        cluster
            .node_mut_by_ids(1, 1)
            .set_security_audit_log_dir(RawPath::new("/audit"));
        assert!(reason(&cluster).starts_with("Nodes with names: [node-1-2] don't have audit log directories"));
    }

    trait NodeAt {
        fn node_mut_by_ids(&mut self, stripe_id: usize, node_id: usize) -> &mut Node;
    }

    impl NodeAt for Cluster {
        fn node_mut_by_ids(&mut self, stripe_id: usize, node_id: usize) -> &mut Node {
            self.stripe_mut(stripe_id)
                .and_then(|s| s.node_mut(node_id))
                .unwrap()
        }
    }
}
