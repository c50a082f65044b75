//! The cluster: ordered stripes plus cluster-wide settings.

use crate::context::NodeContext;
use crate::defaults;
use crate::endpoint::{Endpoint, EndpointKind, HostPort};
use crate::failover::FailoverPriority;
use crate::lock::LockContext;
use crate::node::Node;
use crate::optional::OptionalConfig;
use crate::properties::Properties;
use crate::setting::{names, SettingRegistry};
use crate::stripe::Stripe;
use dynconf_core::{DynConfigError, DynConfigResult, Measure, Scope, TimeUnit, Uid, Version};
use rand::Rng;

/// The root of a topology.
///
/// A cluster owns its stripes, which own their nodes. Nothing points back
/// up: the stripe of a node is found by searching, and stripe and node ids
/// are positions computed at call time. `clone()` is a deep copy, used as
/// the snapshot a failed change rolls back to.
///
/// # Example
///
/// ```
/// use dynconf_model::{Cluster, Node, Stripe};
///
/// let mut cluster = Cluster::named("tc-cluster", [Stripe::with_nodes(
///     "stripe-1",
///     [Node::new("node-1", "localhost")],
/// )]);
/// let node = cluster.single_node().unwrap().unwrap().uid();
/// assert_eq!(cluster.stripe_id_of(node), Some(1));
///
/// cluster.remove_node(node);
/// assert_eq!(cluster.stripe_count(), 0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    uid: Uid,
    name: Option<String>,
    stripes: Vec<Stripe>,
    failover_priority: Option<FailoverPriority>,
    client_reconnect_window: Option<Measure<TimeUnit>>,
    client_lease_duration: Option<Measure<TimeUnit>>,
    security_authc: Option<String>,
    security_ssl_tls: Option<bool>,
    security_whitelist: Option<bool>,
    lock_context: Option<LockContext>,
}

impl Cluster {
    /// Creates an unnamed cluster with a fresh random UID.
    pub fn new(stripes: impl IntoIterator<Item = Stripe>) -> Self {
        Self {
            uid: Uid::new_uid(),
            name: None,
            stripes: stripes.into_iter().collect(),
            failover_priority: None,
            client_reconnect_window: None,
            client_lease_duration: None,
            security_authc: None,
            security_ssl_tls: None,
            security_whitelist: None,
            lock_context: None,
        }
    }

    /// Creates a named cluster.
    pub fn named(name: impl Into<String>, stripes: impl IntoIterator<Item = Stripe>) -> Self {
        let mut cluster = Self::new(stripes);
        cluster.name = Some(name.into());
        cluster
    }

    // ---- identity

    /// Returns the cluster UID.
    pub const fn uid(&self) -> Uid {
        self.uid
    }

    /// Replaces the cluster UID.
    pub fn set_uid(&mut self, uid: Uid) -> &mut Self {
        self.uid = uid;
        self
    }

    /// Returns the cluster name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Sets or clears the cluster name.
    pub fn set_name(&mut self, name: impl Into<Option<String>>) -> &mut Self {
        self.name = name.into();
        self
    }

    /// Generates a UID no stripe, node or the cluster itself already uses.
    pub fn new_uid(&self) -> Uid {
        self.new_uid_with(&mut rand::thread_rng())
    }

    /// Same as [`new_uid`](Self::new_uid), drawing from the given generator.
    ///
    /// A seeded generator yields a reproducible sequence.
    pub fn new_uid_with<R: Rng>(&self, rng: &mut R) -> Uid {
        loop {
            let uid = Uid::from_rng(rng);
            if !self.contains_uid(uid) {
                tracing::trace!(%uid, "Generated UID");
                return uid;
            }
            tracing::debug!(%uid, "Generated UID already in use, retrying");
        }
    }

    /// Returns `true` if the UID belongs to the cluster, a stripe or a node.
    pub fn contains_uid(&self, uid: Uid) -> bool {
        self.uids().any(|u| u == uid)
    }

    /// Every UID reachable from the cluster.
    pub fn uids(&self) -> impl Iterator<Item = Uid> + '_ {
        std::iter::once(self.uid).chain(self.stripes.iter().flat_map(Stripe::uids))
    }

    // ---- structure

    /// Returns the stripes, in order. The first one leads.
    pub fn stripes(&self) -> &[Stripe] {
        &self.stripes
    }

    /// Returns the stripes for in-place changes.
    pub fn stripes_mut(&mut self) -> &mut [Stripe] {
        &mut self.stripes
    }

    /// Number of stripes.
    pub fn stripe_count(&self) -> usize {
        self.stripes.len()
    }

    /// Number of nodes over all stripes.
    pub fn node_count(&self) -> usize {
        self.stripes.iter().map(Stripe::node_count).sum()
    }

    /// Iterates over every node, stripe by stripe.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.stripes.iter().flat_map(|s| s.nodes().iter())
    }

    /// Iterates over every node for in-place changes.
    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.stripes.iter_mut().flat_map(|s| s.nodes_mut().iter_mut())
    }

    /// Returns the stripe at a 1-based id.
    pub fn stripe(&self, stripe_id: usize) -> Option<&Stripe> {
        stripe_id.checked_sub(1).and_then(|i| self.stripes.get(i))
    }

    /// Returns the stripe at a 1-based id for in-place changes.
    pub fn stripe_mut(&mut self, stripe_id: usize) -> Option<&mut Stripe> {
        stripe_id.checked_sub(1).and_then(|i| self.stripes.get_mut(i))
    }

    /// Finds a stripe by UID.
    pub fn stripe_by_uid(&self, uid: Uid) -> Option<&Stripe> {
        self.stripes.iter().find(|s| s.uid() == uid)
    }

    /// Finds a stripe by name.
    pub fn stripe_by_name(&self, name: &str) -> Option<&Stripe> {
        self.stripes.iter().find(|s| s.name() == name)
    }

    /// Finds the stripe holding the node with this UID.
    pub fn stripe_of_node(&self, node_uid: Uid) -> Option<&Stripe> {
        self.stripes.iter().find(|s| s.contains_node(node_uid))
    }

    /// Returns the 1-based id of a stripe, given its UID or the UID of one of its nodes.
    pub fn stripe_id_of(&self, uid: Uid) -> Option<usize> {
        self.stripes
            .iter()
            .position(|s| s.uid() == uid || s.contains_node(uid))
            .map(|i| i + 1)
    }

    /// Returns the 1-based id of a node within its stripe.
    pub fn node_id_of(&self, node_uid: Uid) -> Option<usize> {
        self.stripe_of_node(node_uid)
            .and_then(|s| s.node_id(node_uid))
    }

    /// Returns the node at the given 1-based ids.
    pub fn node(&self, stripe_id: usize, node_id: usize) -> Option<&Node> {
        self.stripe(stripe_id).and_then(|s| s.node(node_id))
    }

    /// Finds a node by UID.
    pub fn node_by_uid(&self, uid: Uid) -> Option<&Node> {
        self.nodes().find(|n| n.uid() == uid)
    }

    /// Finds a node by UID for in-place changes.
    pub fn node_by_uid_mut(&mut self, uid: Uid) -> Option<&mut Node> {
        self.nodes_mut().find(|n| n.uid() == uid)
    }

    /// Finds a node by name.
    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.nodes().find(|n| n.name() == name)
    }

    /// Finds a node by its internal or public address.
    pub fn node_by_address(&self, address: &HostPort) -> Option<&Node> {
        self.nodes().find(|n| n.has_address(address))
    }

    /// Appends a stripe.
    pub fn add_stripe(&mut self, stripe: Stripe) -> &mut Self {
        tracing::debug!(stripe = %stripe.to_shape_string(), "Adding stripe");
        self.stripes.push(stripe);
        self
    }

    /// Removes a stripe by UID, returning it.
    pub fn remove_stripe(&mut self, uid: Uid) -> Option<Stripe> {
        let index = self.stripes.iter().position(|s| s.uid() == uid)?;
        let stripe = self.stripes.remove(index);
        tracing::debug!(stripe = %stripe.to_shape_string(), "Removed stripe");
        Some(stripe)
    }

    /// Appends a node to the stripe with the given UID.
    pub fn add_node(&mut self, stripe_uid: Uid, node: Node) -> DynConfigResult<&mut Self> {
        let stripe = self
            .stripes
            .iter_mut()
            .find(|s| s.uid() == stripe_uid)
            .ok_or_else(|| {
                DynConfigError::invalid_shape(format!("Stripe with UID {stripe_uid} not found"))
            })?;
        tracing::debug!(node = %node.to_shape_string(), stripe = stripe.name(), "Adding node");
        stripe.add_node(node);
        Ok(self)
    }

    /// Removes a node by UID, returning it.
    ///
    /// A stripe left without nodes is removed as well.
    pub fn remove_node(&mut self, node_uid: Uid) -> Option<Node> {
        let index = self.stripes.iter().position(|s| s.contains_node(node_uid))?;
        let node = self.stripes[index].remove_node(node_uid)?;
        tracing::debug!(node = %node.to_shape_string(), "Removed node");
        if self.stripes[index].is_empty() {
            let stripe = self.stripes.remove(index);
            tracing::debug!(stripe = stripe.name(), "Removed stripe left without nodes");
        }
        Some(node)
    }

    /// Iterates over the stripes without nodes.
    pub fn empty_stripes(&self) -> impl Iterator<Item = &Stripe> {
        self.stripes.iter().filter(|s| s.is_empty())
    }

    /// Returns the only stripe of the cluster.
    ///
    /// Fails when the cluster holds several stripes.
    pub fn single_stripe(&self) -> DynConfigResult<Option<&Stripe>> {
        match self.stripes.as_slice() {
            [] => Ok(None),
            [stripe] => Ok(Some(stripe)),
            stripes => Err(DynConfigError::invalid_shape(format!(
                "Unable to get the only stripe of the cluster: it contains {} stripes",
                stripes.len()
            ))),
        }
    }

    /// Returns the only node of the cluster.
    ///
    /// Fails when the cluster holds several nodes.
    pub fn single_node(&self) -> DynConfigResult<Option<&Node>> {
        match self.single_stripe()? {
            None => Ok(None),
            Some(stripe) => stripe.single_node(),
        }
    }

    /// Returns a view of the node at the given 1-based ids.
    pub fn node_context(&self, stripe_id: usize, node_id: usize) -> DynConfigResult<NodeContext<'_>> {
        let stripe = self.stripe(stripe_id).ok_or(DynConfigError::UnknownStripe {
            stripe_id,
            stripe_count: self.stripe_count(),
        })?;
        let node = stripe.node(node_id).ok_or(DynConfigError::UnknownNode {
            stripe_id,
            node_id,
            node_count: stripe.node_count(),
        })?;
        Ok(NodeContext::new(self, stripe_id, stripe, node_id, node))
    }

    /// Iterates over a view of every node.
    pub fn node_contexts(&self) -> impl Iterator<Item = NodeContext<'_>> {
        self.stripes.iter().enumerate().flat_map(move |(s, stripe)| {
            stripe
                .nodes()
                .iter()
                .enumerate()
                .map(move |(n, node)| NodeContext::new(self, s + 1, stripe, n + 1, node))
        })
    }

    // ---- endpoints

    /// Returns one endpoint per node, all of the same kind.
    ///
    /// When the initiator is one node's internal address, internal endpoints
    /// are used, even if it is also some node's public address. When it is a
    /// public address, public endpoints are used. Without initiator or match,
    /// public endpoints are used only if every node has one.
    pub fn get_endpoints(&self, initiator: Option<&HostPort>) -> Vec<Endpoint> {
        let kind = self.endpoint_kind_for(initiator);
        tracing::trace!(%kind, "Resolving cluster endpoints");
        self.nodes()
            .map(|node| match kind {
                EndpointKind::Public => node.determine_endpoint(),
                _ => node.internal_endpoint(),
            })
            .collect()
    }

    fn endpoint_kind_for(&self, initiator: Option<&HostPort>) -> EndpointKind {
        if let Some(address) = initiator {
            if self.nodes().any(|n| n.internal_address().matches(address)) {
                return EndpointKind::Internal;
            }
            if self
                .nodes()
                .any(|n| n.public_address().is_some_and(|p| p.matches(address)))
            {
                return EndpointKind::Public;
            }
        }
        if self.node_count() > 0 && self.nodes().all(|n| n.public_address().is_some()) {
            EndpointKind::Public
        } else {
            EndpointKind::Internal
        }
    }

    // ---- cluster settings

    /// Returns the failover priority, if configured.
    pub const fn failover_priority(&self) -> Option<FailoverPriority> {
        self.failover_priority
    }

    /// Sets or clears the failover priority.
    pub fn set_failover_priority(&mut self, priority: impl Into<Option<FailoverPriority>>) -> &mut Self {
        self.failover_priority = priority.into();
        self
    }

    /// Returns the client reconnect window.
    pub fn client_reconnect_window(&self) -> OptionalConfig<Measure<TimeUnit>> {
        OptionalConfig::new(
            names::CLIENT_RECONNECT_WINDOW,
            self.client_reconnect_window,
            Some(defaults::client_reconnect_window()),
        )
    }

    /// Sets or clears the client reconnect window.
    pub fn set_client_reconnect_window(&mut self, window: impl Into<Option<Measure<TimeUnit>>>) -> &mut Self {
        self.client_reconnect_window = window.into();
        self
    }

    /// Returns the client lease duration.
    pub fn client_lease_duration(&self) -> OptionalConfig<Measure<TimeUnit>> {
        OptionalConfig::new(
            names::CLIENT_LEASE_DURATION,
            self.client_lease_duration,
            Some(defaults::client_lease_duration()),
        )
    }

    /// Sets or clears the client lease duration.
    pub fn set_client_lease_duration(&mut self, duration: impl Into<Option<Measure<TimeUnit>>>) -> &mut Self {
        self.client_lease_duration = duration.into();
        self
    }

    /// Returns the authentication scheme.
    pub fn security_authc(&self) -> OptionalConfig<String> {
        OptionalConfig::new(names::SECURITY_AUTHC, self.security_authc.clone(), None)
    }

    /// Sets or clears the authentication scheme.
    pub fn set_security_authc(&mut self, authc: impl Into<Option<String>>) -> &mut Self {
        self.security_authc = authc.into();
        self
    }

    /// Returns the SSL/TLS switch.
    pub fn security_ssl_tls(&self) -> OptionalConfig<bool> {
        OptionalConfig::new(names::SECURITY_SSL_TLS, self.security_ssl_tls, Some(false))
    }

    /// Sets or clears the SSL/TLS switch.
    pub fn set_security_ssl_tls(&mut self, enabled: impl Into<Option<bool>>) -> &mut Self {
        self.security_ssl_tls = enabled.into();
        self
    }

    /// Returns the whitelist switch.
    pub fn security_whitelist(&self) -> OptionalConfig<bool> {
        OptionalConfig::new(names::SECURITY_WHITELIST, self.security_whitelist, Some(false))
    }

    /// Sets or clears the whitelist switch.
    pub fn set_security_whitelist(&mut self, enabled: impl Into<Option<bool>>) -> &mut Self {
        self.security_whitelist = enabled.into();
        self
    }

    /// Returns the holder of the configuration lock, if any.
    pub fn lock_context(&self) -> Option<&LockContext> {
        self.lock_context.as_ref()
    }

    /// Sets or clears the configuration lock holder.
    pub fn set_lock_context(&mut self, lock: impl Into<Option<LockContext>>) -> &mut Self {
        self.lock_context = lock.into();
        self
    }

    // ---- serialization

    /// Returns the shape of the cluster for logs: `name:uid ( stripe, ... )`.
    pub fn to_shape_string(&self) -> String {
        let stripes: Vec<String> = self.stripes.iter().map(Stripe::to_shape_string).collect();
        format!(
            "{}:{} ( {} )",
            self.name.as_deref().unwrap_or(""),
            self.uid,
            stripes.join(", ")
        )
    }

    /// Exports the whole topology as properties.
    ///
    /// Cluster settings come first, then every stripe under `stripe.<id>.`
    /// with its nodes under `stripe.<id>.node.<id>.`.
    pub fn to_properties(
        &self,
        expanded: bool,
        include_defaults: bool,
        include_hidden: bool,
        version: Version,
    ) -> DynConfigResult<Properties> {
        let registry = SettingRegistry::global()?;
        let mut props = Properties::new();
        for setting in registry.exported(Scope::Cluster, include_hidden, version) {
            setting.write_properties(
                setting.extract_from_cluster(self),
                expanded,
                include_defaults,
                &mut props,
            );
        }
        for (index, stripe) in self.stripes.iter().enumerate() {
            props.extend_prefixed(
                &format!("stripe.{}.", index + 1),
                stripe.to_properties(expanded, include_defaults, include_hidden, version)?,
            );
        }
        Ok(props)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_remove_last_node_removes_stripe() {
        let mut cluster = fixtures::cluster(2, 1);
        let lonely = cluster.node(2, 1).unwrap().uid();
        cluster.remove_node(lonely).unwrap();
        assert_eq!(cluster.stripe_count(), 1);
        assert!(cluster.empty_stripes().next().is_none());
    }

    #[test]
    fn test_ids_shift_after_removal() {
        let mut cluster = fixtures::cluster(3, 2);
        let target = cluster.node(3, 2).unwrap().uid();
        assert_eq!(cluster.stripe_id_of(target), Some(3));
        assert_eq!(cluster.node_id_of(target), Some(2));

        let first_stripe = cluster.stripe(1).unwrap().uid();
        cluster.remove_stripe(first_stripe).unwrap();
        assert_eq!(cluster.stripe_id_of(target), Some(2));

        let sibling = cluster.node(2, 1).unwrap().uid();
        cluster.remove_node(sibling).unwrap();
        assert_eq!(cluster.node_id_of(target), Some(1));
    }

    #[test]
    fn test_single_accessors() {
        let empty = Cluster::new([]);
        assert!(empty.single_stripe().unwrap().is_none());
        assert!(empty.single_node().unwrap().is_none());

        let many = fixtures::cluster(2, 1);
        assert!(matches!(
            many.single_stripe(),
            Err(DynConfigError::InvalidShape { .. })
        ));
        assert!(fixtures::cluster(1, 2).single_node().is_err());
        assert!(fixtures::cluster(1, 1).single_node().unwrap().is_some());
    }

    #[test]
    fn test_new_uid_is_unused() {
        let cluster = fixtures::cluster(2, 3);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            assert!(!cluster.contains_uid(cluster.new_uid_with(&mut rng)));
        }
    }

    #[test]
    fn test_new_uid_skips_taken_values() {
        let mut rng = StdRng::seed_from_u64(42);
        let taken = Uid::from_rng(&mut rng);

        let mut cluster = fixtures::cluster(1, 1);
        cluster.set_uid(taken);

        let mut rng = StdRng::seed_from_u64(42);
        let uid = cluster.new_uid_with(&mut rng);
        assert_ne!(uid, taken);
    }

    #[test]
    fn test_add_node_to_unknown_stripe() {
        let mut cluster = fixtures::cluster(1, 1);
        let err = cluster
            .add_node(Uid::new_uid(), Node::new("n", "h"))
            .unwrap_err();
        assert!(matches!(err, DynConfigError::InvalidShape { .. }));
    }

    #[test]
    fn test_node_contexts_cover_every_node() {
        let cluster = fixtures::cluster(2, 3);
        let ids: Vec<(usize, usize)> = cluster
            .node_contexts()
            .map(|c| (c.stripe_id(), c.node_id()))
            .collect();
        assert_eq!(ids, vec![(1, 1), (1, 2), (1, 3), (2, 1), (2, 2), (2, 3)]);
        assert!(matches!(
            cluster.node_context(3, 1),
            Err(DynConfigError::UnknownStripe { stripe_id: 3, stripe_count: 2 })
        ));
        assert!(matches!(
            cluster.node_context(1, 4),
            Err(DynConfigError::UnknownNode { node_id: 4, node_count: 3, .. })
        ));
    }

    #[test]
    fn test_endpoints_follow_the_initiator() {
        let mut cluster = fixtures::cluster(1, 2);
        for (i, node) in cluster.nodes_mut().enumerate() {
            node.set_public_hostname(Some(format!("public-{i}")))
                .set_public_port(9510);
        }
        let internal = cluster.node(1, 1).unwrap().internal_address();
        let kinds = |endpoints: Vec<Endpoint>| -> Vec<EndpointKind> {
            endpoints.iter().map(Endpoint::kind).collect()
        };

        assert_eq!(
            kinds(cluster.get_endpoints(Some(&internal))),
            vec![EndpointKind::Internal; 2]
        );
        assert_eq!(
            kinds(cluster.get_endpoints(Some(&HostPort::new("public-1", 9510)))),
            vec![EndpointKind::Public; 2]
        );
        assert_eq!(kinds(cluster.get_endpoints(None)), vec![EndpointKind::Public; 2]);

        cluster
            .stripe_mut(1)
            .unwrap()
            .node_mut(2)
            .unwrap()
            .set_public_hostname(None::<String>);
        assert_eq!(kinds(cluster.get_endpoints(None)), vec![EndpointKind::Internal; 2]);
    }

    #[test]
    fn test_ambiguous_initiator_prefers_internal() {
        let mut cluster = fixtures::cluster(1, 2);
        let first = cluster.node(1, 1).unwrap().internal_address();
        let second = cluster.stripe_mut(1).unwrap().node_mut(2).unwrap();
        second
            .set_public_hostname(Some(first.host().to_string()))
            .set_public_port(first.port());
        let endpoints = cluster.get_endpoints(Some(&first));
        assert!(endpoints.iter().all(|e| e.kind() == EndpointKind::Internal));
    }

    #[test]
    fn test_clone_is_a_deep_snapshot() {
        let original = fixtures::cluster(1, 2);
        let mut copy = original.clone();
        copy.stripe_mut(1).unwrap().node_mut(1).unwrap().set_name("renamed");
        assert_ne!(copy, original);
        assert_ne!(original.node(1, 1).unwrap().name(), "renamed");
    }

    #[test]
    fn test_properties_layout() {
        let mut cluster = fixtures::cluster(2, 1);
        cluster.set_failover_priority(FailoverPriority::Availability);
        let props = cluster
            .to_properties(false, false, false, Version::V2)
            .unwrap();
        let keys: Vec<&str> = props.iter().map(|(k, _)| k).collect();
        assert_eq!(keys[0], "cluster-name");
        assert_eq!(props.get("failover-priority"), Some("availability"));
        assert!(props.contains_key("stripe.2.node.1.hostname"));
        assert!(props.contains_key("stripe.1.stripe-name"));
        assert!(!props.contains_key("client-lease-duration"));

        let with_defaults = cluster.to_properties(false, true, false, Version::V2).unwrap();
        assert_eq!(with_defaults.get("client-lease-duration"), Some("150s"));
        assert_eq!(with_defaults.get("stripe.1.node.1.offheap-resources"), Some("main:512MB"));
    }

    #[test]
    fn test_shape_string() {
        let cluster = fixtures::cluster(1, 1);
        let shape = cluster.to_shape_string();
        assert!(shape.starts_with(&format!("{}:{} ( ", cluster.name().unwrap(), cluster.uid())));
        assert!(shape.ends_with(" )"));
    }
}
