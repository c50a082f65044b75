//! Building a cluster from an exported properties mapping.
//!
//! Every property becomes one [`Configuration`] imported while the cluster is
//! being configured. Stripe and node ids must be contiguous and start at 1.
//! Settings resolved eagerly (uids, names, hostnames, failover priority) are
//! filled from their defaults when missing, and every default filled is
//! reported back to the caller.

use crate::cluster::Cluster;
use crate::configuration::Configuration;
use crate::defaults;
use crate::node::Node;
use crate::properties::Properties;
use crate::setting::{names, Setting, SettingRegistry};
use crate::stripe::Stripe;
use crate::validator::ClusterValidator;
use dynconf_core::{
    contains_placeholders, ClusterState, DynConfigError, DynConfigResult, Operation, Requirement,
    Scope, Uid,
};
use std::collections::BTreeMap;

/// The outcome of an import.
#[derive(Debug, Clone)]
pub struct ParsedCluster {
    /// The cluster built.
    pub cluster: Cluster,
    /// One configuration per default filled in, in the order they were added.
    pub defaults_added: Vec<Configuration>,
}

/// Stripe-level identity lines, `stripe.<id>.stripe-name` and
/// `stripe.<id>.stripe-uid`.
#[derive(Debug, Default)]
struct StripeIdentity {
    name: Option<String>,
    uid: Option<Uid>,
}

/// Builds clusters from properties.
///
/// # Example
///
/// ```
/// use dynconf_model::{ClusterFactory, Properties};
///
/// let props = Properties::parse(
///     "failover-priority=availability\n\
///      stripe.1.node.1.hostname=localhost\n\
///      stripe.1.node.1.name=node-1\n",
/// );
/// let parsed = ClusterFactory::new().create(&props).unwrap();
/// assert_eq!(parsed.cluster.node_count(), 1);
/// assert!(parsed
///     .defaults_added
///     .iter()
///     .any(|c| c.setting().name() == "cluster-uid"));
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct ClusterFactory;

impl ClusterFactory {
    /// Creates a factory.
    pub const fn new() -> Self {
        Self
    }

    /// Builds a cluster from properties and validates it.
    ///
    /// # Errors
    ///
    /// Everything [`parse`](Self::parse) rejects, and
    /// [`DynConfigError::MalformedCluster`] when the cluster is inconsistent.
    pub fn create(&self, properties: &Properties) -> DynConfigResult<ParsedCluster> {
        let parsed = self.parse(properties)?;
        ClusterValidator::new(&parsed.cluster).validate()?;
        Ok(parsed)
    }

    /// Builds a cluster from properties without validating it as a whole.
    ///
    /// # Errors
    ///
    /// - any parse or validation error of a single property
    /// - [`DynConfigError::IllegalOperation`] for properties that cannot be
    ///   imported, or are stripe-wide
    /// - [`DynConfigError::MalformedCluster`] when ids are not contiguous or a
    ///   required setting is missing
    pub fn parse(&self, properties: &Properties) -> DynConfigResult<ParsedCluster> {
        if properties.is_empty() {
            return Err(DynConfigError::malformed_cluster("No configuration provided"));
        }

        let mut identities: BTreeMap<usize, StripeIdentity> = BTreeMap::new();
        let mut configurations = Vec::with_capacity(properties.len());
        for (key, value) in properties.iter() {
            if stripe_identity(&mut identities, key, value)? {
                continue;
            }
            let configuration = Configuration::value_of(&format!("{key}={value}"))?;
            check_importable(&configuration)?;
            configurations.push(configuration);
        }

        let layout = layout(&configurations)?;
        let registry = SettingRegistry::global()?;
        let eager: Vec<&'static Setting> = registry
            .iter()
            .filter(|s| s.requires(Requirement::ResolveEagerly) && !s.is_detached())
            .collect();

        let mut defaults_added = Vec::new();
        let mut cluster = Cluster::new(Vec::new());
        let mut applied = vec![false; configurations.len()];

        for setting in eager.iter().filter(|s| s.scope() == Scope::Cluster) {
            match find(&configurations, &applied, setting, None) {
                Some(index) => {
                    configurations[index].apply(&mut cluster)?;
                    applied[index] = true;
                }
                None => {
                    let default = eager_default(setting)
                        .ok_or_else(|| missing(setting, None))?;
                    setting.inject_cluster(&mut cluster, None, Some(&default))?;
                    defaults_added.push(Configuration::value_of(&format!("{setting}={default}"))?);
                }
            }
        }

        for (&stripe_id, node_ids) in &layout {
            let identity = identities.remove(&stripe_id).unwrap_or_default();
            let uid = identity.uid.unwrap_or_else(|| cluster.new_uid());
            let mut stripe = Stripe::new(identity.name.unwrap_or_else(defaults::stripe_name));
            stripe.set_uid(uid);
            cluster.add_stripe(stripe);

            for &node_id in node_ids {
                let target = Some((stripe_id, node_id));
                let mut node = Node::new(String::new(), String::new());
                for setting in eager.iter().filter(|s| s.scope() == Scope::Node) {
                    match find(&configurations, &applied, setting, target) {
                        Some(index) => {
                            configurations[index].apply_to_node(&mut node)?;
                            applied[index] = true;
                        }
                        None => {
                            let default = if setting.name() == names::NODE_UID {
                                Some(cluster.new_uid().to_string())
                            } else {
                                eager_default(setting)
                            }
                            .ok_or_else(|| missing(setting, target))?;
                            setting.inject_node(&mut node, None, Some(&default))?;
                            defaults_added.push(Configuration::value_of(&format!(
                                "stripe.{stripe_id}.node.{node_id}.{setting}={default}"
                            ))?);
                        }
                    }
                }
                cluster
                    .stripe_mut(stripe_id)
                    .ok_or(DynConfigError::UnknownStripe {
                        stripe_id,
                        stripe_count: layout.len(),
                    })?
                    .add_node(node);
            }
        }

        if let Some((&stripe_id, _)) = identities.iter().next() {
            return Err(DynConfigError::UnknownStripe {
                stripe_id,
                stripe_count: cluster.stripe_count(),
            });
        }

        for (configuration, _) in configurations.iter().zip(&applied).filter(|(_, done)| !**done) {
            configuration.apply(&mut cluster)?;
        }

        tracing::debug!(
            cluster = %cluster.to_shape_string(),
            defaults_added = defaults_added.len(),
            "Cluster imported"
        );
        Ok(ParsedCluster {
            cluster,
            defaults_added,
        })
    }
}

/// Consumes `stripe.<id>.stripe-name` and `stripe.<id>.stripe-uid` lines.
fn stripe_identity(
    identities: &mut BTreeMap<usize, StripeIdentity>,
    key: &str,
    value: &str,
) -> DynConfigResult<bool> {
    let Some((id, name)) = key.strip_prefix("stripe.").and_then(|rest| rest.split_once('.')) else {
        return Ok(false);
    };
    if name != names::STRIPE_NAME && name != names::STRIPE_UID {
        return Ok(false);
    }
    let stripe_id = id
        .parse::<usize>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| DynConfigError::syntax(key, "Expected stripe ID to be greater than 0"))?;
    let value = value.trim();
    let identity = identities.entry(stripe_id).or_default();
    if name == names::STRIPE_NAME {
        if value.is_empty() {
            return Err(DynConfigError::invalid_value(names::STRIPE_NAME, "Stripe name must not be empty"));
        }
        identity.name = Some(value.to_string());
    } else {
        identity.uid = Some(value.parse()?);
    }
    Ok(true)
}

fn check_importable(configuration: &Configuration) -> DynConfigResult<()> {
    let illegal = |reason: &str| DynConfigError::IllegalOperation {
        input: configuration.raw().to_string(),
        setting: configuration.setting().name().to_string(),
        operation: Some(Operation::Import),
        scope: configuration.scope(),
        state: Some(ClusterState::Configuring),
        reason: reason.to_string(),
    };
    if !configuration.setting().allows_operation(Operation::Import) {
        return Err(illegal("not allowed"));
    }
    if configuration.scope() == Scope::Stripe {
        return Err(illegal("stripe level configuration not allowed"));
    }
    configuration.validate(ClusterState::Configuring, Operation::Import)
}

/// Stripe ids mapped to their node ids, checked contiguous from 1.
fn layout(configurations: &[Configuration]) -> DynConfigResult<BTreeMap<usize, Vec<usize>>> {
    let mut ids: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for configuration in configurations {
        if let (Some(stripe_id), Some(node_id)) = (configuration.stripe_id(), configuration.node_id()) {
            let nodes = ids.entry(stripe_id).or_default();
            if !nodes.contains(&node_id) {
                nodes.push(node_id);
            }
        }
    }
    if ids.is_empty() {
        ids.insert(1, vec![1]);
    }

    let stripe_count = ids.len();
    if ids.keys().next() != Some(&1) {
        return Err(DynConfigError::malformed_cluster("Stripe ID must start at 1"));
    }
    if ids.keys().next_back() != Some(&stripe_count) {
        return Err(DynConfigError::malformed_cluster(format!(
            "Stripe ID must end at {stripe_count}"
        )));
    }
    for (stripe_id, nodes) in &mut ids {
        nodes.sort_unstable();
        if nodes.first() != Some(&1) {
            return Err(DynConfigError::malformed_cluster(format!(
                "Node ID must start at 1 in stripe {stripe_id}"
            )));
        }
        if nodes.last() != Some(&nodes.len()) {
            return Err(DynConfigError::malformed_cluster(format!(
                "Node ID must end at {} in stripe {stripe_id}",
                nodes.len()
            )));
        }
    }
    Ok(ids)
}

/// Index of the first configuration not applied yet for the setting, at the
/// cluster when `target` is `None`, else at that node.
fn find(
    configurations: &[Configuration],
    applied: &[bool],
    setting: &Setting,
    target: Option<(usize, usize)>,
) -> Option<usize> {
    configurations.iter().zip(applied).position(|(c, done)| {
        !*done
            && c.setting() == setting
            && match target {
                None => c.scope() == Scope::Cluster,
                Some((s, n)) => c.stripe_id() == Some(s) && c.node_id() == Some(n),
            }
    })
}

/// A default usable without resolving placeholders.
fn eager_default(setting: &Setting) -> Option<String> {
    setting
        .default_property()
        .filter(|d| !d.is_empty() && !contains_placeholders(d))
}

fn missing(setting: &Setting, target: Option<(usize, usize)>) -> DynConfigError {
    DynConfigError::malformed_cluster(match target {
        None => format!("Required setting: '{setting}' is missing"),
        Some((stripe_id, node_id)) => format!(
            "Required setting: '{setting}' is missing for node ID: {node_id} in stripe ID: {stripe_id}"
        ),
    })
}
