//! A node seen together with its place in the cluster.

use crate::cluster::Cluster;
use crate::node::Node;
use crate::stripe::Stripe;

/// A node with the cluster and stripe holding it.
///
/// Built from a cluster by [`Cluster::node_context`] or
/// [`Cluster::node_contexts`], so the ids always point at `node`.
#[derive(Debug, Clone, Copy)]
pub struct NodeContext<'a> {
    cluster: &'a Cluster,
    stripe: &'a Stripe,
    node: &'a Node,
    stripe_id: usize,
    node_id: usize,
}

impl<'a> NodeContext<'a> {
    pub(crate) const fn new(
        cluster: &'a Cluster,
        stripe_id: usize,
        stripe: &'a Stripe,
        node_id: usize,
        node: &'a Node,
    ) -> Self {
        Self {
            cluster,
            stripe,
            node,
            stripe_id,
            node_id,
        }
    }

    /// Returns the cluster.
    pub const fn cluster(&self) -> &'a Cluster {
        self.cluster
    }

    /// Returns the stripe holding the node.
    pub const fn stripe(&self) -> &'a Stripe {
        self.stripe
    }

    /// Returns the node.
    pub const fn node(&self) -> &'a Node {
        self.node
    }

    /// Returns the 1-based id of the stripe.
    pub const fn stripe_id(&self) -> usize {
        self.stripe_id
    }

    /// Returns the 1-based id of the node within its stripe.
    pub const fn node_id(&self) -> usize {
        self.node_id
    }
}
