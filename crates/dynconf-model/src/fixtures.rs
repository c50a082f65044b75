//! Ready-made topologies for tests and examples.

use crate::cluster::Cluster;
use crate::failover::FailoverPriority;
use crate::node::Node;
use crate::stripe::Stripe;

/// A node named `node-<stripe>-<node>` on host `host-<stripe>-<node>`.
pub fn node(stripe_id: usize, node_id: usize) -> Node {
    let mut node = Node::new(
        format!("node-{stripe_id}-{node_id}"),
        format!("host-{stripe_id}-{node_id}"),
    );
    node.set_port(9410);
    node
}

/// A stripe named `stripe-<id>` holding `nodes` fixture nodes.
pub fn stripe(stripe_id: usize, nodes: usize) -> Stripe {
    Stripe::with_nodes(
        format!("stripe-{stripe_id}"),
        (1..=nodes).map(|n| node(stripe_id, n)),
    )
}

/// A cluster named `tc-cluster` with `stripes` stripes of `nodes` nodes each.
///
/// Every UID is distinct and the failover priority is not set.
pub fn cluster(stripes: usize, nodes: usize) -> Cluster {
    Cluster::named("tc-cluster", (1..=stripes).map(|s| stripe(s, nodes)))
}

/// A [`cluster`] that passes the cluster validator.
pub fn valid_cluster(stripes: usize, nodes: usize) -> Cluster {
    let mut cluster = cluster(stripes, nodes);
    cluster.set_failover_priority(FailoverPriority::Availability);
    cluster
}
