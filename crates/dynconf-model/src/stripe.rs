//! A stripe: a replicated group of nodes.

use crate::endpoint::HostPort;
use crate::node::Node;
use crate::properties::Properties;
use crate::setting::names;
use dynconf_core::{DynConfigError, DynConfigResult, Uid, Version};

/// An ordered group of nodes replicating the same data.
///
/// Node ids are 1-based positions, recomputed on each lookup: removing a
/// node shifts the ids of the nodes after it.
#[derive(Debug, Clone, PartialEq)]
pub struct Stripe {
    uid: Uid,
    name: String,
    nodes: Vec<Node>,
}

impl Stripe {
    /// Creates an empty stripe with a fresh random UID.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            uid: Uid::new_uid(),
            name: name.into(),
            nodes: Vec::new(),
        }
    }

    /// Creates a stripe holding the given nodes.
    pub fn with_nodes(name: impl Into<String>, nodes: impl IntoIterator<Item = Node>) -> Self {
        let mut stripe = Self::new(name);
        stripe.nodes.extend(nodes);
        stripe
    }

    /// Returns the stripe UID.
    pub const fn uid(&self) -> Uid {
        self.uid
    }

    /// Replaces the stripe UID.
    pub fn set_uid(&mut self, uid: Uid) -> &mut Self {
        self.uid = uid;
        self
    }

    /// Returns the stripe name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the stripe.
    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }

    /// Returns the nodes, in order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Returns the nodes for in-place changes.
    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the stripe holds no node.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Appends a node.
    pub fn add_node(&mut self, node: Node) -> &mut Self {
        self.nodes.push(node);
        self
    }

    /// Removes a node by UID, returning it.
    pub fn remove_node(&mut self, uid: Uid) -> Option<Node> {
        let index = self.nodes.iter().position(|n| n.uid() == uid)?;
        Some(self.nodes.remove(index))
    }

    /// Returns `true` if a node has this UID.
    pub fn contains_node(&self, uid: Uid) -> bool {
        self.nodes.iter().any(|n| n.uid() == uid)
    }

    /// Finds a node by UID.
    pub fn node_by_uid(&self, uid: Uid) -> Option<&Node> {
        self.nodes.iter().find(|n| n.uid() == uid)
    }

    /// Finds a node by name.
    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name() == name)
    }

    /// Finds a node by its internal or public address.
    pub fn node_by_address(&self, address: &HostPort) -> Option<&Node> {
        self.nodes.iter().find(|n| n.has_address(address))
    }

    /// Returns the 1-based id of the node with this UID.
    pub fn node_id(&self, uid: Uid) -> Option<usize> {
        self.nodes.iter().position(|n| n.uid() == uid).map(|i| i + 1)
    }

    /// Returns the node at a 1-based id.
    pub fn node(&self, node_id: usize) -> Option<&Node> {
        node_id.checked_sub(1).and_then(|i| self.nodes.get(i))
    }

    /// Returns the node at a 1-based id for in-place changes.
    pub fn node_mut(&mut self, node_id: usize) -> Option<&mut Node> {
        node_id.checked_sub(1).and_then(|i| self.nodes.get_mut(i))
    }

    /// Returns the only node of the stripe.
    ///
    /// Fails when the stripe holds several nodes.
    pub fn single_node(&self) -> DynConfigResult<Option<&Node>> {
        match self.nodes.as_slice() {
            [] => Ok(None),
            [node] => Ok(Some(node)),
            nodes => Err(DynConfigError::invalid_shape(format!(
                "Unable to get the only node of stripe {}: it contains {} nodes",
                self.name,
                nodes.len()
            ))),
        }
    }

    /// Every UID in this stripe: its own and its nodes'.
    pub fn uids(&self) -> impl Iterator<Item = Uid> + '_ {
        std::iter::once(self.uid).chain(self.nodes.iter().map(Node::uid))
    }

    /// Returns the shape of this stripe for logs: `name:uid@[node, ...]`.
    pub fn to_shape_string(&self) -> String {
        let nodes: Vec<String> = self.nodes.iter().map(Node::to_shape_string).collect();
        format!("{}:{}@[{}]", self.name, self.uid, nodes.join(", "))
    }

    /// Exports the stripe and its nodes as properties.
    ///
    /// Node keys are prefixed by `node.<id>.`. From format version 2 the
    /// stripe name is written as `stripe-name`, and its UID as `stripe-uid`
    /// when hidden values are included.
    pub fn to_properties(
        &self,
        expanded: bool,
        include_defaults: bool,
        include_hidden: bool,
        version: Version,
    ) -> DynConfigResult<Properties> {
        let mut props = Properties::new();
        if version == Version::V2 {
            props.insert(names::STRIPE_NAME, self.name.as_str());
            if include_hidden {
                props.insert(names::STRIPE_UID, self.uid.to_string());
            }
        }
        for (index, node) in self.nodes.iter().enumerate() {
            props.extend_prefixed(
                &format!("node.{}.", index + 1),
                node.to_properties(expanded, include_defaults, include_hidden, version)?,
            );
        }
        Ok(props)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stripe() -> Stripe {
        Stripe::with_nodes(
            "stripe-1",
            [Node::new("n1", "h1"), Node::new("n2", "h2"), Node::new("n3", "h3")],
        )
    }

    #[test]
    fn test_ids_are_positional() {
        let mut stripe = stripe();
        let n2 = stripe.node_by_name("n2").unwrap().uid();
        let n3 = stripe.node_by_name("n3").unwrap().uid();
        assert_eq!(stripe.node_id(n2), Some(2));
        assert_eq!(stripe.node_id(n3), Some(3));

        let removed = stripe.remove_node(n2).unwrap();
        assert_eq!(removed.name(), "n2");
        assert_eq!(stripe.node_id(n3), Some(2));
        assert_eq!(stripe.node(2).map(Node::name), Some("n3"));
        assert!(stripe.node(0).is_none());
        assert!(stripe.node(3).is_none());
        assert!(stripe.remove_node(n2).is_none());
    }

    #[test]
    fn test_single_node() {
        assert!(Stripe::new("s").single_node().unwrap().is_none());
        let one = Stripe::with_nodes("s", [Node::new("n1", "h1")]);
        assert_eq!(one.single_node().unwrap().map(Node::name), Some("n1"));
        let err = stripe().single_node().unwrap_err();
        assert!(matches!(err, DynConfigError::InvalidShape { .. }));
    }

    #[test]
    fn test_lookup_by_address() {
        let mut stripe = stripe();
        stripe.node_mut(1).unwrap().set_port(9410);
        assert_eq!(
            stripe
                .node_by_address(&HostPort::new("h1", 9410))
                .map(Node::name),
            Some("n1")
        );
        assert!(stripe.node_by_address(&HostPort::new("h1", 1)).is_none());
    }

    #[test]
    fn test_uids() {
        let stripe = stripe();
        let uids: Vec<Uid> = stripe.uids().collect();
        assert_eq!(uids.len(), 4);
        assert_eq!(uids[0], stripe.uid());
    }

    #[test]
    fn test_properties_layout() {
        let stripe = stripe();
        let props = stripe.to_properties(false, false, false, Version::V2).unwrap();
        assert_eq!(props.get("stripe-name"), Some("stripe-1"));
        assert!(props.get("stripe-uid").is_none());
        assert_eq!(props.get("node.2.name"), Some("n2"));
        assert_eq!(props.get("node.3.hostname"), Some("h3"));

        let v1 = stripe.to_properties(false, false, true, Version::V1).unwrap();
        assert!(v1.get("stripe-name").is_none());
        assert!(v1.get("node.1.node-uid").is_none());

        let hidden = stripe.to_properties(false, false, true, Version::V2).unwrap();
        assert_eq!(hidden.get("stripe-uid"), Some(stripe.uid().to_string().as_str()));
        assert!(hidden.get("node.1.node-uid").is_some());
    }
}
