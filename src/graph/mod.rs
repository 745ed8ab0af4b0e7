//! The attributed gene graph — nodes, edges, and adjacency.
//!
//! `GeneGraph` is the explicit mutable context passed between pipeline
//! phases. Registries are `BTreeMap`s so iteration order is deterministic,
//! which keeps repeated null-distribution runs reproducible.

use std::collections::BTreeMap;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{Edge, EdgeKey, Node};
use crate::{Error, Result};

/// In-memory attributed undirected graph of genes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneGraph {
    nodes: BTreeMap<String, Node>,
    edges: BTreeMap<EdgeKey, Edge>,
    /// node name → neighbor names, insertion order. Queries sort on read.
    adjacency: HashMap<String, Vec<String>>,
    target: Option<String>,
}

impl GeneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Nodes
    // ========================================================================

    /// Register a node. If a node with the same name already exists, its
    /// feature map gains the new node's keys — the node object itself is
    /// never replaced (parsers mutate genes in place, one feature each).
    pub fn add_node(&mut self, node: Node) {
        match self.nodes.get_mut(&node.name) {
            Some(existing) => existing.merge_features(node.data),
            None => {
                self.nodes.insert(node.name.clone(), node);
            }
        }
    }

    pub fn node(&self, name: &str) -> Result<&Node> {
        self.nodes
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("node '{name}'")))
    }

    pub fn node_mut(&mut self, name: &str) -> Result<&mut Node> {
        self.nodes
            .get_mut(name)
            .ok_or_else(|| Error::NotFound(format!("node '{name}'")))
    }

    pub fn has_node(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.values_mut()
    }

    /// All node names in registry (sorted) order.
    pub fn node_names(&self) -> Vec<String> {
        self.nodes.keys().cloned().collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // ========================================================================
    // Edges
    // ========================================================================

    /// Register an edge. Idempotent on the canonical key: re-adding the same
    /// pair merges data keys into the existing edge object, preserving any
    /// metric history already accumulated there.
    ///
    /// Endpoints need not be registered yet — target installation creates
    /// edges to the target before the target node itself is registered.
    pub fn add_edge(&mut self, edge: Edge) {
        match self.edges.get_mut(&edge.key) {
            Some(existing) => existing.merge_data(edge.data),
            None => {
                let (a, b) = (edge.key.a().to_owned(), edge.key.b().to_owned());
                self.link(&a, &b);
                self.link(&b, &a);
                self.edges.insert(edge.key.clone(), edge);
            }
        }
    }

    fn link(&mut self, from: &str, to: &str) {
        let list = self.adjacency.entry(from.to_owned()).or_default();
        if !list.iter().any(|n| n == to) {
            list.push(to.to_owned());
        }
    }

    pub fn edge_between(&self, x: &str, y: &str) -> Option<&Edge> {
        let key = EdgeKey::new(x, y).ok()?;
        self.edges.get(&key)
    }

    pub fn edge_between_mut(&mut self, x: &str, y: &str) -> Option<&mut Edge> {
        let key = EdgeKey::new(x, y).ok()?;
        self.edges.get_mut(&key)
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// All edge keys in registry (sorted) order.
    pub fn edge_keys(&self) -> Vec<EdgeKey> {
        self.edges.keys().cloned().collect()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Split-borrow an edge mutably together with immutable views of its two
    /// endpoint nodes. This is what lets a metric read both endpoints while
    /// writing its result into the edge.
    pub fn edge_with_endpoints_mut(&mut self, key: &EdgeKey) -> Result<(&mut Edge, &Node, &Node)> {
        let edge = self
            .edges
            .get_mut(key)
            .ok_or_else(|| Error::NotFound(format!("edge '{key}'")))?;
        let a = self
            .nodes
            .get(key.a())
            .ok_or_else(|| Error::NotFound(format!("node '{}'", key.a())))?;
        let b = self
            .nodes
            .get(key.b())
            .ok_or_else(|| Error::NotFound(format!("node '{}'", key.b())))?;
        Ok((edge, a, b))
    }

    /// Neighbor names of `name`, sorted for deterministic polling order.
    pub fn neighbors(&self, name: &str) -> Vec<String> {
        let mut list = self.adjacency.get(name).cloned().unwrap_or_default();
        list.sort();
        list
    }

    /// Drop every edge and all adjacency, leaving nodes untouched.
    /// Used only by null-distribution resampling before a rebuild.
    pub fn remove_all_edges(&mut self) {
        debug!(edges = self.edges.len(), "removing all edges for resample");
        self.edges.clear();
        self.adjacency.clear();
    }

    // ========================================================================
    // Target bookkeeping
    // ========================================================================

    pub fn target_name(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn target(&self) -> Option<&Node> {
        self.target.as_ref().and_then(|t| self.nodes.get(t))
    }

    pub(crate) fn set_target(&mut self, name: String) {
        self.target = Some(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;

    fn edge(a: &str, b: &str) -> Edge {
        Edge::new(EdgeKey::new(a, b).unwrap())
    }

    #[test]
    fn test_add_node_merges_features() {
        let mut g = GeneGraph::new();
        g.add_node(Node::new("g1", Some("sp1")).with_feature("expression_vector", vec![1.0]));
        g.add_node(Node::new("g1", Some("sp1")).with_feature("tfbs_vector", vec![2.0]));

        assert_eq!(g.node_count(), 1);
        let n = g.node("g1").unwrap();
        assert!(n.feature("expression_vector").is_some());
        assert!(n.feature("tfbs_vector").is_some());
    }

    #[test]
    fn test_add_edge_is_idempotent_on_key() {
        let mut g = GeneGraph::new();
        g.add_node(Node::new("a", Some("sp1")));
        g.add_node(Node::new("b", Some("sp2")));

        g.add_edge(edge("a", "b").with_data("branch_length", 0.3));
        g.add_edge(edge("b", "a").with_data("one_to_one_ortholog", true));

        assert_eq!(g.edge_count(), 1);
        let e = g.edge_between("a", "b").unwrap();
        assert_eq!(e.get("branch_length"), Some(&Value::Float(0.3)));
        assert_eq!(e.get("one_to_one_ortholog"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_neighbors_sorted() {
        let mut g = GeneGraph::new();
        for n in ["m", "z", "a"] {
            g.add_node(Node::new(n, Some("sp")));
        }
        g.add_edge(edge("m", "z"));
        g.add_edge(edge("m", "a"));

        assert_eq!(g.neighbors("m"), vec!["a".to_owned(), "z".to_owned()]);
        assert_eq!(g.neighbors("a"), vec!["m".to_owned()]);
        assert!(g.neighbors("unknown").is_empty());
    }

    #[test]
    fn test_remove_all_edges_keeps_nodes() {
        let mut g = GeneGraph::new();
        g.add_node(Node::new("a", Some("sp1")));
        g.add_node(Node::new("b", Some("sp2")));
        g.add_edge(edge("a", "b"));

        g.remove_all_edges();

        assert_eq!(g.node_count(), 2);
        assert_eq!(g.edge_count(), 0);
        assert!(g.neighbors("a").is_empty());
    }

    #[test]
    fn test_edge_with_endpoints_mut() {
        let mut g = GeneGraph::new();
        g.add_node(Node::new("a", Some("sp1")));
        g.add_node(Node::new("b", Some("sp2")));
        g.add_edge(edge("a", "b"));

        let key = EdgeKey::new("a", "b").unwrap();
        let (e, n1, n2) = g.edge_with_endpoints_mut(&key).unwrap();
        e.set_data("PTCI", 0.9);
        assert_eq!(n1.name, "a");
        assert_eq!(n2.name, "b");
    }
}
