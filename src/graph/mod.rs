//! Node/edge graph model shared by the store, the propagation engine and the
//! persistence layer.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;

mod canvas;
mod definition;
mod payload;

pub use canvas::*;
pub use definition::*;
pub use payload::*;

/// The node and edge collections of one canvas.
///
/// Nodes and edges sit behind `Arc` so that cloning a `Graph` (one history
/// snapshot) shares every element with the live graph. Mutation goes through
/// [`Graph::node_mut`] / [`Graph::edge_mut`], which copy an element only when
/// a snapshot still holds it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<Arc<Node>>,
    pub edges: Vec<Arc<Edge>>,
}

/// A history entry. Identical in shape to the live graph.
pub type GraphSnapshot = Graph;

impl Graph {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self {
            nodes: nodes.into_iter().map(Arc::new).collect(),
            edges: edges.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == node_id).map(Arc::as_ref)
    }

    pub fn node_mut(&mut self, node_id: &str) -> Option<&mut Node> {
        self.nodes
            .iter_mut()
            .find(|n| n.id == node_id)
            .map(Arc::make_mut)
    }

    pub fn contains_node(&self, node_id: &str) -> bool {
        self.node(node_id).is_some()
    }

    pub fn edge(&self, edge_id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == edge_id).map(Arc::as_ref)
    }

    pub fn edge_mut(&mut self, edge_id: &str) -> Option<&mut Edge> {
        self.edges
            .iter_mut()
            .find(|e| e.id == edge_id)
            .map(Arc::make_mut)
    }

    pub fn contains_edge(&self, edge_id: &str) -> bool {
        self.edge(edge_id).is_some()
    }

    pub fn outgoing<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges
            .iter()
            .map(Arc::as_ref)
            .filter(move |e| e.source == node_id)
    }

    pub fn incoming<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges
            .iter()
            .map(Arc::as_ref)
            .filter(move |e| e.target == node_id)
    }

    pub fn push_node(&mut self, node: Node) {
        self.nodes.push(Arc::new(node));
    }

    pub fn push_edge(&mut self, edge: Edge) {
        self.edges.push(Arc::new(edge));
    }

    /// Removes a node and every edge that references it.
    /// Returns `false` if the node was not present.
    pub fn remove_node(&mut self, node_id: &str) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| n.id != node_id);
        if self.nodes.len() == before {
            return false;
        }
        self.edges.retain(|e| !e.touches(node_id));
        true
    }

    pub fn remove_edge(&mut self, edge_id: &str) -> bool {
        let before = self.edges.len();
        self.edges.retain(|e| e.id != edge_id);
        self.edges.len() != before
    }

    /// Whether `to` is reachable from `from` by following outgoing edges.
    /// A node always reaches itself.
    pub fn reaches(&self, from: &str, to: &str) -> bool {
        let mut visited: AHashSet<&str> = AHashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([from]);
        while let Some(current) = queue.pop_front() {
            if current == to {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            queue.extend(self.outgoing(current).map(|e| e.target.as_str()));
        }
        false
    }

    /// Nodes without any incoming edge, in insertion order.
    pub fn roots(&self) -> impl Iterator<Item = &Node> {
        self.nodes
            .iter()
            .map(Arc::as_ref)
            .filter(move |n| self.incoming(&n.id).next().is_none())
    }
}
