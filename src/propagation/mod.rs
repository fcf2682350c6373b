//! Breadth-first schema propagation over the canvas graph.
//!
//! When a node's output schema changes, every node reachable along outgoing
//! edges has its own output recomputed by the transform registered for its
//! component type. Each node is visited at most once per call, which also
//! bounds the traversal on graphs that contain cycles.

use crate::graph::{Edge, Graph, Node};
use crate::schema::Schema;
use ahash::{AHashMap, AHashSet};
use std::collections::VecDeque;
use tracing::{debug, trace};

mod transforms;

pub use transforms::SchemaTransform;
use transforms::{IdentityTransform, create_transform_by_name, register_default_transforms};

/// Outcome of one propagation call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PropagationReport {
    /// Node ids in the order they were visited, root first.
    pub visited: Vec<String>,
    /// Nodes whose stored schema actually changed.
    pub updated: Vec<String>,
}

/// Holds the per-component-type transform registry and runs propagation.
pub struct SchemaPropagator {
    registry: AHashMap<String, Box<dyn SchemaTransform>>,
    fallback: IdentityTransform,
}

impl Default for SchemaPropagator {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaPropagator {
    /// Creates a propagator with every built-in transform registered.
    pub fn new() -> Self {
        let mut registry: AHashMap<String, Box<dyn SchemaTransform>> = AHashMap::new();
        register_default_transforms(&mut registry);
        Self {
            registry,
            fallback: IdentityTransform,
        }
    }

    /// Registers (or replaces) the transform for its component type.
    pub fn register(&mut self, transform: Box<dyn SchemaTransform>) {
        self.registry
            .insert(transform.component_type().to_string(), transform);
    }

    /// Makes `user_type` behave like the built-in `builtin_type`.
    /// Returns `false` when no built-in of that name exists.
    pub fn alias(&mut self, user_type: &str, builtin_type: &str) -> bool {
        match create_transform_by_name(builtin_type) {
            Some(transform) => {
                self.registry.insert(user_type.to_string(), transform);
                true
            }
            None => false,
        }
    }

    pub fn transform_for(&self, component_type: &str) -> &dyn SchemaTransform {
        self.registry
            .get(component_type)
            .map(Box::as_ref)
            .unwrap_or(&self.fallback)
    }

    pub fn is_multi_output(&self, node: &Node) -> bool {
        self.transform_for(&node.component_type).is_multi_output()
    }

    /// The schema `node` would carry given `input`.
    pub fn derive_output(&self, node: &Node, input: &Schema) -> Schema {
        self.transform_for(&node.component_type)
            .derive(input, &node.data.config)
    }

    /// The schema that leaves `node` along `edge`, before the target's own
    /// transform is applied.
    pub fn forwarded_schema(&self, node: &Node, edge: &Edge) -> Schema {
        let transform = self.transform_for(&node.component_type);
        if transform.is_multi_output() {
            transform.route(node, edge)
        } else {
            node.schema().cloned().unwrap_or_default()
        }
    }

    /// The schema arriving at `node_id` along its first incoming edge, if any.
    pub fn input_schema_for(&self, graph: &Graph, node_id: &str) -> Option<Schema> {
        graph.incoming(node_id).find_map(|edge| {
            graph
                .node(&edge.source)
                .map(|source| self.forwarded_schema(source, edge))
        })
    }

    /// Writes `schema` as the output of `root_id` and recomputes every node
    /// reachable from it.
    pub fn propagate(&self, graph: &mut Graph, root_id: &str, schema: Schema) -> PropagationReport {
        let mut report = PropagationReport::default();
        let mut visited: AHashSet<String> = AHashSet::new();
        let mut queue: VecDeque<(String, Schema)> = VecDeque::from([(root_id.to_string(), schema)]);

        while let Some((node_id, incoming)) = queue.pop_front() {
            if visited.contains(&node_id) {
                trace!(node_id = %node_id, "already visited in this pass, skipping");
                continue;
            }
            let multi_output = match graph.node(&node_id) {
                Some(node) => self.is_multi_output(node),
                None => {
                    debug!(node_id = %node_id, "node vanished before propagation reached it");
                    continue;
                }
            };
            visited.insert(node_id.clone());

            // The primary schema of a multi-output node is user-configured.
            if !multi_output {
                let changed = graph
                    .node(&node_id)
                    .is_some_and(|n| n.data.schema.as_ref() != Some(&incoming));
                if changed {
                    if let Some(node) = graph.node_mut(&node_id) {
                        node.data.schema = Some(incoming);
                    }
                    report.updated.push(node_id.clone());
                }
            }

            let Some(node) = graph.node(&node_id) else {
                continue;
            };
            for edge in graph.outgoing(&node_id) {
                let Some(target) = graph.node(&edge.target) else {
                    continue;
                };
                let forwarded = self.forwarded_schema(node, edge);
                let derived = self.derive_output(target, &forwarded);
                trace!(
                    from = %node_id,
                    to = %edge.target,
                    columns = derived.len(),
                    "forwarding schema"
                );
                queue.push_back((edge.target.clone(), derived));
            }
            report.visited.push(node_id);
        }

        debug!(
            root = root_id,
            visited = report.visited.len(),
            updated = report.updated.len(),
            "schema propagation finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeEndpoints, Node};
    use crate::schema::{Column, ColumnType};

    fn schema() -> Schema {
        Schema::from_columns(vec![Column::new("id", ColumnType::Integer)])
    }

    #[test]
    fn test_unchanged_nodes_stay_shared() {
        let mut graph = Graph::new(
            vec![
                Node::new("a", "csv-reader", "A"),
                Node::new("b", "filter", "B").with_schema(schema()),
            ],
            vec![Edge::new("e", EdgeEndpoints::new("a", "b"))],
        );
        let before = graph.clone();
        let report = SchemaPropagator::new().propagate(&mut graph, "a", schema());

        assert_eq!(report.visited, vec!["a", "b"]);
        assert_eq!(report.updated, vec!["a"]);
        assert!(std::sync::Arc::ptr_eq(&graph.nodes[1], &before.nodes[1]));
    }

    #[test]
    fn test_missing_root_is_a_no_op() {
        let mut graph = Graph::default();
        let report = SchemaPropagator::new().propagate(&mut graph, "ghost", schema());
        assert!(report.visited.is_empty());
    }

    #[test]
    fn test_alias_to_builtin() {
        let mut propagator = SchemaPropagator::new();
        assert!(propagator.alias("tAggregateRow", "aggregate"));
        assert!(!propagator.alias("tNothing", "does-not-exist"));
        assert_eq!(
            propagator.transform_for("tAggregateRow").component_type(),
            "aggregate"
        );
        assert_eq!(propagator.transform_for("unknown").component_type(), "identity");
    }
}
