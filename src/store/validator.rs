use crate::error::ConnectionError;
use crate::graph::{EdgeEndpoints, Graph};
use serde::{Deserialize, Serialize};

/// What the store does with a connection that would close a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CyclePolicy {
    /// Decline the connection with `ConnectionError::CycleDetected`.
    #[default]
    Reject,
    /// Admit it; propagation stops at already-visited nodes.
    Tolerate,
}

/// Admission rules for new and rewired connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectionValidator {
    policy: CyclePolicy,
}

impl ConnectionValidator {
    pub fn new(policy: CyclePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> CyclePolicy {
        self.policy
    }

    /// Checks `candidate` against `graph`. For a rewire, pass the graph
    /// without the edge being moved.
    pub fn check(&self, graph: &Graph, candidate: &EdgeEndpoints) -> Result<(), ConnectionError> {
        for endpoint in [&candidate.source, &candidate.target] {
            if !graph.contains_node(endpoint) {
                return Err(ConnectionError::UnknownNode(endpoint.clone()));
            }
        }

        if graph.edges.iter().any(|e| e.matches(candidate)) {
            return Err(ConnectionError::DuplicateConnection {
                source_node_id: candidate.source.clone(),
                target_node_id: candidate.target.clone(),
            });
        }

        if self.policy == CyclePolicy::Reject && graph.reaches(&candidate.target, &candidate.source)
        {
            return Err(ConnectionError::CycleDetected {
                source_node_id: candidate.source.clone(),
                target_node_id: candidate.target.clone(),
            });
        }
        Ok(())
    }

    /// Deterministic id for a new edge. A numeric suffix is appended when a
    /// rewired edge already holds the plain id.
    pub fn edge_id_for(graph: &Graph, candidate: &EdgeEndpoints) -> String {
        let base = format!("edge-{}", candidate);
        if !graph.contains_edge(&base) {
            return base;
        }
        (1..)
            .map(|n| format!("{}-{}", base, n))
            .find(|id| !graph.contains_edge(id))
            .unwrap_or(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, Node};

    fn graph() -> Graph {
        Graph::new(
            vec![
                Node::new("a", "csv-reader", "A"),
                Node::new("b", "map", "B"),
                Node::new("c", "csv-writer", "C"),
            ],
            vec![Edge::new("edge-a-b", EdgeEndpoints::new("a", "b"))],
        )
    }

    #[test]
    fn test_distinct_handles_are_not_duplicates() {
        let validator = ConnectionValidator::default();
        let g = graph();
        assert!(validator.check(&g, &EdgeEndpoints::new("a", "b")).is_err());
        assert!(
            validator
                .check(&g, &EdgeEndpoints::new("a", "b").with_target_handle("in-2"))
                .is_ok()
        );
    }

    #[test]
    fn test_unknown_endpoint() {
        let validator = ConnectionValidator::default();
        let err = validator
            .check(&graph(), &EdgeEndpoints::new("a", "zzz"))
            .unwrap_err();
        assert_eq!(err, ConnectionError::UnknownNode("zzz".to_string()));
    }

    #[test]
    fn test_cycle_policy() {
        let back_edge = EdgeEndpoints::new("b", "a");
        let self_loop = EdgeEndpoints::new("c", "c");
        let reject = ConnectionValidator::new(CyclePolicy::Reject);
        let tolerate = ConnectionValidator::new(CyclePolicy::Tolerate);
        assert!(matches!(
            reject.check(&graph(), &back_edge),
            Err(ConnectionError::CycleDetected { .. })
        ));
        assert!(reject.check(&graph(), &self_loop).is_err());
        assert!(tolerate.check(&graph(), &back_edge).is_ok());
    }

    #[test]
    fn test_edge_id_suffix_on_collision() {
        let g = graph();
        assert_eq!(
            ConnectionValidator::edge_id_for(&g, &EdgeEndpoints::new("a", "b")),
            "edge-a-b-1"
        );
        assert_eq!(
            ConnectionValidator::edge_id_for(
                &g,
                &EdgeEndpoints::new("b", "c").with_source_handle("out")
            ),
            "edge-b:out-c"
        );
    }
}
