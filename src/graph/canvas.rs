use super::{Coordinate, Edge, Graph, Node};
use crate::error::PayloadError;
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Pan and zoom of the canvas. Persisted with the job but never part of the
/// undo history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: Coordinate,
    pub y: Coordinate,
    pub zoom: Coordinate,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }
}

impl Viewport {
    pub fn new(x: f64, y: f64, zoom: f64) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
            zoom: zoom.into(),
        }
    }
}

/// The persisted form of a job's canvas, as stored by the job-storage backend.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CanvasSnapshot {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub viewport: Viewport,
}

impl CanvasSnapshot {
    pub fn from_graph(graph: &Graph, viewport: Viewport) -> Self {
        Self {
            nodes: graph.nodes.iter().map(|n| n.as_ref().clone()).collect(),
            edges: graph.edges.iter().map(|e| e.as_ref().clone()).collect(),
            viewport,
        }
    }

    /// Parses and validates a persisted canvas.
    pub fn from_json(json: &str) -> Result<Self, PayloadError> {
        let canvas: CanvasSnapshot = serde_json::from_str(json)?;
        canvas.validate()?;
        Ok(canvas)
    }

    pub fn to_json(&self) -> Result<String, PayloadError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, PayloadError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks the structural guarantees the store relies on: unique node ids,
    /// unique edge ids, and no edge pointing at a missing node.
    pub fn validate(&self) -> Result<(), PayloadError> {
        let mut node_ids = AHashSet::new();
        for node in &self.nodes {
            if !node_ids.insert(node.id.as_str()) {
                return Err(PayloadError::Invalid(format!(
                    "duplicate node id '{}'",
                    node.id
                )));
            }
        }

        let mut edge_ids = AHashSet::new();
        for edge in &self.edges {
            if !edge_ids.insert(edge.id.as_str()) {
                return Err(PayloadError::Invalid(format!(
                    "duplicate edge id '{}'",
                    edge.id
                )));
            }
            for endpoint in [&edge.source, &edge.target] {
                if !node_ids.contains(endpoint.as_str()) {
                    return Err(PayloadError::Invalid(format!(
                        "edge '{}' references missing node '{}'",
                        edge.id, endpoint
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn into_graph(self) -> Graph {
        Graph {
            nodes: self.nodes.into_iter().map(Arc::new).collect(),
            edges: self.edges.into_iter().map(Arc::new).collect(),
        }
    }
}
