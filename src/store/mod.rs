//! The authoritative canvas graph, its mutation operations, and undo/redo.
//!
//! All operations run synchronously to completion: a mutation, the schema
//! propagation it triggers, and the history snapshot it records happen inside
//! one `&mut self` call, so no other mutation can observe a half-applied state.

use crate::error::{ConnectionError, PayloadError};
use crate::graph::{
    CanvasSnapshot, Edge, EdgeEndpoints, Graph, NewNodePayload, Node, NodeData, NodePatch,
    NodeStatus, Position, Viewport,
};
use crate::propagation::{PropagationReport, SchemaPropagator, SchemaTransform};
use crate::schema::Schema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

mod history;
mod validator;

pub use history::{DEFAULT_HISTORY_CAPACITY, History};
pub use validator::{ConnectionValidator, CyclePolicy};

/// Tunables for a [`GraphStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreConfig {
    pub history_capacity: usize,
    pub cycle_policy: CyclePolicy,
    /// Where nodes created from a palette payload land when no drop position
    /// is given.
    pub default_position: Position,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            cycle_policy: CyclePolicy::Reject,
            default_position: Position::new(100.0, 100.0),
        }
    }
}

pub struct GraphStoreBuilder {
    config: StoreConfig,
    propagator: SchemaPropagator,
}

impl GraphStoreBuilder {
    pub fn new() -> Self {
        Self {
            config: StoreConfig::default(),
            propagator: SchemaPropagator::new(),
        }
    }

    pub fn with_config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.config.history_capacity = capacity;
        self
    }

    pub fn cycle_policy(mut self, policy: CyclePolicy) -> Self {
        self.config.cycle_policy = policy;
        self
    }

    pub fn default_position(mut self, position: Position) -> Self {
        self.config.default_position = position;
        self
    }

    /// Registers a transform for a component type not covered by the
    /// built-ins, or overrides a built-in.
    pub fn with_transform(mut self, transform: Box<dyn SchemaTransform>) -> Self {
        self.propagator.register(transform);
        self
    }

    /// Treats `user_type` like the built-in `builtin_type`. Unknown built-ins
    /// are ignored.
    pub fn with_type_alias(mut self, user_type: &str, builtin_type: &str) -> Self {
        if !self.propagator.alias(user_type, builtin_type) {
            warn!(user_type, builtin_type, "alias target is not a built-in transform");
        }
        self
    }

    pub fn build(self) -> GraphStore {
        let mut history = History::new(self.config.history_capacity);
        history.reset(Graph::default());
        GraphStore {
            graph: Graph::default(),
            viewport: Viewport::default(),
            history,
            propagator: self.propagator,
            validator: ConnectionValidator::new(self.config.cycle_policy),
            config: self.config,
            revision: 0,
            node_sequence: 0,
        }
    }
}

impl Default for GraphStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Sole owner of the live graph and its history.
pub struct GraphStore {
    graph: Graph,
    viewport: Viewport,
    history: History,
    propagator: SchemaPropagator,
    validator: ConnectionValidator,
    config: StoreConfig,
    revision: u64,
    node_sequence: u64,
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphStore {
    pub fn new() -> Self {
        GraphStoreBuilder::new().build()
    }

    pub fn builder() -> GraphStoreBuilder {
        GraphStoreBuilder::new()
    }

    // --- Read access ---

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.graph.node(node_id)
    }

    pub fn edge(&self, edge_id: &str) -> Option<&Edge> {
        self.graph.edge(edge_id)
    }

    pub fn node_count(&self) -> usize {
        self.graph.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edges.len()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn propagator(&self) -> &SchemaPropagator {
        &self.propagator
    }

    /// Bumped by every mutation; lets observers detect changes cheaply.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn history_index(&self) -> usize {
        self.history.index()
    }

    // --- Whole-graph lifecycle ---

    /// Replaces the graph and viewport with a persisted canvas and restarts
    /// history from it. A canvas that fails validation leaves the store as is.
    pub fn load(&mut self, canvas: CanvasSnapshot) -> Result<(), PayloadError> {
        canvas.validate()?;
        self.viewport = canvas.viewport;
        self.graph = canvas.into_graph();
        self.history.reset(self.graph.clone());
        self.bump();
        info!(
            nodes = self.graph.nodes.len(),
            edges = self.graph.edges.len(),
            "canvas loaded"
        );
        Ok(())
    }

    pub fn load_json(&mut self, json: &str) -> Result<(), PayloadError> {
        let canvas = CanvasSnapshot::from_json(json)?;
        self.load(canvas)
    }

    pub fn to_canvas(&self) -> CanvasSnapshot {
        CanvasSnapshot::from_graph(&self.graph, self.viewport)
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.bump();
    }

    // --- Nodes ---

    /// Appends a node and records a history entry. Returns `false` (and leaves
    /// the graph untouched) if a node with the same id already exists.
    pub fn add_node(&mut self, node: Node) -> bool {
        if self.graph.contains_node(&node.id) {
            warn!(node_id = %node.id, "refusing to add a node with a duplicate id");
            return false;
        }
        debug!(node_id = %node.id, component_type = %node.component_type, "node added");
        self.graph.push_node(node);
        self.bump();
        self.save_to_history();
        true
    }

    /// Creates a node from a palette drop. Returns the generated id.
    pub fn add_node_from_payload(
        &mut self,
        payload: NewNodePayload,
        position: Option<Position>,
    ) -> String {
        let id = self.next_node_id(&payload.component_type);
        let node = Node {
            id: id.clone(),
            component_type: payload.component_type,
            position: position.unwrap_or(self.config.default_position),
            data: NodeData {
                label: payload.label,
                config: payload.config,
                ..NodeData::default()
            },
        };
        self.add_node(node);
        id
    }

    /// Merges `patch` into the node's data.
    ///
    /// A patch carrying a schema makes it the node's output and propagates it
    /// downstream before returning. A config-only patch re-derives the node's
    /// output from its upstream input. Unknown ids are ignored.
    pub fn update_node_data(&mut self, node_id: &str, patch: NodePatch) -> Option<PropagationReport> {
        let NodePatch {
            label,
            config,
            schema,
            status,
        } = patch;

        let Some(node) = self.graph.node_mut(node_id) else {
            debug!(node_id, "update for unknown node ignored");
            return None;
        };
        let config_changed = config.as_ref().is_some_and(|c| *c != node.data.config);
        if let Some(label) = label {
            node.data.label = label;
        }
        if let Some(config) = config {
            node.data.config = config;
        }
        if let Some(status) = status {
            node.data.status = Some(status);
        }
        if let Some(schema) = &schema {
            node.data.schema = Some(schema.clone());
        }
        self.bump();

        match schema {
            Some(schema) => Some(self.propagator.propagate(&mut self.graph, node_id, schema)),
            None if config_changed => self.refresh_node(node_id),
            None => None,
        }
    }

    /// Recomputes a node's output from what currently flows into it and
    /// propagates the result. Returns `None` when the node has nothing to
    /// derive from.
    pub fn refresh_node(&mut self, node_id: &str) -> Option<PropagationReport> {
        let node = self.graph.node(node_id)?;
        let transform = self.propagator.transform_for(&node.component_type);

        let output = if transform.is_multi_output() {
            node.schema().cloned().unwrap_or_default()
        } else if let Some(input) = self.propagator.input_schema_for(&self.graph, node_id) {
            transform.derive(&input, &node.data.config)
        } else if transform.is_source() {
            transform.derive(&Schema::empty(), &node.data.config)
        } else {
            return None;
        };

        self.bump();
        Some(self.propagator.propagate(&mut self.graph, node_id, output))
    }

    /// Moves a node. Drag updates do not create history entries.
    pub fn update_node_position(&mut self, node_id: &str, position: Position) {
        if let Some(node) = self.graph.node_mut(node_id) {
            node.position = position;
            self.bump();
        }
    }

    pub fn set_node_status(&mut self, node_id: &str, status: NodeStatus) {
        if let Some(node) = self.graph.node_mut(node_id) {
            node.data.status = Some(status);
            self.bump();
        }
    }

    /// Removes a node together with every edge attached to it.
    pub fn delete_node(&mut self, node_id: &str) {
        if !self.graph.remove_node(node_id) {
            debug!(node_id, "delete for unknown node ignored");
            return;
        }
        debug!(node_id, "node deleted");
        self.bump();
        self.save_to_history();
    }

    // --- Edges ---

    /// Admits a new connection and returns its id. The source's schema, if it
    /// has one, is propagated through the new edge immediately.
    pub fn connect(&mut self, candidate: EdgeEndpoints) -> Result<String, ConnectionError> {
        if let Err(e) = self.validator.check(&self.graph, &candidate) {
            info!(connection = %candidate, reason = %e, "connection rejected");
            return Err(e);
        }

        let id = ConnectionValidator::edge_id_for(&self.graph, &candidate);
        let source_id = candidate.source.clone();
        self.graph.push_edge(Edge::new(id.clone(), candidate));
        debug!(edge_id = %id, "edge added");

        self.propagate_from(&source_id);
        self.bump();
        self.save_to_history();
        Ok(id)
    }

    /// Points an existing edge at new endpoints while keeping its id.
    /// Unknown edge ids are ignored.
    pub fn reconnect(
        &mut self,
        edge_id: &str,
        endpoints: EdgeEndpoints,
    ) -> Result<(), ConnectionError> {
        let Some(edge) = self.graph.edge(edge_id) else {
            debug!(edge_id, "reconnect for unknown edge ignored");
            return Ok(());
        };
        if edge.matches(&endpoints) {
            return Ok(());
        }

        let mut without_edge = self.graph.clone();
        without_edge.remove_edge(edge_id);
        self.validator.check(&without_edge, &endpoints)?;

        let source_id = endpoints.source.clone();
        if let Some(edge) = self.graph.edge_mut(edge_id) {
            edge.set_endpoints(endpoints);
        }
        debug!(edge_id, "edge reconnected");

        self.propagate_from(&source_id);
        self.bump();
        self.save_to_history();
        Ok(())
    }

    pub fn delete_edge(&mut self, edge_id: &str) {
        if !self.graph.remove_edge(edge_id) {
            debug!(edge_id, "delete for unknown edge ignored");
            return;
        }
        self.bump();
        self.save_to_history();
    }

    // --- Propagation ---

    /// Re-propagates from every root node that can supply a schema: roots
    /// with a declared schema, multi-output roots with configured outputs,
    /// and source components derived from config.
    pub fn propagate_all(&mut self) -> PropagationReport {
        let roots: Vec<(String, Schema)> = self
            .graph
            .roots()
            .filter_map(|node| {
                self.root_output(node)
                    .map(|schema| (node.id.clone(), schema))
            })
            .collect();

        let mut combined = PropagationReport::default();
        for (root_id, schema) in roots {
            let report = self.propagator.propagate(&mut self.graph, &root_id, schema);
            combined.visited.extend(report.visited);
            combined.updated.extend(report.updated);
        }
        if !combined.updated.is_empty() {
            self.bump();
        }
        combined
    }

    /// The schema a node can push downstream without looking upstream.
    fn root_output(&self, node: &Node) -> Option<Schema> {
        if let Some(schema) = node.schema() {
            return Some(schema.clone());
        }
        let transform = self.propagator.transform_for(&node.component_type);
        if transform.is_multi_output() {
            // Routing reads the configured outputs; the primary schema is unused.
            Some(Schema::empty())
        } else if transform.is_source() {
            Some(transform.derive(&Schema::empty(), &node.data.config))
        } else {
            None
        }
    }

    fn propagate_from(&mut self, source_id: &str) {
        let Some(node) = self.graph.node(source_id) else {
            return;
        };
        let transform = self.propagator.transform_for(&node.component_type);
        let schema = match node.schema() {
            Some(schema) => schema.clone(),
            None if transform.is_multi_output() => Schema::empty(),
            None => return,
        };
        self.propagator.propagate(&mut self.graph, source_id, schema);
    }

    // --- History ---

    /// Records the current graph as a history entry.
    pub fn save_to_history(&mut self) {
        self.history.record(self.graph.clone());
    }

    /// Steps back one history entry. Returns `false` at the oldest entry.
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(snapshot) => {
                self.graph = snapshot.clone();
                self.bump();
                true
            }
            None => false,
        }
    }

    /// Steps forward one history entry. Returns `false` at the newest entry.
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(snapshot) => {
                self.graph = snapshot.clone();
                self.bump();
                true
            }
            None => false,
        }
    }

    fn bump(&mut self) {
        self.revision += 1;
    }

    fn next_node_id(&mut self, component_type: &str) -> String {
        loop {
            self.node_sequence += 1;
            let id = format!("{}-{}", component_type, self.node_sequence);
            if !self.graph.contains_node(&id) {
                return id;
            }
        }
    }
}
