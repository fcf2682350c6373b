//! Prelude module for convenient imports
//!
//! Re-exports the types most callers need to drive a canvas.
//!
//! # Example
//!
//! ```rust,no_run
//! use canvasflow::prelude::*;
//!
//! # fn run_example() -> Result<(), Box<dyn std::error::Error>> {
//! let json = std::fs::read_to_string("path/to/canvas.json")?;
//! let mut store = GraphStore::new();
//! store.load_json(&json)?;
//! let report = store.propagate_all();
//! println!("{} nodes updated", report.updated.len());
//! # Ok(())
//! # }
//! ```

// Store and history
pub use crate::store::{CyclePolicy, GraphStore, GraphStoreBuilder, StoreConfig};

// Graph model
pub use crate::graph::{
    CanvasSnapshot, Config, Coordinate, Edge, EdgeEndpoints, Graph, NewNodePayload, Node, NodeData,
    NodePatch, NodeStatus, Position, Viewport,
};

// Schemas and propagation
pub use crate::propagation::{PropagationReport, SchemaPropagator, SchemaTransform};
pub use crate::schema::{Column, ColumnType, Schema};

// Persistence
pub use crate::autosave::{AutosaveConfig, AutosaveCoordinator, InMemoryJobStorage, JobStorage};

// Error types
pub use crate::error::{ConnectionError, PayloadError, PersistenceError};
