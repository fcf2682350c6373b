//! # Canvasflow - ETL Canvas Graph Store and Schema Propagation
//!
//! **Canvasflow** keeps the node/edge graph behind a visual ETL job designer.
//! Every component on the canvas (readers, transforms, writers) is a node;
//! every data flow between two components is an edge. Whenever a node's output
//! schema changes, the schema is pushed downstream and recomputed by each
//! component it passes through, so configuration forms always see the columns
//! that actually reach them.
//!
//! ## Core Workflow
//!
//! 1.  **Build a Store**: Use [`GraphStore::builder`](store::GraphStore::builder) to pick the
//!     history capacity, the cycle policy, and any extra schema transforms.
//! 2.  **Edit the Canvas**: Add nodes, connect them, and patch their data. Connections are
//!     validated, and schemas propagate synchronously before each call returns.
//! 3.  **Undo and Redo**: Structural edits are recorded as cheap, structurally shared snapshots.
//! 4.  **Persist**: Hand the store to an [`AutosaveCoordinator`](autosave::AutosaveCoordinator)
//!     to debounce saves against a [`JobStorage`](autosave::JobStorage) backend.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use canvasflow::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut store = GraphStore::builder().history_capacity(50).build();
//!
//!     store.add_node(Node::new("reader", "csv-reader", "Customers"));
//!     store.add_node(Node::new("agg", "aggregate", "By country").with_config(
//!         serde_json::from_str(
//!             r#"{"groupByColumns":["country"],"aggregations":[{"column":"id","operation":"count"}]}"#,
//!         )?,
//!     ));
//!     store.connect(EdgeEndpoints::new("reader", "agg"))?;
//!
//!     let schema = Schema::from_columns(vec![
//!         Column::new("id", ColumnType::Integer),
//!         Column::new("country", ColumnType::String),
//!     ]);
//!     store.update_node_data("reader", NodePatch::schema(schema));
//!
//!     if let Some(out) = store.node("agg").and_then(Node::schema) {
//!         println!("aggregate emits {}", out); // [country: string, id_count: number]
//!     }
//!
//!     store.undo();
//!     Ok(())
//! }
//! ```

pub mod autosave;
pub mod error;
pub mod graph;
pub mod prelude;
pub mod propagation;
pub mod schema;
pub mod store;
