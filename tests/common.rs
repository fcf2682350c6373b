//! Common test utilities for building canvases and schemas.
use canvasflow::prelude::*;
use serde_json::json;

/// Columns emitted by the customer reader in most fixtures.
#[allow(dead_code)]
pub fn customer_schema() -> Schema {
    Schema::from_columns(vec![
        Column::new("id", ColumnType::Integer),
        Column::new("name", ColumnType::String),
        Column::new("country", ColumnType::String),
        Column::new("amount", ColumnType::Number),
    ])
}

/// Turns a `json!` object literal into a node config.
#[allow(dead_code)]
pub fn config(value: serde_json::Value) -> Config {
    value.as_object().cloned().unwrap_or_default()
}

/// `reader -> filter -> writer`, unconnected schemas.
#[allow(dead_code)]
pub fn linear_store() -> GraphStore {
    let mut store = GraphStore::new();
    store.add_node(Node::new("reader", "csv-reader", "Customers"));
    store.add_node(Node::new("filter", "filter", "Active only"));
    store.add_node(Node::new("writer", "csv-writer", "Output"));
    store
        .connect(EdgeEndpoints::new("reader", "filter"))
        .expect("reader -> filter");
    store
        .connect(EdgeEndpoints::new("filter", "writer"))
        .expect("filter -> writer");
    store
}

/// Aggregate config grouping by country and counting ids.
#[allow(dead_code)]
pub fn count_by_country() -> Config {
    config(json!({
        "groupByColumns": ["country"],
        "aggregations": [{ "column": "id", "operation": "count" }]
    }))
}

/// A small persisted canvas with one edge and a custom viewport.
#[allow(dead_code)]
pub const SIMPLE_CANVAS_JSON: &str = r#"{"nodes":[{"id":"reader","type":"csv-reader","position":{"x":10.0,"y":20.0},"data":{"label":"Customers","config":{"path":"customers.csv","delimiter":","},"schema":[{"name":"id","type":"integer"},{"name":"email","type":"string","nullable":true}]}},{"id":"writer","type":"csv-writer","position":{"x":300.0,"y":20.0},"data":{"label":"Out","config":{}}}],"edges":[{"id":"edge-reader-writer","source":"reader","target":"writer"}],"viewport":{"x":-5.0,"y":12.5,"zoom":0.75}}"#;
