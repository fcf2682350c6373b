//! Schema propagation tests driven through the store.
mod common;
use common::*;
use canvasflow::prelude::*;
use serde_json::json;

fn schema_of(store: &GraphStore, node_id: &str) -> Option<Schema> {
    store.node(node_id).and_then(Node::schema).cloned()
}

#[test]
fn test_identity_chain_receives_source_schema() {
    let mut store = linear_store();
    let report = store
        .update_node_data("reader", NodePatch::schema(customer_schema()))
        .expect("schema patch propagates");

    assert_eq!(report.visited, vec!["reader", "filter", "writer"]);
    assert_eq!(schema_of(&store, "filter"), Some(customer_schema()));
    assert_eq!(schema_of(&store, "writer"), Some(customer_schema()));
}

#[test]
fn test_connect_propagates_existing_schema() {
    let mut store = GraphStore::new();
    store.add_node(Node::new("reader", "csv-reader", "In").with_schema(customer_schema()));
    store.add_node(Node::new("sort", "sort", "Sort"));
    assert_eq!(schema_of(&store, "sort"), None);

    store
        .connect(EdgeEndpoints::new("reader", "sort"))
        .expect("connect");
    assert_eq!(schema_of(&store, "sort"), Some(customer_schema()));
}

#[test]
fn test_aggregate_output_feeds_downstream() {
    let mut store = GraphStore::new();
    store.add_node(Node::new("reader", "csv-reader", "In"));
    store.add_node(Node::new("agg", "aggregate", "Per country").with_config(count_by_country()));
    store.add_node(Node::new("writer", "csv-writer", "Out"));
    store.connect(EdgeEndpoints::new("reader", "agg")).expect("reader -> agg");
    store.connect(EdgeEndpoints::new("agg", "writer")).expect("agg -> writer");

    store.update_node_data("reader", NodePatch::schema(customer_schema()));

    let expected = Schema::from_columns(vec![
        Column::new("country", ColumnType::String),
        Column::new("id_count", ColumnType::Number),
    ]);
    assert_eq!(schema_of(&store, "agg"), Some(expected.clone()));
    assert_eq!(schema_of(&store, "writer"), Some(expected));
}

#[test]
fn test_config_only_change_refreshes_node() {
    let mut store = GraphStore::new();
    store.add_node(Node::new("reader", "csv-reader", "In").with_schema(customer_schema()));
    store.add_node(Node::new("agg", "aggregate", "Per country").with_config(count_by_country()));
    store.add_node(Node::new("writer", "csv-writer", "Out"));
    store.connect(EdgeEndpoints::new("reader", "agg")).expect("reader -> agg");
    store.connect(EdgeEndpoints::new("agg", "writer")).expect("agg -> writer");

    let report = store
        .update_node_data(
            "agg",
            NodePatch::config(config(json!({
                "groupByColumns": ["country", "name"],
                "aggregations": [{ "column": "amount", "operation": "sum", "targetColumn": "total" }]
            }))),
        )
        .expect("config change refreshes");

    let expected = Schema::from_columns(vec![
        Column::new("country", ColumnType::String),
        Column::new("name", ColumnType::String),
        Column::new("total", ColumnType::Number),
    ]);
    assert_eq!(report.visited, vec!["agg", "writer"]);
    assert_eq!(schema_of(&store, "writer"), Some(expected));
    assert_eq!(schema_of(&store, "reader"), Some(customer_schema()));
}

#[test]
fn test_convert_then_rest_client() {
    let mut store = GraphStore::new();
    store.add_node(Node::new("reader", "csv-reader", "In"));
    store.add_node(Node::new("convert", "convert-type", "Ids as text").with_config(config(
        json!({ "conversions": [{ "column": "id", "targetType": "string" }] }),
    )));
    store.add_node(Node::new("api", "rest-client", "Enrich"));
    store.connect(EdgeEndpoints::new("reader", "convert")).expect("edge");
    store.connect(EdgeEndpoints::new("convert", "api")).expect("edge");

    store.update_node_data("reader", NodePatch::schema(customer_schema()));

    let api = schema_of(&store, "api").expect("api schema");
    assert_eq!(api.type_of("id"), Some(ColumnType::String));
    assert_eq!(api.type_of("status_code"), Some(ColumnType::Integer));
    assert_eq!(api.type_of("response_body"), Some(ColumnType::String));
    assert_eq!(api.len(), customer_schema().len() + 2);
}

#[test]
fn test_unknown_component_passes_schema_through() {
    let mut store = GraphStore::new();
    store.add_node(Node::new("reader", "csv-reader", "In"));
    store.add_node(Node::new("custom", "tSomethingVendorSpecific", "?"));
    store.connect(EdgeEndpoints::new("reader", "custom")).expect("edge");

    store.update_node_data("reader", NodePatch::schema(customer_schema()));
    assert_eq!(schema_of(&store, "custom"), Some(customer_schema()));
}

#[test]
fn test_multi_output_routes_per_branch() {
    let mut store = GraphStore::new();
    let map_config = config(json!({
        "outputs": [
            { "name": "ids", "schema": [{ "name": "id", "type": "integer" }] },
            { "name": "names", "schema": [{ "name": "name", "type": "string" }] }
        ]
    }));
    store.add_node(Node::new("reader", "csv-reader", "In"));
    store.add_node(Node::new("map", "map", "Split").with_config(map_config));
    store.add_node(Node::new("ids_out", "csv-writer", "Ids"));
    store.add_node(Node::new("names_out", "csv-writer", "Names"));
    store.connect(EdgeEndpoints::new("reader", "map")).expect("edge");
    store
        .connect(EdgeEndpoints::new("map", "ids_out").with_source_handle("ids"))
        .expect("edge");
    store
        .connect(EdgeEndpoints::new("map", "names_out").with_source_handle("names"))
        .expect("edge");

    let report = store
        .update_node_data("reader", NodePatch::schema(customer_schema()))
        .expect("propagated");

    // The map keeps its own (unset) primary schema.
    assert_eq!(schema_of(&store, "map"), None);
    assert!(!report.updated.contains(&"map".to_string()));
    assert_eq!(
        schema_of(&store, "ids_out"),
        Some(Schema::from_columns(vec![Column::new("id", ColumnType::Integer)]))
    );
    assert_eq!(
        schema_of(&store, "names_out"),
        Some(Schema::from_columns(vec![Column::new("name", ColumnType::String)]))
    );
}

#[test]
fn test_multi_output_config_change_only_touches_its_branches() {
    let mut store = GraphStore::new();
    store.add_node(
        Node::new("map", "map", "Split")
            .with_schema(customer_schema())
            .with_config(config(json!({
                "outputs": { "a": [{ "name": "x", "type": "integer" }] }
            }))),
    );
    store.add_node(Node::new("a", "csv-writer", "A"));
    store.add_node(Node::new("b", "csv-writer", "B"));
    store.connect(EdgeEndpoints::new("map", "a")).expect("edge");
    store.connect(EdgeEndpoints::new("map", "b")).expect("edge");

    // An unmatched branch gets an empty schema, never the map's primary one.
    let b_before = schema_of(&store, "b");
    assert_eq!(b_before, Some(Schema::empty()));
    assert_eq!(schema_of(&store, "map"), Some(customer_schema()));

    store.update_node_data(
        "map",
        NodePatch::config(config(json!({
            "outputs": { "a": [{ "name": "x", "type": "date" }] }
        }))),
    );
    assert_eq!(
        schema_of(&store, "a"),
        Some(Schema::from_columns(vec![Column::new("x", ColumnType::Date)]))
    );
    assert_eq!(schema_of(&store, "b"), b_before);
}

#[test]
fn test_connect_after_configuring_map_outputs() {
    let mut store = GraphStore::new();
    store.add_node(Node::new("map", "map", "Split").with_config(config(json!({
        "outputs": [{ "name": "ids", "schema": [{ "name": "id", "type": "integer" }] }]
    }))));
    store.add_node(Node::new("w", "csv-writer", "Ids"));

    store
        .connect(EdgeEndpoints::new("map", "w").with_source_handle("ids"))
        .expect("edge");

    let ids = Schema::from_columns(vec![Column::new("id", ColumnType::Integer)]);
    assert_eq!(schema_of(&store, "w"), Some(ids));
    assert_eq!(schema_of(&store, "map"), None);
}

#[test]
fn test_propagate_all_starts_from_map_roots() {
    let mut store = GraphStore::new();
    store
        .load_json(
            r#"{"nodes":[
                {"id":"map","type":"map","data":{"label":"Split","config":{"outputs":[{"name":"ids","schema":[{"name":"id","type":"integer"}]}]}}},
                {"id":"w","type":"csv-writer","data":{"label":"Ids"}}
            ],"edges":[{"id":"e","source":"map","target":"w","sourceHandle":"ids"}]}"#,
        )
        .expect("load");
    assert_eq!(schema_of(&store, "w"), None);

    let report = store.propagate_all();
    assert_eq!(report.visited, vec!["map", "w"]);
    assert_eq!(report.updated, vec!["w"]);
    assert_eq!(
        schema_of(&store, "w"),
        Some(Schema::from_columns(vec![Column::new("id", ColumnType::Integer)]))
    );
}

#[test]
fn test_propagation_visits_each_node_once() {
    // Diamond: reader feeds two branches that rejoin at the writer.
    let mut store = GraphStore::new();
    for (id, kind) in [
        ("reader", "csv-reader"),
        ("left", "filter"),
        ("right", "sort"),
        ("writer", "csv-writer"),
    ] {
        store.add_node(Node::new(id, kind, id));
    }
    for (s, t) in [("reader", "left"), ("reader", "right"), ("left", "writer"), ("right", "writer")] {
        store.connect(EdgeEndpoints::new(s, t)).expect("edge");
    }

    let report = store
        .update_node_data("reader", NodePatch::schema(customer_schema()))
        .expect("propagated");
    assert_eq!(report.visited.len(), 4);
    assert_eq!(report.visited.first().map(String::as_str), Some("reader"));
    assert_eq!(schema_of(&store, "writer"), Some(customer_schema()));
}

#[test]
fn test_propagation_terminates_on_tolerated_cycle() {
    let mut store = GraphStore::builder()
        .cycle_policy(CyclePolicy::Tolerate)
        .build();
    for id in ["a", "b", "c"] {
        store.add_node(Node::new(id, "filter", id));
    }
    for (s, t) in [("a", "b"), ("b", "c"), ("c", "a")] {
        store.connect(EdgeEndpoints::new(s, t)).expect("edge");
    }

    let report = store
        .update_node_data("a", NodePatch::schema(customer_schema()))
        .expect("propagated");
    assert_eq!(report.visited, vec!["a", "b", "c"]);
    assert_eq!(schema_of(&store, "c"), Some(customer_schema()));
}

#[test]
fn test_row_generator_as_source() {
    let mut store = GraphStore::new();
    let id = store.add_node_from_payload(NewNodePayload::new("row-generator", "Seed"), None);
    store.add_node(Node::new("log", "log", "Log"));
    store.connect(EdgeEndpoints::new(id.as_str(), "log")).expect("edge");

    store.update_node_data(
        &id,
        NodePatch::config(config(json!({
            "fields": [{ "name": "n", "type": "integer" }, { "name": "note" }]
        }))),
    );

    let expected = Schema::from_columns(vec![
        Column::new("n", ColumnType::Integer),
        Column::new("note", ColumnType::String),
    ]);
    assert_eq!(schema_of(&store, &id), Some(expected.clone()));
    assert_eq!(schema_of(&store, "log"), Some(expected));
}

#[test]
fn test_propagate_all_after_load() {
    let mut store = GraphStore::new();
    store.load_json(SIMPLE_CANVAS_JSON).expect("load");
    assert_eq!(schema_of(&store, "writer"), None);

    let report = store.propagate_all();
    assert_eq!(report.updated, vec!["writer"]);
    assert_eq!(schema_of(&store, "writer"), schema_of(&store, "reader"));

    let again = store.propagate_all();
    assert!(again.updated.is_empty());
}

#[test]
fn test_reconnect_propagates_from_new_source() {
    let mut store = GraphStore::new();
    let ids = Schema::from_columns(vec![Column::new("id", ColumnType::Integer)]);
    store.add_node(Node::new("r1", "csv-reader", "One").with_schema(customer_schema()));
    store.add_node(Node::new("r2", "csv-reader", "Two").with_schema(ids.clone()));
    store.add_node(Node::new("w", "csv-writer", "Out"));
    let edge_id = store.connect(EdgeEndpoints::new("r1", "w")).expect("edge");
    assert_eq!(schema_of(&store, "w"), Some(customer_schema()));

    store
        .reconnect(&edge_id, EdgeEndpoints::new("r2", "w"))
        .expect("reconnect");
    assert_eq!(schema_of(&store, "w"), Some(ids));
}

struct PrefixTransform;

impl SchemaTransform for PrefixTransform {
    fn component_type(&self) -> &str {
        "prefix"
    }

    fn derive(&self, input: &Schema, _config: &Config) -> Schema {
        input
            .iter()
            .map(|c| Column {
                name: format!("src_{}", c.name),
                ..c.clone()
            })
            .collect()
    }
}

#[test]
fn test_custom_transform_and_alias() {
    let mut store = GraphStore::builder()
        .with_transform(Box::new(PrefixTransform))
        .with_type_alias("tAggregateRow", "aggregate")
        .build();
    store.add_node(Node::new("reader", "csv-reader", "In"));
    store.add_node(Node::new("prefix", "prefix", "Prefix"));
    store.add_node(Node::new("agg", "tAggregateRow", "Agg").with_config(config(json!({
        "groupByColumns": ["src_country"]
    }))));
    store.connect(EdgeEndpoints::new("reader", "prefix")).expect("edge");
    store.connect(EdgeEndpoints::new("prefix", "agg")).expect("edge");

    store.update_node_data("reader", NodePatch::schema(customer_schema()));

    let prefixed = schema_of(&store, "prefix").expect("prefix schema");
    assert!(prefixed.contains("src_id"));
    assert_eq!(
        schema_of(&store, "agg"),
        Some(Schema::from_columns(vec![Column::new("src_country", ColumnType::String)]))
    );
    assert_eq!(
        store.propagator().input_schema_for(store.graph(), "agg"),
        Some(prefixed)
    );
}
