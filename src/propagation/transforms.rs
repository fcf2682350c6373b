use crate::graph::{Config, Edge, Node};
use crate::schema::{Column, ColumnType, Schema};
use ahash::AHashMap;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::warn;

/// Derives the output schema of one component type from its input schema and
/// configuration.
pub trait SchemaTransform: Send + Sync {
    fn component_type(&self) -> &str;

    fn derive(&self, input: &Schema, config: &Config) -> Schema;

    /// Multi-output components keep their own schema as the primary output and
    /// choose a schema per outgoing edge through [`SchemaTransform::route`].
    fn is_multi_output(&self) -> bool {
        false
    }

    /// Source components derive their output from configuration alone.
    fn is_source(&self) -> bool {
        false
    }

    /// The schema sent from `node` along `edge`. Only consulted for
    /// multi-output components.
    fn route(&self, node: &Node, _edge: &Edge) -> Schema {
        node.schema().cloned().unwrap_or_default()
    }
}

/// Used for any component type without a registered transform.
pub(super) struct IdentityTransform;

impl SchemaTransform for IdentityTransform {
    fn component_type(&self) -> &str {
        "identity"
    }
    fn derive(&self, input: &Schema, _config: &Config) -> Schema {
        input.clone()
    }
}

/// Reads a typed view of a node's config. Malformed config degrades to the
/// default (empty) view so that propagation never fails.
fn read_config<T: DeserializeOwned + Default>(component_type: &str, config: &Config) -> T {
    match serde_json::from_value(serde_json::Value::Object(config.clone())) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(component_type, error = %e, "ignoring malformed component config");
            T::default()
        }
    }
}

/// Looks up each named column in `input`, falling back to `string` when absent.
fn columns_from_input<'a>(
    input: &'a Schema,
    names: &'a [String],
) -> impl Iterator<Item = Column> + 'a {
    names.iter().map(move |name| {
        input
            .column(name)
            .cloned()
            .unwrap_or_else(|| Column::new(name.clone(), ColumnType::String))
    })
}

// --- convert-type ---

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConvertTypeConfig {
    #[serde(default)]
    conversions: Option<Conversions>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Conversions {
    List(Vec<Conversion>),
    Map(AHashMap<String, ColumnType>),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Conversion {
    column: String,
    #[serde(alias = "type", alias = "to")]
    target_type: ColumnType,
}

impl Conversions {
    fn into_lookup(self) -> AHashMap<String, ColumnType> {
        match self {
            Conversions::List(list) => list
                .into_iter()
                .map(|c| (c.column, c.target_type))
                .collect(),
            Conversions::Map(map) => map,
        }
    }
}

struct ConvertTypeTransform;

impl SchemaTransform for ConvertTypeTransform {
    fn component_type(&self) -> &str {
        "convert-type"
    }
    fn derive(&self, input: &Schema, config: &Config) -> Schema {
        let conversions = read_config::<ConvertTypeConfig>(self.component_type(), config)
            .conversions
            .map(Conversions::into_lookup)
            .unwrap_or_default();
        input
            .iter()
            .map(|column| match conversions.get(&column.name) {
                Some(target) => Column {
                    column_type: *target,
                    ..column.clone()
                },
                None => column.clone(),
            })
            .collect()
    }
}

// --- aggregate ---

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct AggregateConfig {
    #[serde(default)]
    group_by_columns: Vec<String>,
    #[serde(default)]
    aggregations: Vec<Aggregation>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Aggregation {
    #[serde(default)]
    column: String,
    #[serde(default)]
    operation: String,
    #[serde(default)]
    target_column: Option<String>,
}

impl Aggregation {
    fn output_name(&self) -> String {
        match self.target_column.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("{}_{}", self.column, self.operation),
        }
    }

    fn output_type(&self, input: &Schema) -> ColumnType {
        match self.operation.to_ascii_lowercase().as_str() {
            "count" | "sum" | "avg" => ColumnType::Number,
            _ => input.type_of(&self.column).unwrap_or(ColumnType::String),
        }
    }
}

struct AggregateTransform;

impl SchemaTransform for AggregateTransform {
    fn component_type(&self) -> &str {
        "aggregate"
    }
    fn derive(&self, input: &Schema, config: &Config) -> Schema {
        let cfg: AggregateConfig = read_config(self.component_type(), config);
        let grouped = columns_from_input(input, &cfg.group_by_columns);
        let aggregated = cfg
            .aggregations
            .iter()
            .map(|agg| Column::new(agg.output_name(), agg.output_type(input)));
        grouped.chain(aggregated).collect()
    }
}

// --- normalize (unpivot) ---

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct NormalizeConfig {
    #[serde(default)]
    id_columns: Vec<String>,
    #[serde(default)]
    var_name: Option<String>,
    #[serde(default)]
    value_name: Option<String>,
}

fn non_empty_or(value: Option<String>, fallback: &str) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

struct NormalizeTransform;

impl SchemaTransform for NormalizeTransform {
    fn component_type(&self) -> &str {
        "normalize"
    }
    fn derive(&self, input: &Schema, config: &Config) -> Schema {
        let cfg: NormalizeConfig = read_config(self.component_type(), config);
        let var_name = non_empty_or(cfg.var_name, "variable");
        let value_name = non_empty_or(cfg.value_name, "value");
        columns_from_input(input, &cfg.id_columns)
            .chain([
                Column::new(var_name, ColumnType::String),
                Column::new(value_name, ColumnType::String),
            ])
            .collect()
    }
}

// --- denormalize (pivot) ---

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct DenormalizeConfig {
    #[serde(default)]
    index_columns: Vec<String>,
}

/// Only the index columns are statically known; pivoted columns depend on data.
struct DenormalizeTransform;

impl SchemaTransform for DenormalizeTransform {
    fn component_type(&self) -> &str {
        "denormalize"
    }
    fn derive(&self, input: &Schema, config: &Config) -> Schema {
        let cfg: DenormalizeConfig = read_config(self.component_type(), config);
        columns_from_input(input, &cfg.index_columns).collect()
    }
}

// --- row-generator ---

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RowGeneratorConfig {
    #[serde(default)]
    fields: Vec<GeneratedField>,
}

#[derive(Deserialize)]
struct GeneratedField {
    name: String,
    #[serde(rename = "type", default)]
    column_type: ColumnType,
}

struct RowGeneratorTransform;

impl SchemaTransform for RowGeneratorTransform {
    fn component_type(&self) -> &str {
        "row-generator"
    }
    fn is_source(&self) -> bool {
        true
    }
    fn derive(&self, _input: &Schema, config: &Config) -> Schema {
        let cfg: RowGeneratorConfig = read_config(self.component_type(), config);
        cfg.fields
            .into_iter()
            .map(|f| Column::new(f.name, f.column_type))
            .collect()
    }
}

// --- rest-client ---

struct RestClientTransform;

impl SchemaTransform for RestClientTransform {
    fn component_type(&self) -> &str {
        "rest-client"
    }
    fn derive(&self, input: &Schema, _config: &Config) -> Schema {
        let mut output = input.clone();
        output.push_if_absent(Column::new("status_code", ColumnType::Integer));
        output.push_if_absent(Column::new("response_body", ColumnType::String));
        output
    }
}

// --- map (multi-output) ---

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct MapConfig {
    #[serde(default)]
    outputs: Option<MapOutputs>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MapOutputs {
    Ports(Vec<OutputPort>),
    Keyed(AHashMap<String, KeyedOutput>),
}

#[derive(Deserialize)]
struct OutputPort {
    name: String,
    #[serde(default)]
    schema: Schema,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum KeyedOutput {
    Columns(Schema),
    Wrapped { schema: Schema },
}

impl MapOutputs {
    fn into_ports(self) -> AHashMap<String, Schema> {
        match self {
            MapOutputs::Ports(ports) => ports.into_iter().map(|p| (p.name, p.schema)).collect(),
            MapOutputs::Keyed(keyed) => keyed
                .into_iter()
                .map(|(key, output)| {
                    let schema = match output {
                        KeyedOutput::Columns(schema) | KeyedOutput::Wrapped { schema } => schema,
                    };
                    (key, schema)
                })
                .collect(),
        }
    }
}

/// Field-mapping node producing one schema per downstream branch.
///
/// Outputs are looked up by the edge's source handle (port name) first and by
/// the downstream node id second. Once any output is configured, an edge that
/// matches none of them carries an empty schema.
struct MapTransform;

impl SchemaTransform for MapTransform {
    fn component_type(&self) -> &str {
        "map"
    }
    fn derive(&self, input: &Schema, _config: &Config) -> Schema {
        input.clone()
    }
    fn is_multi_output(&self) -> bool {
        true
    }
    fn route(&self, node: &Node, edge: &Edge) -> Schema {
        let ports = read_config::<MapConfig>(self.component_type(), &node.data.config)
            .outputs
            .map(MapOutputs::into_ports)
            .unwrap_or_default();
        if ports.is_empty() {
            return node.schema().cloned().unwrap_or_default();
        }
        edge.source_handle
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(edge.target.as_str()))
            .find_map(|key| ports.get(key).cloned())
            .unwrap_or_default()
    }
}

/// Defines the pass-through transforms and the registration helpers for every
/// built-in transform.
macro_rules! define_schema_transforms {
    ( $( ($id_struct:ident, $id_type:literal) ),* $(,)? ; $( ($struct_name:ident, $type_name:literal) ),* $(,)? ) => {
        $(
            struct $id_struct;
            impl SchemaTransform for $id_struct {
                fn component_type(&self) -> &str { $id_type }
                fn derive(&self, input: &Schema, _config: &Config) -> Schema { input.clone() }
            }
        )*

        pub(super) fn register_default_transforms(registry: &mut AHashMap<String, Box<dyn SchemaTransform>>) {
            $( registry.insert($id_type.to_string(), Box::new($id_struct)); )*
            $( registry.insert($type_name.to_string(), Box::new($struct_name)); )*
        }

        pub(super) fn create_transform_by_name(name: &str) -> Option<Box<dyn SchemaTransform>> {
            match name {
                $( $id_type => Some(Box::new($id_struct)), )*
                $( $type_name => Some(Box::new($struct_name)), )*
                _ => None,
            }
        }
    };
}

define_schema_transforms! {
    // Row-level operations that never change the column set
    (FilterTransform, "filter"),
    (SortTransform, "sort"),
    (UnionTransform, "union"),
    (LogTransform, "log"),
    (UniqRowTransform, "uniq-row"),
    (SplitRowTransform, "split-row"),
    (RunJobTransform, "run-job"),
    (JavaRowTransform, "java-row"),
    (CsvWriterTransform, "csv-writer"),
    (JsonWriterTransform, "json-writer"),
    (DatabaseWriterTransform, "database-writer"),

    ;

    (ConvertTypeTransform, "convert-type"),
    (AggregateTransform, "aggregate"),
    (NormalizeTransform, "normalize"),
    (DenormalizeTransform, "denormalize"),
    (RowGeneratorTransform, "row-generator"),
    (RestClientTransform, "rest-client"),
    (MapTransform, "map"),
}
