use crate::schema::Schema;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Component-specific configuration attached to a node.
///
/// The shape is owned by the configuration form of each component type; the
/// core only reads the keys its schema transforms understand.
pub type Config = serde_json::Map<String, serde_json::Value>;

/// A canvas coordinate that remembers whether it was written as an integer,
/// so `100` is saved back as `100` and `100.0` as `100.0`.
///
/// Equality compares the numeric value only.
#[derive(Debug, Clone, Copy, Default)]
pub struct Coordinate {
    value: f64,
    integral: bool,
}

impl Coordinate {
    pub fn value(self) -> f64 {
        self.value
    }

    pub fn is_integral(self) -> bool {
        self.integral
    }
}

impl From<f64> for Coordinate {
    fn from(value: f64) -> Self {
        Self {
            value,
            integral: false,
        }
    }
}

impl From<i64> for Coordinate {
    fn from(value: i64) -> Self {
        Self {
            value: value as f64,
            integral: true,
        }
    }
}

impl PartialEq for Coordinate {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl PartialEq<f64> for Coordinate {
    fn eq(&self, other: &f64) -> bool {
        self.value == *other
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl Serialize for Coordinate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // `i64::MAX as f64` rounds up to 2^63, hence the strict upper bound.
        let fits = self.value.fract() == 0.0
            && self.value >= i64::MIN as f64
            && self.value < i64::MAX as f64;
        if self.integral && fits {
            serializer.serialize_i64(self.value as i64)
        } else {
            serializer.serialize_f64(self.value)
        }
    }
}

struct CoordinateVisitor;

impl Visitor<'_> for CoordinateVisitor {
    type Value = Coordinate;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Coordinate, E> {
        Ok(Coordinate::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Coordinate, E> {
        Ok(Coordinate {
            value: v as f64,
            integral: i64::try_from(v).is_ok(),
        })
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Coordinate, E> {
        Ok(Coordinate::from(v))
    }
}

impl<'de> Deserialize<'de> for Coordinate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(CoordinateVisitor)
    }
}

/// Canvas coordinates of a node.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: Coordinate,
    pub y: Coordinate,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
        }
    }
}

/// Last known execution status, displayed on the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    #[default]
    Idle,
    Pending,
    Running,
    Success,
    Error,
}

/// The mutable payload of a node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub config: Config,
    /// The node's current output schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<NodeStatus>,
}

/// A component instance on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    #[serde(rename = "type", alias = "componentType")]
    pub component_type: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub data: NodeData,
}

impl Node {
    pub fn new(
        id: impl Into<String>,
        component_type: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            component_type: component_type.into(),
            position: Position::default(),
            data: NodeData {
                label: label.into(),
                ..NodeData::default()
            },
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.data.config = config;
        self
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.data.schema = Some(schema);
        self
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.data.schema.as_ref()
    }
}

/// The four-part identity of a connection: endpoints plus optional handles.
///
/// Used both as the candidate passed to `connect` and as the replacement
/// endpoints passed to `reconnect`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeEndpoints {
    #[serde(alias = "sourceNodeId")]
    pub source: String,
    #[serde(alias = "targetNodeId")]
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
}

impl EdgeEndpoints {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            source_handle: None,
            target_handle: None,
        }
    }

    pub fn with_source_handle(mut self, handle: impl Into<String>) -> Self {
        self.source_handle = Some(handle.into());
        self
    }

    pub fn with_target_handle(mut self, handle: impl Into<String>) -> Self {
        self.target_handle = Some(handle.into());
        self
    }
}

impl fmt::Display for EdgeEndpoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)?;
        if let Some(handle) = &self.source_handle {
            write!(f, ":{}", handle)?;
        }
        write!(f, "-{}", self.target)?;
        if let Some(handle) = &self.target_handle {
            write!(f, ":{}", handle)?;
        }
        Ok(())
    }
}

/// A directed connection between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    #[serde(alias = "sourceNodeId")]
    pub source: String,
    #[serde(alias = "targetNodeId")]
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
}

impl Edge {
    pub fn new(id: impl Into<String>, endpoints: EdgeEndpoints) -> Self {
        Self {
            id: id.into(),
            source: endpoints.source,
            target: endpoints.target,
            source_handle: endpoints.source_handle,
            target_handle: endpoints.target_handle,
        }
    }

    pub fn endpoints(&self) -> EdgeEndpoints {
        EdgeEndpoints {
            source: self.source.clone(),
            target: self.target.clone(),
            source_handle: self.source_handle.clone(),
            target_handle: self.target_handle.clone(),
        }
    }

    /// True when this edge has exactly the given duplicate-detection tuple.
    pub fn matches(&self, endpoints: &EdgeEndpoints) -> bool {
        self.source == endpoints.source
            && self.target == endpoints.target
            && self.source_handle == endpoints.source_handle
            && self.target_handle == endpoints.target_handle
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }

    pub(crate) fn set_endpoints(&mut self, endpoints: EdgeEndpoints) {
        self.source = endpoints.source;
        self.target = endpoints.target;
        self.source_handle = endpoints.source_handle;
        self.target_handle = endpoints.target_handle;
    }
}
