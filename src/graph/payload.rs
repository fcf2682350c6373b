use super::{Config, NodeStatus};
use crate::error::PayloadError;
use crate::schema::Schema;
use serde::Deserialize;

/// A component dropped onto the canvas from the palette.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNodePayload {
    pub component_type: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub config: Config,
}

impl NewNodePayload {
    pub fn new(component_type: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            component_type: component_type.into(),
            label: label.into(),
            config: Config::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, PayloadError> {
        let payload: NewNodePayload = serde_json::from_str(json)?;
        if payload.component_type.trim().is_empty() {
            return Err(PayloadError::Invalid(
                "componentType must not be empty".to_string(),
            ));
        }
        Ok(payload)
    }
}

/// A partial update of a node's data, as submitted by a configuration form.
/// Fields left as `None` are not touched.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePatch {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub config: Option<Config>,
    #[serde(default)]
    pub schema: Option<Schema>,
    #[serde(default)]
    pub status: Option<NodeStatus>,
}

impl NodePatch {
    pub fn from_json(json: &str) -> Result<Self, PayloadError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }

    pub fn config(config: Config) -> Self {
        Self {
            config: Some(config),
            ..Self::default()
        }
    }

    pub fn schema(schema: Schema) -> Self {
        Self {
            schema: Some(schema),
            ..Self::default()
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.label.is_none() && self.config.is_none() && self.schema.is_none() && self.status.is_none()
    }
}
