use crate::error::{FgaError, Result};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::path::Path;

/// Authorization model document in the engine's JSON format.
///
/// Only the outer shape is checked here; the engine compiles and validates
/// the type definitions themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDefinition {
    document: Value,
}

impl ModelDefinition {
    pub fn parse(text: &str) -> Result<Self> {
        let document: Value = serde_json::from_str(text)
            .map_err(|e| FgaError::InvalidModel(format!("Model document is not valid JSON: {}", e)))?;
        Self::from_json(document)
    }

    pub fn from_json(document: Value) -> Result<Self> {
        let root = document
            .as_object()
            .ok_or_else(|| FgaError::InvalidModel("Model document must be a JSON object".to_string()))?;

        match root.get("schema_version") {
            Some(Value::String(_)) => {}
            _ => {
                return Err(FgaError::InvalidModel(
                    "Model document is missing a string 'schema_version'".to_string(),
                ))
            }
        }

        let type_definitions = root
            .get("type_definitions")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                FgaError::InvalidModel("Model document is missing a 'type_definitions' array".to_string())
            })?;

        for (index, definition) in type_definitions.iter().enumerate() {
            if definition.get("type").and_then(Value::as_str).is_none() {
                return Err(FgaError::InvalidModel(format!(
                    "Type definition {} has no string 'type'",
                    index
                )));
            }
        }

        Ok(Self { document })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn schema_version(&self) -> &str {
        self.document
            .get("schema_version")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Declared object types, in document order
    pub fn type_names(&self) -> Vec<&str> {
        self.document
            .get("type_definitions")
            .and_then(Value::as_array)
            .map(|definitions| {
                definitions
                    .iter()
                    .filter_map(|d| d.get("type").and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn as_json(&self) -> &Value {
        &self.document
    }
}

impl Serialize for ModelDefinition {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.document.serialize(serializer)
    }
}
