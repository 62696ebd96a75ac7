//! YAML string serializer

use std::sync::Arc;

use super::interchange::{from_json, to_json};
use super::StringSerializer;
use crate::error::Result;
use crate::types::{TypeHandle, TypeRegistry};
use crate::value::Value;

/// YAML serializer backed by `serde_yaml`, sharing the JSON data model
#[derive(Debug, Clone)]
pub struct YamlSerializer {
    registry: Arc<TypeRegistry>,
}

impl YamlSerializer {
    /// Registered name
    pub const NAME: &'static str = "yaml";

    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self { registry }
    }
}

impl StringSerializer for YamlSerializer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn serialize(&self, value: &Value) -> Result<String> {
        Ok(serde_yaml::to_string(&to_json(value)?)?)
    }

    fn deserialize(&self, text: &str, handle: &TypeHandle) -> Result<Value> {
        let json: serde_json::Value = serde_yaml::from_str(text)?;
        from_json(json, handle, &self.registry)
    }
}
