//! JSON string serializer

use std::sync::Arc;

use super::interchange::{from_json, to_json};
use super::StringSerializer;
use crate::error::Result;
use crate::types::{TypeHandle, TypeRegistry};
use crate::value::Value;

/// JSON serializer backed by `serde_json`
///
/// Registered under [`JsonSerializer::NAME`]. Failures are always encoded
/// with this serializer, whatever the caller asked for.
#[derive(Debug, Clone)]
pub struct JsonSerializer {
    registry: Arc<TypeRegistry>,
    default: bool,
}

impl JsonSerializer {
    /// Registered name
    pub const NAME: &'static str = "json";

    /// Create a JSON serializer that reports itself as the default
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            default: true,
        }
    }

    /// Builder: whether this serializer reports itself as the default
    pub fn with_default(mut self, default: bool) -> Self {
        self.default = default;
        self
    }
}

impl StringSerializer for JsonSerializer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn is_default(&self) -> bool {
        self.default
    }

    fn serialize(&self, value: &Value) -> Result<String> {
        Ok(serde_json::to_string(&to_json(value)?)?)
    }

    fn deserialize(&self, text: &str, handle: &TypeHandle) -> Result<Value> {
        let json: serde_json::Value = serde_json::from_str(text)?;
        from_json(json, handle, &self.registry)
    }
}
