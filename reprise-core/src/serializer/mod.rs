//! Serialization facade
//!
//! Dispatches to named [`StringSerializer`]s and layers the record format's
//! special cases on top of them:
//!
//! - Failures are always encoded with the JSON serializer.
//! - A sequence of sequences is encoded one inner sequence at a time, the
//!   chunks joined with [`SERIALIZE_SEPARATOR`], and decoded back through a
//!   `Outer-Inner,Elem1,Elem2,...` descriptor.
//! - A map's collected-values view is decoded as a list and re-projected.
//!
//! The facade is built once per process (see [`crate::engine::Engine`]) and
//! shared by reference.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use reprise_core::serializer::{JsonSerializer, Serializer};
//! use reprise_core::types::{TypeCodec, TypeRegistry};
//! use reprise_core::value::Value;
//!
//! let registry = Arc::new(TypeRegistry::with_builtins());
//! let serializer = Serializer::builder(Arc::new(TypeCodec::new(registry.clone())))
//!     .default_serializer(Arc::new(JsonSerializer::new(registry)))
//!     .build()
//!     .unwrap();
//!
//! let text = serializer.serialize(&Value::list(vec![Value::str("a")]), None).unwrap();
//! assert_eq!(text, r#"["a"]"#);
//! ```

mod interchange;
mod json;
mod proto;
mod yaml;

pub use json::JsonSerializer;
pub use proto::{is_protobuf_format, ProtoCodec, ProtoJsonCodec, FORMAT_ATTRIBUTE, PROTOBUF_FORMAT};
pub use yaml::YamlSerializer;

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{RepriseError, Result};
use crate::types::names::{self, COMMA, HORIZONTAL_LINE};
use crate::types::{TypeCodec, TypeHandle};
use crate::value::{MapValue, Sequence, Value};

/// Separator between inner-sequence chunks of a nested sequence
pub const SERIALIZE_SEPARATOR: &str = "A@R#E$X";

/// Serialized form of an empty inner sequence
pub const EMPTY_LIST_JSON: &str = "[]";

/// Serializer used for failures regardless of the requested name
pub const FAILURE_SERIALIZER: &str = JsonSerializer::NAME;

/// Descriptor suffixes naming a failure type
const FAILURE_SUFFIXES: [&str; 2] = ["Exception", "Error"];

/// A pluggable text serializer
pub trait StringSerializer: Send + Sync {
    /// Registered name
    fn name(&self) -> &str;

    /// Whether this serializer should become the facade's default
    fn is_default(&self) -> bool {
        false
    }

    /// Encode a value
    fn serialize(&self, value: &Value) -> Result<String>;

    /// Decode text against a resolved type
    fn deserialize(&self, text: &str, handle: &TypeHandle) -> Result<Value>;
}

/// Serialization facade over named serializers
pub struct Serializer {
    default: Arc<dyn StringSerializer>,
    serializers: HashMap<String, Arc<dyn StringSerializer>>,
    codec: Arc<TypeCodec>,
}

impl std::fmt::Debug for Serializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.serializers.keys().collect();
        names.sort();
        f.debug_struct("Serializer")
            .field("default", &self.default.name())
            .field("serializers", &names)
            .finish()
    }
}

impl Serializer {
    /// Start building a facade over a descriptor codec
    pub fn builder(codec: Arc<TypeCodec>) -> SerializerBuilder {
        SerializerBuilder {
            codec,
            default: None,
            serializers: HashMap::new(),
        }
    }

    /// Build a facade from a list, taking the serializer that reports
    /// [`StringSerializer::is_default`] as the default
    pub fn from_serializers(
        codec: Arc<TypeCodec>,
        serializers: Vec<Arc<dyn StringSerializer>>,
    ) -> Result<Self> {
        serializers
            .into_iter()
            .fold(Self::builder(codec), |builder, serializer| {
                builder.add_serializer(serializer)
            })
            .build()
    }

    /// The descriptor codec
    pub fn codec(&self) -> &Arc<TypeCodec> {
        &self.codec
    }

    /// The default serializer
    pub fn default_serializer(&self) -> &Arc<dyn StringSerializer> {
        &self.default
    }

    /// Look up a serializer, falling back to the default when `name` is
    /// `None` or unregistered
    pub fn serializer(&self, name: Option<&str>) -> &Arc<dyn StringSerializer> {
        name.and_then(|name| self.serializers.get(name))
            .unwrap_or(&self.default)
    }

    /// Serialize a value, logging failures and yielding `None` in their place
    pub fn serialize(&self, value: &Value, serializer: Option<&str>) -> Option<String> {
        match self.serialize_with_error(value, serializer) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(
                    value_type = %self.codec.error_description(value),
                    error = %e,
                    "Failed to serialize value"
                );
                None
            }
        }
    }

    /// Serialize a value, reporting failures
    ///
    /// `Ok(None)` means there was nothing to serialize.
    pub fn serialize_with_error(&self, value: &Value, serializer: Option<&str>) -> Result<Option<String>> {
        if value.is_null() {
            return Ok(None);
        }

        let serializer = if value.is_failure() {
            Some(FAILURE_SERIALIZER)
        } else {
            serializer
        };

        if let Some(nested) = as_nested_sequence(value) {
            return self.serialize_nested_sequence(nested, serializer).map(Some);
        }

        self.serializer(serializer).serialize(value).map(Some)
    }

    fn serialize_nested_sequence(&self, nested: &Sequence, serializer: Option<&str>) -> Result<String> {
        let mut chunks = Vec::with_capacity(nested.len());
        for inner in nested.iter() {
            let chunk = match inner {
                Value::Seq(inner) if inner.is_empty() => EMPTY_LIST_JSON.to_string(),
                Value::Null => names::NULL.to_string(),
                inner => self
                    .serialize_with_error(inner, serializer)?
                    .unwrap_or_else(|| names::NULL.to_string()),
            };
            chunks.push(chunk);
        }
        Ok(chunks.join(SERIALIZE_SEPARATOR))
    }

    /// Deserialize text against a descriptor, logging failures and yielding
    /// `None` in their place
    ///
    /// Empty text or an empty descriptor yields `None` without logging.
    pub fn deserialize(&self, text: &str, descriptor: &str, serializer: Option<&str>) -> Option<Value> {
        if text.is_empty() || descriptor.is_empty() {
            return None;
        }

        let serializer = if FAILURE_SUFFIXES.iter().any(|s| descriptor.ends_with(s)) {
            Some(FAILURE_SERIALIZER)
        } else {
            serializer
        };

        if descriptor.starts_with(names::MAP_VALUES) {
            return Some(self.restore_map_values(text, descriptor, serializer));
        }

        if let Some((outer, inner_types)) = self.nested_sequence_types(descriptor) {
            return Some(self.deserialize_nested_sequence(text, outer, &inner_types, serializer));
        }

        let handle = self.codec.resolve(descriptor)?;
        self.deserialize_type(text, &handle, serializer)
    }

    /// Deserialize text against a resolved type, logging failures
    pub fn deserialize_type(&self, text: &str, handle: &TypeHandle, serializer: Option<&str>) -> Option<Value> {
        if text.is_empty() {
            return None;
        }

        match self.serializer(serializer).deserialize(text, handle) {
            Ok(Value::Null) => None,
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(
                    type_name = %handle,
                    error = %e,
                    "Failed to deserialize value"
                );
                None
            }
        }
    }

    /// `(outer, [inner, elem1, elem2, ...])` when both the outer type and the
    /// first inner segment are sequence types
    fn nested_sequence_types<'a>(&self, descriptor: &'a str) -> Option<(&'a str, Vec<&'a str>)> {
        let (outer, rest) = descriptor.split_once(HORIZONTAL_LINE)?;
        let registry = self.codec.registry();
        if !registry.is_sequence(outer) {
            return None;
        }

        let inner_types: Vec<&str> = rest.split(COMMA).collect();
        if !registry.is_sequence(inner_types[0]) {
            return None;
        }
        Some((outer, inner_types))
    }

    fn deserialize_nested_sequence(
        &self,
        text: &str,
        outer: &str,
        inner_types: &[&str],
        serializer: Option<&str>,
    ) -> Value {
        let inner_container = inner_types[0];
        let mut nested = Sequence::empty(outer);

        // element types are consumed one per typed chunk; extra chunks are dropped
        let mut element_index = 1;
        for chunk in text.split(SERIALIZE_SEPARATOR) {
            if chunk == EMPTY_LIST_JSON {
                nested.items.push(Value::Seq(Sequence::empty(inner_container)));
                continue;
            }

            if chunk.eq_ignore_ascii_case(names::NULL) {
                nested.items.push(Value::Null);
                continue;
            }

            if let Some(element) = inner_types.get(element_index) {
                let descriptor = format!("{}{}{}", inner_container, HORIZONTAL_LINE, element);
                let inner = self
                    .codec
                    .resolve(&descriptor)
                    .and_then(|handle| self.deserialize_type(chunk, &handle, serializer))
                    .unwrap_or(Value::Null);
                nested.items.push(inner);
                element_index += 1;
            }
        }

        Value::Seq(nested)
    }

    /// Decode a map-values view as a list, then project it back out of a
    /// positionally indexed map
    fn restore_map_values(&self, text: &str, descriptor: &str, serializer: Option<&str>) -> Value {
        let list_descriptor = descriptor.replace(names::MAP_VALUES, names::LIST);
        let items = self
            .codec
            .resolve(&list_descriptor)
            .and_then(|handle| self.deserialize_type(text, &handle, serializer));

        let Some(Value::Seq(items)) = items else {
            return Value::Seq(Sequence::empty(names::MAP_VALUES));
        };

        let mut map = MapValue::new(names::MAP, Vec::with_capacity(items.len()));
        for (index, item) in items.items.into_iter().enumerate() {
            map.insert(Value::Int(index as i64), item);
        }
        Value::Seq(map.values())
    }
}

/// A non-empty sequence whose elements are all sequences or null
fn as_nested_sequence(value: &Value) -> Option<&Sequence> {
    let seq = value.as_seq()?;
    if seq.is_empty() {
        return None;
    }
    seq.iter()
        .all(|inner| matches!(inner, Value::Seq(_) | Value::Null))
        .then_some(seq)
}

/// Builder for [`Serializer`]
pub struct SerializerBuilder {
    codec: Arc<TypeCodec>,
    default: Option<Arc<dyn StringSerializer>>,
    serializers: HashMap<String, Arc<dyn StringSerializer>>,
}

impl SerializerBuilder {
    /// Set the default serializer; it is also registered under its name
    pub fn default_serializer(mut self, serializer: Arc<dyn StringSerializer>) -> Self {
        self.serializers
            .insert(serializer.name().to_string(), serializer.clone());
        self.default = Some(serializer);
        self
    }

    /// Register a serializer under its name
    ///
    /// The first serializer reporting [`StringSerializer::is_default`]
    /// becomes the default unless one was set explicitly.
    pub fn add_serializer(mut self, serializer: Arc<dyn StringSerializer>) -> Self {
        if serializer.is_default() && self.default.is_none() {
            self.default = Some(serializer.clone());
        }
        self.serializers
            .insert(serializer.name().to_string(), serializer);
        self
    }

    /// Build the facade; fails when no default serializer was given
    pub fn build(self) -> Result<Serializer> {
        let default = self.default.ok_or_else(|| {
            RepriseError::Configuration("Default serializer is not set".to_string())
        })?;
        Ok(Serializer {
            default,
            serializers: self.serializers,
            codec: self.codec,
        })
    }
}

#[cfg(test)]
mod tests;
