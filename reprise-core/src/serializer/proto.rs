//! Protocol-buffer payload codec
//!
//! Messages are recorded in the proto3 JSON mapping: field names in
//! lowerCamelCase on the wire, snake_case on the decoded object.

use serde_json::{Map as JsonMap, Value as JsonValue};

use super::interchange::{infer, to_json};
use crate::error::{RepriseError, Result};
use crate::types::{names, TypeHandle, TypeKind};
use crate::value::{Object, Sequence, Value};

/// Codec used for results tagged `Format=protobuf`
pub trait ProtoCodec: Send + Sync {
    /// Encode a message, or a sequence of messages
    fn serialize(&self, value: &Value) -> Result<String>;

    /// Decode a message, or a sequence of messages, of the given type
    fn deserialize(&self, text: &str, handle: &TypeHandle) -> Result<Value>;
}

/// Proto3-JSON codec
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtoJsonCodec;

impl ProtoJsonCodec {
    pub fn new() -> Self {
        Self
    }

    fn encode(value: &Value) -> Result<JsonValue> {
        match value {
            Value::Object(object) => {
                let mut fields = JsonMap::new();
                for (name, field) in &object.fields {
                    fields.insert(to_camel_case(name), Self::encode(field)?);
                }
                Ok(JsonValue::Object(fields))
            }
            Value::Seq(seq) => Ok(JsonValue::Array(
                seq.iter().map(Self::encode).collect::<Result<_>>()?,
            )),
            other => to_json(other),
        }
    }

    fn decode_message(json: JsonValue, type_name: &str) -> Result<Value> {
        let JsonValue::Object(fields) = json else {
            return Err(RepriseError::deserialize(type_name, "expected a message object"));
        };

        let mut message = Object::new(type_name);
        for (name, field) in fields {
            message.fields.insert(to_snake_case(&name), infer(field));
        }
        Ok(Value::Object(message))
    }
}

impl ProtoCodec for ProtoJsonCodec {
    fn serialize(&self, value: &Value) -> Result<String> {
        Ok(serde_json::to_string(&Self::encode(value)?)?)
    }

    fn deserialize(&self, text: &str, handle: &TypeHandle) -> Result<Value> {
        let json: JsonValue = serde_json::from_str(text)?;
        if !handle.kind().is_sequence() {
            return Self::decode_message(json, handle.name());
        }

        let element = handle
            .arg(0)
            .filter(|arg| arg.kind() == TypeKind::Object)
            .ok_or_else(|| {
                RepriseError::deserialize(handle.to_string(), "sequence has no message type")
            })?;
        let JsonValue::Array(items) = json else {
            return Err(RepriseError::deserialize(handle.to_string(), "expected an array"));
        };

        let items = items
            .into_iter()
            .map(|item| match item {
                JsonValue::Null => Ok(Value::Null),
                item => Self::decode_message(item, element.name()),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Value::Seq(Sequence::new(handle.name(), items)))
    }
}

fn to_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '_' {
            upper = !out.is_empty();
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            if !out.is_empty() {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Attribute key marking a response's payload format
pub const FORMAT_ATTRIBUTE: &str = "Format";

/// [`FORMAT_ATTRIBUTE`] value for protocol-buffer payloads
pub const PROTOBUF_FORMAT: &str = "protobuf";

/// Whether a response's attributes tag it as a protocol-buffer payload
pub fn is_protobuf_format(attributes: &std::collections::HashMap<String, String>) -> bool {
    attributes
        .get(FORMAT_ATTRIBUTE)
        .is_some_and(|format| format == PROTOBUF_FORMAT)
}
