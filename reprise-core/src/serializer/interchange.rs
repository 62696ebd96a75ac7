//! Typed conversion between [`Value`] and `serde_json::Value`
//!
//! Encoding is shape-driven and needs no type information. Decoding walks
//! the target [`TypeHandle`]: containers take their element types from the
//! handle's arguments, generic objects route each slot field through the
//! matching argument, and anything the handle does not describe is inferred
//! from the JSON itself.

use serde_json::{Map as JsonMap, Number, Value as JsonValue};
use std::sync::Arc;

use crate::error::{RepriseError, Result};
use crate::types::{names, TypeHandle, TypeKind, TypeRegistry};
use crate::value::{Failure, MapValue, Object, Sequence, Value};

/// Field carrying a failure's message
const MESSAGE_FIELD: &str = "message";

/// Encode a value as JSON
pub(crate) fn to_json(value: &Value) -> Result<JsonValue> {
    Ok(match value {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Int(i) => JsonValue::Number((*i).into()),
        Value::Float(f) => Number::from_f64(*f)
            .map(JsonValue::Number)
            .ok_or_else(|| RepriseError::unserializable(names::FLOAT, format!("{} is not finite", f)))?,
        Value::Str(s) => JsonValue::String(s.clone()),
        Value::Seq(seq) => JsonValue::Array(seq.iter().map(to_json).collect::<Result<_>>()?),
        Value::Array(items) => JsonValue::Array(items.iter().map(to_json).collect::<Result<_>>()?),
        Value::Map(map) => {
            let mut object = JsonMap::new();
            for (key, entry) in &map.entries {
                object.insert(map_key(key)?, to_json(entry)?);
            }
            JsonValue::Object(object)
        }
        Value::Optional(inner) => match inner {
            Some(inner) => to_json(inner)?,
            None => JsonValue::Null,
        },
        Value::Object(object) => {
            let mut fields = JsonMap::new();
            for (name, field) in &object.fields {
                fields.insert(name.clone(), to_json(field)?);
            }
            JsonValue::Object(fields)
        }
        Value::Failure(failure) => {
            let mut fields = JsonMap::new();
            fields.insert(
                MESSAGE_FIELD.to_string(),
                JsonValue::String(failure.message.clone()),
            );
            JsonValue::Object(fields)
        }
        Value::Type(_) | Value::Pending(_) | Value::Opaque(_) => {
            return Err(RepriseError::unserializable(
                value.type_name(),
                "value has no serialized form",
            ));
        }
    })
}

fn map_key(key: &Value) -> Result<String> {
    match key {
        Value::Str(s) => Ok(s.clone()),
        Value::Null => Ok(names::NULL.to_string()),
        other => other.scalar_text().ok_or_else(|| {
            RepriseError::unserializable(other.type_name(), "map keys must be scalars")
        }),
    }
}

/// Decode JSON against a type handle
pub(crate) fn from_json(json: JsonValue, handle: &TypeHandle, registry: &TypeRegistry) -> Result<Value> {
    if json.is_null() {
        return Ok(match handle.kind() {
            TypeKind::Optional => Value::Optional(None),
            _ => Value::Null,
        });
    }

    match handle.kind() {
        TypeKind::Scalar => scalar_from_json(json, handle.name()),
        TypeKind::Sequence | TypeKind::MapValues => {
            sequence_from_json(json, handle.name(), handle.arg(0), registry).map(Value::Seq)
        }
        TypeKind::Map => map_from_json(json, handle, registry),
        TypeKind::Optional => {
            let inner = match handle.arg(0) {
                Some(arg) => from_json(json, arg, registry)?,
                None => infer(json),
            };
            Ok(Value::optional(Some(inner)))
        }
        TypeKind::Array => match json {
            JsonValue::Array(items) => Ok(Value::Array(items.into_iter().map(infer).collect())),
            other => Err(mismatch(handle, "an array", &other)),
        },
        TypeKind::Object => object_from_json(json, handle, registry),
        TypeKind::Failure => match json {
            JsonValue::Object(mut fields) => {
                let message = match fields.remove(MESSAGE_FIELD) {
                    Some(JsonValue::String(message)) => message,
                    Some(other) => other.to_string(),
                    None => String::new(),
                };
                Ok(Value::Failure(Failure::new(handle.name(), message)))
            }
            JsonValue::String(message) => Ok(Value::Failure(Failure::new(handle.name(), message))),
            other => Err(mismatch(handle, "a failure object", &other)),
        },
        TypeKind::AsyncHandle => Err(RepriseError::deserialize(
            handle.to_string(),
            "asynchronous handles are recorded by their resolved value",
        )),
    }
}

fn scalar_from_json(json: JsonValue, type_name: &str) -> Result<Value> {
    let value = match (type_name, json) {
        (names::INTEGER, JsonValue::Number(n)) => n.as_i64().map(Value::Int),
        (names::INTEGER, JsonValue::String(s)) => s.parse().ok().map(Value::Int),
        (names::FLOAT, JsonValue::Number(n)) => n.as_f64().map(Value::Float),
        (names::FLOAT, JsonValue::String(s)) => s.parse().ok().map(Value::Float),
        (names::BOOLEAN, JsonValue::Bool(b)) => Some(Value::Bool(b)),
        (names::BOOLEAN, JsonValue::String(s)) => s.parse().ok().map(Value::Bool),
        (names::STRING, JsonValue::String(s)) => Some(Value::Str(s)),
        // lenient: numbers and booleans read as their text
        (names::STRING, other @ (JsonValue::Number(_) | JsonValue::Bool(_))) => {
            Some(Value::Str(other.to_string()))
        }
        (_, other) => {
            return Err(RepriseError::deserialize(
                type_name,
                format!("unexpected {}", json_kind(&other)),
            ));
        }
    };
    value.ok_or_else(|| RepriseError::deserialize(type_name, "value out of range"))
}

fn sequence_from_json(
    json: JsonValue,
    type_name: &str,
    element: Option<&Arc<TypeHandle>>,
    registry: &TypeRegistry,
) -> Result<Sequence> {
    let JsonValue::Array(items) = json else {
        return Err(RepriseError::deserialize(
            type_name,
            format!("expected an array, found {}", json_kind(&json)),
        ));
    };

    let items = match element {
        Some(element) => items
            .into_iter()
            .map(|item| from_json(item, element, registry))
            .collect::<Result<Vec<_>>>()?,
        None => items.into_iter().map(infer).collect(),
    };
    Ok(Sequence::new(type_name, items))
}

fn map_from_json(json: JsonValue, handle: &TypeHandle, registry: &TypeRegistry) -> Result<Value> {
    let JsonValue::Object(entries) = json else {
        return Err(mismatch(handle, "an object", &json));
    };

    // single-parameter maps have string keys
    let key_handle = if handle.args().len() == 2 { handle.arg(0) } else { None };
    let value_handle = handle.args().last();

    let mut map = MapValue::new(handle.name(), Vec::with_capacity(entries.len()));
    for (key, entry) in entries {
        let key = match key_handle {
            Some(key_handle) => scalar_from_json(JsonValue::String(key), key_handle.name())?,
            None => Value::Str(key),
        };
        let entry = match value_handle {
            Some(value_handle) => from_json(entry, value_handle, registry)?,
            None => infer(entry),
        };
        map.insert(key, entry);
    }
    Ok(Value::Map(map))
}

fn object_from_json(json: JsonValue, handle: &TypeHandle, registry: &TypeRegistry) -> Result<Value> {
    let JsonValue::Object(fields) = json else {
        return Err(mismatch(handle, "an object", &json));
    };

    let mut object = Object::new(handle.name());
    for (name, field) in fields {
        let value = match slot_argument(handle, &name, registry) {
            Some((arg, true)) => Value::Seq(sequence_from_json(field, names::LIST, Some(arg), registry)?),
            Some((arg, false)) => from_json(field, arg, registry)?,
            None => infer(field),
        };
        object.fields.insert(name, value);
    }
    Ok(Value::Object(object))
}

/// Type argument bound to `field` through a generic slot, with the slot's sequence flag
fn slot_argument<'a>(
    handle: &'a TypeHandle,
    field: &str,
    registry: &TypeRegistry,
) -> Option<(&'a Arc<TypeHandle>, bool)> {
    handle
        .raw()
        .params()
        .iter()
        .enumerate()
        .find_map(|(i, param)| {
            let slot = registry.generic_slot(handle.name(), param)?;
            if slot.field != field {
                return None;
            }
            handle.arg(i).map(|arg| (arg, slot.sequence))
        })
}

/// Rebuild a value from JSON alone
pub(crate) fn infer(json: JsonValue) -> Value {
    match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or_default()),
        },
        JsonValue::String(s) => Value::Str(s),
        JsonValue::Array(items) => Value::list(items.into_iter().map(infer).collect()),
        JsonValue::Object(entries) => Value::map(
            entries
                .into_iter()
                .map(|(k, v)| (Value::Str(k), infer(v)))
                .collect(),
        ),
    }
}

fn mismatch(handle: &TypeHandle, expected: &str, found: &JsonValue) -> RepriseError {
    RepriseError::deserialize(
        handle.to_string(),
        format!("expected {}, found {}", expected, json_kind(found)),
    )
}

fn json_kind(json: &JsonValue) -> &'static str {
    match json {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
