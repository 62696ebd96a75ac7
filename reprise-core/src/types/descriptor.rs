//! Describing a value's runtime shape as a descriptor string
//!
//! Grammar, with `-` splitting a raw type from its arguments:
//!
//! - `Type` for plain types and empty containers
//! - `Raw-Arg` for one-argument types (`List-String`, `Optional-Integer`)
//! - `Raw-Key,Value` for two-argument maps (`Map-String,Integer`)
//! - `Outer-Inner,Elem1,Elem2,...` for a sequence of sequences, one element
//!   type per inner sequence (`List-List,String,Integer`)

use super::codec::TypeCodec;
use super::handle::TypeHandle;
use super::names::{self, COMMA, HORIZONTAL_LINE};
use super::registry::TypeKind;
use crate::value::{MapValue, Object, Sequence, Value};

impl TypeCodec {
    /// Describe a value's shape; `None` for [`Value::Null`]
    pub fn describe(&self, value: &Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::Map(map) => Some(self.map_to_string(map)),
            Value::Optional(inner) => Some(self.optional_to_string(inner.as_deref())),
            Value::Seq(seq) => Some(self.sequence_to_string(seq)),
            Value::Type(handle) => Some(handle_to_string(handle)),
            Value::Object(object) if self.is_generic(object) => {
                Some(self.generic_to_string(object))
            }
            other => Some(other.type_name().to_string()),
        }
    }

    /// Best-effort type description used in serialization failure logs
    ///
    /// Argument arrays are described by their element type names.
    pub fn error_description(&self, value: &Value) -> String {
        match value {
            Value::Array(items) => items
                .iter()
                .map(|item| item.type_name())
                .collect::<Vec<_>>()
                .join(","),
            other => self
                .describe(other)
                .unwrap_or_else(|| names::NULL.to_string()),
        }
    }

    fn map_to_string(&self, map: &MapValue) -> String {
        if map.is_empty() {
            return map.type_name.clone();
        }

        let param_count = self
            .registry()
            .lookup(&map.type_name)
            .map(|def| def.params().len())
            .unwrap_or(0);
        if param_count == 0 {
            return map.type_name.clone();
        }

        let mut builder = format!("{}{}", map.type_name, HORIZONTAL_LINE);
        // only the first entry is inspected
        if let Some((key, value)) = map.entries.first() {
            let value_name = self
                .describe(value)
                .unwrap_or_else(|| names::DEFAULT_TYPE_NAME.to_string());
            if param_count == 1 {
                builder.push_str(&value_name);
            } else {
                let key_name = if key.is_null() {
                    names::DEFAULT_TYPE_NAME
                } else {
                    key.type_name()
                };
                builder.push_str(key_name);
                builder.push(COMMA);
                builder.push_str(&value_name);
            }
        }
        builder
    }

    fn optional_to_string(&self, inner: Option<&Value>) -> String {
        let mut builder = names::OPTIONAL.to_string();
        if let Some(inner) = inner.and_then(|v| self.describe(v)) {
            builder.push(HORIZONTAL_LINE);
            builder.push_str(&inner);
        }
        builder
    }

    fn sequence_to_string(&self, seq: &Sequence) -> String {
        let mut builder = seq.type_name.clone();
        if seq.is_empty() {
            return builder;
        }
        builder.push(HORIZONTAL_LINE);

        let mut parts: Vec<String> = Vec::new();
        let mut append_inner_type = true;
        for inner in seq.iter() {
            if inner.is_null() {
                continue;
            }

            let Value::Seq(inner_seq) = inner else {
                // scalar elements: the first one decides
                if let Some(name) = self.describe(inner) {
                    builder.push_str(&name);
                }
                return builder;
            };

            if append_inner_type {
                parts.push(inner_seq.type_name.clone());
                append_inner_type = false;
            }

            // inner sequences are assumed uniform past their first non-null element
            if let Some(first) = inner_seq.iter().find(|e| !e.is_null()) {
                parts.push(first.type_name().to_string());
            }
        }

        builder.push_str(&parts.join(","));
        builder
    }

    fn is_generic(&self, object: &Object) -> bool {
        self.registry()
            .lookup(&object.type_name)
            .is_some_and(|def| def.kind() == TypeKind::Object && !def.params().is_empty())
    }

    fn generic_to_string(&self, object: &Object) -> String {
        let mut builder = format!("{}{}", object.type_name, HORIZONTAL_LINE);
        let Some(def) = self.registry().lookup(&object.type_name) else {
            return builder;
        };

        let params = def.params();
        for (i, param) in params.iter().enumerate() {
            let Some(slot) = self.registry().generic_slot(&object.type_name, param) else {
                return builder;
            };

            let mut generic = slot.read(object).and_then(|v| self.describe(v));
            if slot.sequence {
                generic = Some(self.filter_raw_generic_type(generic.as_deref()));
            }

            if let Some(generic) = generic.filter(|g| !g.is_empty()) {
                builder.push_str(&generic);
            }
            if i == params.len() - 1 {
                return builder;
            }
            builder.push(COMMA);
        }
        builder
    }

    /// Strip sequence wrappers from a slot descriptor: `List-String` becomes `String`
    ///
    /// An unset slot yields an empty string rather than `null`, so the
    /// enclosing descriptor stays resolvable.
    fn filter_raw_generic_type(&self, generic: Option<&str>) -> String {
        let Some(generic) = generic.filter(|g| !g.is_empty()) else {
            return String::new();
        };

        generic
            .split(HORIZONTAL_LINE)
            .filter(|part| {
                !part.eq_ignore_ascii_case(names::NULL) && !self.registry().is_sequence(part)
            })
            .collect::<Vec<_>>()
            .join("-")
    }
}

/// `Raw-FirstArg` for parameterized handles, the raw name otherwise
///
/// The first argument keeps its own arguments (`Optional-List-String`).
fn handle_to_string(handle: &TypeHandle) -> String {
    match handle.arg(0) {
        Some(first) => format!("{}{}{}", handle.name(), HORIZONTAL_LINE, argument_to_string(first)),
        None => handle.name().to_string(),
    }
}

/// Full descriptor of a type argument, every argument included
fn argument_to_string(handle: &TypeHandle) -> String {
    let args = handle.args();
    if args.is_empty() {
        return handle.name().to_string();
    }

    let args = args
        .iter()
        .map(|arg| argument_to_string(arg))
        .collect::<Vec<_>>()
        .join(&COMMA.to_string());
    format!("{}{}{}", handle.name(), HORIZONTAL_LINE, args)
}
