//! Runtime value model
//!
//! Intercepted arguments and return values reach the engine as [`Value`]s.
//! A value carries enough shape information (container names, element
//! values, registered object type names) for the descriptor codec to
//! describe it and for a serializer to rebuild it from text.

mod future;

pub use future::{AsyncValue, Outcome};

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::types::{names, TypeHandle};

/// A value observed at an interception site
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value
    Null,

    /// Boolean scalar
    Bool(bool),

    /// Integer scalar
    Int(i64),

    /// Floating point scalar
    Float(f64),

    /// String scalar
    Str(String),

    /// Named sequence container (`List`, `Set`, `MapValues`, ...)
    Seq(Sequence),

    /// Fixed array, used for argument lists
    Array(Vec<Value>),

    /// Named map container with ordered entries
    Map(MapValue),

    /// Optional holding at most one value
    Optional(Option<Box<Value>>),

    /// Instance of a registered object type
    Object(Object),

    /// A failure (error value) returned or thrown by the real call
    Failure(Failure),

    /// A type handle passed around as a value
    Type(Arc<TypeHandle>),

    /// Pending asynchronous result
    Pending(AsyncValue),

    /// Native value no serializer can encode, identified by type name
    Opaque(String),
}

impl Value {
    /// Create a string value
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    /// Create a `List` sequence
    pub fn list(items: Vec<Value>) -> Self {
        Value::Seq(Sequence::list(items))
    }

    /// Create a `Set` sequence
    pub fn set(items: Vec<Value>) -> Self {
        Value::Seq(Sequence::new(names::SET, items))
    }

    /// Create a `Map` with the given entries
    pub fn map(entries: Vec<(Value, Value)>) -> Self {
        Value::Map(MapValue::map(entries))
    }

    /// Create an optional
    pub fn optional(inner: Option<Value>) -> Self {
        Value::Optional(inner.map(Box::new))
    }

    /// Create a failure value
    pub fn failure(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Value::Failure(Failure::new(type_name, message))
    }

    /// Whether this is [`Value::Null`]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether this is a failure value
    pub fn is_failure(&self) -> bool {
        matches!(self, Value::Failure(_))
    }

    /// Plain runtime type name, without any type arguments
    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => names::NULL,
            Value::Bool(_) => names::BOOLEAN,
            Value::Int(_) => names::INTEGER,
            Value::Float(_) => names::FLOAT,
            Value::Str(_) => names::STRING,
            Value::Seq(seq) => &seq.type_name,
            Value::Array(_) => names::ARRAY,
            Value::Map(map) => &map.type_name,
            Value::Optional(_) => names::OPTIONAL,
            Value::Object(object) => &object.type_name,
            Value::Failure(failure) => &failure.type_name,
            Value::Type(_) => names::TYPE,
            Value::Pending(pending) => pending.type_name(),
            Value::Opaque(type_name) => type_name,
        }
    }

    /// Element, entry or array length for container values
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Seq(seq) => Some(seq.len()),
            Value::Array(items) => Some(items.len()),
            Value::Map(map) => Some(map.len()),
            _ => None,
        }
    }

    /// Sequence items, if this is a sequence
    pub fn as_seq(&self) -> Option<&Sequence> {
        match self {
            Value::Seq(seq) => Some(seq),
            _ => None,
        }
    }

    /// Read a field of an object value
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Object(object) => object.field(name),
            _ => None,
        }
    }

    /// Text form used by key expressions; `None` for non-scalar values
    pub fn scalar_text(&self) -> Option<String> {
        match self {
            Value::Bool(b) => Some(b.to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Str(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

/// A named sequence container
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    /// Container type name
    pub type_name: String,

    /// Elements in iteration order
    pub items: Vec<Value>,
}

impl Sequence {
    /// Create a sequence of the given container type
    pub fn new(type_name: impl Into<String>, items: Vec<Value>) -> Self {
        Self {
            type_name: type_name.into(),
            items,
        }
    }

    /// Create a `List`
    pub fn list(items: Vec<Value>) -> Self {
        Self::new(names::LIST, items)
    }

    /// Create an empty sequence of the given container type
    pub fn empty(type_name: impl Into<String>) -> Self {
        Self::new(type_name, Vec::new())
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the sequence has no elements
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over the elements
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.items.iter()
    }
}

/// A named map container
#[derive(Debug, Clone, PartialEq)]
pub struct MapValue {
    /// Container type name
    pub type_name: String,

    /// Entries in iteration order
    pub entries: Vec<(Value, Value)>,
}

impl MapValue {
    /// Create a map of the given container type
    pub fn new(type_name: impl Into<String>, entries: Vec<(Value, Value)>) -> Self {
        Self {
            type_name: type_name.into(),
            entries,
        }
    }

    /// Create a `Map`
    pub fn map(entries: Vec<(Value, Value)>) -> Self {
        Self::new(names::MAP, entries)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a value by key
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Insert or replace an entry
    pub fn insert(&mut self, key: Value, value: Value) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// The collected-values view of this map
    pub fn values(&self) -> Sequence {
        Sequence::new(
            names::MAP_VALUES,
            self.entries.iter().map(|(_, v)| v.clone()).collect(),
        )
    }
}

/// An instance of a registered object type
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    /// Registered type name
    pub type_name: String,

    /// Field values by field name
    pub fields: BTreeMap<String, Value>,
}

impl Object {
    /// Create an object with no fields set
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder: set a field
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Read a field
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Value::Object(object)
    }
}

impl From<Sequence> for Value {
    fn from(seq: Sequence) -> Self {
        Value::Seq(seq)
    }
}

impl From<MapValue> for Value {
    fn from(map: MapValue) -> Self {
        Value::Map(map)
    }
}

/// A failure returned or thrown by an intercepted call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// Failure type name
    pub type_name: String,

    /// Human-readable message
    pub message: String,
}

impl Failure {
    /// Create a failure
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.type_name, self.message)
    }
}

impl std::error::Error for Failure {}
