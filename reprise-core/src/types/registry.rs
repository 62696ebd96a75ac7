//! Typed registry of describable types
//!
//! Every type the engine can describe or rebuild is registered ahead of
//! time with its kind, type-parameter names and, for generic object types,
//! the field that holds each type parameter. This replaces inspecting
//! field generics at runtime.
//!
//! # Example
//!
//! ```rust
//! use reprise_core::types::{TypeDef, TypeKind, TypeRegistry};
//!
//! let registry = TypeRegistry::with_builtins();
//! registry.register(
//!     TypeDef::builder("Page", TypeKind::Object)
//!         .param("T")
//!         .sequence_slot("T", "items")
//!         .build(),
//! );
//! assert!(registry.generic_slot("Page", "T").is_some());
//! ```

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use super::names;
use crate::error::{RepriseError, Result};
use crate::value::{Object, Value};

/// Ancestor chains longer than this are treated as cyclic
const MAX_SUPERTYPE_DEPTH: usize = 32;

/// Shape category of a registered type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// String, number or boolean
    Scalar,
    /// Ordered or unordered collection of elements
    Sequence,
    /// Collected-values view of a map
    MapValues,
    /// Key/value container
    Map,
    /// Holds at most one value
    Optional,
    /// Fixed array
    Array,
    /// Registered object with named fields
    Object,
    /// Error value
    Failure,
    /// Completion-style asynchronous handle
    AsyncHandle,
}

impl TypeKind {
    /// Whether values of this kind are collections
    pub fn is_sequence(self) -> bool {
        matches!(self, TypeKind::Sequence | TypeKind::MapValues)
    }
}

/// Field of a generic object type that holds one type parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericSlot {
    /// Type parameter name (`T`)
    pub param: String,

    /// Field holding the parameter
    pub field: String,

    /// The field is a sequence of the parameter (`List<T>`), not the parameter itself
    pub sequence: bool,
}

impl GenericSlot {
    /// Read the slot's field from an object
    pub fn read<'a>(&self, object: &'a Object) -> Option<&'a Value> {
        object.field(&self.field)
    }
}

/// A registered type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDef {
    name: String,
    kind: TypeKind,
    params: Vec<String>,
    supertype: Option<String>,
    package: Option<String>,
    slots: Vec<GenericSlot>,
}

impl TypeDef {
    /// Start building a type definition
    pub fn builder(name: impl Into<String>, kind: TypeKind) -> TypeDefBuilder {
        TypeDefBuilder {
            def: TypeDef {
                name: name.into(),
                kind,
                params: Vec::new(),
                supertype: None,
                package: None,
                slots: Vec::new(),
            },
        }
    }

    /// Scalar type without parameters
    pub fn scalar(name: impl Into<String>) -> Self {
        Self::builder(name, TypeKind::Scalar).build()
    }

    /// Sequence container with one element parameter
    pub fn sequence(name: impl Into<String>) -> Self {
        Self::builder(name, TypeKind::Sequence).param("E").build()
    }

    /// Plain object type without parameters
    pub fn object(name: impl Into<String>) -> Self {
        Self::builder(name, TypeKind::Object).build()
    }

    /// Failure type
    pub fn failure(name: impl Into<String>) -> Self {
        Self::builder(name, TypeKind::Failure).build()
    }

    /// Protocol-buffer message type
    pub fn protobuf_message(name: impl Into<String>) -> Self {
        Self::builder(name, TypeKind::Object)
            .supertype(names::PROTOBUF_MESSAGE)
            .build()
    }

    /// Type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type kind
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Declared type-parameter names
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Direct supertype, if any
    pub fn supertype(&self) -> Option<&str> {
        self.supertype.as_deref()
    }

    /// Declaring package, if any
    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    /// Generic slots declared directly on this type
    pub fn slots(&self) -> &[GenericSlot] {
        &self.slots
    }
}

/// Builder for [`TypeDef`]
#[derive(Debug)]
pub struct TypeDefBuilder {
    def: TypeDef,
}

impl TypeDefBuilder {
    /// Declare a type parameter
    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.def.params.push(name.into());
        self
    }

    /// Set the direct supertype
    pub fn supertype(mut self, name: impl Into<String>) -> Self {
        self.def.supertype = Some(name.into());
        self
    }

    /// Set the declaring package
    pub fn package(mut self, name: impl Into<String>) -> Self {
        self.def.package = Some(name.into());
        self
    }

    /// Field `field` holds type parameter `param`
    pub fn slot(mut self, param: impl Into<String>, field: impl Into<String>) -> Self {
        self.def.slots.push(GenericSlot {
            param: param.into(),
            field: field.into(),
            sequence: false,
        });
        self
    }

    /// Field `field` is a sequence of type parameter `param`
    pub fn sequence_slot(mut self, param: impl Into<String>, field: impl Into<String>) -> Self {
        self.def.slots.push(GenericSlot {
            param: param.into(),
            field: field.into(),
            sequence: true,
        });
        self
    }

    /// Finish the definition
    pub fn build(self) -> TypeDef {
        self.def
    }
}

/// Registry of describable types
pub struct TypeRegistry {
    types: RwLock<HashMap<String, Arc<TypeDef>>>,
    slot_cache: RwLock<HashMap<String, Option<GenericSlot>>>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("type_count", &self.types.read().len())
            .finish()
    }
}

impl TypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            types: RwLock::new(HashMap::new()),
            slot_cache: RwLock::new(HashMap::new()),
        }
    }

    /// Create a registry holding the built-in scalars and containers
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        for scalar in [names::STRING, names::INTEGER, names::FLOAT, names::BOOLEAN] {
            registry.register(TypeDef::scalar(scalar));
        }
        for sequence in [names::LIST, names::LINKED_LIST, names::SET] {
            registry.register(TypeDef::sequence(sequence));
        }
        registry.register(
            TypeDef::builder(names::MAP_VALUES, TypeKind::MapValues)
                .param("V")
                .build(),
        );
        registry.register(
            TypeDef::builder(names::MAP, TypeKind::Map)
                .param("K")
                .param("V")
                .build(),
        );
        registry.register(
            TypeDef::builder(names::OPTIONAL, TypeKind::Optional)
                .param("T")
                .build(),
        );
        registry.register(TypeDef::builder(names::ARRAY, TypeKind::Array).build());
        registry.register(
            TypeDef::builder(names::FUTURE, TypeKind::AsyncHandle)
                .param("T")
                .build(),
        );
        registry.register(TypeDef::object(names::OBJECT));
        registry.register(
            TypeDef::builder(names::PROTOBUF_MESSAGE, TypeKind::Object)
                .package(names::PROTOBUF_PACKAGE)
                .build(),
        );
        registry
    }

    /// Register (or replace) a type
    pub fn register(&self, def: TypeDef) {
        self.types.write().insert(def.name.clone(), Arc::new(def));
        self.slot_cache.write().clear();
    }

    /// Look up a type, failing if it is not registered
    pub fn get(&self, name: &str) -> Result<Arc<TypeDef>> {
        self.lookup(name)
            .ok_or_else(|| RepriseError::TypeNotFound(name.to_string()))
    }

    /// Look up a type
    pub fn lookup(&self, name: &str) -> Option<Arc<TypeDef>> {
        self.types.read().get(name).cloned()
    }

    /// Kind of a registered type
    pub fn kind_of(&self, name: &str) -> Option<TypeKind> {
        self.lookup(name).map(|def| def.kind)
    }

    /// Whether `name` is a registered collection type
    pub fn is_sequence(&self, name: &str) -> bool {
        !name.is_empty() && self.kind_of(name).is_some_and(TypeKind::is_sequence)
    }

    /// Whether `name` is a registered asynchronous handle type
    pub fn is_async_handle(&self, name: &str) -> bool {
        self.kind_of(name) == Some(TypeKind::AsyncHandle)
    }

    /// Find the field holding `param`, searching `type_name` then its ancestors
    pub fn generic_slot(&self, type_name: &str, param: &str) -> Option<GenericSlot> {
        let cache_key = format!("{}{}", type_name, param);
        if let Some(cached) = self.slot_cache.read().get(&cache_key) {
            return cached.clone();
        }

        let mut current = self.lookup(type_name);
        let mut found = None;
        for _ in 0..MAX_SUPERTYPE_DEPTH {
            let Some(def) = current else { break };
            if let Some(slot) = def.slots.iter().find(|slot| slot.param == param) {
                found = Some(slot.clone());
                break;
            }
            current = def.supertype.as_deref().and_then(|name| self.lookup(name));
        }

        self.slot_cache.write().insert(cache_key, found.clone());
        found
    }

    /// Whether a value is a protocol-buffer message (or a sequence of them)
    ///
    /// Detection looks at the package of the value type's direct supertype.
    pub fn is_protobuf(&self, value: &Value) -> bool {
        match value {
            Value::Seq(seq) => seq.items.first().is_some_and(|first| self.is_protobuf(first)),
            Value::Object(object) => self
                .lookup(&object.type_name)
                .and_then(|def| def.supertype.clone())
                .and_then(|supertype| self.lookup(&supertype))
                .is_some_and(|parent| parent.package() == Some(names::PROTOBUF_PACKAGE)),
            _ => false,
        }
    }
}
