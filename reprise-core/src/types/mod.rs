//! Type descriptor codec
//!
//! Converts a value's runtime shape into a compact descriptor string and a
//! descriptor back into a [`TypeHandle`] that serializers decode against.
//! Descriptors are the only bit-exact contract with persisted records.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use reprise_core::types::{TypeCodec, TypeRegistry};
//! use reprise_core::value::Value;
//!
//! let codec = TypeCodec::new(Arc::new(TypeRegistry::with_builtins()));
//! let value = Value::list(vec![Value::list(vec![]), Value::list(vec![Value::str("a")])]);
//!
//! assert_eq!(codec.describe(&value).as_deref(), Some("List-List,String"));
//! assert!(codec.resolve("Map-String,Integer").is_some());
//! ```

mod codec;
mod descriptor;
mod handle;
pub mod names;
mod registry;

pub use codec::TypeCodec;
pub use handle::TypeHandle;
pub use registry::{GenericSlot, TypeDef, TypeDefBuilder, TypeKind, TypeRegistry};

#[cfg(test)]
mod tests;
