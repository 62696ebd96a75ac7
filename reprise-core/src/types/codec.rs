//! Descriptor resolution with a process-lifetime cache

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use super::handle::TypeHandle;
use super::names::{COMMA, HORIZONTAL_LINE};
use super::registry::TypeRegistry;
use crate::error::{RepriseError, Result};

/// Converts values to descriptors and descriptors to type handles
///
/// Resolved handles are cached by descriptor string and never invalidated,
/// so resolving the same descriptor twice returns the same `Arc`.
pub struct TypeCodec {
    registry: Arc<TypeRegistry>,
    cache: RwLock<HashMap<String, Arc<TypeHandle>>>,
}

impl std::fmt::Debug for TypeCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeCodec")
            .field("registry", &self.registry)
            .field("cached", &self.cache.read().len())
            .finish()
    }
}

impl TypeCodec {
    /// Create a codec over a registry
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// The underlying registry
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Resolve a descriptor to a type handle
    ///
    /// Lookup failures are logged and yield `None`; empty descriptors and a
    /// lone separator resolve to `None` without logging.
    pub fn resolve(&self, descriptor: &str) -> Option<Arc<TypeHandle>> {
        if descriptor.is_empty() || descriptor == "-" {
            return None;
        }

        match self.try_resolve(descriptor) {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!(descriptor = %descriptor, error = %e, "Failed to resolve type descriptor");
                None
            }
        }
    }

    /// Resolve a descriptor, reporting why resolution failed
    pub fn try_resolve(&self, descriptor: &str) -> Result<Arc<TypeHandle>> {
        if descriptor.is_empty() || descriptor == "-" {
            return Err(RepriseError::InvalidDescriptor(descriptor.to_string()));
        }

        if let Some(handle) = self.cache.read().get(descriptor) {
            return Ok(handle.clone());
        }

        let (raw_name, rest) = match descriptor.split_once(HORIZONTAL_LINE) {
            Some((raw, rest)) => (raw, rest),
            None => (descriptor, ""),
        };
        let raw = self.registry.get(raw_name)?;

        let handle = if rest.is_empty() {
            TypeHandle::Raw(raw)
        } else {
            match raw.params().len() {
                1 => match self.resolve(rest) {
                    Some(arg) => TypeHandle::parameterized(raw, vec![arg]),
                    None => TypeHandle::Raw(raw),
                },
                2 => {
                    let (first, second) = rest.split_once(COMMA).ok_or_else(|| {
                        RepriseError::InvalidDescriptor(format!(
                            "{} expects two type arguments",
                            descriptor
                        ))
                    })?;
                    match (self.resolve(first), self.resolve(second)) {
                        (Some(a), Some(b)) => TypeHandle::parameterized(raw, vec![a, b]),
                        _ => TypeHandle::Raw(raw),
                    }
                }
                _ => TypeHandle::Raw(raw),
            }
        };

        let mut cache = self.cache.write();
        let cached = cache
            .entry(descriptor.to_string())
            .or_insert_with(|| Arc::new(handle));
        Ok(cached.clone())
    }
}
