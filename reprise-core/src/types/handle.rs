//! Type handles produced by resolving descriptors

use std::fmt;
use std::sync::Arc;

use super::registry::{TypeDef, TypeKind};

/// A resolved type: a registered raw type, optionally with type arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeHandle {
    /// Raw type without arguments
    Raw(Arc<TypeDef>),

    /// Raw type applied to one or two arguments
    Parameterized {
        /// The generic raw type
        raw: Arc<TypeDef>,
        /// Type arguments in declaration order
        args: Vec<Arc<TypeHandle>>,
    },
}

impl TypeHandle {
    /// Create a parameterized handle
    pub fn parameterized(raw: Arc<TypeDef>, args: Vec<Arc<TypeHandle>>) -> Self {
        TypeHandle::Parameterized { raw, args }
    }

    /// The raw type
    pub fn raw(&self) -> &Arc<TypeDef> {
        match self {
            TypeHandle::Raw(raw) => raw,
            TypeHandle::Parameterized { raw, .. } => raw,
        }
    }

    /// Raw type name
    pub fn name(&self) -> &str {
        self.raw().name()
    }

    /// Raw type kind
    pub fn kind(&self) -> TypeKind {
        self.raw().kind()
    }

    /// Type arguments (empty for raw handles)
    pub fn args(&self) -> &[Arc<TypeHandle>] {
        match self {
            TypeHandle::Raw(_) => &[],
            TypeHandle::Parameterized { args, .. } => args,
        }
    }

    /// The `index`-th type argument
    pub fn arg(&self, index: usize) -> Option<&Arc<TypeHandle>> {
        self.args().get(index)
    }

    /// Whether `other` values can be held by this handle
    ///
    /// Raw handles accept any arguments; parameterized handles require
    /// matching arguments.
    pub fn is_assignable_from(&self, other: &TypeHandle) -> bool {
        if self.name() != other.name() {
            return false;
        }
        match self {
            TypeHandle::Raw(_) => true,
            TypeHandle::Parameterized { args, .. } => {
                args.len() == other.args().len()
                    && args
                        .iter()
                        .zip(other.args())
                        .all(|(a, b)| a.is_assignable_from(b))
            }
        }
    }
}

impl fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())?;
        let args = self.args();
        if !args.is_empty() {
            write!(f, "<")?;
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", arg)?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}
