//! Error types for Reprise operations
//!
//! None of these ever reach the instrumented application: the record and
//! replay entry points log and swallow them. They exist for the internal
//! "throwing" variants that need to tell failure apart from an empty result.

/// Result type for Reprise operations
pub type Result<T> = std::result::Result<T, RepriseError>;

/// Error types for the record/replay engine
#[derive(Debug, thiserror::Error)]
pub enum RepriseError {
    /// A descriptor named a type that is not registered
    #[error("Type not found: {0}")]
    TypeNotFound(String),

    /// A descriptor could not be parsed
    #[error("Invalid type descriptor: {0}")]
    InvalidDescriptor(String),

    /// A value cannot be encoded by a serializer
    #[error("Cannot serialize {type_name}: {reason}")]
    Unserializable {
        /// Runtime type name of the offending value
        type_name: String,
        /// Why encoding failed
        reason: String,
    },

    /// Serialized text does not fit the requested type
    #[error("Cannot deserialize into {type_name}: {reason}")]
    Deserialize {
        /// Descriptor or type name requested
        type_name: String,
        /// Why decoding failed
        reason: String,
    },

    /// A key expression could not be parsed
    #[error("Invalid key expression '{expression}': {reason}")]
    InvalidExpression {
        /// Expression text
        expression: String,
        /// Why parsing failed
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// JSON error
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl RepriseError {
    /// Shorthand for an [`RepriseError::Unserializable`] error
    pub fn unserializable(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        RepriseError::Unserializable {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`RepriseError::Deserialize`] error
    pub fn deserialize(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        RepriseError::Deserialize {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }
}

impl From<String> for RepriseError {
    fn from(s: String) -> Self {
        RepriseError::Other(s)
    }
}

impl From<&str> for RepriseError {
    fn from(s: &str) -> Self {
        RepriseError::Other(s.to_string())
    }
}

impl From<anyhow::Error> for RepriseError {
    fn from(err: anyhow::Error) -> Self {
        RepriseError::Other(err.to_string())
    }
}
