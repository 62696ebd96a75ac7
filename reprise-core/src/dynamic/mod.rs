//! Record/replay of configured dynamic-class calls
//!
//! The interception hook builds one [`CallExtractor`] per intercepted
//! invocation and then calls either [`CallExtractor::record_response`]
//! with the real call's result, or [`CallExtractor::replay`] to substitute
//! a recorded one.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use reprise_core::context::ContextManager;
//! use reprise_core::dynamic::{CallExtractor, MethodInfo};
//! use reprise_core::engine::Engine;
//! use reprise_core::value::Value;
//!
//! let contexts = Arc::new(ContextManager::default());
//! let engine = Arc::new(Engine::builder().context_manager(contexts.clone()).build().unwrap());
//!
//! contexts.create_context("case-1", None);
//! let _scope = contexts.enter("case-1");
//!
//! let method = MethodInfo::new("com.acme.Clock", "zone").with_parameter("region", "String");
//! let extractor = CallExtractor::new(engine.clone(), method.clone(), vec![Value::str("eu")]);
//! extractor.record_response(Value::str("Europe/Paris"));
//!
//! let replayed = CallExtractor::new(engine, method, vec![Value::str("eu")]).replay();
//! assert_eq!(replayed.result, Value::str("Europe/Paris"));
//! ```

mod advice;
mod extractor;
mod key;

pub use advice::need_record_or_replay;
pub use extractor::CallExtractor;
pub use key::{KeyExpression, KeyTerm};

/// Static description of an intercepted method
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MethodInfo {
    /// Declaring type name
    pub type_name: String,

    /// Method name
    pub method_name: String,

    /// Declared parameter names, in order
    pub parameter_names: Vec<String>,

    /// Declared parameter type names, in order
    pub parameter_types: Vec<String>,

    /// Declared return type name; an async handle type enables result bridging
    pub return_type: Option<String>,
}

impl MethodInfo {
    /// Describe a method without parameters
    pub fn new(type_name: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            method_name: method_name.into(),
            ..Default::default()
        }
    }

    /// Builder: append a parameter
    pub fn with_parameter(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.parameter_names.push(name.into());
        self.parameter_types.push(type_name.into());
        self
    }

    /// Builder: set the declared return type
    pub fn with_return_type(mut self, type_name: impl Into<String>) -> Self {
        self.return_type = Some(type_name.into());
        self
    }
}
