//! Ignore policy: call sites that stopped being recordable, and replay
//! results the caller should not trust

use parking_lot::RwLock;
use std::collections::HashSet;

/// Policy consulted by the call extractor
pub trait IgnorePolicy: Send + Sync {
    /// Whether a dynamic signature was marked invalid
    fn invalid_operation(&self, signature: &str) -> bool;

    /// Mark a dynamic signature invalid; later calls at that site short-circuit
    fn add_invalid_operation(&self, signature: &str);

    /// Whether replayed results for `type_name.method_name` should be ignored
    fn ignore_mock_result(&self, type_name: &str, method_name: &str) -> bool;
}

/// Default thread-safe [`IgnorePolicy`]
#[derive(Debug, Default)]
pub struct InvalidOperations {
    invalid: RwLock<HashSet<String>>,
    ignored_results: HashSet<(String, String)>,
}

impl InvalidOperations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: flag replayed results of `type_name.method_name` as ignorable
    pub fn with_ignored_result(mut self, type_name: impl Into<String>, method_name: impl Into<String>) -> Self {
        self.ignored_results
            .insert((type_name.into(), method_name.into()));
        self
    }

    /// Number of signatures marked invalid
    pub fn invalid_count(&self) -> usize {
        self.invalid.read().len()
    }
}

impl IgnorePolicy for InvalidOperations {
    fn invalid_operation(&self, signature: &str) -> bool {
        self.invalid.read().contains(signature)
    }

    fn add_invalid_operation(&self, signature: &str) {
        if self.invalid.write().insert(signature.to_string()) {
            tracing::warn!(signature = %signature, "Marked operation invalid");
        }
    }

    fn ignore_mock_result(&self, type_name: &str, method_name: &str) -> bool {
        self.ignored_results
            .contains(&(type_name.to_string(), method_name.to_string()))
    }
}
