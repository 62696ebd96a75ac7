//! Context Store configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Expiry settings for the context store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextStoreConfig {
    /// Age after which a context is reclaimed by the sweep
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,

    /// Entry count a map must exceed before it is swept
    pub cleanup_threshold: usize,
}

impl Default for ContextStoreConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60),
            cleanup_threshold: 10,
        }
    }
}

impl ContextStoreConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the context TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the sweep threshold
    pub fn with_cleanup_threshold(mut self, threshold: usize) -> Self {
        self.cleanup_threshold = threshold;
        self
    }
}
