//! Per-unit-of-work correlation state

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::value::Value;

/// Correlation scope for one unit of work (one incoming request, one test case)
///
/// Holds the hashes of calls already recorded in this scope and the values
/// already resolved during replay. Both are only touched by calls running
/// inside this context.
#[derive(Debug)]
pub struct ExecutionContext {
    case_id: String,
    replay_id: Option<String>,
    created_at: DateTime<Utc>,
    recorded: Mutex<HashSet<u64>>,
    replay_cache: Mutex<HashMap<String, Value>>,
}

impl ExecutionContext {
    /// Create a recording context
    pub fn new(case_id: impl Into<String>) -> Self {
        Self {
            case_id: case_id.into(),
            replay_id: None,
            created_at: Utc::now(),
            recorded: Mutex::new(HashSet::new()),
            replay_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Builder: mark the context as a replay of a recorded case
    pub fn with_replay_id(mut self, replay_id: impl Into<String>) -> Self {
        self.replay_id = Some(replay_id.into());
        self
    }

    /// Builder: override the creation time
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn case_id(&self) -> &str {
        &self.case_id
    }

    pub fn replay_id(&self) -> Option<&str> {
        self.replay_id.as_deref()
    }

    /// Whether this context replays rather than records
    pub fn is_replay(&self) -> bool {
        self.replay_id.is_some()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether the context is at least `ttl` old at `now`
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        let age = now.signed_duration_since(self.created_at);
        age.to_std().is_ok_and(|age| age >= ttl)
    }

    /// Whether a duplicate-suppression hash was already recorded
    pub fn has_recorded(&self, hash: u64) -> bool {
        self.recorded.lock().contains(&hash)
    }

    /// Remember a duplicate-suppression hash; `false` if it was already known
    pub fn mark_recorded(&self, hash: u64) -> bool {
        self.recorded.lock().insert(hash)
    }

    /// A value already resolved during replay
    pub fn cached_replay(&self, key: &str) -> Option<Value> {
        self.replay_cache.lock().get(key).cloned()
    }

    /// Cache a value resolved during replay
    pub fn cache_replay(&self, key: impl Into<String>, value: Value) {
        self.replay_cache.lock().insert(key.into(), value);
    }

    /// Drop all attached state
    pub fn clear(&self) {
        self.recorded.lock().clear();
        self.replay_cache.lock().clear();
    }
}
