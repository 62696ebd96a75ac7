//! Self-expiring context store
//!
//! Two maps composed side by side: the live map, and a retained map that
//! keeps removed contexts readable for one more TTL window. The retained
//! map is allocated on the first lookup miss. Nothing runs on a timer;
//! expired entries are swept opportunistically from [`ContextStore::remove`].

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use super::config::ContextStoreConfig;
use super::execution::ExecutionContext;

type ContextMap = RwLock<HashMap<String, Arc<ExecutionContext>>>;

/// Advisory lock shared by every store's sweep; a sweep that cannot take it
/// is skipped
static SWEEP_LOCK: Mutex<()> = Mutex::new(());

/// Store of execution contexts keyed by case id
#[derive(Debug, Default)]
pub struct ContextStore {
    live: ContextMap,
    retained: OnceLock<ContextMap>,
    config: ContextStoreConfig,
}

impl ContextStore {
    /// Create a store with the given expiry settings
    pub fn new(config: ContextStoreConfig) -> Self {
        Self {
            live: RwLock::new(HashMap::new()),
            retained: OnceLock::new(),
            config,
        }
    }

    /// Expiry settings
    pub fn config(&self) -> &ContextStoreConfig {
        &self.config
    }

    /// Insert (or replace) a context
    pub fn put(&self, context: Arc<ExecutionContext>) {
        self.live
            .write()
            .insert(context.case_id().to_string(), context);
    }

    /// Look a context up
    ///
    /// A miss on the live map falls through to the retained map. The very
    /// first miss only allocates the retained map and yields `None`.
    pub fn get(&self, case_id: &str) -> Option<Arc<ExecutionContext>> {
        if let Some(context) = self.live.read().get(case_id) {
            return Some(context.clone());
        }

        match self.retained.get() {
            Some(retained) => retained.read().get(case_id).cloned(),
            None => {
                self.retained.get_or_init(ContextMap::default);
                None
            }
        }
    }

    /// Remove a context, keeping it readable in the retained map
    pub fn remove(&self, case_id: &str) -> Option<Arc<ExecutionContext>> {
        let removed = self.live.write().remove(case_id);
        self.sweep();

        if let (Some(retained), Some(context)) = (self.retained.get(), removed.as_ref()) {
            retained
                .write()
                .insert(case_id.to_string(), context.clone());
        }
        removed
    }

    /// Number of live contexts
    pub fn len(&self) -> usize {
        self.live.read().len()
    }

    /// Whether there are no live contexts
    pub fn is_empty(&self) -> bool {
        self.live.read().is_empty()
    }

    /// Number of removed contexts still retained
    pub fn retained_len(&self) -> usize {
        self.retained.get().map_or(0, |retained| retained.read().len())
    }

    fn sweep(&self) {
        if let Some(retained) = self.retained.get() {
            if retained.read().len() > self.config.cleanup_threshold {
                if let Some(_guard) = SWEEP_LOCK.try_lock() {
                    let swept = self.sweep_map(retained);
                    tracing::debug!(swept, "Swept expired retained contexts");
                }
            }
        }

        // covers callers that never remove their contexts
        if self.live.read().len() > self.config.cleanup_threshold {
            if let Some(_guard) = SWEEP_LOCK.try_lock() {
                let swept = self.sweep_map(&self.live);
                tracing::debug!(swept, "Swept expired live contexts");
            }
        }
    }

    fn sweep_map(&self, map: &ContextMap) -> usize {
        let now = Utc::now();
        let mut map = map.write();
        let before = map.len();
        map.retain(|_, context| {
            if context.is_expired(now, self.config.ttl) {
                context.clear();
                false
            } else {
                true
            }
        });
        before - map.len()
    }
}

#[cfg(test)]
mod store_tests {
    use super::*;
    use chrono::Duration;

    // sweeps in this module must not contend for the shared lock
    static SERIAL: Mutex<()> = Mutex::new(());

    fn aged(case_id: &str, seconds: i64) -> Arc<ExecutionContext> {
        Arc::new(
            ExecutionContext::new(case_id).with_created_at(Utc::now() - Duration::seconds(seconds)),
        )
    }

    #[test]
    fn test_first_miss_allocates_retained_map() {
        let store = ContextStore::default();
        store.put(aged("a", 0));
        assert!(store.remove("a").is_some());
        // no retained map yet, so the removed context is gone
        assert!(store.get("a").is_none());

        store.put(aged("b", 0));
        assert!(store.remove("b").is_some());
        assert!(store.get("b").is_some());
        assert_eq!(store.retained_len(), 1);
    }

    #[test]
    fn test_live_lookup() {
        let store = ContextStore::default();
        store.put(aged("a", 0));
        assert_eq!(store.get("a").unwrap().case_id(), "a");
        assert_eq!(store.len(), 1);
        assert!(store.remove("missing").is_none());
    }

    #[test]
    fn test_retained_entries_expire_after_sweep() {
        let _serial = SERIAL.lock();
        let store = ContextStore::default();
        assert!(store.get("warm-up").is_none());

        let old = aged("old", 120);
        old.mark_recorded(1);
        store.put(old.clone());
        store.remove("old");

        for i in 0..11 {
            let id = format!("fresh-{}", i);
            store.put(aged(&id, 0));
            store.remove(&id);
        }

        assert!(store.get("old").is_none());
        assert!(!old.has_recorded(1));
        assert!(store.get("fresh-0").is_some());
        assert_eq!(store.retained_len(), 11);
    }

    #[test]
    fn test_retained_entries_survive_before_ttl() {
        let _serial = SERIAL.lock();
        let store = ContextStore::default();
        assert!(store.get("warm-up").is_none());

        store.put(aged("recent", 30));
        store.remove("recent");
        for i in 0..11 {
            let id = format!("fresh-{}", i);
            store.put(aged(&id, 0));
            store.remove(&id);
        }

        assert!(store.get("recent").is_some());
        assert_eq!(store.retained_len(), 12);
    }

    #[test]
    fn test_live_map_swept_without_remove() {
        let _serial = SERIAL.lock();
        let store = ContextStore::new(ContextStoreConfig::default().with_cleanup_threshold(2));
        store.put(aged("stale-1", 120));
        store.put(aged("stale-2", 120));
        store.put(aged("live", 0));

        store.remove("missing");
        assert_eq!(store.len(), 1);
        assert!(store.get("live").is_some());
    }

    #[test]
    fn test_sweep_skipped_while_locked() {
        let _serial = SERIAL.lock();
        let store = ContextStore::new(ContextStoreConfig::default().with_cleanup_threshold(0));
        store.put(aged("stale", 120));

        let guard = SWEEP_LOCK.lock();
        store.remove("missing");
        assert_eq!(store.len(), 1);
        drop(guard);

        store.remove("missing");
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_sweep_lock_shared_across_stores() {
        let _serial = SERIAL.lock();
        let first = ContextStore::new(ContextStoreConfig::default().with_cleanup_threshold(0));
        let second = ContextStore::new(ContextStoreConfig::default().with_cleanup_threshold(0));
        first.put(aged("stale-1", 120));
        second.put(aged("stale-2", 120));

        // a sweep in progress anywhere in the process skips every other sweep
        let guard = SWEEP_LOCK.lock();
        first.remove("missing");
        second.remove("missing");
        assert_eq!((first.len(), second.len()), (1, 1));
        drop(guard);

        second.remove("missing");
        assert_eq!((first.len(), second.len()), (1, 0));
    }
}
