//! Context provider and the default thread-scoped context manager

use std::cell::RefCell;
use std::sync::Arc;

use super::config::ContextStoreConfig;
use super::execution::ExecutionContext;
use super::store::ContextStore;

/// Source of the execution context for the call being intercepted
pub trait ContextProvider: Send + Sync {
    /// The context the current call belongs to
    fn current_context(&self) -> Option<Arc<ExecutionContext>>;

    /// Whether the current call should be recorded or replayed at all
    fn need_record_or_replay(&self) -> bool {
        self.current_context().is_some()
    }
}

thread_local! {
    static CURRENT_CASE: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Context manager over a [`ContextStore`]
///
/// The current context is tracked per thread: [`ContextManager::enter`]
/// makes a case current until the returned scope is dropped.
///
/// # Example
///
/// ```rust
/// use reprise_core::context::{ContextManager, ContextProvider};
///
/// let manager = ContextManager::default();
/// manager.create_context("case-1", None);
///
/// let scope = manager.enter("case-1");
/// assert_eq!(manager.current_context().unwrap().case_id(), "case-1");
/// drop(scope);
/// assert!(manager.current_context().is_none());
/// ```
#[derive(Debug, Default)]
pub struct ContextManager {
    store: ContextStore,
}

impl ContextManager {
    /// Create a manager with the given store settings
    pub fn new(config: ContextStoreConfig) -> Self {
        Self {
            store: ContextStore::new(config),
        }
    }

    /// The backing store
    pub fn store(&self) -> &ContextStore {
        &self.store
    }

    /// Create and register a context; a replay id makes it a replay context
    pub fn create_context(&self, case_id: &str, replay_id: Option<&str>) -> Arc<ExecutionContext> {
        let mut context = ExecutionContext::new(case_id);
        if let Some(replay_id) = replay_id {
            context = context.with_replay_id(replay_id);
        }
        let context = Arc::new(context);
        self.store.put(context.clone());
        tracing::debug!(case_id = %case_id, replay = context.is_replay(), "Created execution context");
        context
    }

    /// Look a context up by case id
    pub fn get(&self, case_id: &str) -> Option<Arc<ExecutionContext>> {
        self.store.get(case_id)
    }

    /// Remove a context at the end of its unit of work
    pub fn remove_context(&self, case_id: &str) -> Option<Arc<ExecutionContext>> {
        self.store.remove(case_id)
    }

    /// Make `case_id` the current case on this thread until the scope drops
    pub fn enter(&self, case_id: impl Into<String>) -> ContextScope {
        let previous = CURRENT_CASE.with(|current| current.replace(Some(case_id.into())));
        ContextScope { previous }
    }

    /// The current case id on this thread
    pub fn current_case_id() -> Option<String> {
        CURRENT_CASE.with(|current| current.borrow().clone())
    }
}

impl ContextProvider for ContextManager {
    fn current_context(&self) -> Option<Arc<ExecutionContext>> {
        Self::current_case_id().and_then(|case_id| self.store.get(&case_id))
    }
}

/// Guard returned by [`ContextManager::enter`]; restores the previous case on drop
#[derive(Debug)]
#[must_use = "the context is only current while the scope is alive"]
pub struct ContextScope {
    previous: Option<String>,
}

impl Drop for ContextScope {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT_CASE.with(|current| *current.borrow_mut() = previous);
    }
}
