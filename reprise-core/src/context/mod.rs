//! Execution contexts and the self-expiring context store
//!
//! An [`ExecutionContext`] is created when a unit of work begins and carries
//! the per-context state the call extractor needs: which call shapes were
//! already recorded, and which replay results were already resolved. The
//! [`ContextStore`] owns every context; the extractor only borrows them
//! through a [`ContextProvider`].

mod config;
mod execution;
mod manager;
mod store;

pub use config::ContextStoreConfig;
pub use execution::ExecutionContext;
pub use manager::{ContextManager, ContextProvider, ContextScope};
pub use store::ContextStore;
