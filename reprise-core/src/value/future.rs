//! Pending asynchronous values
//!
//! An [`AsyncValue`] is the engine's view of a completion-style handle: a
//! shared future that any number of observers can await. Callbacks
//! registered with [`AsyncValue::when_complete`] run on whichever executor
//! drives the handle to completion; the call site keeps the original handle.

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::mem;
use std::sync::Arc;

use super::{Failure, Value};
use crate::types::names;

/// Completion outcome of an asynchronous value
pub type Outcome = std::result::Result<Value, Failure>;

type Callback = Box<dyn FnOnce(&Outcome) + Send>;

enum Completion {
    Pending(Vec<Callback>),
    Done(Outcome),
}

/// A cloneable, shareable pending result
#[derive(Clone)]
pub struct AsyncValue {
    type_name: String,
    inner: Shared<BoxFuture<'static, Outcome>>,
    completion: Arc<Mutex<Completion>>,
}

impl AsyncValue {
    /// Wrap a future under the default `Future` handle type
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = Outcome> + Send + 'static,
    {
        Self::with_type(names::FUTURE, future)
    }

    /// Wrap a future under a specific handle type name
    pub fn with_type<F>(type_name: impl Into<String>, future: F) -> Self
    where
        F: Future<Output = Outcome> + Send + 'static,
    {
        let completion = Arc::new(Mutex::new(Completion::Pending(Vec::new())));
        let state = completion.clone();
        let inner = async move {
            let outcome = future.await;
            let previous = mem::replace(&mut *state.lock(), Completion::Done(outcome.clone()));
            // run outside the lock so a callback may register another
            if let Completion::Pending(callbacks) = previous {
                for callback in callbacks {
                    callback(&outcome);
                }
            }
            outcome
        };

        Self {
            type_name: type_name.into(),
            inner: inner.boxed().shared(),
            completion,
        }
    }

    /// An already-succeeded handle
    pub fn ready(type_name: impl Into<String>, value: Value) -> Self {
        Self::completed(type_name, Ok(value))
    }

    /// An already-failed handle
    pub fn failed(type_name: impl Into<String>, failure: Failure) -> Self {
        Self::completed(type_name, Err(failure))
    }

    fn completed(type_name: impl Into<String>, outcome: Outcome) -> Self {
        let value = Self::with_type(type_name, futures::future::ready(outcome.clone()));
        *value.completion.lock() = Completion::Done(outcome);
        value
    }

    /// Run `callback` once the handle completes
    ///
    /// A handle that has already completed runs it immediately on the
    /// calling thread. Otherwise it runs on whichever task first drives the
    /// handle to completion, before any awaiter of [`outcome`](Self::outcome)
    /// observes the result.
    pub fn when_complete<F>(&self, callback: F)
    where
        F: FnOnce(&Outcome) + Send + 'static,
    {
        let outcome = match &mut *self.completion.lock() {
            Completion::Pending(callbacks) => {
                callbacks.push(Box::new(callback));
                return;
            }
            Completion::Done(outcome) => outcome.clone(),
        };
        callback(&outcome);
    }

    /// Handle type name
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Wait for the outcome without consuming the handle
    pub async fn outcome(&self) -> Outcome {
        self.inner.clone().await
    }

    /// The outcome, if the handle has already been driven to completion
    pub fn peek(&self) -> Option<&Outcome> {
        self.inner.peek()
    }
}

impl PartialEq for AsyncValue {
    fn eq(&self, other: &Self) -> bool {
        self.inner.ptr_eq(&other.inner)
    }
}

impl fmt::Debug for AsyncValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncValue")
            .field("type_name", &self.type_name)
            .field("completed", &self.peek().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ready_and_failed() {
        let ok = AsyncValue::ready("Future", Value::Int(7));
        assert_eq!(ok.outcome().await, Ok(Value::Int(7)));

        let err = AsyncValue::failed("Future", Failure::new("IoError", "boom"));
        assert_eq!(err.outcome().await, Err(Failure::new("IoError", "boom")));
    }

    #[tokio::test]
    async fn test_clones_share_completion() {
        let (tx, rx) = tokio::sync::oneshot::channel::<Value>();
        let pending = AsyncValue::new(async move {
            rx.await
                .map_err(|_| Failure::new("Cancelled", "sender dropped"))
        });
        let observer = pending.clone();
        assert_eq!(pending, observer);
        assert!(pending.peek().is_none());

        tx.send(Value::str("done")).unwrap();
        assert_eq!(observer.outcome().await, Ok(Value::str("done")));
        assert_eq!(pending.peek(), Some(&Ok(Value::str("done"))));
    }

    #[test]
    fn test_when_complete_runs_on_driving_executor() {
        let (tx, rx) = futures::channel::oneshot::channel::<Value>();
        let pending = AsyncValue::new(async move {
            rx.await
                .map_err(|_| Failure::new("Cancelled", "sender dropped"))
        });

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        pending.when_complete(move |outcome| sink.lock().push(outcome.clone()));
        assert!(seen.lock().is_empty());

        tx.send(Value::str("Europe/Paris")).unwrap();
        let outcome = futures::executor::block_on(pending.outcome());
        assert_eq!(outcome, Ok(Value::str("Europe/Paris")));
        assert_eq!(*seen.lock(), vec![Ok(Value::str("Europe/Paris"))]);

        // a second await does not run the callback again
        futures::executor::block_on(pending.outcome());
        assert_eq!(seen.lock().len(), 1);
    }

    #[test]
    fn test_when_complete_after_completion_runs_immediately() {
        let failed = AsyncValue::failed("Future", Failure::new("IoError", "boom"));
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        failed.when_complete(move |outcome| *sink.lock() = Some(outcome.clone()));
        assert_eq!(*seen.lock(), Some(Err(Failure::new("IoError", "boom"))));

        let pending = AsyncValue::new(async { Ok(Value::Int(1)) });
        futures::executor::block_on(pending.outcome());
        let sink = seen.clone();
        pending.when_complete(move |outcome| *sink.lock() = Some(outcome.clone()));
        assert_eq!(*seen.lock(), Some(Ok(Value::Int(1))));
    }
}
