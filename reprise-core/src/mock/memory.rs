//! In-memory mock store for tests and single-process runs

use parking_lot::RwLock;

use super::{MockStore, MockStrategy, Mocker};

/// Append-only in-memory [`MockStore`]
#[derive(Debug, Default)]
pub struct InMemoryMockStore {
    records: RwLock<Vec<Mocker>>,
}

impl InMemoryMockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-loaded with records
    pub fn with_records(records: Vec<Mocker>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Copy of every record, oldest first
    pub fn records(&self) -> Vec<Mocker> {
        self.records.read().clone()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl MockStore for InMemoryMockStore {
    fn record_mocker(&self, mocker: Mocker) {
        tracing::debug!(
            operation = %mocker.operation_name,
            method = %mocker.method_name,
            "Recorded mocker"
        );
        self.records.write().push(mocker);
    }

    fn replay_mocker(&self, query: &Mocker, strategy: MockStrategy) -> Option<Mocker> {
        let records = self.records.read();
        let mut matches = records.iter().filter(|record| record.matches(query));
        match strategy {
            MockStrategy::FindLast => matches.next_back().cloned(),
            MockStrategy::Strict => match (matches.next(), matches.next()) {
                (Some(only), None) => Some(only.clone()),
                _ => None,
            },
        }
    }
}
