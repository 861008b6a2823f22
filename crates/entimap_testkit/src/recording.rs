//! A document store that records every call.

use entimap_codec::{Document, Value};
use entimap_store::{DocumentStore, Filter, InMemoryStore, StoreError, StoreResult, ID_FIELD};
use parking_lot::Mutex;

/// One call made to a [`RecordingStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    /// A batched lookup.
    Find {
        /// Target collection.
        collection: String,
        /// Filter used.
        filter: Filter,
    },
    /// A single lookup.
    FindFirst {
        /// Target collection.
        collection: String,
        /// Filter used.
        filter: Filter,
    },
    /// A write.
    Save {
        /// Target collection.
        collection: String,
        /// `_id` of the written document.
        id: Value,
    },
    /// A delete.
    Delete {
        /// Target collection.
        collection: String,
        /// Deleted id.
        id: Value,
    },
    /// A count.
    Count {
        /// Target collection.
        collection: String,
    },
}

/// An [`InMemoryStore`] that records calls and can be told to fail.
#[derive(Default)]
pub struct RecordingStore {
    inner: InMemoryStore,
    calls: Mutex<Vec<StoreCall>>,
    fail_next: Mutex<Option<StoreError>>,
}

impl RecordingStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().clone()
    }

    /// Batched lookups so far.
    pub fn finds(&self) -> Vec<StoreCall> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, StoreCall::Find { .. }))
            .collect()
    }

    /// Single lookups so far.
    pub fn find_firsts(&self) -> Vec<StoreCall> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, StoreCall::FindFirst { .. }))
            .collect()
    }

    /// Lookups (single or batched) so far.
    pub fn lookups(&self) -> usize {
        self.finds().len() + self.find_firsts().len()
    }

    /// Forgets recorded calls.
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Makes the next call fail with `error`.
    pub fn fail_next(&self, error: StoreError) {
        *self.fail_next.lock() = Some(error);
    }

    fn record(&self, call: StoreCall) -> StoreResult<()> {
        self.calls.lock().push(call);
        match self.fail_next.lock().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl DocumentStore for RecordingStore {
    fn find(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Document>> {
        self.record(StoreCall::Find {
            collection: collection.to_string(),
            filter: filter.clone(),
        })?;
        self.inner.find(collection, filter)
    }

    fn find_first(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>> {
        self.record(StoreCall::FindFirst {
            collection: collection.to_string(),
            filter: filter.clone(),
        })?;
        self.inner.find_first(collection, filter)
    }

    fn save(&self, collection: &str, document: Document) -> StoreResult<()> {
        self.record(StoreCall::Save {
            collection: collection.to_string(),
            id: document.get(ID_FIELD).cloned().unwrap_or(Value::Null),
        })?;
        self.inner.save(collection, document)
    }

    fn delete(&self, collection: &str, id: &Value) -> StoreResult<bool> {
        self.record(StoreCall::Delete {
            collection: collection.to_string(),
            id: id.clone(),
        })?;
        self.inner.delete(collection, id)
    }

    fn count(&self, collection: &str) -> StoreResult<usize> {
        self.record(StoreCall::Count {
            collection: collection.to_string(),
        })?;
        self.inner.count(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_fails_on_demand() {
        let store = RecordingStore::new();
        store
            .save("users", Document::new().with("_id", 1))
            .unwrap();
        store.fail_next(StoreError::unavailable("down"));
        assert!(store.find("users", &Filter::id_in(vec![Value::Integer(1)])).is_err());
        assert_eq!(store.find("users", &Filter::id_in(vec![Value::Integer(1)])).unwrap().len(), 1);

        assert_eq!(store.calls().len(), 3);
        assert_eq!(store.finds().len(), 2);
        assert_eq!(
            store.calls()[0],
            StoreCall::Save {
                collection: "users".into(),
                id: Value::Integer(1)
            }
        );
    }
}
