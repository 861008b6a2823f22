//! In-memory document store.

use crate::backend::DocumentStore;
use crate::error::{StoreError, StoreResult};
use crate::filter::{Filter, ID_FIELD};
use entimap_codec::{from_cbor, to_cbor, Document, Value};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::trace;

#[derive(Debug, Clone)]
struct StoredDocument {
    id: Value,
    bytes: Vec<u8>,
}

/// An in-memory document store.
///
/// Documents are held in their CBOR byte form, so every read decodes a
/// fresh copy just like a round trip to a real store would. Suitable for:
/// - Unit and integration tests
/// - Ephemeral data that doesn't need persistence
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use entimap_codec::{Document, Value};
/// use entimap_store::{DocumentStore, Filter, InMemoryStore};
///
/// let store = InMemoryStore::new();
/// store.save("users", Document::new().with("_id", 1).with("name", "Alice")).unwrap();
/// let found = store.find_first("users", &Filter::id_eq(Value::Integer(1))).unwrap();
/// assert_eq!(found.unwrap().get("name"), Some(&Value::from("Alice")));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, Vec<StoredDocument>>>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the names of all collections holding at least one document.
    #[must_use]
    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self
            .collections
            .read()
            .iter()
            .filter(|(_, docs)| !docs.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Removes every document from every collection.
    pub fn clear(&self) {
        self.collections.write().clear();
    }
}

impl DocumentStore for InMemoryStore {
    fn find(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read();
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut results = Vec::new();
        for stored in docs {
            let document = from_cbor(&stored.bytes)?;
            if filter.matches(&document) {
                results.push(document);
            }
        }
        trace!(collection, %filter, matched = results.len(), "find");
        Ok(results)
    }

    fn save(&self, collection: &str, document: Document) -> StoreResult<()> {
        let id = document
            .get(ID_FIELD)
            .filter(|id| !id.is_null())
            .cloned()
            .ok_or_else(|| StoreError::MissingId {
                collection: collection.to_string(),
            })?;
        let bytes = to_cbor(&document)?;

        let mut collections = self.collections.write();
        let docs = collections.entry(collection.to_string()).or_default();
        match docs.iter_mut().find(|stored| stored.id == id) {
            Some(existing) => existing.bytes = bytes,
            None => docs.push(StoredDocument { id, bytes }),
        }
        trace!(collection, "saved document");
        Ok(())
    }

    fn delete(&self, collection: &str, id: &Value) -> StoreResult<bool> {
        let mut collections = self.collections.write();
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let before = docs.len();
        docs.retain(|stored| &stored.id != id);
        Ok(docs.len() < before)
    }

    fn count(&self, collection: &str) -> StoreResult<usize> {
        Ok(self
            .collections
            .read()
            .get(collection)
            .map_or(0, Vec::len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, name: &str) -> Document {
        Document::new().with("_id", id).with("name", name)
    }

    #[test]
    fn save_and_find() {
        let store = InMemoryStore::new();
        store.save("users", user(1, "Alice")).unwrap();
        store.save("users", user(2, "Bob")).unwrap();

        let found = store
            .find_first("users", &Filter::id_eq(Value::Integer(2)))
            .unwrap()
            .unwrap();
        assert_eq!(found.get("name"), Some(&Value::from("Bob")));
        assert_eq!(store.count("users").unwrap(), 2);
    }

    #[test]
    fn save_replaces_by_id() {
        let store = InMemoryStore::new();
        store.save("users", user(1, "Alice")).unwrap();
        store.save("users", user(1, "Alicia")).unwrap();

        assert_eq!(store.count("users").unwrap(), 1);
        let found = store
            .find_first("users", &Filter::id_eq(Value::Integer(1)))
            .unwrap()
            .unwrap();
        assert_eq!(found.get("name"), Some(&Value::from("Alicia")));
    }

    #[test]
    fn find_in_returns_storage_order() {
        let store = InMemoryStore::new();
        for (id, name) in [(1, "a"), (2, "b"), (3, "c")] {
            store.save("users", user(id, name)).unwrap();
        }

        let found = store
            .find(
                "users",
                &Filter::id_in(vec![Value::Integer(3), Value::Integer(1), Value::Integer(9)]),
            )
            .unwrap();
        let ids: Vec<_> = found.iter().map(|d| d.get("_id").cloned().unwrap()).collect();
        assert_eq!(ids, vec![Value::Integer(1), Value::Integer(3)]);
    }

    #[test]
    fn missing_id_is_rejected() {
        let store = InMemoryStore::new();
        let err = store
            .save("users", Document::new().with("name", "nobody"))
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingId { .. }));
    }

    #[test]
    fn delete_and_collections() {
        let store = InMemoryStore::new();
        store.save("users", user(1, "Alice")).unwrap();
        assert_eq!(store.collection_names(), vec!["users".to_string()]);
        assert!(store.delete("users", &Value::Integer(1)).unwrap());
        assert!(!store.delete("users", &Value::Integer(1)).unwrap());
        assert!(!store.delete("ghosts", &Value::Integer(1)).unwrap());
        assert!(store.collection_names().is_empty());
    }

    #[test]
    fn unknown_collection_is_empty() {
        let store = InMemoryStore::new();
        assert!(store
            .find("nothing", &Filter::id_eq(Value::Integer(1)))
            .unwrap()
            .is_empty());
        assert_eq!(store.count("nothing").unwrap(), 0);
    }
}
