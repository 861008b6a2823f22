//! Per-operation entity cache.

use crate::entity::Entity;
use entimap_codec::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Entities loaded during one decode or resolve pass, keyed by collection
/// and id.
///
/// A cached `None` records that the id was looked up and nothing exists.
/// Owned by one operation; never shared between threads or operations.
#[derive(Debug, Default)]
pub struct EntityCache {
    entries: HashMap<String, HashMap<Value, Option<Arc<Entity>>>>,
}

impl EntityCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks an id up. The outer `None` means the id was never looked up.
    pub fn get(&self, collection: &str, id: &Value) -> Option<Option<Arc<Entity>>> {
        self.entries.get(collection)?.get(id).cloned()
    }

    /// Returns true if the id was looked up.
    pub fn contains(&self, collection: &str, id: &Value) -> bool {
        self.entries
            .get(collection)
            .is_some_and(|ids| ids.contains_key(id))
    }

    /// Records a lookup result.
    pub fn insert(&mut self, collection: &str, id: Value, entity: Option<Arc<Entity>>) {
        self.entries
            .entry(collection.to_string())
            .or_default()
            .insert(id, entity);
    }

    /// Number of recorded lookups.
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    /// Returns true if nothing was looked up.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
