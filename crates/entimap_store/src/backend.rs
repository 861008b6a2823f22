//! Document store trait definition.

use crate::error::StoreResult;
use crate::filter::Filter;
use entimap_codec::{Document, Value};

/// The backing document store consumed by the mapper.
///
/// A store is a set of named collections of documents, each document
/// identified by its `_id` property. The mapper only relies on the
/// operations below; everything else about storage is the store's business.
///
/// # Invariants
///
/// - `save` replaces any document with the same `_id` in the collection
/// - `find` returns every matching document exactly once, in storage order
/// - Stores must be `Send + Sync`; calls block the caller until complete
pub trait DocumentStore: Send + Sync {
    /// Returns every document in `collection` matching `filter`.
    ///
    /// This is the batched lookup used for multi-valued references
    /// (`Filter::In` over `_id`).
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot serve the request.
    fn find(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Document>>;

    /// Returns the first document in `collection` matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot serve the request.
    fn find_first(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>> {
        Ok(self.find(collection, filter)?.into_iter().next())
    }

    /// Inserts or replaces a document, keyed by its `_id`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::MissingId`] if the document has no `_id`.
    fn save(&self, collection: &str, document: Document) -> StoreResult<()>;

    /// Deletes the document with the given `_id`.
    ///
    /// Returns true if a document was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot serve the request.
    fn delete(&self, collection: &str, id: &Value) -> StoreResult<bool>;

    /// Returns the number of documents in a collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot serve the request.
    fn count(&self, collection: &str) -> StoreResult<usize>;
}
