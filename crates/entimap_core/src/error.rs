//! Error types for the mapping engine.

use crate::lifecycle::{HookError, LifecycleEvent};
use crate::schema::ClassName;
use entimap_codec::{CodecError, Value};
use entimap_store::StoreError;
use thiserror::Error;

/// Result type for mapper operations.
pub type MapperResult<T> = Result<T, MapperError>;

/// Errors that can occur while mapping, loading or saving entities.
#[derive(Debug, Error)]
pub enum MapperError {
    /// A type cannot be mapped, or an instance contradicts its mapping.
    #[error("mapping error: {message}")]
    Mapping {
        /// Description of the problem.
        message: String,
    },

    /// No schema is registered for the type.
    #[error("unknown class: {class}")]
    UnknownClass {
        /// The requested type.
        class: ClassName,
    },

    /// A lifecycle method or interceptor failed.
    #[error("{event} handler {method} on {class} failed: {source}")]
    Lifecycle {
        /// The event being dispatched.
        event: LifecycleEvent,
        /// The class whose dispatch failed.
        class: ClassName,
        /// The failing method, or `interceptor`.
        method: String,
        /// The handler's error.
        #[source]
        source: HookError,
    },

    /// The backing store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A value could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// A stored document does not fit the class it is decoded into.
    #[error("cannot decode {class}: {message}")]
    InvalidDocument {
        /// The target class.
        class: ClassName,
        /// Description of the mismatch.
        message: String,
    },

    /// A reference points at a document that does not exist.
    #[error("dangling reference in {field}: no document {id:?} in {collection}")]
    DanglingReference {
        /// The reference field.
        field: String,
        /// The target collection.
        collection: String,
        /// The missing id.
        id: Value,
    },

    /// The stored version differs from the one being saved.
    #[error("concurrent modification of {class} {id:?}: stored version {stored}, expected {expected}")]
    ConcurrentModification {
        /// The saved class.
        class: ClassName,
        /// The entity id.
        id: Value,
        /// Version found in the store.
        stored: i64,
        /// Version carried by the entity.
        expected: i64,
    },
}

impl MapperError {
    /// Creates a mapping error.
    pub fn mapping(message: impl Into<String>) -> Self {
        Self::Mapping {
            message: message.into(),
        }
    }

    /// Creates an invalid-document error.
    pub fn invalid_document(class: &ClassName, message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            class: class.clone(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_surface_unmodified() {
        let err: MapperError = StoreError::unavailable("disk on fire").into();
        assert_eq!(err.to_string(), "store unavailable: disk on fire");
        assert!(matches!(err, MapperError::Store(StoreError::Unavailable { .. })));
    }

    #[test]
    fn lifecycle_error_message() {
        let err = MapperError::Lifecycle {
            event: LifecycleEvent::PrePersist,
            class: ClassName::new("Job"),
            method: "stamp".into(),
            source: "boom".into(),
        };
        assert_eq!(err.to_string(), "@PrePersist handler stamp on Job failed: boom");
    }
}
