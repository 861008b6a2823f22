//! Identity keys.

use crate::schema::ClassName;
use entimap_codec::{DbRef, Value};
use std::fmt;

/// The identity of a stored entity: its class, collection and id.
///
/// Keys stand in for entities wherever only the identity is needed, for
/// example as unresolved references or as query values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    /// The entity's mapped class.
    pub class: ClassName,
    /// The collection the entity lives in.
    pub collection: String,
    /// The entity's id value.
    pub id: Value,
}

impl Key {
    /// Creates a key.
    pub fn new(class: impl Into<ClassName>, collection: impl Into<String>, id: Value) -> Self {
        Self {
            class: class.into(),
            collection: collection.into(),
            id,
        }
    }

    /// The full-pointer form of this key.
    pub fn to_dbref(&self) -> DbRef {
        DbRef::new(self.collection.clone(), self.id.clone())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}/{:?})", self.class, self.collection, self.id)
    }
}
