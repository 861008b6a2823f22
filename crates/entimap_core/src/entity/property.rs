//! Property values held by entities.

use crate::entity::{Entity, Key};
use entimap_codec::Value;
use std::sync::Arc;

/// A reference slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// The related entity, loaded. Duplicates within one load share the `Arc`.
    Resolved(Arc<Entity>),
    /// Not resolved yet.
    Key(Key),
    /// Resolution was attempted and no document exists for the key.
    Missing(Key),
}

impl Reference {
    /// Returns the loaded entity, if resolved.
    pub fn entity(&self) -> Option<&Arc<Entity>> {
        match self {
            Self::Resolved(entity) => Some(entity),
            Self::Key(_) | Self::Missing(_) => None,
        }
    }

    /// Returns the key of an unresolved or missing reference.
    pub fn key(&self) -> Option<&Key> {
        match self {
            Self::Resolved(_) => None,
            Self::Key(key) | Self::Missing(key) => Some(key),
        }
    }

    /// Returns true if resolution found nothing.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing(_))
    }
}

impl From<Key> for Reference {
    fn from(key: Key) -> Self {
        Self::Key(key)
    }
}

impl From<Entity> for Reference {
    fn from(entity: Entity) -> Self {
        Self::Resolved(Arc::new(entity))
    }
}

impl From<Arc<Entity>> for Reference {
    fn from(entity: Arc<Entity>) -> Self {
        Self::Resolved(entity)
    }
}

/// The value of one field of an [`Entity`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Property {
    /// No value.
    #[default]
    Null,
    /// A plain value.
    Value(Value),
    /// An embedded object.
    Embedded(Box<Entity>),
    /// A sequence of embedded objects.
    EmbeddedList(Vec<Entity>),
    /// A single reference.
    Reference(Reference),
    /// A sequence of references, in field order.
    References(Vec<Reference>),
}

impl Property {
    /// Returns true for [`Property::Null`] and a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null | Self::Value(Value::Null))
    }

    /// Returns the plain value, if this is one.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the embedded object, if this is one.
    pub fn as_embedded(&self) -> Option<&Entity> {
        match self {
            Self::Embedded(entity) => Some(entity),
            _ => None,
        }
    }

    /// Returns the single reference, if this is one.
    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            Self::Reference(reference) => Some(reference),
            _ => None,
        }
    }

    /// Returns the reference sequence, if this is one.
    pub fn as_references(&self) -> Option<&[Reference]> {
        match self {
            Self::References(references) => Some(references),
            _ => None,
        }
    }
}

impl From<Value> for Property {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Entity> for Property {
    fn from(entity: Entity) -> Self {
        Self::Embedded(Box::new(entity))
    }
}

impl From<Vec<Entity>> for Property {
    fn from(entities: Vec<Entity>) -> Self {
        Self::EmbeddedList(entities)
    }
}

impl From<Reference> for Property {
    fn from(reference: Reference) -> Self {
        Self::Reference(reference)
    }
}

impl From<Vec<Reference>> for Property {
    fn from(references: Vec<Reference>) -> Self {
        Self::References(references)
    }
}

impl From<Key> for Property {
    fn from(key: Key) -> Self {
        Self::Reference(Reference::Key(key))
    }
}

macro_rules! property_from_value {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for Property {
                fn from(value: $t) -> Self {
                    Self::Value(Value::from(value))
                }
            }
        )*
    };
}

property_from_value!(bool, i64, i32, u32, String, &str, entimap_codec::ObjectId);
