//! Type- and field-level annotations.

use crate::schema::ClassName;
use entimap_codec::Value;

/// Options of the entity marker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityOptions {
    /// Collection name; the simple class name when absent.
    pub collection: Option<String>,
    /// Do not write the class name discriminator into documents.
    pub no_class_name_stored: bool,
}

/// Options of the embedded marker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbeddedOptions {
    /// Preferred stored name when used as a field.
    pub name: Option<String>,
}

/// An annotation placed on a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeAnnotation {
    /// Top-level persistent type with its own collection.
    Entity(EntityOptions),
    /// Type persisted inside its owner's document.
    Embedded(EmbeddedOptions),
    /// External listener types receiving lifecycle callbacks.
    EntityListeners(Vec<ClassName>),
    /// Any other annotation, kept for collaborators.
    Custom {
        /// Annotation name.
        name: String,
        /// Annotation payload.
        value: Value,
    },
}

/// Discriminant used to group type annotations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeAnnotationKind {
    /// [`TypeAnnotation::Entity`].
    Entity,
    /// [`TypeAnnotation::Embedded`].
    Embedded,
    /// [`TypeAnnotation::EntityListeners`].
    EntityListeners,
    /// [`TypeAnnotation::Custom`] with the given name.
    Custom(String),
}

impl TypeAnnotation {
    /// Returns the grouping kind.
    pub fn kind(&self) -> TypeAnnotationKind {
        match self {
            Self::Entity(_) => TypeAnnotationKind::Entity,
            Self::Embedded(_) => TypeAnnotationKind::Embedded,
            Self::EntityListeners(_) => TypeAnnotationKind::EntityListeners,
            Self::Custom { name, .. } => TypeAnnotationKind::Custom(name.clone()),
        }
    }
}

/// Configuration of a reference field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReferenceOptions {
    /// Store the bare id instead of a `{"$ref", "$id"}` pointer.
    pub id_only: bool,
    /// Leave the reference unresolved on load; resolve on demand.
    pub lazy: bool,
}

impl ReferenceOptions {
    /// Id-only pointers, resolved eagerly.
    pub fn id_only() -> Self {
        Self {
            id_only: true,
            lazy: false,
        }
    }

    /// Full pointers, resolved on demand.
    pub fn lazy() -> Self {
        Self {
            id_only: false,
            lazy: true,
        }
    }
}

/// An annotation placed on a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldAnnotation {
    /// The identity field; stored as `_id`.
    Id,
    /// Optimistic-locking version counter.
    Version,
    /// Persisted as a pointer to another entity's document.
    Reference(ReferenceOptions),
    /// Stored under a different property name.
    Property(String),
    /// Never persisted.
    Transient,
    /// Persisted inline as a sub-document.
    Embedded,
}

/// Discriminant used to select fields by annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldAnnotationKind {
    /// [`FieldAnnotation::Id`].
    Id,
    /// [`FieldAnnotation::Version`].
    Version,
    /// [`FieldAnnotation::Reference`].
    Reference,
    /// [`FieldAnnotation::Property`].
    Property,
    /// [`FieldAnnotation::Transient`].
    Transient,
    /// [`FieldAnnotation::Embedded`].
    Embedded,
}

impl FieldAnnotation {
    /// Returns the selection kind.
    pub fn kind(&self) -> FieldAnnotationKind {
        match self {
            Self::Id => FieldAnnotationKind::Id,
            Self::Version => FieldAnnotationKind::Version,
            Self::Reference(_) => FieldAnnotationKind::Reference,
            Self::Property(_) => FieldAnnotationKind::Property,
            Self::Transient => FieldAnnotationKind::Transient,
            Self::Embedded => FieldAnnotationKind::Embedded,
        }
    }
}
