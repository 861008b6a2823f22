//! Declared field types.

use crate::schema::ClassName;
use entimap_codec::Value;
use std::fmt;

/// Scalar kinds a field can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// `true` / `false`.
    Bool,
    /// Any signed integer width.
    Integer,
    /// UTF-8 text.
    Text,
    /// Raw bytes.
    Bytes,
    /// Generated object identifier.
    ObjectId,
    /// Untyped; accepts any value.
    Any,
}

impl ScalarKind {
    /// Returns true if a stored value of this shape fits the kind.
    pub fn accepts(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (ScalarKind::Any, _)
                | (ScalarKind::Bool, Value::Bool(_))
                | (ScalarKind::Integer, Value::Integer(_))
                | (ScalarKind::Text, Value::Text(_))
                | (ScalarKind::Bytes, Value::Bytes(_))
                | (ScalarKind::ObjectId, Value::Id(_))
        )
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::Integer => "integer",
            ScalarKind::Text => "text",
            ScalarKind::Bytes => "bytes",
            ScalarKind::ObjectId => "object id",
            ScalarKind::Any => "any",
        }
    }
}

/// The declared type of a field, including generic arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// A scalar.
    Scalar(ScalarKind),
    /// Another registered type (entity, embedded, interface).
    Class(ClassName),
    /// Ordered collection.
    List(Box<FieldType>),
    /// Unordered collection.
    Set(Box<FieldType>),
    /// Fixed array.
    Array(Box<FieldType>),
    /// String-keyed map.
    Map(Box<FieldType>),
}

impl FieldType {
    /// Scalar shorthand.
    pub fn scalar(kind: ScalarKind) -> Self {
        Self::Scalar(kind)
    }

    /// `ObjectId` shorthand.
    pub fn object_id() -> Self {
        Self::Scalar(ScalarKind::ObjectId)
    }

    /// `Integer` shorthand.
    pub fn integer() -> Self {
        Self::Scalar(ScalarKind::Integer)
    }

    /// `Text` shorthand.
    pub fn text() -> Self {
        Self::Scalar(ScalarKind::Text)
    }

    /// Class shorthand.
    pub fn class(name: impl Into<ClassName>) -> Self {
        Self::Class(name.into())
    }

    /// `List<element>`.
    pub fn list(element: FieldType) -> Self {
        Self::List(Box::new(element))
    }

    /// `Set<element>`.
    pub fn set(element: FieldType) -> Self {
        Self::Set(Box::new(element))
    }

    /// `element[]`.
    pub fn array(element: FieldType) -> Self {
        Self::Array(Box::new(element))
    }

    /// `Map<String, element>`.
    pub fn map(element: FieldType) -> Self {
        Self::Map(Box::new(element))
    }

    /// Returns true for list, set and array types.
    pub fn is_multiple(&self) -> bool {
        matches!(self, Self::List(_) | Self::Set(_) | Self::Array(_))
    }

    /// The element type of a multi-valued type, or the type itself.
    pub fn element_type(&self) -> &FieldType {
        match self {
            Self::List(inner) | Self::Set(inner) | Self::Array(inner) => inner.element_type(),
            other => other,
        }
    }

    /// The class a single or multi-valued class type refers to.
    pub fn class_name(&self) -> Option<&ClassName> {
        match self.element_type() {
            Self::Class(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(kind) => f.write_str(kind.name()),
            Self::Class(name) => write!(f, "{name}"),
            Self::List(inner) => write!(f, "List<{inner}>"),
            Self::Set(inner) => write!(f, "Set<{inner}>"),
            Self::Array(inner) => write!(f, "{inner}[]"),
            Self::Map(inner) => write!(f, "Map<text, {inner}>"),
        }
    }
}
