//! Dynamic document value type.

use crate::document::Document;
use crate::id::ObjectId;
use serde::{Deserialize, Serialize};

/// A dynamic document value.
///
/// This is every shape a stored property can take. Floats are intentionally
/// not supported, which keeps `Value` usable as a hash key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    /// Absent or explicitly null.
    Null,
    /// `true` or `false`.
    Bool(bool),
    /// Signed integer (full i64 range).
    Integer(i64),
    /// UTF-8 text.
    Text(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// Generated object identifier.
    Id(ObjectId),
    /// Ordered sequence of values.
    Array(Vec<Value>),
    /// Nested document.
    Document(Document),
}

macro_rules! accessor {
    ($(#[$doc:meta])* $name:ident, $variant:ident, $out:ty, |$v:ident| $map:expr) => {
        $(#[$doc])*
        pub fn $name(&self) -> Option<$out> {
            match self {
                Value::$variant($v) => Some($map),
                _ => None,
            }
        }
    };
}

impl Value {
    /// Returns true for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        *self == Value::Null
    }

    accessor!(
        /// The boolean, for [`Value::Bool`].
        as_bool, Bool, bool, |b| *b
    );
    accessor!(
        /// The integer, for [`Value::Integer`].
        as_integer, Integer, i64, |n| *n
    );
    accessor!(
        /// The text, for [`Value::Text`].
        as_text, Text, &str, |s| s.as_str()
    );
    accessor!(
        /// The bytes, for [`Value::Bytes`].
        as_bytes, Bytes, &[u8], |b| b.as_slice()
    );
    accessor!(
        /// The object id, for [`Value::Id`].
        as_object_id, Id, ObjectId, |id| *id
    );
    accessor!(
        /// The items, for [`Value::Array`].
        as_array, Array, &[Value], |items| items.as_slice()
    );
    accessor!(
        /// The nested document, for [`Value::Document`].
        as_document, Document, &Document, |document| document
    );

    /// Human-readable name of this value's kind, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Id(_) => "object id",
            Value::Array(_) => "array",
            Value::Document(_) => "document",
        }
    }
}

macro_rules! value_from {
    ($($source:ty => |$v:ident| $make:expr),* $(,)?) => {
        $(
            impl From<$source> for Value {
                fn from($v: $source) -> Self {
                    $make
                }
            }
        )*
    };
}

value_from!(
    bool => |b| Value::Bool(b),
    i64 => |n| Value::Integer(n),
    i32 => |n| Value::Integer(i64::from(n)),
    u32 => |n| Value::Integer(i64::from(n)),
    String => |text| Value::Text(text),
    &str => |text| Value::Text(text.to_owned()),
    Vec<u8> => |bytes| Value::Bytes(bytes),
    ObjectId => |id| Value::Id(id),
    Document => |document| Value::Document(document),
    Vec<Value> => |items| Value::Array(items),
);

impl From<()> for Value {
    fn from((): ()) -> Self {
        Value::Null
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}
