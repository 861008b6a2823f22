//! Lookup predicates.

use entimap_codec::{Document, Value};
use std::fmt;

/// Name of the identity property of every stored document.
pub const ID_FIELD: &str = "_id";

/// A predicate over a top-level document property.
///
/// Stores only need to understand equality and set membership; richer
/// query execution belongs to the storage engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `field == value`.
    Eq {
        /// Property name.
        field: String,
        /// Expected value.
        value: Value,
    },
    /// `field` is one of `values`.
    In {
        /// Property name.
        field: String,
        /// Accepted values.
        values: Vec<Value>,
    },
}

impl Filter {
    /// `_id == id`.
    pub fn id_eq(id: Value) -> Self {
        Self::Eq {
            field: ID_FIELD.to_string(),
            value: id,
        }
    }

    /// `_id` is one of `ids`.
    pub fn id_in(ids: Vec<Value>) -> Self {
        Self::In {
            field: ID_FIELD.to_string(),
            values: ids,
        }
    }

    /// Returns true if the document satisfies this predicate.
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Filter::Eq { field, value } => document.get(field) == Some(value),
            Filter::In { field, values } => document
                .get(field)
                .is_some_and(|v| values.iter().any(|candidate| candidate == v)),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Eq { field, value } => write!(f, "{field} == {value:?}"),
            Filter::In { field, values } => write!(f, "{field} in {values:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eq_and_in() {
        let doc = Document::new().with("_id", 3).with("name", "x");
        assert!(Filter::id_eq(Value::Integer(3)).matches(&doc));
        assert!(!Filter::id_eq(Value::Integer(4)).matches(&doc));
        assert!(Filter::id_in(vec![Value::Integer(1), Value::Integer(3)]).matches(&doc));
        assert!(!Filter::id_in(vec![]).matches(&doc));
    }

    #[test]
    fn missing_field_never_matches() {
        let doc = Document::new().with("name", "x");
        assert!(!Filter::id_eq(Value::Null).matches(&doc));
    }
}
