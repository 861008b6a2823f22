//! Query values and criteria.

use crate::entity::{Entity, Key};
use crate::query::FilterOperator;
use entimap_codec::{ObjectId, Value};

/// A value supplied to a query predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    /// A plain value.
    Value(Value),
    /// An entity instance; compared by type.
    Entity(Entity),
    /// An identity key; compared by its referenced type.
    Key(Key),
}

impl QueryValue {
    /// Returns true for a null plain value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Value(Value::Null))
    }

    /// Describes the value's type for validation messages.
    pub fn type_description(&self) -> String {
        match self {
            Self::Value(value) => value.type_name().to_string(),
            Self::Entity(entity) => entity.class().to_string(),
            Self::Key(key) => format!("Key<{}>", key.class),
        }
    }
}

impl From<Value> for QueryValue {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Entity> for QueryValue {
    fn from(entity: Entity) -> Self {
        Self::Entity(entity)
    }
}

impl From<Key> for QueryValue {
    fn from(key: Key) -> Self {
        Self::Key(key)
    }
}

macro_rules! query_value_from {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for QueryValue {
                fn from(value: $t) -> Self {
                    Self::Value(Value::from(value))
                }
            }
        )*
    };
}

query_value_from!(bool, i64, i32, String, &str, ObjectId, Vec<Value>);

/// One predicate: a field path, an operator and a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criterion {
    /// Field path; dotted segments descend into embedded fields. Each
    /// segment is a stored or a declared name.
    pub field: String,
    /// The operator.
    pub operator: FilterOperator,
    /// The supplied value.
    pub value: QueryValue,
}

impl Criterion {
    /// Creates a predicate.
    pub fn new(
        field: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<QueryValue>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// `field == value`.
    pub fn eq(field: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        Self::new(field, FilterOperator::Equal, value)
    }
}
