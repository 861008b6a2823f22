//! Property-based test generators.
//!
//! Provides proptest strategies for stored values, identifiers, class
//! names and reference layouts.

use entimap_codec::{Document, ObjectId, Value};
use entimap_core::schema::ClassName;
use proptest::prelude::*;

/// Strategy for generating object ids.
pub fn object_id_strategy() -> impl Strategy<Value = ObjectId> {
    prop::array::uniform16(any::<u8>()).prop_map(ObjectId::from_bytes)
}

/// Strategy for generating scalar values (no arrays or documents).
pub fn scalar_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Integer),
        "[a-zA-Z0-9 ]{0,24}".prop_map(Value::Text),
        prop::collection::vec(any::<u8>(), 0..16).prop_map(Value::Bytes),
        object_id_strategy().prop_map(Value::Id),
    ]
}

/// Strategy for generating nested values up to a small depth.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    scalar_value_strategy().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::vec(("[a-z]{1,8}", inner), 0..4)
                .prop_map(|entries| Value::Document(entries.into_iter().collect::<Document>())),
        ]
    })
}

/// Strategy for generating qualified class names such as `org.acme.Job`.
pub fn class_name_strategy() -> impl Strategy<Value = ClassName> {
    prop::string::string_regex("([a-z]{2,6}\\.){0,3}[A-Z][a-zA-Z0-9]{0,12}")
        .expect("valid regex")
        .prop_map(ClassName::new)
}

/// Strategy for generating author id lists that repeat ids.
///
/// Ids are drawn from a small range so duplicates are common.
pub fn author_ids_strategy() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(1i64..12, 1..24)
}

/// Strategy for generating author names.
pub fn author_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z][a-z]{2,10}").expect("valid regex")
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 128,
            max_shrink_iters: 500,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn class_names_have_simple_names(name in class_name_strategy()) {
            let simple = name.simple_name();
            prop_assert!(!simple.contains('.'));
            prop_assert!(simple.chars().next().is_some_and(char::is_uppercase));
        }

        #[test]
        fn author_ids_stay_in_range(ids in author_ids_strategy()) {
            prop_assert!(!ids.is_empty());
            prop_assert!(ids.iter().all(|id| (1..12).contains(id)));
        }
    }
}
