//! Validation failures.

use crate::query::FilterOperator;
use std::fmt;

/// One incompatible query predicate.
///
/// Failures are collected, not raised, so every problem of a query can be
/// reported at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    /// The field path as given.
    pub field: String,
    /// The predicate's operator.
    pub operator: FilterOperator,
    /// Type of the supplied value.
    pub actual: String,
    /// What the field accepts.
    pub expected: String,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
