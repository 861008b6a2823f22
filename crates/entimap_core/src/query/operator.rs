//! Filter operators.

use std::fmt;

/// The operator of one query predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    /// `$eq`
    Equal,
    /// `$ne`
    NotEqual,
    /// `$gt`
    GreaterThan,
    /// `$gte`
    GreaterThanOrEqual,
    /// `$lt`
    LessThan,
    /// `$lte`
    LessThanOrEqual,
    /// `$exists`; the value is a boolean.
    Exists,
    /// `$size`; the value is an element count.
    Size,
    /// `$in`; the value is an array of candidates.
    In,
    /// `$nin`; the value is an array of excluded values.
    NotIn,
    /// `$all`; the value is an array of required elements.
    All,
    /// `$mod`; the value is `[divisor, remainder]`.
    Mod,
}

impl FilterOperator {
    /// Wire name of the operator.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "$eq",
            Self::NotEqual => "$ne",
            Self::GreaterThan => "$gt",
            Self::GreaterThanOrEqual => "$gte",
            Self::LessThan => "$lt",
            Self::LessThanOrEqual => "$lte",
            Self::Exists => "$exists",
            Self::Size => "$size",
            Self::In => "$in",
            Self::NotIn => "$nin",
            Self::All => "$all",
            Self::Mod => "$mod",
        }
    }

    /// Returns true for equality and ordering operators.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Equal
                | Self::NotEqual
                | Self::GreaterThan
                | Self::GreaterThanOrEqual
                | Self::LessThan
                | Self::LessThanOrEqual
        )
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
