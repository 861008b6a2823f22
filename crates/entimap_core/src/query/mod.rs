//! Query value validation.

mod failure;
mod operator;
mod validator;
mod value;

pub use failure::ValidationFailure;
pub use operator::FilterOperator;
pub use validator::QueryValidator;
pub use value::{Criterion, QueryValue};
