//! Type identity.

use std::fmt;
use std::sync::Arc;

/// The name identifying a mapped type.
///
/// Cheap to clone. Names may be qualified with `.` or `::`; the last
/// segment is the simple name used for default collection names.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassName(Arc<str>);

impl ClassName {
    /// Creates a class name.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// Returns the full name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the last path segment.
    pub fn simple_name(&self) -> &str {
        let tail = self.0.rsplit("::").next().unwrap_or(&self.0);
        tail.rsplit('.').next().unwrap_or(tail)
    }
}

impl fmt::Debug for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassName({})", self.0)
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClassName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ClassName {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl From<&ClassName> for ClassName {
    fn from(name: &ClassName) -> Self {
        name.clone()
    }
}
