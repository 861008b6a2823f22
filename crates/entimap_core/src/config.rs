//! Mapper configuration.

/// What to do with a reference whose target document does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DanglingPolicy {
    /// Keep the slot as [`crate::Reference::Missing`].
    #[default]
    Keep,
    /// Remove the slot; sequences get shorter, single references become null.
    Drop,
    /// Fail the load with [`crate::MapperError::DanglingReference`].
    Fail,
}

/// Options controlling how entities are mapped.
#[derive(Debug, Clone)]
pub struct MapperOptions {
    /// Lower-case default collection names.
    pub use_lower_case_collection_names: bool,

    /// Write null fields instead of skipping them.
    pub store_nulls: bool,

    /// Write empty arrays instead of skipping them.
    pub store_empties: bool,

    /// Document key holding the class name discriminator.
    pub class_name_key: String,

    /// Handling of references to missing documents.
    pub dangling_references: DanglingPolicy,
}

impl Default for MapperOptions {
    fn default() -> Self {
        Self {
            use_lower_case_collection_names: false,
            store_nulls: false,
            store_empties: false,
            class_name_key: "className".to_string(),
            dangling_references: DanglingPolicy::Keep,
        }
    }
}

impl MapperOptions {
    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether default collection names are lower-cased.
    #[must_use]
    pub const fn use_lower_case_collection_names(mut self, value: bool) -> Self {
        self.use_lower_case_collection_names = value;
        self
    }

    /// Sets whether null fields are written.
    #[must_use]
    pub const fn store_nulls(mut self, value: bool) -> Self {
        self.store_nulls = value;
        self
    }

    /// Sets whether empty arrays are written.
    #[must_use]
    pub const fn store_empties(mut self, value: bool) -> Self {
        self.store_empties = value;
        self
    }

    /// Sets the class name discriminator key.
    #[must_use]
    pub fn class_name_key(mut self, key: impl Into<String>) -> Self {
        self.class_name_key = key.into();
        self
    }

    /// Sets the dangling reference policy.
    #[must_use]
    pub const fn dangling_references(mut self, policy: DanglingPolicy) -> Self {
        self.dangling_references = policy;
        self
    }
}
