//! Schema sources.

use crate::schema::{ClassName, TypeSchema};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Supplies type descriptions to the mapper.
///
/// The mapper asks for a type the first time it needs to map it, then
/// caches what it built. Implementations must answer the same way every
/// time for a given name.
pub trait SchemaSource: Send + Sync {
    /// Returns the description of `class`, if it is known.
    fn schema(&self, class: &ClassName) -> Option<Arc<TypeSchema>>;
}

/// Explicitly registered type descriptions.
#[derive(Default)]
pub struct SchemaRegistry {
    schemas: RwLock<HashMap<ClassName, Arc<TypeSchema>>>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration.
    #[must_use]
    pub fn with(self, schema: TypeSchema) -> Self {
        self.register(schema);
        self
    }

    /// Registers a type, replacing any previous description of it.
    pub fn register(&self, schema: TypeSchema) {
        self.schemas
            .write()
            .insert(schema.name().clone(), Arc::new(schema));
    }

    /// Returns true if the type is registered.
    pub fn contains(&self, class: &ClassName) -> bool {
        self.schemas.read().contains_key(class)
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.schemas.read().len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.schemas.read().is_empty()
    }
}

impl SchemaSource for SchemaRegistry {
    fn schema(&self, class: &ClassName) -> Option<Arc<TypeSchema>> {
        self.schemas.read().get(class).cloned()
    }
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.schemas.read().keys().cloned().collect();
        names.sort();
        f.debug_struct("SchemaRegistry")
            .field("types", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSchema, FieldType};

    #[test]
    fn register_and_lookup() {
        let registry = SchemaRegistry::new()
            .with(TypeSchema::interface("User"))
            .with(
                TypeSchema::class("UserImpl")
                    .entity()
                    .implements("User")
                    .field(FieldSchema::new("id", FieldType::object_id()).id()),
            );

        assert_eq!(registry.len(), 2);
        let user = registry.schema(&ClassName::new("UserImpl")).unwrap();
        assert_eq!(user.interfaces(), &[ClassName::new("User")]);
        assert!(registry.schema(&ClassName::new("Nope")).is_none());
    }
}
