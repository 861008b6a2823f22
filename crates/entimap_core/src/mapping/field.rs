//! Field descriptors.

use crate::schema::{
    ClassName, FieldAnnotation, FieldAnnotationKind, FieldSchema, FieldType, ReferenceOptions,
};
use entimap_store::ID_FIELD;

/// One persistent property of a mapped class.
///
/// Built once when the declaring class is discovered, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedField {
    declaring_class: ClassName,
    name: String,
    stored_name: String,
    field_type: FieldType,
    annotations: Vec<FieldAnnotation>,
    transient: bool,
}

impl MappedField {
    /// Builds the descriptor of a declared field.
    pub fn new(declaring_class: &ClassName, schema: &FieldSchema) -> Self {
        let annotations = schema.annotations().to_vec();
        let stored_name = if annotations.contains(&FieldAnnotation::Id) {
            ID_FIELD.to_string()
        } else {
            annotations
                .iter()
                .find_map(|a| match a {
                    FieldAnnotation::Property(name) => Some(name.clone()),
                    _ => None,
                })
                .unwrap_or_else(|| schema.name().to_string())
        };
        let transient =
            schema.has_transient_modifier() || annotations.contains(&FieldAnnotation::Transient);

        Self {
            declaring_class: declaring_class.clone(),
            name: schema.name().to_string(),
            stored_name,
            field_type: schema.field_type().clone(),
            annotations,
            transient,
        }
    }

    /// The class that declares the field.
    pub fn declaring_class(&self) -> &ClassName {
        &self.declaring_class
    }

    /// Declared field name; the key used on [`crate::Entity`].
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Document key the field is stored under.
    pub fn stored_name(&self) -> &str {
        &self.stored_name
    }

    /// Declared type.
    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    /// All annotations, in declaration order.
    pub fn annotations(&self) -> &[FieldAnnotation] {
        &self.annotations
    }

    /// Returns the first annotation of `kind`.
    pub fn annotation(&self, kind: FieldAnnotationKind) -> Option<&FieldAnnotation> {
        self.annotations.iter().find(|a| a.kind() == kind)
    }

    /// Returns true if the field carries an annotation of `kind`.
    pub fn has_annotation(&self, kind: FieldAnnotationKind) -> bool {
        self.annotation(kind).is_some()
    }

    /// Returns true if the field is never persisted.
    pub fn is_transient(&self) -> bool {
        self.transient
    }

    /// Returns true for the id field.
    pub fn is_id(&self) -> bool {
        self.has_annotation(FieldAnnotationKind::Id)
    }

    /// Returns true for the version field.
    pub fn is_version(&self) -> bool {
        self.has_annotation(FieldAnnotationKind::Version)
    }

    /// Returns true for reference fields.
    pub fn is_reference(&self) -> bool {
        self.has_annotation(FieldAnnotationKind::Reference)
    }

    /// Reference configuration, for reference fields.
    pub fn reference_options(&self) -> Option<ReferenceOptions> {
        self.annotations.iter().find_map(|a| match a {
            FieldAnnotation::Reference(options) => Some(*options),
            _ => None,
        })
    }

    /// Returns true for list, set and array fields.
    pub fn is_multiple(&self) -> bool {
        self.field_type.is_multiple()
    }

    /// The class named by the field type or its element type.
    pub fn target_class(&self) -> Option<&ClassName> {
        self.field_type.class_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(schema: FieldSchema) -> MappedField {
        MappedField::new(&ClassName::new("Job"), &schema)
    }

    #[test]
    fn stored_names() {
        assert_eq!(
            field(FieldSchema::new("id", FieldType::object_id()).id()).stored_name(),
            "_id"
        );
        assert_eq!(
            field(FieldSchema::new("title", FieldType::text()).stored_as("t")).stored_name(),
            "t"
        );
        assert_eq!(
            field(FieldSchema::new("title", FieldType::text())).stored_name(),
            "title"
        );
    }

    #[test]
    fn reference_queries() {
        let owners = field(
            FieldSchema::new("owners", FieldType::list(FieldType::class("User")))
                .reference_with(ReferenceOptions::id_only()),
        );
        assert!(owners.is_reference());
        assert!(owners.is_multiple());
        assert_eq!(owners.target_class(), Some(&ClassName::new("User")));
        assert_eq!(owners.reference_options(), Some(ReferenceOptions::id_only()));
        assert!(!owners.is_id());
    }

    #[test]
    fn transient_either_way() {
        assert!(field(FieldSchema::new("cache", FieldType::text()).transient()).is_transient());
        assert!(
            field(FieldSchema::new("cache", FieldType::text()).transient_modifier())
                .is_transient()
        );
        assert!(!field(FieldSchema::new("cache", FieldType::text())).is_transient());
    }
}
