//! Mapping validation, run once per type before its descriptor is cached.

use crate::error::{MapperError, MapperResult};
use crate::mapping::{MappedClass, Mapper};
use crate::schema::{FieldAnnotationKind, FieldType, ScalarKind, TypeAnnotationKind};
use std::collections::HashSet;

/// Checks the annotation configuration of `class`.
///
/// Every problem found is reported in one [`MapperError::Mapping`].
pub(crate) fn validate(class: &MappedClass, mapper: &Mapper) -> MapperResult<()> {
    let name = class.class_name();
    let mut problems = Vec::new();

    let ids = class.fields_annotated_with(FieldAnnotationKind::Id);
    if ids.len() > 1 {
        problems.push(format!("{name} has {} Id fields", ids.len()));
    }
    let versions = class.fields_annotated_with(FieldAnnotationKind::Version);
    if versions.len() > 1 {
        problems.push(format!("{name} has {} Version fields", versions.len()));
    }

    if !class.annotations(&TypeAnnotationKind::Entity).is_empty()
        && !class.annotations(&TypeAnnotationKind::Embedded).is_empty()
    {
        problems.push(format!("{name} cannot be both Entity and Embedded"));
    }

    let mut stored_names = HashSet::new();
    for field in class.persistence_fields() {
        if !stored_names.insert(field.stored_name()) {
            problems.push(format!(
                "{name}.{} is stored as {}, which is already used",
                field.name(),
                field.stored_name()
            ));
        }

        if field.is_id() && field.is_reference() {
            problems.push(format!("{name}.{} cannot be both Id and Reference", field.name()));
        }

        if field.is_version() && field.field_type() != &FieldType::Scalar(ScalarKind::Integer) {
            problems.push(format!(
                "{name}.{} is a Version field of type {}, must be integer",
                field.name(),
                field.field_type()
            ));
        }

        if field.is_reference() {
            match field.target_class() {
                None => problems.push(format!(
                    "{name}.{} is a Reference of type {}, which names no class",
                    field.name(),
                    field.field_type()
                )),
                Some(target) if mapper.schemas().schema(target).is_none() => {
                    problems.push(format!(
                        "{name}.{} references unregistered type {target}",
                        field.name()
                    ));
                }
                Some(_) => {}
            }
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(MapperError::mapping(problems.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use crate::error::MapperError;
    use crate::mapping::Mapper;
    use crate::schema::{FieldSchema, FieldType, SchemaRegistry, TypeSchema};
    use std::sync::Arc;

    fn mapping_error(schema: TypeSchema) -> String {
        let mapper = Mapper::new(Arc::new(SchemaRegistry::new().with(schema)));
        match mapper.get_mapped_class(&"Broken".into()) {
            Err(MapperError::Mapping { message }) => message,
            other => panic!("expected mapping error, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_ids() {
        let message = mapping_error(
            TypeSchema::class("Broken")
                .entity()
                .field(FieldSchema::new("a", FieldType::object_id()).id())
                .field(FieldSchema::new("b", FieldType::object_id()).id()),
        );
        assert!(message.contains("2 Id fields"));
    }

    #[test]
    fn entity_and_embedded() {
        let message = mapping_error(TypeSchema::class("Broken").entity().embedded());
        assert!(message.contains("both Entity and Embedded"));
    }

    #[test]
    fn version_must_be_integer() {
        let message = mapping_error(
            TypeSchema::class("Broken")
                .entity()
                .field(FieldSchema::new("v", FieldType::text()).version()),
        );
        assert!(message.contains("must be integer"));
    }

    #[test]
    fn unregistered_reference_target() {
        let message = mapping_error(
            TypeSchema::class("Broken")
                .entity()
                .field(FieldSchema::new("owner", FieldType::class("Ghost")).reference()),
        );
        assert!(message.contains("unregistered type Ghost"));
    }

    #[test]
    fn problems_are_reported_together() {
        let message = mapping_error(
            TypeSchema::class("Broken")
                .entity()
                .field(FieldSchema::new("id", FieldType::class("Broken")).id().reference())
                .field(FieldSchema::new("name", FieldType::text()).stored_as("_id")),
        );
        assert!(message.contains("both Id and Reference"));
        assert!(message.contains("already used"));
    }
}
