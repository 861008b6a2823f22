//! Compatibility of query values with mapped fields.

use crate::error::MapperResult;
use crate::mapping::{MappedClass, MappedField, Mapper};
use crate::query::{Criterion, FilterOperator, QueryValue, ValidationFailure};
use crate::schema::{ClassName, FieldType, ScalarKind};
use entimap_codec::{DbRef, Value};
use std::sync::Arc;

/// Checks query predicates against class descriptors.
///
/// Read-only over descriptors the mapper already built or can build; never
/// touches a store.
#[derive(Debug, Clone, Copy)]
pub struct QueryValidator<'a> {
    mapper: &'a Mapper,
}

/// Arguments shared by every check in the chain.
struct Check<'c> {
    /// Path as written in the query; the field name when checked directly.
    path: &'c str,
    field: &'c MappedField,
    declared: &'c FieldType,
    operator: FilterOperator,
    value: &'c QueryValue,
}

impl Check<'_> {
    fn fail(&self, failures: &mut Vec<ValidationFailure>, expected: impl Into<String>, message: String) {
        failures.push(ValidationFailure {
            field: self.path.to_string(),
            operator: self.operator,
            actual: self.value.type_description(),
            expected: expected.into(),
            message,
        });
    }

    fn plain(&self) -> Option<&Value> {
        match self.value {
            QueryValue::Value(value) => Some(value),
            _ => None,
        }
    }
}

impl<'a> QueryValidator<'a> {
    /// Creates a validator over `mapper`'s descriptors.
    pub fn new(mapper: &'a Mapper) -> Self {
        Self { mapper }
    }

    /// Returns true if `value` may be used with `operator` against `field`,
    /// whose declared type is `declared`.
    ///
    /// Checks run in a fixed order and the first one that applies decides.
    /// The value is compatible when a check applied and added nothing to
    /// `failures`. Null values are always compatible.
    pub fn is_compatible_for_operator(
        &self,
        class: &MappedClass,
        field: &MappedField,
        declared: &FieldType,
        operator: FilterOperator,
        value: &QueryValue,
        failures: &mut Vec<ValidationFailure>,
    ) -> bool {
        let check = Check {
            path: field.name(),
            field,
            declared,
            operator,
            value,
        };
        self.run_checks(class, &check, failures)
    }

    fn run_checks(
        &self,
        class: &MappedClass,
        check: &Check<'_>,
        failures: &mut Vec<ValidationFailure>,
    ) -> bool {
        if check.value.is_null() {
            return true;
        }
        let before = failures.len();
        let applied = exists(check, failures)
            || size(check, failures)
            || array_operand(check, failures)
            || modulo(check, failures)
            || self.key_value(check, failures)
            || self.entity_value(check, failures)
            || self.reference_id(class, check, failures)
            || scalar(check, failures)
            || default_type(check, failures);

        applied && failures.len() == before
    }

    /// Validates every criterion of a query against `class`.
    ///
    /// Returns all failures; an empty list means the query is valid.
    ///
    /// # Errors
    ///
    /// Fails only if `class` (or an embedded type on a path) cannot be
    /// mapped.
    pub fn validate(
        &self,
        class: &ClassName,
        criteria: &[Criterion],
    ) -> MapperResult<Vec<ValidationFailure>> {
        let root = self.mapper.get_mapped_class(class)?;
        let mut failures = Vec::new();
        for criterion in criteria {
            match self.resolve_path(&root, &criterion.field)? {
                Some((owner, field)) => {
                    let check = Check {
                        path: &criterion.field,
                        field: &field,
                        declared: field.field_type(),
                        operator: criterion.operator,
                        value: &criterion.value,
                    };
                    self.run_checks(&owner, &check, &mut failures);
                }
                None => failures.push(ValidationFailure {
                    field: criterion.field.clone(),
                    operator: criterion.operator,
                    actual: criterion.value.type_description(),
                    expected: "a mapped field".to_string(),
                    message: format!(
                        "the field '{}' could not be found in '{}'",
                        criterion.field, class
                    ),
                }),
            }
        }
        Ok(failures)
    }

    /// Walks a dotted path through embedded fields.
    fn resolve_path(
        &self,
        root: &Arc<MappedClass>,
        path: &str,
    ) -> MapperResult<Option<(Arc<MappedClass>, MappedField)>> {
        let mut owner = root.clone();
        let mut segments = path.split('.').peekable();
        while let Some(segment) = segments.next() {
            let Some(field) = owner
                .mapped_field(segment)
                .or_else(|| owner.mapped_field_by_java_field(segment))
                .cloned()
            else {
                return Ok(None);
            };
            if segments.peek().is_none() {
                return Ok(Some((owner, field)));
            }
            let next = match field.target_class() {
                Some(target) if !field.is_reference() => self.mapper.get_mapped_class(target)?,
                _ => return Ok(None),
            };
            owner = next;
        }
        Ok(None)
    }

    fn key_value(&self, check: &Check<'_>, failures: &mut Vec<ValidationFailure>) -> bool {
        let QueryValue::Key(key) = check.value else {
            return false;
        };
        if !self.assignable(&key.class, check.declared) {
            check.fail(
                failures,
                check.declared.to_string(),
                format!(
                    "the type {} of the key is not compatible with field {}, declared {}",
                    key.class,
                    check.path,
                    check.declared
                ),
            );
        }
        true
    }

    fn entity_value(&self, check: &Check<'_>, failures: &mut Vec<ValidationFailure>) -> bool {
        let QueryValue::Entity(entity) = check.value else {
            return false;
        };
        if !self.assignable(entity.class(), check.declared) {
            check.fail(
                failures,
                check.declared.to_string(),
                format!(
                    "a value of type {} cannot be compared with field {}, declared {}",
                    entity.class(),
                    check.path,
                    check.declared
                ),
            );
        }
        true
    }

    /// A plain value against a reference field: the referenced id, or a full pointer.
    fn reference_id(
        &self,
        class: &MappedClass,
        check: &Check<'_>,
        failures: &mut Vec<ValidationFailure>,
    ) -> bool {
        let Some(value) = check.plain() else {
            return false;
        };
        if !check.field.is_reference() {
            return false;
        }
        if DbRef::is_dbref(value) {
            return true;
        }

        let id_kind = check
            .field
            .target_class()
            .and_then(|target| self.mapper.get_mapped_class(target).ok())
            .and_then(|target| match target.id_field().map(MappedField::field_type) {
                Some(FieldType::Scalar(kind)) => Some(*kind),
                _ => None,
            })
            .unwrap_or(ScalarKind::Any);
        if !id_kind.accepts(value) {
            check.fail(
                failures,
                id_kind.name(),
                format!(
                    "the value for {}.{} must be the referenced id ({}) but was {}",
                    class.class_name(),
                    check.field.name(),
                    id_kind.name(),
                    value.type_name()
                ),
            );
        }
        true
    }

    /// Returns true if values of `class` can stand where `declared` (or its
    /// element type) names a class.
    fn assignable(&self, class: &ClassName, declared: &FieldType) -> bool {
        let Some(target) = declared.class_name() else {
            return false;
        };
        self.mapper
            .get_mapped_class(class)
            .is_ok_and(|mapped| mapped.is_assignable_to(target))
    }
}

fn exists(check: &Check<'_>, failures: &mut Vec<ValidationFailure>) -> bool {
    if check.operator != FilterOperator::Exists {
        return false;
    }
    if check.plain().and_then(Value::as_bool).is_none() {
        check.fail(
            failures,
            "bool",
            format!(
                "value for an {} operation should be a bool, was {}",
                check.operator,
                check.value.type_description()
            ),
        );
    }
    true
}

fn size(check: &Check<'_>, failures: &mut Vec<ValidationFailure>) -> bool {
    if check.operator != FilterOperator::Size {
        return false;
    }
    if check.plain().and_then(Value::as_integer).is_none() {
        check.fail(
            failures,
            "integer",
            format!(
                "value for a {} operation should be an integer, was {}",
                check.operator,
                check.value.type_description()
            ),
        );
    }
    if !check.declared.is_multiple() {
        check.fail(
            failures,
            "a list, set or array field",
            format!(
                "a {} operation needs a multi-valued field, {} is declared {}",
                check.operator,
                check.path,
                check.declared
            ),
        );
    }
    true
}

fn array_operand(check: &Check<'_>, failures: &mut Vec<ValidationFailure>) -> bool {
    if !matches!(
        check.operator,
        FilterOperator::In | FilterOperator::NotIn | FilterOperator::All
    ) {
        return false;
    }
    if check.plain().and_then(Value::as_array).is_none() {
        check.fail(
            failures,
            "array",
            format!(
                "value for a {} operation should be an array, was {}",
                check.operator,
                check.value.type_description()
            ),
        );
    }
    true
}

fn modulo(check: &Check<'_>, failures: &mut Vec<ValidationFailure>) -> bool {
    if check.operator != FilterOperator::Mod {
        return false;
    }
    let well_formed = check
        .plain()
        .and_then(Value::as_array)
        .is_some_and(|operands| {
            operands.len() == 2 && operands.iter().all(|o| o.as_integer().is_some())
        });
    if !well_formed {
        check.fail(
            failures,
            "[divisor, remainder]",
            format!(
                "value for a {} operation should be an array of two integers, was {}",
                check.operator,
                check.value.type_description()
            ),
        );
    }
    true
}

fn scalar(check: &Check<'_>, failures: &mut Vec<ValidationFailure>) -> bool {
    let (Some(value), FieldType::Scalar(kind)) = (check.plain(), check.declared.element_type())
    else {
        return false;
    };
    let accepted = kind.accepts(value)
        || (check.declared.is_multiple()
            && value
                .as_array()
                .is_some_and(|items| items.iter().all(|item| kind.accepts(item))));
    if !accepted {
        check.fail(
            failures,
            check.declared.to_string(),
            format!(
                "type {} may not be compatible with field {}, declared {}",
                value.type_name(),
                check.path,
                check.declared
            ),
        );
    }
    true
}

fn default_type(check: &Check<'_>, failures: &mut Vec<ValidationFailure>) -> bool {
    let Some(value) = check.plain() else {
        return true;
    };
    let fits = match check.declared {
        FieldType::Class(_) | FieldType::Map(_) => value.as_document().is_some(),
        _ => true,
    };
    if !fits {
        check.fail(
            failures,
            check.declared.to_string(),
            format!(
                "type {} may not be compatible with field {}, declared {}",
                value.type_name(),
                check.path,
                check.declared
            ),
        );
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Entity, Key};
    use crate::schema::{FieldSchema, ReferenceOptions, SchemaRegistry, TypeSchema};
    use entimap_codec::ObjectId;

    fn mapper() -> Mapper {
        Mapper::new(Arc::new(
            SchemaRegistry::new()
                .with(TypeSchema::interface("User"))
                .with(
                    TypeSchema::class("UserImpl")
                        .entity()
                        .implements("User")
                        .field(FieldSchema::new("id", FieldType::object_id()).id()),
                )
                .with(
                    TypeSchema::class("Address")
                        .embedded()
                        .field(FieldSchema::new("city", FieldType::text())),
                )
                .with(
                    TypeSchema::class("Job")
                        .entity()
                        .field(FieldSchema::new("id", FieldType::object_id()).id())
                        .field(FieldSchema::new("owner", FieldType::class("User")).reference())
                        .field(
                            FieldSchema::new("reviewer", FieldType::class("UserImpl"))
                                .reference_with(ReferenceOptions::id_only()),
                        )
                        .field(FieldSchema::new("attributes", FieldType::list(FieldType::text())))
                        .field(FieldSchema::new("priority", FieldType::integer()))
                        .field(FieldSchema::new("site", FieldType::class("Address"))),
                ),
        ))
    }

    fn compatible(field: &str, operator: FilterOperator, value: impl Into<QueryValue>) -> bool {
        let mapper = mapper();
        let job = mapper.get_mapped_class(&"Job".into()).unwrap();
        let field = job.mapped_field_by_java_field(field).unwrap();
        QueryValidator::new(&mapper).is_compatible_for_operator(
            &job,
            field,
            field.field_type(),
            operator,
            &value.into(),
            &mut Vec::new(),
        )
    }

    #[test]
    fn size_needs_integer_and_multi_valued_field() {
        assert!(compatible("attributes", FilterOperator::Size, 2));
        assert!(!compatible("attributes", FilterOperator::Size, "2"));
        assert!(!compatible("priority", FilterOperator::Size, 2));
    }

    #[test]
    fn implementing_class_matches_interface_field() {
        let user = Entity::new("UserImpl").with("id", ObjectId::new());
        assert!(compatible("owner", FilterOperator::Equal, user));
        assert!(!compatible("owner", FilterOperator::Equal, Entity::new("Job")));
    }

    #[test]
    fn keys_compare_by_referenced_type() {
        let key = Key::new("UserImpl", "UserImpl", Value::Integer(212));
        assert!(compatible("owner", FilterOperator::Equal, key));
        let wrong = Key::new("Job", "Job", Value::Integer(1));
        assert!(!compatible("owner", FilterOperator::Equal, wrong));
    }

    #[test]
    fn operator_shapes() {
        assert!(compatible("priority", FilterOperator::Exists, true));
        assert!(!compatible("priority", FilterOperator::Exists, 1));
        assert!(compatible("priority", FilterOperator::In, vec![Value::Integer(1)]));
        assert!(!compatible("priority", FilterOperator::NotIn, 1));
        assert!(compatible(
            "priority",
            FilterOperator::Mod,
            vec![Value::Integer(4), Value::Integer(0)]
        ));
        assert!(!compatible("priority", FilterOperator::Mod, vec![Value::Integer(4)]));
    }

    #[test]
    fn scalar_kinds() {
        assert!(compatible("priority", FilterOperator::GreaterThan, 3));
        assert!(!compatible("priority", FilterOperator::GreaterThan, "high"));
        assert!(compatible("attributes", FilterOperator::Equal, "urgent"));
        assert!(compatible("priority", FilterOperator::Equal, Value::Null));
    }

    #[test]
    fn plain_values_against_references() {
        assert!(compatible("reviewer", FilterOperator::Equal, ObjectId::new()));
        assert!(!compatible("reviewer", FilterOperator::Equal, "someone"));
        assert!(compatible(
            "owner",
            FilterOperator::Equal,
            DbRef::new("UserImpl", ObjectId::new()).to_value()
        ));
    }

    #[test]
    fn validate_collects_every_failure() {
        let mapper = mapper();
        let failures = QueryValidator::new(&mapper)
            .validate(
                &"Job".into(),
                &[
                    Criterion::new("attributes", FilterOperator::Size, "2"),
                    Criterion::eq("missing", 1),
                    Criterion::eq("site.city", "Oslo"),
                    Criterion::eq("site.city", 5),
                ],
            )
            .unwrap();

        let fields: Vec<_> = failures.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(fields, ["attributes", "missing", "site.city"]);
        assert_eq!(failures[0].operator, FilterOperator::Size);
        assert_eq!(failures[0].actual, "text");
        assert!(failures[1].to_string().contains("could not be found"));
        assert!(failures[2].message.contains("field site.city"));
    }

    #[test]
    fn failures_tell_same_named_embedded_fields_apart() {
        let mapper = Mapper::new(Arc::new(
            SchemaRegistry::new()
                .with(
                    TypeSchema::class("Address")
                        .embedded()
                        .field(FieldSchema::new("city", FieldType::text())),
                )
                .with(
                    TypeSchema::class("Trip")
                        .entity()
                        .field(FieldSchema::new("id", FieldType::object_id()).id())
                        .field(FieldSchema::new("origin", FieldType::class("Address")))
                        .field(FieldSchema::new("destination", FieldType::class("Address"))),
                ),
        ));
        let failures = QueryValidator::new(&mapper)
            .validate(
                &"Trip".into(),
                &[
                    Criterion::eq("origin.city", 1),
                    Criterion::eq("destination.city", true),
                ],
            )
            .unwrap();

        let fields: Vec<_> = failures.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(fields, ["origin.city", "destination.city"]);
    }

    #[test]
    fn direct_checks_report_the_field_name() {
        let mapper = mapper();
        let job = mapper.get_mapped_class(&"Job".into()).unwrap();
        let priority = job.mapped_field_by_java_field("priority").unwrap();
        let mut failures = Vec::new();
        assert!(!QueryValidator::new(&mapper).is_compatible_for_operator(
            &job,
            priority,
            priority.field_type(),
            FilterOperator::Equal,
            &"high".into(),
            &mut failures,
        ));
        assert_eq!(failures[0].field, "priority");
    }
}
