//! Integration tests for query value validation.

use entimap_codec::{DbRef, ObjectId, Value};
use entimap_core::query::{Criterion, FilterOperator, QueryValidator, QueryValue};
use entimap_core::{Entity, Key, Mapper};
use entimap_testkit::prelude::*;
use proptest::prelude::*;
use std::sync::Arc;

fn jobs_mapper() -> Mapper {
    Mapper::new(Arc::new(jobs_registry()))
}

fn library_mapper() -> Mapper {
    Mapper::new(Arc::new(library_registry()))
}

fn failing_fields(mapper: &Mapper, class: &str, criteria: &[Criterion]) -> Vec<String> {
    QueryValidator::new(mapper)
        .validate(&class.into(), criteria)
        .unwrap()
        .into_iter()
        .map(|failure| failure.field)
        .collect()
}

#[test]
fn size_needs_an_integer_and_a_multi_valued_field() {
    let mapper = jobs_mapper();
    let criteria = [
        Criterion::new("attributes", FilterOperator::Size, 2),
        Criterion::new("title", FilterOperator::Size, 2),
        Criterion::new("attributes", FilterOperator::Size, "two"),
    ];
    let failures = QueryValidator::new(&mapper)
        .validate(&"Job".into(), &criteria)
        .unwrap();
    let fields: Vec<_> = failures.iter().map(|f| f.field.as_str()).collect();
    assert_eq!(fields, vec!["title", "attributes"]);
    assert!(failures[0].message.contains("multi-valued"));
    assert_eq!(failures[1].expected, "integer");
}

#[test]
fn implementations_match_interface_fields() {
    let mapper = jobs_mapper();
    let user = Entity::new("UserImpl").with("id", ObjectId::from_bytes([1; 16]));
    let job = Entity::new("Job");
    let criteria = [
        Criterion::eq("owner", user),
        Criterion::eq("owner", job),
    ];
    assert_eq!(failing_fields(&mapper, "Job", &criteria), vec!["owner"]);
}

#[test]
fn keys_are_checked_against_the_declared_class() {
    let mapper = jobs_mapper();
    let user_key = Key::new("UserImpl", "users", Value::Id(ObjectId::from_bytes([1; 16])));
    let job_key = Key::new("Job", "jobs", Value::Id(ObjectId::from_bytes([2; 16])));

    let failures = QueryValidator::new(&mapper)
        .validate(
            &"Job".into(),
            &[
                Criterion::eq("owner", user_key.clone()),
                Criterion::eq("watchers", user_key),
                Criterion::eq("owner", job_key),
            ],
        )
        .unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].actual, "Key<Job>");
}

#[test]
fn reference_fields_accept_ids_and_pointers() {
    let mapper = library_mapper();
    let criteria = [
        Criterion::eq("editor", 3),
        Criterion::eq("authors", DbRef::new("authors", 3).to_value()),
        Criterion::eq("editor", "three"),
        Criterion::eq("authors", QueryValue::Value(Value::Null)),
    ];
    assert_eq!(failing_fields(&mapper, "Book", &criteria), vec!["editor"]);
}

#[test]
fn dotted_paths_descend_into_embedded_fields() {
    let mapper = library_mapper();
    let criteria = [
        Criterion::eq("home.city", "Portland"),
        Criterion::eq("home.city", 12),
        Criterion::eq("home.street", "Main"),
    ];
    let failures = QueryValidator::new(&mapper)
        .validate(&"Author".into(), &criteria)
        .unwrap();
    assert_eq!(failures.len(), 2);
    assert_eq!(failures[0].field, "home.city");
    assert_eq!(
        failures[1].message,
        "the field 'home.street' could not be found in 'Author'"
    );
}

proptest! {
    #![proptest_config(PropTestConfig::quick().to_proptest_config())]

    #[test]
    fn null_is_compatible_everywhere(
        field in prop::sample::select(vec!["id", "title", "owner", "attributes", "watchers"]),
        operator in prop::sample::select(vec![
            FilterOperator::Equal,
            FilterOperator::Size,
            FilterOperator::In,
            FilterOperator::Mod,
            FilterOperator::Exists,
        ]),
    ) {
        let mapper = jobs_mapper();
        let criteria = [Criterion::new(field, operator, QueryValue::Value(Value::Null))];
        prop_assert!(failing_fields(&mapper, "Job", &criteria).is_empty());
    }

    #[test]
    fn text_values_fit_text_fields(text in "[a-z ]{0,16}") {
        let mapper = jobs_mapper();
        let criteria = [
            Criterion::eq("title", text.as_str()),
            Criterion::eq("attributes", text.as_str()),
            Criterion::new(
                "attributes",
                FilterOperator::All,
                vec![Value::Text(text.clone())],
            ),
        ];
        prop_assert!(failing_fields(&mapper, "Job", &criteria).is_empty());
    }
}
