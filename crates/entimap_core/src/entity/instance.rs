//! Entity instances.

use crate::entity::Property;
use crate::schema::ClassName;
use entimap_codec::Value;
use std::collections::BTreeMap;

/// A mapped object: its runtime class and its field values.
///
/// Properties are keyed by declared field name, not by stored name. A
/// field that is absent and a field holding [`Property::Null`] encode the
/// same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    class: ClassName,
    properties: BTreeMap<String, Property>,
}

impl Entity {
    /// Creates an entity with no properties.
    pub fn new(class: impl Into<ClassName>) -> Self {
        Self {
            class: class.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Builder-style property setter.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Property>) -> Self {
        self.set(field, value);
        self
    }

    /// The runtime class.
    pub fn class(&self) -> &ClassName {
        &self.class
    }

    /// Sets a property, returning the previous one.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Property>) -> Option<Property> {
        self.properties.insert(field.into(), value.into())
    }

    /// Returns a property.
    pub fn get(&self, field: &str) -> Option<&Property> {
        self.properties.get(field)
    }

    /// Returns a mutable property.
    pub fn get_mut(&mut self, field: &str) -> Option<&mut Property> {
        self.properties.get_mut(field)
    }

    /// Returns a property's plain value.
    pub fn get_value(&self, field: &str) -> Option<&Value> {
        self.get(field).and_then(Property::as_value)
    }

    /// Removes a property.
    pub fn remove(&mut self, field: &str) -> Option<Property> {
        self.properties.remove(field)
    }

    /// Iterates properties in field-name order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Key, Reference};

    #[test]
    fn builder_and_accessors() {
        let mut job = Entity::new("Job")
            .with("name", "build")
            .with("attempts", 3)
            .with("owner", Key::new("User", "users", Value::Integer(7)));

        assert_eq!(job.class().as_str(), "Job");
        assert_eq!(job.get_value("name"), Some(&Value::from("build")));
        assert_eq!(job.get_value("attempts"), Some(&Value::Integer(3)));
        assert!(matches!(
            job.get("owner"),
            Some(Property::Reference(Reference::Key(_)))
        ));

        let old = job.set("attempts", 4);
        assert_eq!(old, Some(Property::Value(Value::Integer(3))));
        assert!(job.remove("name").is_some());
        assert!(job.get("name").is_none());
    }

    #[test]
    fn null_properties() {
        assert!(Property::Null.is_null());
        assert!(Property::Value(Value::Null).is_null());
        assert!(!Property::from(0).is_null());
    }
}
