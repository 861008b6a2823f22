//! Entity to document conversion.

use crate::entity::{Entity, Key, Property};
use crate::error::{MapperError, MapperResult};
use crate::lifecycle::LifecycleEvent;
use crate::mapping::{MappedClass, MappedField, Mapper};
use crate::reference::ReferenceHandler;
use crate::schema::{ClassName, FieldType};
use entimap_codec::{Document, Value};
use entimap_store::ID_FIELD;
use std::sync::Arc;

impl Mapper {
    /// Encodes an entity, running `PrePersist` before and `PreSave` after.
    ///
    /// Lifecycle methods and interceptors may change the entity.
    ///
    /// # Errors
    ///
    /// Fails if the class cannot be mapped, a property does not fit its
    /// field, a related entity has no id, or a hook fails.
    pub fn to_document(&self, entity: &mut Entity) -> MapperResult<Document> {
        let class = self.get_mapped_class(entity.class())?;
        let document =
            class.call_lifecycle_methods(LifecycleEvent::PrePersist, entity, Document::new(), self)?;
        let document = self.encode_into(&class, entity, document)?;
        class.call_lifecycle_methods(LifecycleEvent::PreSave, entity, document, self)
    }

    /// Decodes a document, running `PreLoad` before and `PostLoad` after.
    ///
    /// Reference fields are left as unresolved keys.
    ///
    /// # Errors
    ///
    /// Fails if the document does not fit the class or a hook fails.
    pub fn from_document(&self, class: &ClassName, document: Document) -> MapperResult<Entity> {
        let mapped = self.concrete_class(class, &document)?;
        let mut entity = Entity::new(mapped.class_name().clone());
        let document =
            mapped.call_lifecycle_methods(LifecycleEvent::PreLoad, &mut entity, document, self)?;
        self.decode_into(&mapped, &mut entity, &document)?;
        mapped.call_lifecycle_methods(LifecycleEvent::PostLoad, &mut entity, document, self)?;
        Ok(entity)
    }

    /// Decodes a document without running lifecycle methods.
    ///
    /// # Errors
    ///
    /// Fails if the document does not fit the class.
    pub fn decode_document(&self, class: &ClassName, document: &Document) -> MapperResult<Entity> {
        let mapped = self.concrete_class(class, document)?;
        let mut entity = Entity::new(mapped.class_name().clone());
        self.decode_into(&mapped, &mut entity, document)?;
        Ok(entity)
    }

    /// Returns the entity's id value, `None` when unset.
    ///
    /// # Errors
    ///
    /// Fails if the class cannot be mapped or has no id field.
    pub fn id_of(&self, entity: &Entity) -> MapperResult<Option<Value>> {
        let class = self.get_mapped_class(entity.class())?;
        let id_field = class
            .id_field()
            .ok_or_else(|| MapperError::mapping(format!("{} has no Id field", entity.class())))?;
        Ok(entity
            .get_value(id_field.name())
            .filter(|id| !id.is_null())
            .cloned())
    }

    /// Returns the entity's identity key.
    ///
    /// # Errors
    ///
    /// Fails if the class cannot be mapped or the id is unset.
    pub fn key_of(&self, entity: &Entity) -> MapperResult<Key> {
        let class = self.get_mapped_class(entity.class())?;
        let id = self.id_of(entity)?.ok_or_else(|| {
            MapperError::mapping(format!("{} has no id value", entity.class()))
        })?;
        Ok(Key::new(
            class.class_name().clone(),
            class.collection_name(),
            id,
        ))
    }

    /// Picks the class a document decodes into: the stored class name when
    /// present, otherwise `requested`.
    pub(crate) fn concrete_class(
        &self,
        requested: &ClassName,
        document: &Document,
    ) -> MapperResult<Arc<MappedClass>> {
        let stored = document
            .get(&self.options().class_name_key)
            .and_then(Value::as_text);
        match stored {
            Some(stored) if stored != requested.as_str() => {
                let concrete = self.get_mapped_class(&ClassName::new(stored))?;
                if concrete.is_assignable_to(requested) {
                    Ok(concrete)
                } else {
                    Err(MapperError::invalid_document(
                        requested,
                        format!("stored class {stored} is not a {requested}"),
                    ))
                }
            }
            _ => self.get_mapped_class(requested),
        }
    }

    pub(crate) fn encode_into(
        &self,
        class: &MappedClass,
        entity: &Entity,
        mut document: Document,
    ) -> MapperResult<Document> {
        if let Some(id_field) = class.id_field() {
            if let Some(id) = entity.get_value(id_field.name()).filter(|id| !id.is_null()) {
                document.insert(ID_FIELD, id.clone());
            }
        }
        if class.stores_class_name() {
            document.insert(
                self.options().class_name_key.clone(),
                class.class_name().as_str(),
            );
        }

        let null = Property::Null;
        for field in class.persistence_fields().iter().filter(|f| !f.is_id()) {
            let property = entity.get(field.name()).unwrap_or(&null);
            let value = if field.is_reference() {
                ReferenceHandler::new(self, field).encode_reference(property)?
            } else {
                self.encode_property(field, property)?
            };

            let skip = match &value {
                Value::Null => !self.options().store_nulls,
                Value::Array(items) if items.is_empty() => !self.options().store_empties,
                _ => false,
            };
            if !skip {
                document.insert(field.stored_name(), value);
            }
        }
        Ok(document)
    }

    fn encode_property(&self, field: &MappedField, property: &Property) -> MapperResult<Value> {
        match property {
            Property::Null => Ok(Value::Null),
            Property::Value(value) if value.is_null() || value_fits(field.field_type(), value) => {
                Ok(value.clone())
            }
            Property::Value(value) => Err(MapperError::mapping(format!(
                "{}.{} holds {}, declared {}",
                field.declaring_class(),
                field.name(),
                value.type_name(),
                field.field_type()
            ))),
            Property::Embedded(entity) => Ok(Value::Document(self.encode_embedded(entity)?)),
            Property::EmbeddedList(entities) => entities
                .iter()
                .map(|entity| self.encode_embedded(entity).map(Value::Document))
                .collect::<MapperResult<Vec<_>>>()
                .map(Value::Array),
            Property::Reference(_) | Property::References(_) => Err(MapperError::mapping(format!(
                "{}.{} holds a reference but is not a Reference field",
                field.declaring_class(),
                field.name()
            ))),
        }
    }

    fn encode_embedded(&self, entity: &Entity) -> MapperResult<Document> {
        let class = self.get_mapped_class(entity.class())?;
        self.encode_into(&class, entity, Document::new())
    }

    pub(crate) fn decode_into(
        &self,
        class: &MappedClass,
        entity: &mut Entity,
        document: &Document,
    ) -> MapperResult<()> {
        for field in class.persistence_fields() {
            let Some(raw) = document.get(field.stored_name()) else {
                continue;
            };
            let property = if raw.is_null() {
                Property::Null
            } else if field.is_reference() {
                ReferenceHandler::new(self, field).decode_keys(raw)?
            } else {
                self.decode_property(class, field, raw)?
            };
            entity.set(field.name(), property);
        }
        Ok(())
    }

    fn decode_property(
        &self,
        class: &MappedClass,
        field: &MappedField,
        raw: &Value,
    ) -> MapperResult<Property> {
        let mismatch = || {
            MapperError::invalid_document(
                class.class_name(),
                format!(
                    "{} holds {}, declared {}",
                    field.stored_name(),
                    raw.type_name(),
                    field.field_type()
                ),
            )
        };

        match (field.field_type(), field.field_type().element_type(), raw) {
            (FieldType::Class(_), FieldType::Class(target), Value::Document(embedded)) => Ok(
                Property::Embedded(Box::new(self.decode_embedded(target, embedded)?)),
            ),
            (declared, FieldType::Class(target), Value::Array(items)) if declared.is_multiple() => {
                items
                    .iter()
                    .map(|item| match item {
                        Value::Document(embedded) => self.decode_embedded(target, embedded),
                        _ => Err(mismatch()),
                    })
                    .collect::<MapperResult<Vec<_>>>()
                    .map(Property::EmbeddedList)
            }
            (declared, _, value) if value_fits(declared, value) => {
                Ok(Property::Value(value.clone()))
            }
            _ => Err(mismatch()),
        }
    }

    fn decode_embedded(&self, class: &ClassName, document: &Document) -> MapperResult<Entity> {
        let mapped = self.concrete_class(class, document)?;
        let mut entity = Entity::new(mapped.class_name().clone());
        self.decode_into(&mapped, &mut entity, document)?;
        Ok(entity)
    }
}

fn value_fits(declared: &FieldType, value: &Value) -> bool {
    match declared {
        FieldType::Scalar(kind) => kind.accepts(value),
        FieldType::Class(_) => value.as_document().is_some(),
        FieldType::List(inner) | FieldType::Set(inner) | FieldType::Array(inner) => {
            value.as_array().is_some_and(|items| {
                items
                    .iter()
                    .all(|item| item.is_null() || value_fits(inner, item))
            })
        }
        FieldType::Map(inner) => value.as_document().is_some_and(|entries| {
            entries
                .iter()
                .all(|(_, item)| item.is_null() || value_fits(inner, item))
        }),
    }
}
