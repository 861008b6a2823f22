//! Reference field encoding and resolution.

use crate::config::DanglingPolicy;
use crate::entity::{Entity, Key, Property, Reference};
use crate::error::{MapperError, MapperResult};
use crate::mapping::{MappedClass, MappedField, Mapper};
use crate::reference::EntityCache;
use crate::schema::{ClassName, ReferenceOptions};
use entimap_codec::{DbRef, Document, Value};
use entimap_store::{DocumentStore, Filter, ID_FIELD};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{trace, warn};

/// Encodes and resolves the values of one reference field.
///
/// Pointers come in two shapes, picked per field: id-only fields store
/// the related entity's bare id, full-pointer fields store
/// `{"$ref": <collection>, "$id": <id>}`. Multi-valued fields store an
/// array of pointers in field order.
pub struct ReferenceHandler<'a> {
    mapper: &'a Mapper,
    field: &'a MappedField,
    options: ReferenceOptions,
}

impl<'a> ReferenceHandler<'a> {
    /// Creates a handler for `field`.
    pub fn new(mapper: &'a Mapper, field: &'a MappedField) -> Self {
        Self {
            mapper,
            field,
            options: field.reference_options().unwrap_or_default(),
        }
    }

    fn target(&self) -> MapperResult<Arc<MappedClass>> {
        let target = self.field.target_class().ok_or_else(|| {
            MapperError::mapping(format!(
                "{}.{} names no referenced class",
                self.field.declaring_class(),
                self.field.name()
            ))
        })?;
        self.mapper.get_mapped_class(target)
    }

    fn pointer(&self, collection: &str, id: Value) -> Value {
        if self.options.id_only {
            id
        } else {
            DbRef::new(collection, id).to_value()
        }
    }

    fn entity_pointer(&self, entity: &Entity) -> MapperResult<Value> {
        let related = self.mapper.get_mapped_class(entity.class())?;
        let id = self.mapper.id_of(entity)?.ok_or_else(|| {
            MapperError::mapping(format!(
                "{} referenced by {}.{} has no id value",
                entity.class(),
                self.field.declaring_class(),
                self.field.name()
            ))
        })?;
        Ok(self.pointer(related.collection_name(), id))
    }

    fn reference_pointer(&self, reference: &Reference) -> MapperResult<Value> {
        match reference {
            Reference::Resolved(entity) => self.entity_pointer(entity),
            Reference::Key(key) | Reference::Missing(key) => {
                Ok(self.pointer(&key.collection, key.id.clone()))
            }
        }
    }

    /// Encodes the field's current value into its pointer form.
    ///
    /// # Errors
    ///
    /// Fails if a related entity has no id, the property is a plain value,
    /// or its single-vs-list shape disagrees with the field.
    pub fn encode_reference(&self, property: &Property) -> MapperResult<Value> {
        let multiple = matches!(
            property,
            Property::References(_) | Property::EmbeddedList(_)
        );
        let single = matches!(property, Property::Reference(_) | Property::Embedded(_));
        if (multiple && !self.field.is_multiple()) || (single && self.field.is_multiple()) {
            return Err(MapperError::mapping(format!(
                "{}.{} is declared {} but holds {}",
                self.field.declaring_class(),
                self.field.name(),
                self.field.field_type(),
                if multiple { "a list of references" } else { "a single reference" }
            )));
        }
        match property {
            Property::Null => Ok(Value::Null),
            Property::Reference(reference) => self.reference_pointer(reference),
            Property::References(references) => references
                .iter()
                .map(|reference| self.reference_pointer(reference))
                .collect::<MapperResult<Vec<_>>>()
                .map(Value::Array),
            Property::Embedded(entity) => self.entity_pointer(entity),
            Property::EmbeddedList(entities) => entities
                .iter()
                .map(|entity| self.entity_pointer(entity))
                .collect::<MapperResult<Vec<_>>>()
                .map(Value::Array),
            Property::Value(value) => Err(MapperError::mapping(format!(
                "{}.{} is a Reference field but holds a {} value",
                self.field.declaring_class(),
                self.field.name(),
                value.type_name()
            ))),
        }
    }

    fn key(&self, target: &MappedClass, pointer: &Value) -> MapperResult<Key> {
        if self.options.id_only {
            Ok(Key::new(
                target.class_name().clone(),
                target.collection_name(),
                pointer.clone(),
            ))
        } else {
            let dbref = DbRef::from_value(pointer)?;
            Ok(Key::new(
                target.class_name().clone(),
                dbref.collection,
                dbref.id,
            ))
        }
    }

    fn keys(&self, raw: &Value) -> MapperResult<Vec<Key>> {
        let target = self.target()?;
        match raw {
            Value::Array(pointers) if self.field.is_multiple() => pointers
                .iter()
                .map(|pointer| self.key(&target, pointer))
                .collect(),
            pointer if !self.field.is_multiple() => Ok(vec![self.key(&target, pointer)?]),
            other => Err(MapperError::invalid_document(
                self.field.declaring_class(),
                format!(
                    "{} holds {}, declared {}",
                    self.field.stored_name(),
                    other.type_name(),
                    self.field.field_type()
                ),
            )),
        }
    }

    /// Turns a stored pointer (or array of pointers) into unresolved keys.
    ///
    /// # Errors
    ///
    /// Fails on malformed pointers.
    pub fn decode_keys(&self, raw: &Value) -> MapperResult<Property> {
        if raw.is_null() {
            return Ok(Property::Null);
        }
        let keys = self.keys(raw)?;
        if self.field.is_multiple() {
            Ok(Property::References(
                keys.into_iter().map(Reference::Key).collect(),
            ))
        } else {
            Ok(keys
                .into_iter()
                .next()
                .map_or(Property::Null, |key| Property::Reference(Reference::Key(key))))
        }
    }

    /// Loads the entities a stored pointer (or array of pointers) refers to.
    ///
    /// A single pointer costs at most one lookup. An array costs at most one
    /// batched lookup per target collection, for the distinct ids not
    /// already in `cache`; repeated ids resolve to the same `Arc`. Loaded
    /// entities keep their own references unresolved.
    ///
    /// # Errors
    ///
    /// Store errors are returned unmodified. Dangling references fail only
    /// under [`DanglingPolicy::Fail`].
    pub fn resolve_reference(
        &self,
        raw: &Value,
        store: &dyn DocumentStore,
        cache: &mut EntityCache,
    ) -> MapperResult<Property> {
        if raw.is_null() {
            return Ok(Property::Null);
        }
        let keys = self.keys(raw)?;

        if !self.field.is_multiple() {
            let Some(key) = keys.into_iter().next() else {
                return Ok(Property::Null);
            };
            return match self.resolve_one(&key, store, cache)? {
                Some(entity) => Ok(Property::Reference(Reference::Resolved(entity))),
                None => Ok(self
                    .dangling(key)?
                    .map_or(Property::Null, Property::Reference)),
            };
        }

        self.fetch_uncached(&keys, store, cache)?;
        let mut resolved = Vec::with_capacity(keys.len());
        for key in keys {
            match cache.get(&key.collection, &key.id).flatten() {
                Some(entity) => resolved.push(Reference::Resolved(entity)),
                None => resolved.extend(self.dangling(key)?),
            }
        }
        Ok(Property::References(resolved))
    }

    fn resolve_one(
        &self,
        key: &Key,
        store: &dyn DocumentStore,
        cache: &mut EntityCache,
    ) -> MapperResult<Option<Arc<Entity>>> {
        if let Some(hit) = cache.get(&key.collection, &key.id) {
            return Ok(hit);
        }
        trace!(collection = %key.collection, id = ?key.id, "resolving reference");
        let loaded = store
            .find_first(&key.collection, &Filter::id_eq(key.id.clone()))?
            .map(|document| self.load(&key.class, document))
            .transpose()?
            .map(Arc::new);
        cache.insert(&key.collection, key.id.clone(), loaded.clone());
        Ok(loaded)
    }

    fn fetch_uncached(
        &self,
        keys: &[Key],
        store: &dyn DocumentStore,
        cache: &mut EntityCache,
    ) -> MapperResult<()> {
        let mut batches: Vec<(&str, &ClassName, Vec<Value>)> = Vec::new();
        let mut seen: HashSet<(&str, &Value)> = HashSet::new();
        for key in keys {
            let collection = key.collection.as_str();
            if cache.contains(collection, &key.id) || !seen.insert((collection, &key.id)) {
                continue;
            }
            match batches.iter_mut().find(|batch| batch.0 == collection) {
                Some((_, _, ids)) => ids.push(key.id.clone()),
                None => batches.push((collection, &key.class, vec![key.id.clone()])),
            }
        }

        for (collection, class, ids) in batches {
            trace!(collection, requested = ids.len(), "batched reference lookup");
            let documents = store.find(collection, &Filter::id_in(ids.clone()))?;
            if documents.len() < ids.len() {
                warn!(
                    collection,
                    requested = ids.len(),
                    found = documents.len(),
                    "batched lookup returned fewer documents than requested"
                );
            }
            for document in documents {
                let Some(id) = document.get(ID_FIELD).cloned() else {
                    continue;
                };
                let entity = self.load(class, document)?;
                cache.insert(collection, id, Some(Arc::new(entity)));
            }
            for id in ids {
                if !cache.contains(collection, &id) {
                    cache.insert(collection, id, None);
                }
            }
        }
        Ok(())
    }

    fn load(&self, class: &ClassName, document: Document) -> MapperResult<Entity> {
        self.mapper.from_document(class, document)
    }

    /// Applies the dangling policy to an unresolvable key.
    fn dangling(&self, key: Key) -> MapperResult<Option<Reference>> {
        warn!(
            class = %self.field.declaring_class(),
            field = self.field.name(),
            collection = %key.collection,
            id = ?key.id,
            "dangling reference"
        );
        match self.mapper.options().dangling_references {
            DanglingPolicy::Keep => Ok(Some(Reference::Missing(key))),
            DanglingPolicy::Drop => Ok(None),
            DanglingPolicy::Fail => Err(MapperError::DanglingReference {
                field: self.field.name().to_string(),
                collection: key.collection,
                id: key.id,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSchema, FieldType, SchemaRegistry, TypeSchema};
    use crate::MapperOptions;
    use entimap_store::InMemoryStore;

    fn registry() -> Arc<SchemaRegistry> {
        Arc::new(
            SchemaRegistry::new()
                .with(
                    TypeSchema::class("Author")
                        .entity_in("authors")
                        .field(FieldSchema::new("id", FieldType::integer()).id())
                        .field(FieldSchema::new("name", FieldType::text())),
                )
                .with(
                    TypeSchema::class("Book")
                        .entity_in("books")
                        .field(FieldSchema::new("id", FieldType::integer()).id())
                        .field(
                            FieldSchema::new("editor", FieldType::class("Author"))
                                .reference_with(ReferenceOptions::id_only()),
                        )
                        .field(
                            FieldSchema::new("authors", FieldType::list(FieldType::class("Author")))
                                .reference(),
                        ),
                ),
        )
    }

    fn field<'m>(class: &'m MappedClass, name: &str) -> &'m MappedField {
        class.mapped_field_by_java_field(name).unwrap()
    }

    fn author(id: i64, name: &str) -> Entity {
        Entity::new("Author").with("id", id).with("name", name)
    }

    fn store_with_authors(mapper: &Mapper, authors: &[Entity]) -> InMemoryStore {
        let store = InMemoryStore::new();
        for author in authors {
            let document = mapper.to_document(&mut author.clone()).unwrap();
            store.save("authors", document).unwrap();
        }
        store
    }

    #[test]
    fn pointer_shapes() {
        let mapper = Mapper::new(registry());
        let book = mapper.get_mapped_class(&"Book".into()).unwrap();

        let editor = ReferenceHandler::new(&mapper, field(&book, "editor"));
        assert_eq!(
            editor.encode_reference(&author(7, "Ann").into()).unwrap(),
            Value::Integer(7)
        );

        let authors = ReferenceHandler::new(&mapper, field(&book, "authors"));
        let encoded = authors
            .encode_reference(&Property::References(vec![
                author(1, "A").into(),
                Key::new("Author", "authors", Value::Integer(2)).into(),
            ]))
            .unwrap();
        assert_eq!(
            encoded,
            Value::Array(vec![
                DbRef::new("authors", 1).to_value(),
                DbRef::new("authors", 2).to_value(),
            ])
        );
    }

    #[test]
    fn shape_must_match_the_field() {
        let mapper = Mapper::new(registry());
        let book = mapper.get_mapped_class(&"Book".into()).unwrap();

        let editor = ReferenceHandler::new(&mapper, field(&book, "editor"));
        let err = editor
            .encode_reference(&Property::References(vec![author(1, "A").into()]))
            .unwrap_err();
        assert!(matches!(err, MapperError::Mapping { .. }));
        assert!(editor
            .encode_reference(&vec![author(1, "A")].into())
            .is_err());

        let authors = ReferenceHandler::new(&mapper, field(&book, "authors"));
        let err = authors
            .encode_reference(&Key::new("Author", "authors", Value::Integer(1)).into())
            .unwrap_err();
        assert!(matches!(err, MapperError::Mapping { .. }));
        assert!(authors.encode_reference(&author(1, "A").into()).is_err());
        assert_eq!(
            authors.encode_reference(&Property::References(vec![])).unwrap(),
            Value::Array(vec![])
        );
    }

    #[test]
    fn single_reference_resolves_and_fills_the_cache() {
        let mapper = Mapper::new(registry());
        let store = store_with_authors(&mapper, &[author(7, "Ann")]);
        let book = mapper.get_mapped_class(&"Book".into()).unwrap();
        let editor = ReferenceHandler::new(&mapper, field(&book, "editor"));

        let mut cache = EntityCache::new();
        let resolved = editor
            .resolve_reference(&Value::Integer(7), &store, &mut cache)
            .unwrap();
        let entity = resolved.as_reference().unwrap().entity().unwrap().clone();
        assert_eq!(*entity, author(7, "Ann"));

        let cached = cache.get("authors", &Value::Integer(7)).flatten().unwrap();
        assert!(Arc::ptr_eq(&entity, &cached));
        let again = editor
            .resolve_reference(&Value::Integer(7), &store, &mut cache)
            .unwrap();
        assert!(Arc::ptr_eq(again.as_reference().unwrap().entity().unwrap(), &entity));
    }

    #[test]
    fn related_entity_without_id() {
        let mapper = Mapper::new(registry());
        let book = mapper.get_mapped_class(&"Book".into()).unwrap();
        let editor = ReferenceHandler::new(&mapper, field(&book, "editor"));
        let err = editor
            .encode_reference(&Entity::new("Author").into())
            .unwrap_err();
        assert!(matches!(err, MapperError::Mapping { .. }));
    }

    #[test]
    fn decode_keys_leaves_references_unresolved() {
        let mapper = Mapper::new(registry());
        let book = mapper.get_mapped_class(&"Book".into()).unwrap();
        let editor = ReferenceHandler::new(&mapper, field(&book, "editor"));
        assert_eq!(
            editor.decode_keys(&Value::Integer(7)).unwrap(),
            Property::from(Key::new("Author", "authors", Value::Integer(7)))
        );
    }

    #[test]
    fn duplicates_share_one_instance() {
        let mapper = Mapper::new(registry());
        let store = store_with_authors(&mapper, &[author(1, "A"), author(2, "B")]);
        let book = mapper.get_mapped_class(&"Book".into()).unwrap();
        let authors = ReferenceHandler::new(&mapper, field(&book, "authors"));

        let raw = Value::Array(vec![
            DbRef::new("authors", 2).to_value(),
            DbRef::new("authors", 1).to_value(),
            DbRef::new("authors", 2).to_value(),
        ]);
        let mut cache = EntityCache::new();
        let resolved = authors.resolve_reference(&raw, &store, &mut cache).unwrap();
        let references = resolved.as_references().unwrap();

        assert_eq!(references.len(), 3);
        let first = references[0].entity().unwrap();
        let third = references[2].entity().unwrap();
        assert!(Arc::ptr_eq(first, third));
        assert_eq!(**first, author(2, "B"));
        assert_eq!(**references[1].entity().unwrap(), author(1, "A"));
    }

    #[test]
    fn single_lookup_result_is_cached_even_when_absent() {
        let mapper = Mapper::new(registry());
        let store = store_with_authors(&mapper, &[]);
        let book = mapper.get_mapped_class(&"Book".into()).unwrap();
        let editor = ReferenceHandler::new(&mapper, field(&book, "editor"));

        let mut cache = EntityCache::new();
        let resolved = editor
            .resolve_reference(&Value::Integer(9), &store, &mut cache)
            .unwrap();
        assert!(resolved.as_reference().unwrap().is_missing());
        assert_eq!(cache.get("authors", &Value::Integer(9)), Some(None));
    }

    #[test]
    fn dangling_policies() {
        let raw = Value::Array(vec![
            DbRef::new("authors", 1).to_value(),
            DbRef::new("authors", 5).to_value(),
        ]);
        let resolve = |policy| {
            let mapper = Mapper::builder(registry())
                .options(MapperOptions::new().dangling_references(policy))
                .build();
            let store = store_with_authors(&mapper, &[author(1, "A")]);
            let book = mapper.get_mapped_class(&"Book".into()).unwrap();
            let handler = ReferenceHandler::new(&mapper, field(&book, "authors"));
            handler.resolve_reference(&raw, &store, &mut EntityCache::new())
        };

        let kept = resolve(DanglingPolicy::Keep).unwrap();
        let kept = kept.as_references().unwrap();
        assert_eq!(kept.len(), 2);
        assert_eq!(
            kept[1],
            Reference::Missing(Key::new("Author", "authors", Value::Integer(5)))
        );

        let dropped = resolve(DanglingPolicy::Drop).unwrap();
        assert_eq!(dropped.as_references().unwrap().len(), 1);

        let err = resolve(DanglingPolicy::Fail).unwrap_err();
        assert!(matches!(
            err,
            MapperError::DanglingReference { ref collection, .. } if collection == "authors"
        ));
    }
}
