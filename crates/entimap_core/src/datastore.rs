//! Saving and loading entities through a document store.

use crate::entity::{Entity, Key};
use crate::error::{MapperError, MapperResult};
use crate::lifecycle::LifecycleEvent;
use crate::mapping::{MappedClass, Mapper};
use crate::reference::{EntityCache, ReferenceHandler};
use crate::schema::{ClassName, FieldType, ScalarKind};
use entimap_codec::{Document, ObjectId, Value};
use entimap_store::{DocumentStore, Filter};
use std::sync::Arc;
use tracing::debug;

/// Entity persistence over a [`DocumentStore`].
///
/// Loads resolve every eager reference field, each load with its own
/// [`EntityCache`]. Lazy fields stay unresolved until
/// [`Datastore::resolve_field`] is called.
///
/// # Example
///
/// ```rust
/// use entimap_core::schema::{FieldSchema, FieldType, SchemaRegistry, TypeSchema};
/// use entimap_core::{Datastore, Entity, Mapper};
/// use entimap_store::InMemoryStore;
/// use std::sync::Arc;
///
/// let registry = SchemaRegistry::new().with(
///     TypeSchema::class("Note")
///         .entity_in("notes")
///         .field(FieldSchema::new("id", FieldType::object_id()).id())
///         .field(FieldSchema::new("text", FieldType::text())),
/// );
/// let datastore = Datastore::new(
///     Arc::new(Mapper::new(Arc::new(registry))),
///     Arc::new(InMemoryStore::new()),
/// );
///
/// let mut note = Entity::new("Note").with("text", "hello");
/// let key = datastore.save(&mut note).unwrap();
/// let loaded = datastore.get_by_key(&key).unwrap().unwrap();
/// assert_eq!(loaded, note);
/// ```
pub struct Datastore {
    mapper: Arc<Mapper>,
    store: Arc<dyn DocumentStore>,
}

impl Datastore {
    /// Creates a datastore.
    pub fn new(mapper: Arc<Mapper>, store: Arc<dyn DocumentStore>) -> Self {
        Self { mapper, store }
    }

    /// The mapper.
    pub fn mapper(&self) -> &Arc<Mapper> {
        &self.mapper
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    fn entity_class(&self, class: &ClassName) -> MapperResult<Arc<MappedClass>> {
        let mapped = self.mapper.get_mapped_class(class)?;
        if mapped.is_entity() {
            Ok(mapped)
        } else {
            Err(MapperError::mapping(format!("{class} is not an entity")))
        }
    }

    /// Saves an entity and returns its key.
    ///
    /// An unset `ObjectId` id is generated. With a version field, the stored
    /// version must equal the entity's (both unset for a new entity) and the
    /// entity's version is incremented; it is restored if the save fails.
    /// `PostPersist` runs after the write.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::ConcurrentModification`] on a version
    /// mismatch; store errors are returned unmodified.
    pub fn save(&self, entity: &mut Entity) -> MapperResult<Key> {
        let class = self.entity_class(entity.class())?;
        let id_field = class
            .id_field()
            .ok_or_else(|| MapperError::mapping(format!("{} has no Id field", class.class_name())))?;

        if self.mapper.id_of(entity)?.is_none() {
            if id_field.field_type() != &FieldType::Scalar(ScalarKind::ObjectId) {
                return Err(MapperError::mapping(format!(
                    "{} has no id value and {} is not generated",
                    class.class_name(),
                    id_field.name()
                )));
            }
            entity.set(id_field.name(), ObjectId::new());
        }
        let id = self.mapper.id_of(entity)?.unwrap_or(Value::Null);
        let collection = class.collection_name();

        let previous_version = match class.version_field() {
            Some(version_field) => {
                let current = entity
                    .get_value(version_field.name())
                    .and_then(Value::as_integer);
                let stored = self
                    .store
                    .find_first(collection, &Filter::id_eq(id.clone()))?
                    .and_then(|document| {
                        document
                            .get(version_field.stored_name())
                            .and_then(Value::as_integer)
                    });
                if stored != current {
                    return Err(MapperError::ConcurrentModification {
                        class: class.class_name().clone(),
                        id,
                        stored: stored.unwrap_or(0),
                        expected: current.unwrap_or(0),
                    });
                }
                entity.set(version_field.name(), current.unwrap_or(0) + 1);
                Some((version_field.name(), current))
            }
            None => None,
        };

        let written = self.mapper.to_document(entity).and_then(|document| {
            self.store.save(collection, document.clone())?;
            Ok(document)
        });
        let document = match written {
            Ok(document) => document,
            Err(err) => {
                if let Some((name, current)) = previous_version {
                    match current {
                        Some(version) => entity.set(name, version),
                        None => entity.remove(name),
                    };
                }
                return Err(err);
            }
        };
        debug!(class = %class.class_name(), collection, id = ?id, "saved entity");

        class.call_lifecycle_methods(LifecycleEvent::PostPersist, entity, document, &self.mapper)?;
        Ok(Key::new(class.class_name().clone(), collection, id))
    }

    /// Loads the entity of `class` with the given id.
    ///
    /// # Errors
    ///
    /// Fails on mapping, hook, resolution or store errors.
    pub fn get(&self, class: &ClassName, id: &Value) -> MapperResult<Option<Entity>> {
        let mapped = self.entity_class(class)?;
        self.load_one(class, mapped.collection_name(), id)
    }

    /// Loads the entity a key identifies.
    ///
    /// # Errors
    ///
    /// Fails on mapping, hook, resolution or store errors.
    pub fn get_by_key(&self, key: &Key) -> MapperResult<Option<Entity>> {
        self.load_one(&key.class, &key.collection, &key.id)
    }

    fn load_one(&self, class: &ClassName, collection: &str, id: &Value) -> MapperResult<Option<Entity>> {
        let Some(document) = self
            .store
            .find_first(collection, &Filter::id_eq(id.clone()))?
        else {
            return Ok(None);
        };
        self.load(class, document, &mut EntityCache::new()).map(Some)
    }

    /// Loads every entity of `class` matching `filter`, in store order.
    ///
    /// One [`EntityCache`] is shared by all loaded entities. Documents whose
    /// stored class name is not assignable to `class`, such as parent-class
    /// documents in a collection shared with subclasses, are skipped.
    ///
    /// # Errors
    ///
    /// Fails on mapping, hook, resolution or store errors.
    pub fn find(&self, class: &ClassName, filter: &Filter) -> MapperResult<Vec<Entity>> {
        let mapped = self.entity_class(class)?;
        let documents = self.store.find(mapped.collection_name(), filter)?;
        let mut cache = EntityCache::new();
        let mut found = Vec::with_capacity(documents.len());
        for document in documents {
            if !self.holds_instance_of(class, &document)? {
                continue;
            }
            found.push(self.load(class, document, &mut cache)?);
        }
        Ok(found)
    }

    fn holds_instance_of(&self, class: &ClassName, document: &Document) -> MapperResult<bool> {
        let stored = document
            .get(&self.mapper.options().class_name_key)
            .and_then(Value::as_text);
        let Some(stored) = stored.filter(|stored| *stored != class.as_str()) else {
            return Ok(true);
        };
        let assignable = self
            .mapper
            .get_mapped_class(&ClassName::new(stored))?
            .is_assignable_to(class);
        if !assignable {
            debug!(requested = %class, stored, "skipping document of unrelated class");
        }
        Ok(assignable)
    }

    fn load(
        &self,
        class: &ClassName,
        document: Document,
        cache: &mut EntityCache,
    ) -> MapperResult<Entity> {
        let mapped = self.mapper.concrete_class(class, &document)?;
        let mut entity = Entity::new(mapped.class_name().clone());
        let document = mapped.call_lifecycle_methods(
            LifecycleEvent::PreLoad,
            &mut entity,
            document,
            &self.mapper,
        )?;
        self.mapper.decode_into(&mapped, &mut entity, &document)?;

        let eager = mapped.persistence_fields().iter().filter(|field| {
            field
                .reference_options()
                .is_some_and(|options| !options.lazy)
        });
        for field in eager {
            if let Some(raw) = document.get(field.stored_name()) {
                let resolved = ReferenceHandler::new(&self.mapper, field).resolve_reference(
                    raw,
                    self.store.as_ref(),
                    cache,
                )?;
                entity.set(field.name(), resolved);
            }
        }

        mapped.call_lifecycle_methods(LifecycleEvent::PostLoad, &mut entity, document, &self.mapper)?;
        Ok(entity)
    }

    /// Resolves one reference field of an already loaded entity.
    ///
    /// # Errors
    ///
    /// Fails if `field` is not a reference field of the entity's class, or
    /// on resolution and store errors.
    pub fn resolve_field(
        &self,
        entity: &mut Entity,
        field: &str,
        cache: &mut EntityCache,
    ) -> MapperResult<()> {
        let mapped = self.mapper.get_mapped_class(entity.class())?;
        let mapped_field = mapped
            .mapped_field_by_java_field(field)
            .filter(|candidate| candidate.is_reference())
            .ok_or_else(|| {
                MapperError::mapping(format!(
                    "{}.{field} is not a Reference field",
                    entity.class()
                ))
            })?;
        let handler = ReferenceHandler::new(&self.mapper, mapped_field);
        let raw = match entity.get(field) {
            Some(property) => handler.encode_reference(property)?,
            None => Value::Null,
        };
        let resolved = handler.resolve_reference(&raw, self.store.as_ref(), cache)?;
        entity.set(field, resolved);
        Ok(())
    }

    /// Deletes the entity of `class` with the given id.
    ///
    /// # Errors
    ///
    /// Fails on mapping or store errors.
    pub fn delete(&self, class: &ClassName, id: &Value) -> MapperResult<bool> {
        let mapped = self.entity_class(class)?;
        Ok(self.store.delete(mapped.collection_name(), id)?)
    }

    /// Number of stored entities of `class`.
    ///
    /// # Errors
    ///
    /// Fails on mapping or store errors.
    pub fn count(&self, class: &ClassName) -> MapperResult<usize> {
        let mapped = self.entity_class(class)?;
        Ok(self.store.count(mapped.collection_name())?)
    }
}

impl std::fmt::Debug for Datastore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Datastore")
            .field("mapper", &self.mapper)
            .finish_non_exhaustive()
    }
}
