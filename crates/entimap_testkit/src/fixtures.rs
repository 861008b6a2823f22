//! Sample schemas and datastore fixtures.

use crate::recording::RecordingStore;
use entimap_codec::{Document, Value};
use entimap_core::lifecycle::{EntityInterceptor, HookError, LifecycleEvent};
use entimap_core::schema::{
    FieldSchema, FieldType, ReferenceOptions, SchemaRegistry, TypeSchema,
};
use entimap_core::{Datastore, Entity, Mapper, MapperOptions};
use entimap_store::DocumentStore;
use parking_lot::Mutex;
use std::sync::Arc;

/// Interfaces, implementations and a full-pointer reference.
///
/// - `User`: an interface
/// - `UserImpl`: entity in `users`, implements `User`
/// - `Job`: entity in `jobs`, with `owner: User` (full pointer),
///   `attributes: List<text>` and `watchers: List<UserImpl>` (id only)
pub fn jobs_registry() -> SchemaRegistry {
    SchemaRegistry::new()
        .with(TypeSchema::interface("User"))
        .with(
            TypeSchema::class("UserImpl")
                .implements("User")
                .entity_in("users")
                .field(FieldSchema::new("id", FieldType::object_id()).id())
                .field(FieldSchema::new("name", FieldType::text())),
        )
        .with(
            TypeSchema::class("Job")
                .entity_in("jobs")
                .field(FieldSchema::new("id", FieldType::object_id()).id())
                .field(FieldSchema::new("title", FieldType::text()))
                .field(FieldSchema::new("owner", FieldType::class("User")).reference())
                .field(FieldSchema::new("attributes", FieldType::list(FieldType::text())))
                .field(
                    FieldSchema::new("watchers", FieldType::list(FieldType::class("UserImpl")))
                        .reference_with(ReferenceOptions::id_only()),
                ),
        )
}

/// Books referencing authors in every supported way.
///
/// - `Address`: embedded
/// - `Author`: entity in `authors` with an integer id and a `home` address
/// - `Book`: entity in `books` with `editor: Author` (id only),
///   `authors: List<Author>` (full pointers) and `reviewers: List<Author>`
///   (lazy), plus a version counter
pub fn library_registry() -> SchemaRegistry {
    SchemaRegistry::new()
        .with(
            TypeSchema::class("Address")
                .embedded()
                .field(FieldSchema::new("city", FieldType::text())),
        )
        .with(
            TypeSchema::class("Author")
                .entity_in("authors")
                .field(FieldSchema::new("id", FieldType::integer()).id())
                .field(FieldSchema::new("name", FieldType::text()))
                .field(FieldSchema::new("home", FieldType::class("Address")).embedded()),
        )
        .with(
            TypeSchema::class("Book")
                .entity_in("books")
                .field(FieldSchema::new("id", FieldType::integer()).id())
                .field(FieldSchema::new("version", FieldType::integer()).version())
                .field(FieldSchema::new("title", FieldType::text()))
                .field(
                    FieldSchema::new("editor", FieldType::class("Author"))
                        .reference_with(ReferenceOptions::id_only()),
                )
                .field(
                    FieldSchema::new("authors", FieldType::list(FieldType::class("Author")))
                        .reference(),
                )
                .field(
                    FieldSchema::new("reviewers", FieldType::list(FieldType::class("Author")))
                        .reference_with(ReferenceOptions::lazy()),
                ),
        )
}

/// A datastore over a [`RecordingStore`].
pub struct TestDatastore {
    /// The datastore under test.
    pub datastore: Datastore,
    /// The store behind it.
    pub store: Arc<RecordingStore>,
}

impl TestDatastore {
    /// Creates a datastore with default options.
    pub fn new(registry: SchemaRegistry) -> Self {
        Self::with_mapper(Mapper::new(Arc::new(registry)))
    }

    /// Creates a datastore with the given options.
    pub fn with_options(registry: SchemaRegistry, options: MapperOptions) -> Self {
        Self::with_mapper(Mapper::builder(Arc::new(registry)).options(options).build())
    }

    /// Creates a datastore around an existing mapper.
    pub fn with_mapper(mapper: Mapper) -> Self {
        let store = Arc::new(RecordingStore::new());
        let datastore = Datastore::new(Arc::new(mapper), store.clone());
        Self { datastore, store }
    }

    /// The mapper.
    pub fn mapper(&self) -> &Mapper {
        self.datastore.mapper()
    }
}

/// [`library_registry`] over a recording store, with helpers to seed data.
pub struct LibraryFixture {
    /// The datastore under test.
    pub datastore: Datastore,
    /// The store behind it.
    pub store: Arc<RecordingStore>,
}

impl LibraryFixture {
    /// Creates an empty library.
    pub fn new() -> Self {
        Self::with_options(MapperOptions::default())
    }

    /// Creates an empty library with the given options.
    pub fn with_options(options: MapperOptions) -> Self {
        let TestDatastore { datastore, store } =
            TestDatastore::with_options(library_registry(), options);
        Self { datastore, store }
    }

    /// Writes an author document directly, bypassing the mapper.
    pub fn store_author(&self, id: i64, name: &str) {
        self.store
            .save(
                "authors",
                Document::new().with("_id", id).with("name", name),
            )
            .expect("in-memory save cannot fail");
    }

    /// Saves an author through the datastore.
    pub fn save_author(&self, id: i64, name: &str) -> Entity {
        let mut author = author(id, name);
        self.datastore
            .save(&mut author)
            .expect("author should save");
        author
    }
}

impl Default for LibraryFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// An unsaved `Author`.
pub fn author(id: i64, name: &str) -> Entity {
    Entity::new("Author").with("id", id).with("name", name)
}

/// Entries recorded by lifecycle methods, listeners and interceptors.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    /// Every entry so far.
    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    /// Entries starting with `prefix`.
    pub fn entries_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.starts_with(prefix))
            .collect()
    }

    /// Forgets all entries.
    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

/// An interceptor that logs `interceptor:<event>:<class>` and stamps the
/// running document with `intercepted: true` on `PreSave`.
#[derive(Debug, Clone)]
pub struct RecordingInterceptor {
    log: CallLog,
}

impl RecordingInterceptor {
    /// Creates an interceptor writing to `log`.
    pub fn new(log: CallLog) -> Self {
        Self { log }
    }

    fn note(&self, event: LifecycleEvent, entity: &Entity) {
        self.log
            .record(format!("interceptor:{}:{}", event.name(), entity.class()));
    }
}

impl EntityInterceptor for RecordingInterceptor {
    fn pre_persist(
        &self,
        entity: &mut Entity,
        _document: &mut Document,
        _mapper: &Mapper,
    ) -> Result<(), HookError> {
        self.note(LifecycleEvent::PrePersist, entity);
        Ok(())
    }

    fn pre_save(
        &self,
        entity: &mut Entity,
        document: &mut Document,
        _mapper: &Mapper,
    ) -> Result<(), HookError> {
        self.note(LifecycleEvent::PreSave, entity);
        document.insert("intercepted", Value::Bool(true));
        Ok(())
    }

    fn pre_load(
        &self,
        entity: &mut Entity,
        _document: &mut Document,
        _mapper: &Mapper,
    ) -> Result<(), HookError> {
        self.note(LifecycleEvent::PreLoad, entity);
        Ok(())
    }

    fn post_persist(
        &self,
        entity: &mut Entity,
        _document: &mut Document,
        _mapper: &Mapper,
    ) -> Result<(), HookError> {
        self.note(LifecycleEvent::PostPersist, entity);
        Ok(())
    }

    fn post_load(
        &self,
        entity: &mut Entity,
        _document: &mut Document,
        _mapper: &Mapper,
    ) -> Result<(), HookError> {
        self.note(LifecycleEvent::PostLoad, entity);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registries_map_cleanly() {
        let fixture = TestDatastore::new(jobs_registry());
        for class in ["User", "UserImpl", "Job"] {
            fixture.mapper().get_mapped_class(&class.into()).unwrap();
        }
        let library = LibraryFixture::new();
        for class in ["Address", "Author", "Book"] {
            library
                .datastore
                .mapper()
                .get_mapped_class(&class.into())
                .unwrap();
        }
    }

    #[test]
    fn call_log_filters_by_prefix() {
        let log = CallLog::new();
        log.record("a:1");
        log.record("b:1");
        log.record("a:2");
        assert_eq!(log.entries_with_prefix("a:"), vec!["a:1", "a:2"]);
        log.clear();
        assert!(log.entries().is_empty());
    }
}
