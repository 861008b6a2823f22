//! The descriptor registry.

use crate::config::MapperOptions;
use crate::error::{MapperError, MapperResult};
use crate::lifecycle::{EntityInterceptor, ListenerCache};
use crate::mapping::{validator, MappedClass};
use crate::schema::{ClassName, SchemaSource, TypeSchema};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Builds a [`Mapper`].
pub struct MapperBuilder {
    schemas: Arc<dyn SchemaSource>,
    options: MapperOptions,
    listener_cache: Option<Arc<ListenerCache>>,
    interceptors: Vec<Arc<dyn EntityInterceptor>>,
}

impl MapperBuilder {
    /// Sets the mapping options.
    #[must_use]
    pub fn options(mut self, options: MapperOptions) -> Self {
        self.options = options;
        self
    }

    /// Appends an interceptor; interceptors run in the order added.
    #[must_use]
    pub fn interceptor(mut self, interceptor: Arc<dyn EntityInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Shares a listener cache, for example between several mappers.
    #[must_use]
    pub fn listener_cache(mut self, cache: Arc<ListenerCache>) -> Self {
        self.listener_cache = Some(cache);
        self
    }

    /// Builds the mapper.
    #[must_use]
    pub fn build(self) -> Mapper {
        Mapper {
            options: self.options,
            schemas: self.schemas,
            mapped_classes: RwLock::new(HashMap::new()),
            listener_cache: self.listener_cache.unwrap_or_default(),
            interceptors: self.interceptors,
        }
    }
}

/// Maps entities to documents and back.
///
/// The mapper owns the cache of class descriptors. A descriptor is built
/// the first time its type is needed and kept for the mapper's lifetime.
/// Building happens outside the cache lock; when two threads build the same
/// descriptor concurrently the first one published is kept and returned to
/// both.
///
/// # Example
///
/// ```rust
/// use entimap_core::schema::{FieldSchema, FieldType, SchemaRegistry, TypeSchema};
/// use entimap_core::Mapper;
/// use std::sync::Arc;
///
/// let registry = SchemaRegistry::new().with(
///     TypeSchema::class("Job")
///         .entity()
///         .field(FieldSchema::new("id", FieldType::object_id()).id()),
/// );
/// let mapper = Mapper::new(Arc::new(registry));
/// let job = mapper.get_mapped_class(&"Job".into()).unwrap();
/// assert_eq!(job.collection_name(), "Job");
/// ```
pub struct Mapper {
    options: MapperOptions,
    schemas: Arc<dyn SchemaSource>,
    mapped_classes: RwLock<HashMap<ClassName, Arc<MappedClass>>>,
    listener_cache: Arc<ListenerCache>,
    interceptors: Vec<Arc<dyn EntityInterceptor>>,
}

impl Mapper {
    /// Creates a mapper with default options and no interceptors.
    pub fn new(schemas: Arc<dyn SchemaSource>) -> Self {
        Self::builder(schemas).build()
    }

    /// Starts building a mapper.
    pub fn builder(schemas: Arc<dyn SchemaSource>) -> MapperBuilder {
        MapperBuilder {
            schemas,
            options: MapperOptions::default(),
            listener_cache: None,
            interceptors: Vec::new(),
        }
    }

    /// Mapping options.
    pub fn options(&self) -> &MapperOptions {
        &self.options
    }

    /// Where type descriptions come from.
    pub fn schemas(&self) -> &dyn SchemaSource {
        self.schemas.as_ref()
    }

    /// The listener instance cache.
    pub fn listener_cache(&self) -> &Arc<ListenerCache> {
        &self.listener_cache
    }

    /// Registered interceptors, in run order.
    pub fn interceptors(&self) -> &[Arc<dyn EntityInterceptor>] {
        &self.interceptors
    }

    /// Returns the descriptor of `class`, building it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::UnknownClass`] for unregistered types and
    /// [`MapperError::Mapping`] when the type cannot be mapped. Nothing is
    /// cached on failure.
    pub fn get_mapped_class(&self, class: &ClassName) -> MapperResult<Arc<MappedClass>> {
        self.mapped_class_in(class, &mut Vec::new())
    }

    pub(crate) fn mapped_class_in(
        &self,
        class: &ClassName,
        in_progress: &mut Vec<ClassName>,
    ) -> MapperResult<Arc<MappedClass>> {
        if let Some(existing) = self.mapped_classes.read().get(class) {
            return Ok(existing.clone());
        }

        if in_progress.contains(class) {
            let cycle: Vec<&str> = in_progress
                .iter()
                .chain(std::iter::once(class))
                .map(ClassName::as_str)
                .collect();
            return Err(MapperError::mapping(format!(
                "cyclic type hierarchy: {}",
                cycle.join(" -> ")
            )));
        }

        let schema = self.schema_of(class)?;
        in_progress.push(class.clone());
        let discovered = MappedClass::discover(schema, self, in_progress);
        in_progress.pop();
        let discovered = discovered?;
        validator::validate(&discovered, self)?;

        let mut cache = self.mapped_classes.write();
        let published = cache
            .entry(class.clone())
            .or_insert_with(|| Arc::new(discovered));
        debug!(class = %class, "published mapped class");
        Ok(published.clone())
    }

    /// Returns the registered description of `class`.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::UnknownClass`] if nothing is registered.
    pub fn schema_of(&self, class: &ClassName) -> MapperResult<Arc<TypeSchema>> {
        self.schemas
            .schema(class)
            .ok_or_else(|| MapperError::UnknownClass {
                class: class.clone(),
            })
    }

    /// Returns true if the descriptor of `class` is already cached.
    pub fn is_mapped(&self, class: &ClassName) -> bool {
        self.mapped_classes.read().contains_key(class)
    }

    /// Every cached descriptor.
    pub fn mapped_classes(&self) -> Vec<Arc<MappedClass>> {
        self.mapped_classes.read().values().cloned().collect()
    }

    /// The collection `class` is stored in.
    ///
    /// # Errors
    ///
    /// Fails if the class cannot be mapped.
    pub fn collection_name(&self, class: &ClassName) -> MapperResult<String> {
        Ok(self.get_mapped_class(class)?.collection_name().to_string())
    }
}

impl fmt::Debug for Mapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapper")
            .field("options", &self.options)
            .field("mapped_classes", &self.mapped_classes.read().len())
            .field("interceptors", &self.interceptors.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSchema, FieldType, SchemaRegistry};
    use std::thread;

    fn jobs() -> Arc<SchemaRegistry> {
        Arc::new(
            SchemaRegistry::new()
                .with(TypeSchema::class("Job").entity().field(
                    FieldSchema::new("id", FieldType::object_id()).id(),
                ))
                .with(TypeSchema::class("A").extends("B"))
                .with(TypeSchema::class("B").extends("A")),
        )
    }

    #[test]
    fn descriptors_are_cached() {
        let mapper = Mapper::new(jobs());
        assert!(!mapper.is_mapped(&"Job".into()));
        let first = mapper.get_mapped_class(&"Job".into()).unwrap();
        let second = mapper.get_mapped_class(&"Job".into()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(mapper.mapped_classes().len(), 1);
    }

    #[test]
    fn unknown_class() {
        let mapper = Mapper::new(jobs());
        let err = mapper.get_mapped_class(&"Nope".into()).unwrap_err();
        assert!(matches!(err, MapperError::UnknownClass { .. }));
    }

    #[test]
    fn cyclic_hierarchy_is_rejected() {
        let mapper = Mapper::new(jobs());
        let err = mapper.get_mapped_class(&"A".into()).unwrap_err();
        assert!(err.to_string().contains("A -> B -> A"));
        assert!(!mapper.is_mapped(&"A".into()));
        assert!(!mapper.is_mapped(&"B".into()));
    }

    #[test]
    fn concurrent_discovery_publishes_one_descriptor() {
        let mapper = Arc::new(Mapper::new(jobs()));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let mapper = mapper.clone();
                thread::spawn(move || mapper.get_mapped_class(&"Job".into()).unwrap())
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for result in &results {
            assert!(Arc::ptr_eq(result, &results[0]));
        }
    }
}
