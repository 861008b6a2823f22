//! Class descriptors.

use crate::entity::Entity;
use crate::error::{MapperError, MapperResult};
use crate::lifecycle::{
    dispatch_interceptor, Arity, LifecycleCall, LifecycleEvent, ListenerFactory, ListenerInstance,
};
use crate::mapping::{MappedField, Mapper};
use crate::schema::{
    ClassName, EmbeddedOptions, EntityOptions, FieldAnnotationKind, MethodSchema, Nesting,
    TypeAnnotation, TypeAnnotationKind, TypeKind, TypeSchema,
};
use entimap_codec::Document;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// An external listener type bound to a lifecycle method.
#[derive(Clone)]
pub struct ListenerBinding {
    class: ClassName,
    factory: ListenerFactory,
}

impl ListenerBinding {
    /// The listener type.
    pub fn class(&self) -> &ClassName {
        &self.class
    }
}

impl fmt::Debug for ListenerBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ListenerBinding").field(&self.class).finish()
    }
}

/// One entry of a lifecycle event table.
#[derive(Debug, Clone)]
pub struct LifecycleMethod {
    listener: Option<ListenerBinding>,
    method: MethodSchema,
}

impl LifecycleMethod {
    /// The listener type the method is declared on; `None` for the entity itself.
    pub fn listener_class(&self) -> Option<&ClassName> {
        self.listener.as_ref().map(ListenerBinding::class)
    }

    /// The method.
    pub fn method(&self) -> &MethodSchema {
        &self.method
    }
}

/// Everything the mapper knows about one type.
///
/// Built once per type by [`Mapper::get_mapped_class`] and shared after
/// that; nothing in a descriptor changes once it is published.
pub struct MappedClass {
    schema: Arc<TypeSchema>,
    annotations: HashMap<TypeAnnotationKind, Vec<TypeAnnotation>>,
    lifecycle_methods: HashMap<LifecycleEvent, Vec<LifecycleMethod>>,
    persistence_fields: Vec<MappedField>,
    id_field: Option<usize>,
    version_field: Option<usize>,
    entity_options: Option<EntityOptions>,
    embedded_options: Option<EmbeddedOptions>,
    superclass: Option<Arc<MappedClass>>,
    interfaces: Vec<Arc<MappedClass>>,
    collection_name: String,
}

impl MappedClass {
    /// Builds the descriptor of `schema`, resolving supertypes through `mapper`.
    ///
    /// `in_progress` holds the types currently being discovered further up
    /// the call stack.
    pub(crate) fn discover(
        schema: Arc<TypeSchema>,
        mapper: &Mapper,
        in_progress: &mut Vec<ClassName>,
    ) -> MapperResult<Self> {
        let name = schema.name().clone();
        if schema.declared_nesting() == Nesting::InnerMember {
            return Err(MapperError::mapping(format!(
                "cannot map {name}: nested types must be static"
            )));
        }

        let mut annotations: HashMap<TypeAnnotationKind, Vec<TypeAnnotation>> = HashMap::new();
        for annotation in schema.annotations() {
            annotations
                .entry(annotation.kind())
                .or_default()
                .push(annotation.clone());
        }

        let superclass = schema
            .superclass()
            .map(|parent| resolve_supertype(mapper, &name, parent, in_progress))
            .transpose()?;
        let interfaces = schema
            .interfaces()
            .iter()
            .map(|interface| resolve_supertype(mapper, &name, interface, in_progress))
            .collect::<MapperResult<Vec<_>>>()?;

        let lifecycle_methods = collect_lifecycle_methods(&schema, &annotations, mapper)?;

        let mut persistence_fields: Vec<MappedField> = superclass
            .as_ref()
            .map(|parent| parent.persistence_fields.clone())
            .unwrap_or_default();
        for declared in schema.fields() {
            let field = MappedField::new(&name, declared);
            if field.is_transient() {
                warn!(
                    class = %name,
                    field = field.name(),
                    field_type = %field.field_type(),
                    "ignoring transient field, will not persist"
                );
            } else {
                persistence_fields.push(field);
            }
        }

        let id_field = persistence_fields.iter().position(MappedField::is_id);
        let version_field = persistence_fields.iter().position(MappedField::is_version);

        let entity_options = annotations
            .get(&TypeAnnotationKind::Entity)
            .and_then(|all| all.first())
            .and_then(|annotation| match annotation {
                TypeAnnotation::Entity(options) => Some(options.clone()),
                _ => None,
            })
            .or_else(|| superclass.as_ref().and_then(|p| p.entity_options.clone()));
        let embedded_options = annotations
            .get(&TypeAnnotationKind::Embedded)
            .and_then(|all| all.last())
            .and_then(|annotation| match annotation {
                TypeAnnotation::Embedded(options) => Some(options.clone()),
                _ => None,
            });

        let collection_name = match entity_options
            .as_ref()
            .and_then(|options| options.collection.clone())
        {
            Some(explicit) => explicit,
            None if mapper.options().use_lower_case_collection_names => {
                name.simple_name().to_lowercase()
            }
            None => name.simple_name().to_string(),
        };

        debug!(
            class = %name,
            collection = %collection_name,
            fields = persistence_fields.len(),
            "discovered mapped class"
        );

        Ok(Self {
            schema,
            annotations,
            lifecycle_methods,
            persistence_fields,
            id_field,
            version_field,
            entity_options,
            embedded_options,
            superclass,
            interfaces,
            collection_name,
        })
    }

    /// The mapped type.
    pub fn class_name(&self) -> &ClassName {
        self.schema.name()
    }

    /// The type description the descriptor was built from.
    pub fn schema(&self) -> &Arc<TypeSchema> {
        &self.schema
    }

    /// The collection documents of this type are stored in.
    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    /// Returns the last type annotation of `kind`.
    pub fn annotation(&self, kind: &TypeAnnotationKind) -> Option<&TypeAnnotation> {
        self.annotations.get(kind).and_then(|all| all.last())
    }

    /// Returns every type annotation of `kind`, in declaration order.
    pub fn annotations(&self, kind: &TypeAnnotationKind) -> &[TypeAnnotation] {
        self.annotations.get(kind).map_or(&[], Vec::as_slice)
    }

    /// Entity options, own or inherited.
    pub fn entity_options(&self) -> Option<&EntityOptions> {
        self.entity_options.as_ref()
    }

    /// Embedded options.
    pub fn embedded_options(&self) -> Option<&EmbeddedOptions> {
        self.embedded_options.as_ref()
    }

    /// Persistent fields: inherited ones first, then declared ones.
    pub fn persistence_fields(&self) -> &[MappedField] {
        &self.persistence_fields
    }

    /// The id field.
    pub fn id_field(&self) -> Option<&MappedField> {
        self.id_field.map(|i| &self.persistence_fields[i])
    }

    /// The version field.
    pub fn version_field(&self) -> Option<&MappedField> {
        self.version_field.map(|i| &self.persistence_fields[i])
    }

    /// Persistent fields carrying an annotation of `kind`.
    pub fn fields_annotated_with(&self, kind: FieldAnnotationKind) -> Vec<&MappedField> {
        self.persistence_fields
            .iter()
            .filter(|field| field.has_annotation(kind))
            .collect()
    }

    /// Looks a field up by stored name.
    pub fn mapped_field(&self, stored_name: &str) -> Option<&MappedField> {
        self.persistence_fields
            .iter()
            .find(|field| field.stored_name() == stored_name)
    }

    /// Looks a field up by declared name.
    pub fn mapped_field_by_java_field(&self, name: &str) -> Option<&MappedField> {
        self.persistence_fields
            .iter()
            .find(|field| field.name() == name)
    }

    /// The superclass descriptor.
    pub fn superclass(&self) -> Option<&Arc<MappedClass>> {
        self.superclass.as_ref()
    }

    /// Descriptors of the directly implemented interfaces.
    pub fn interfaces(&self) -> &[Arc<MappedClass>] {
        &self.interfaces
    }

    /// Returns true for interfaces.
    pub fn is_interface(&self) -> bool {
        self.schema.kind() == TypeKind::Interface
    }

    /// Returns true for abstract classes.
    pub fn is_abstract(&self) -> bool {
        self.schema.kind() == TypeKind::Abstract
    }

    /// Returns true if the type is (or inherits being) an entity.
    pub fn is_entity(&self) -> bool {
        self.entity_options.is_some()
    }

    /// Returns true if the type is marked embedded.
    pub fn is_embedded(&self) -> bool {
        self.embedded_options.is_some()
    }

    /// Returns true if the class name is written into documents.
    pub fn stores_class_name(&self) -> bool {
        !self
            .entity_options
            .as_ref()
            .is_some_and(|options| options.no_class_name_stored)
    }

    /// Returns true if any method handles `event`.
    pub fn has_lifecycle(&self, event: LifecycleEvent) -> bool {
        self.lifecycle_methods.contains_key(&event)
    }

    /// The methods run for `event`, in dispatch order.
    pub fn lifecycle_methods(&self, event: LifecycleEvent) -> &[LifecycleMethod] {
        self.lifecycle_methods.get(&event).map_or(&[], Vec::as_slice)
    }

    /// Returns true if `class` is the immediate superclass or a directly
    /// implemented interface.
    pub fn is_sub_type(&self, class: &ClassName) -> bool {
        self.superclass
            .as_ref()
            .is_some_and(|parent| parent.class_name() == class)
            || self.interfaces.iter().any(|i| i.class_name() == class)
    }

    /// Returns true if a value of this type can stand where `class` is
    /// declared: the same type, any superclass, or any interface reachable
    /// through superclasses and interfaces.
    pub fn is_assignable_to(&self, class: &ClassName) -> bool {
        self.class_name() == class
            || self
                .superclass
                .as_ref()
                .is_some_and(|parent| parent.is_assignable_to(class))
            || self.interfaces.iter().any(|i| i.is_assignable_to(class))
    }

    /// Runs the methods registered for `event`, then every interceptor.
    ///
    /// A method returning a document replaces the running document for the
    /// methods after it and for the interceptors. Returns the final running
    /// document.
    ///
    /// # Errors
    ///
    /// The first failing method, listener factory or interceptor aborts the
    /// dispatch with [`MapperError::Lifecycle`].
    pub fn call_lifecycle_methods(
        &self,
        event: LifecycleEvent,
        entity: &mut Entity,
        document: Document,
        mapper: &Mapper,
    ) -> MapperResult<Document> {
        let mut running = document;
        let lifecycle_error = |method: &str, source| MapperError::Lifecycle {
            event,
            class: self.class_name().clone(),
            method: method.to_string(),
            source,
        };

        if let Some(methods) = self.lifecycle_methods.get(&event) {
            let mut instances: HashMap<&ClassName, ListenerInstance> = HashMap::new();
            for binding in methods.iter().filter_map(|m| m.listener.as_ref()) {
                if !instances.contains_key(&binding.class) {
                    let instance = mapper
                        .listener_cache()
                        .get_or_create(&binding.class, &binding.factory)
                        .map_err(|source| lifecycle_error(binding.class.as_str(), source))?;
                    instances.insert(&binding.class, instance);
                }
            }

            for lifecycle in methods {
                let method = &lifecycle.method;
                let arity = method.arity();
                trace!(
                    event = %event,
                    class = %self.class_name(),
                    method = method.name(),
                    listener = ?lifecycle.listener_class(),
                    "calling lifecycle method"
                );

                let call = match &lifecycle.listener {
                    None => LifecycleCall {
                        listener: None,
                        entity: Some(&mut *entity),
                        document: if arity == Arity::Zero {
                            None
                        } else {
                            Some(&running)
                        },
                    },
                    Some(binding) => LifecycleCall {
                        listener: instances.get(&binding.class).map(|instance| &**instance),
                        entity: if arity >= Arity::One {
                            Some(&mut *entity)
                        } else {
                            None
                        },
                        document: if arity == Arity::Two {
                            Some(&running)
                        } else {
                            None
                        },
                    },
                };

                if let Some(replacement) = method
                    .invoke(call)
                    .map_err(|source| lifecycle_error(method.name(), source))?
                {
                    running = replacement;
                }
            }
        }

        for interceptor in mapper.interceptors() {
            trace!(event = %event, class = %self.class_name(), "calling interceptor");
            dispatch_interceptor(interceptor.as_ref(), event, entity, &mut running, mapper)
                .map_err(|source| lifecycle_error("interceptor", source))?;
        }

        Ok(running)
    }
}

impl fmt::Debug for MappedClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappedClass")
            .field("class", self.class_name())
            .field("collection", &self.collection_name)
            .field("fields", &self.persistence_fields)
            .field("superclass", &self.superclass.as_ref().map(|p| p.class_name()))
            .field(
                "interfaces",
                &self.interfaces.iter().map(|i| i.class_name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

fn resolve_supertype(
    mapper: &Mapper,
    class: &ClassName,
    parent: &ClassName,
    in_progress: &mut Vec<ClassName>,
) -> MapperResult<Arc<MappedClass>> {
    mapper
        .mapped_class_in(parent, in_progress)
        .map_err(|err| match err {
            MapperError::UnknownClass { class: missing } => MapperError::mapping(format!(
                "supertype {missing} of {class} is not registered"
            )),
            other => other,
        })
}

/// Non-static methods of `schema` and its superclasses, furthest ancestor
/// first. A method redeclared by a descendant takes the ancestor's slot.
fn declared_and_inherited_methods(schema: &Arc<TypeSchema>, mapper: &Mapper) -> Vec<MethodSchema> {
    let mut chain = vec![schema.clone()];
    let mut seen: HashSet<ClassName> = HashSet::from([schema.name().clone()]);
    while let Some(parent) = chain
        .last()
        .and_then(|current| current.superclass().cloned())
        .filter(|parent| seen.insert(parent.clone()))
        .and_then(|parent| mapper.schemas().schema(&parent))
    {
        chain.push(parent);
    }

    let mut methods: Vec<MethodSchema> = Vec::new();
    for ancestor in chain.iter().rev() {
        for method in ancestor.methods().iter().filter(|m| !m.is_static()) {
            match methods.iter_mut().find(|m| m.name() == method.name()) {
                Some(slot) => *slot = method.clone(),
                None => methods.push(method.clone()),
            }
        }
    }
    methods
}

fn collect_lifecycle_methods(
    schema: &Arc<TypeSchema>,
    annotations: &HashMap<TypeAnnotationKind, Vec<TypeAnnotation>>,
    mapper: &Mapper,
) -> MapperResult<HashMap<LifecycleEvent, Vec<LifecycleMethod>>> {
    let mut lifecycle_types: Vec<(Arc<TypeSchema>, Option<ListenerBinding>)> =
        vec![(schema.clone(), None)];

    let listeners = annotations
        .get(&TypeAnnotationKind::EntityListeners)
        .and_then(|all| all.last());
    if let Some(TypeAnnotation::EntityListeners(listeners)) = listeners {
        for listener in listeners {
            if listener == schema.name() {
                lifecycle_types.push((schema.clone(), None));
                continue;
            }
            let listener_schema = mapper.schemas().schema(listener).ok_or_else(|| {
                MapperError::mapping(format!(
                    "listener {listener} of {} is not registered",
                    schema.name()
                ))
            })?;
            let factory = listener_schema.factory().cloned().ok_or_else(|| {
                MapperError::mapping(format!(
                    "listener {listener} of {} has no listener factory",
                    schema.name()
                ))
            })?;
            let binding = ListenerBinding {
                class: listener.clone(),
                factory,
            };
            lifecycle_types.push((listener_schema, Some(binding)));
        }
    }

    let mut table: HashMap<LifecycleEvent, Vec<LifecycleMethod>> = HashMap::new();
    for (lifecycle_type, binding) in &lifecycle_types {
        for method in declared_and_inherited_methods(lifecycle_type, mapper) {
            for event in LifecycleEvent::ALL {
                if method.handles(event) {
                    table.entry(event).or_default().push(LifecycleMethod {
                        listener: binding.clone(),
                        method: method.clone(),
                    });
                }
            }
        }
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::HookError;
    use crate::schema::{FieldSchema, FieldType, SchemaRegistry};

    fn mapper(registry: SchemaRegistry) -> Mapper {
        Mapper::new(Arc::new(registry))
    }

    #[test]
    fn inner_member_types_are_rejected() {
        let mapper = mapper(
            SchemaRegistry::new().with(TypeSchema::class("Outer.Inner").nesting(Nesting::InnerMember)),
        );
        let err = mapper.get_mapped_class(&"Outer.Inner".into()).unwrap_err();
        assert!(err.to_string().contains("Outer.Inner"));
        assert!(!mapper.is_mapped(&"Outer.Inner".into()));
    }

    #[test]
    fn inherited_fields_come_first() {
        let mapper = mapper(
            SchemaRegistry::new()
                .with(
                    TypeSchema::abstract_class("Base")
                        .field(FieldSchema::new("id", FieldType::object_id()).id())
                        .field(FieldSchema::new("created", FieldType::integer())),
                )
                .with(
                    TypeSchema::class("Job")
                        .entity()
                        .extends("Base")
                        .field(FieldSchema::new("name", FieldType::text()))
                        .field(FieldSchema::new("scratch", FieldType::text()).transient()),
                ),
        );
        let job = mapper.get_mapped_class(&"Job".into()).unwrap();
        let names: Vec<_> = job.persistence_fields().iter().map(MappedField::name).collect();
        assert_eq!(names, ["id", "created", "name"]);
        assert_eq!(job.id_field().map(MappedField::stored_name), Some("_id"));
        assert!(job.mapped_field_by_java_field("scratch").is_none());
        assert_eq!(job.collection_name(), "Job");
    }

    #[test]
    fn collection_names() {
        let registry = SchemaRegistry::new()
            .with(TypeSchema::class("app::Person").entity())
            .with(TypeSchema::class("Order").entity_in("purchase_orders"));
        let mapper = Mapper::builder(Arc::new(registry))
            .options(crate::MapperOptions::new().use_lower_case_collection_names(true))
            .build();
        let person = mapper.get_mapped_class(&"app::Person".into()).unwrap();
        let order = mapper.get_mapped_class(&"Order".into()).unwrap();
        assert_eq!(person.collection_name(), "person");
        assert_eq!(order.collection_name(), "purchase_orders");
    }

    #[test]
    fn assignability_walks_every_ancestor() {
        let mapper = mapper(
            SchemaRegistry::new()
                .with(TypeSchema::interface("Named"))
                .with(TypeSchema::interface("User").implements("Named"))
                .with(TypeSchema::abstract_class("Account").implements("User"))
                .with(TypeSchema::class("Admin").entity().extends("Account")),
        );
        let admin = mapper.get_mapped_class(&"Admin".into()).unwrap();
        assert!(admin.is_assignable_to(&"Admin".into()));
        assert!(admin.is_assignable_to(&"Account".into()));
        assert!(admin.is_assignable_to(&"User".into()));
        assert!(admin.is_assignable_to(&"Named".into()));
        assert!(!admin.is_assignable_to(&"Other".into()));
        assert!(admin.is_sub_type(&"Account".into()));
        assert!(!admin.is_sub_type(&"User".into()));
    }

    #[test]
    fn overriding_method_keeps_ancestor_slot() {
        let noop = |_: LifecycleCall<'_>| -> Result<Option<Document>, HookError> { Ok(None) };
        let mapper = mapper(
            SchemaRegistry::new()
                .with(
                    TypeSchema::abstract_class("Base")
                        .method(MethodSchema::new("stamp", Arity::Zero, noop).on(LifecycleEvent::PrePersist))
                        .method(MethodSchema::new("audit", Arity::Zero, noop).on(LifecycleEvent::PrePersist))
                        .method(
                            MethodSchema::new("helper", Arity::Zero, noop)
                                .on(LifecycleEvent::PrePersist)
                                .static_method(),
                        ),
                )
                .with(
                    TypeSchema::class("Job")
                        .entity()
                        .extends("Base")
                        .method(MethodSchema::new("stamp", Arity::One, noop).on(LifecycleEvent::PrePersist)),
                ),
        );
        let job = mapper.get_mapped_class(&"Job".into()).unwrap();
        let methods = job.lifecycle_methods(LifecycleEvent::PrePersist);
        let names: Vec<_> = methods.iter().map(|m| m.method().name()).collect();
        assert_eq!(names, ["stamp", "audit"]);
        assert_eq!(methods[0].method().arity(), Arity::One);
        assert!(!job.has_lifecycle(LifecycleEvent::PostLoad));
    }

    #[test]
    fn listener_without_factory_is_a_mapping_error() {
        let mapper = mapper(
            SchemaRegistry::new()
                .with(TypeSchema::class("Audit"))
                .with(TypeSchema::class("Job").entity().listeners(["Audit"])),
        );
        let err = mapper.get_mapped_class(&"Job".into()).unwrap_err();
        assert!(matches!(err, MapperError::Mapping { .. }));
    }
}
