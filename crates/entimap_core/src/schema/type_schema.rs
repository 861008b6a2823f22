//! Structural descriptions of types, fields and lifecycle methods.

use crate::lifecycle::{
    Arity, HookError, HookResult, LifecycleCall, LifecycleEvent, LifecycleFn, ListenerFactory,
    ListenerInstance,
};
use crate::schema::{
    ClassName, EmbeddedOptions, EntityOptions, FieldAnnotation, FieldType, ReferenceOptions,
    TypeAnnotation,
};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// What sort of type a schema describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// A concrete class.
    Class,
    /// An abstract class.
    Abstract,
    /// An interface.
    Interface,
}

/// Where a type is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Nesting {
    /// Declared at module level.
    #[default]
    TopLevel,
    /// Nested, with no link to an enclosing instance.
    StaticMember,
    /// Nested and bound to an enclosing instance; cannot be mapped.
    InnerMember,
}

/// A declared field.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    name: String,
    field_type: FieldType,
    annotations: Vec<FieldAnnotation>,
    transient_modifier: bool,
}

impl FieldSchema {
    /// Declares a field.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            annotations: Vec::new(),
            transient_modifier: false,
        }
    }

    /// Adds an annotation.
    #[must_use]
    pub fn annotate(mut self, annotation: FieldAnnotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Marks this as the id field.
    #[must_use]
    pub fn id(self) -> Self {
        self.annotate(FieldAnnotation::Id)
    }

    /// Marks this as the version field.
    #[must_use]
    pub fn version(self) -> Self {
        self.annotate(FieldAnnotation::Version)
    }

    /// Marks this as a full-pointer, eagerly resolved reference.
    #[must_use]
    pub fn reference(self) -> Self {
        self.annotate(FieldAnnotation::Reference(ReferenceOptions::default()))
    }

    /// Marks this as a reference with explicit options.
    #[must_use]
    pub fn reference_with(self, options: ReferenceOptions) -> Self {
        self.annotate(FieldAnnotation::Reference(options))
    }

    /// Stores the field under another property name.
    #[must_use]
    pub fn stored_as(self, name: impl Into<String>) -> Self {
        self.annotate(FieldAnnotation::Property(name.into()))
    }

    /// Marks this field as embedded.
    #[must_use]
    pub fn embedded(self) -> Self {
        self.annotate(FieldAnnotation::Embedded)
    }

    /// Excludes the field through the transient annotation.
    #[must_use]
    pub fn transient(self) -> Self {
        self.annotate(FieldAnnotation::Transient)
    }

    /// Declares the field with the transient modifier.
    #[must_use]
    pub fn transient_modifier(mut self) -> Self {
        self.transient_modifier = true;
        self
    }

    /// Field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type.
    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    /// Annotations, in declaration order.
    pub fn annotations(&self) -> &[FieldAnnotation] {
        &self.annotations
    }

    /// Returns true if the field carries the transient modifier.
    pub fn has_transient_modifier(&self) -> bool {
        self.transient_modifier
    }
}

/// A declared method that may receive lifecycle events.
#[derive(Clone)]
pub struct MethodSchema {
    name: String,
    events: Vec<LifecycleEvent>,
    arity: Arity,
    is_static: bool,
    handler: LifecycleFn,
}

impl MethodSchema {
    /// Declares a method with its body.
    pub fn new<F>(name: impl Into<String>, arity: Arity, handler: F) -> Self
    where
        F: Fn(LifecycleCall<'_>) -> HookResult + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            events: Vec::new(),
            arity,
            is_static: false,
            handler: Arc::new(handler),
        }
    }

    /// Annotates the method with a lifecycle event.
    #[must_use]
    pub fn on(mut self, event: LifecycleEvent) -> Self {
        if !self.events.contains(&event) {
            self.events.push(event);
        }
        self
    }

    /// Declares the method static; static methods never receive events.
    #[must_use]
    pub fn static_method(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lifecycle annotations present on the method.
    pub fn events(&self) -> &[LifecycleEvent] {
        &self.events
    }

    /// Returns true if the method is annotated for `event`.
    pub fn handles(&self, event: LifecycleEvent) -> bool {
        self.events.contains(&event)
    }

    /// Declared parameter count.
    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// Returns true for static methods.
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub(crate) fn invoke(&self, call: LifecycleCall<'_>) -> HookResult {
        (self.handler)(call)
    }
}

impl fmt::Debug for MethodSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodSchema")
            .field("name", &self.name)
            .field("events", &self.events)
            .field("arity", &self.arity)
            .field("is_static", &self.is_static)
            .finish_non_exhaustive()
    }
}

/// The structural description of one type.
///
/// This is what the mapper learns a type's shape from: declared fields,
/// type annotations, methods, supertypes. Build it once per type and
/// register it with a [`crate::schema::SchemaRegistry`].
///
/// # Example
///
/// ```rust
/// use entimap_core::schema::{FieldSchema, FieldType, TypeSchema};
///
/// let job = TypeSchema::class("Job")
///     .entity()
///     .field(FieldSchema::new("id", FieldType::object_id()).id())
///     .field(FieldSchema::new("owner", FieldType::class("User")).reference())
///     .field(FieldSchema::new("attributes", FieldType::list(FieldType::text())));
/// assert_eq!(job.fields().len(), 3);
/// ```
#[derive(Clone)]
pub struct TypeSchema {
    name: ClassName,
    kind: TypeKind,
    nesting: Nesting,
    superclass: Option<ClassName>,
    interfaces: Vec<ClassName>,
    annotations: Vec<TypeAnnotation>,
    fields: Vec<FieldSchema>,
    methods: Vec<MethodSchema>,
    listener_factory: Option<ListenerFactory>,
}

impl TypeSchema {
    fn with_kind(name: impl Into<ClassName>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            nesting: Nesting::TopLevel,
            superclass: None,
            interfaces: Vec::new(),
            annotations: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            listener_factory: None,
        }
    }

    /// Describes a concrete class.
    pub fn class(name: impl Into<ClassName>) -> Self {
        Self::with_kind(name, TypeKind::Class)
    }

    /// Describes an abstract class.
    pub fn abstract_class(name: impl Into<ClassName>) -> Self {
        Self::with_kind(name, TypeKind::Abstract)
    }

    /// Describes an interface.
    pub fn interface(name: impl Into<ClassName>) -> Self {
        Self::with_kind(name, TypeKind::Interface)
    }

    /// Sets where the type is declared.
    #[must_use]
    pub fn nesting(mut self, nesting: Nesting) -> Self {
        self.nesting = nesting;
        self
    }

    /// Sets the superclass.
    #[must_use]
    pub fn extends(mut self, superclass: impl Into<ClassName>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    /// Adds an implemented (or, for interfaces, extended) interface.
    #[must_use]
    pub fn implements(mut self, interface: impl Into<ClassName>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    /// Adds a type annotation.
    #[must_use]
    pub fn annotate(mut self, annotation: TypeAnnotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Marks the type as an entity stored in its default collection.
    #[must_use]
    pub fn entity(self) -> Self {
        self.annotate(TypeAnnotation::Entity(EntityOptions::default()))
    }

    /// Marks the type as an entity stored in `collection`.
    #[must_use]
    pub fn entity_in(self, collection: impl Into<String>) -> Self {
        self.annotate(TypeAnnotation::Entity(EntityOptions {
            collection: Some(collection.into()),
            no_class_name_stored: false,
        }))
    }

    /// Marks the type as embedded.
    #[must_use]
    pub fn embedded(self) -> Self {
        self.annotate(TypeAnnotation::Embedded(EmbeddedOptions::default()))
    }

    /// Names external listener types for this type's lifecycle events.
    #[must_use]
    pub fn listeners<I, C>(self, listeners: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ClassName>,
    {
        self.annotate(TypeAnnotation::EntityListeners(
            listeners.into_iter().map(Into::into).collect(),
        ))
    }

    /// Adds a declared field.
    #[must_use]
    pub fn field(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds a declared method.
    #[must_use]
    pub fn method(mut self, method: MethodSchema) -> Self {
        self.methods.push(method);
        self
    }

    /// Registers how instances of this type are created when it is used as
    /// an external listener.
    #[must_use]
    pub fn listener_factory<F, T>(mut self, factory: F) -> Self
    where
        F: Fn() -> Result<T, HookError> + Send + Sync + 'static,
        T: Any + Send + Sync,
    {
        self.listener_factory = Some(Arc::new(move || {
            factory().map(|instance| Arc::new(instance) as ListenerInstance)
        }));
        self
    }

    /// Type name.
    pub fn name(&self) -> &ClassName {
        &self.name
    }

    /// Type kind.
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Declaration site.
    pub fn declared_nesting(&self) -> Nesting {
        self.nesting
    }

    /// Declared superclass.
    pub fn superclass(&self) -> Option<&ClassName> {
        self.superclass.as_ref()
    }

    /// Declared interfaces.
    pub fn interfaces(&self) -> &[ClassName] {
        &self.interfaces
    }

    /// Type annotations, in declaration order.
    pub fn annotations(&self) -> &[TypeAnnotation] {
        &self.annotations
    }

    /// Declared fields, in declaration order.
    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    /// Declared methods, in declaration order.
    pub fn methods(&self) -> &[MethodSchema] {
        &self.methods
    }

    /// Listener factory, if registered.
    pub fn factory(&self) -> Option<&ListenerFactory> {
        self.listener_factory.as_ref()
    }
}

impl fmt::Debug for TypeSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeSchema")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("superclass", &self.superclass)
            .field("interfaces", &self.interfaces)
            .field("fields", &self.fields)
            .field("methods", &self.methods)
            .finish_non_exhaustive()
    }
}
