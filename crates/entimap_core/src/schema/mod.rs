//! Explicit schema registration.
//!
//! Types describe their persistent shape up front: fields with their
//! declared types and annotations, type annotations, lifecycle methods and
//! supertypes. The mapper builds its descriptors from these descriptions.

mod annotation;
mod class_name;
mod field_type;
mod registry;
mod type_schema;

pub use annotation::{
    EmbeddedOptions, EntityOptions, FieldAnnotation, FieldAnnotationKind, ReferenceOptions,
    TypeAnnotation, TypeAnnotationKind,
};
pub use class_name::ClassName;
pub use field_type::{FieldType, ScalarKind};
pub use registry::{SchemaRegistry, SchemaSource};
pub use type_schema::{FieldSchema, MethodSchema, Nesting, TypeKind, TypeSchema};
