//! # EntiMap Core
//!
//! Object-document mapping for EntiMap.
//!
//! This crate provides:
//! - Explicit schema registration ([`schema`]) in place of runtime reflection
//! - Class and field descriptors, discovered lazily and cached by the [`Mapper`]
//! - Lifecycle dispatch to entity methods, listener types and interceptors
//! - Reference pointers (id-only or `{"$ref", "$id"}`) and batched resolution
//! - Query value validation against descriptors
//! - A [`Datastore`] saving and loading entities through a document store
//!
//! ## Usage
//!
//! ```rust
//! use entimap_core::schema::{FieldSchema, FieldType, SchemaRegistry, TypeSchema};
//! use entimap_core::{Entity, Mapper};
//! use entimap_codec::Value;
//! use std::sync::Arc;
//!
//! let registry = SchemaRegistry::new()
//!     .with(
//!         TypeSchema::class("User")
//!             .entity_in("users")
//!             .field(FieldSchema::new("id", FieldType::integer()).id()),
//!     )
//!     .with(
//!         TypeSchema::class("Job")
//!             .entity_in("jobs")
//!             .field(FieldSchema::new("id", FieldType::integer()).id())
//!             .field(FieldSchema::new("owner", FieldType::class("User")).reference()),
//!     );
//! let mapper = Mapper::new(Arc::new(registry));
//!
//! let owner = Entity::new("User").with("id", 7);
//! let mut job = Entity::new("Job").with("id", 1).with("owner", owner);
//! let document = mapper.to_document(&mut job).unwrap();
//! assert_eq!(
//!     document.get("owner").and_then(Value::as_document).and_then(|d| d.get("$ref")),
//!     Some(&Value::from("users"))
//! );
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod datastore;
mod entity;
mod error;
pub mod lifecycle;
mod mapping;
pub mod query;
mod reference;
pub mod schema;

pub use config::{DanglingPolicy, MapperOptions};
pub use datastore::Datastore;
pub use entity::{Entity, Key, Property, Reference};
pub use error::{MapperError, MapperResult};
pub use lifecycle::{EntityInterceptor, LifecycleEvent, ListenerCache};
pub use mapping::{LifecycleMethod, ListenerBinding, MappedClass, MappedField, Mapper, MapperBuilder};
pub use query::{Criterion, FilterOperator, QueryValidator, QueryValue, ValidationFailure};
pub use reference::{EntityCache, ReferenceHandler};
