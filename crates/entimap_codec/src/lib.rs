//! # EntiMap Codec
//!
//! Document value model for EntiMap.
//!
//! This crate provides:
//! - [`Value`] and the insertion-ordered [`Document`]
//! - [`ObjectId`], the generated identifier type
//! - [`DbRef`], the `{"$ref", "$id"}` full-pointer form of references
//! - A CBOR byte form for documents, used by stores
//!
//! ## Usage
//!
//! ```
//! use entimap_codec::{from_cbor, to_cbor, Document, Value};
//!
//! let doc = Document::new().with("name", "Alice").with("age", 30);
//! let bytes = to_cbor(&doc).unwrap();
//! let decoded = from_cbor(&bytes).unwrap();
//! assert_eq!(decoded.get("age"), Some(&Value::Integer(30)));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cbor;
mod dbref;
mod document;
mod error;
mod id;
mod value;

pub use cbor::{from_cbor, to_cbor};
pub use dbref::{DbRef, ID_KEY, REF_KEY};
pub use document::Document;
pub use error::{CodecError, CodecResult};
pub use id::ObjectId;
pub use value::Value;
