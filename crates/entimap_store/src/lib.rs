//! # EntiMap Store
//!
//! The backing document store the mapper talks to.
//!
//! This crate provides the lowest-level persistence abstraction for EntiMap.
//! Stores are **document stores keyed by `_id`**: they know nothing about
//! classes, references or lifecycle events.
//!
//! ## Design Principles
//!
//! - Stores serve single lookups (`_id == x`) and batched lookups (`_id in {..}`)
//! - Errors are reported as-is; the mapper propagates them unmodified
//! - Must be `Send + Sync` for concurrent access
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - For testing and ephemeral data

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod filter;
mod memory;

pub use backend::DocumentStore;
pub use error::{StoreError, StoreResult};
pub use filter::{Filter, ID_FIELD};
pub use memory::InMemoryStore;
