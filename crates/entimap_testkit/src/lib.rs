//! # EntiMap Testkit
//!
//! Test utilities for EntiMap.
//!
//! This crate provides:
//! - A call-recording document store with failure injection
//! - Sample schemas: jobs and users, authors and books
//! - A call log for lifecycle tests
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use entimap_testkit::prelude::*;
//!
//! let fixture = LibraryFixture::new();
//! fixture.store_author(1, "Ursula");
//! assert_eq!(fixture.store.calls().len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod recording;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::recording::*;
}

pub use fixtures::*;
pub use generators::*;
pub use recording::*;
