//! Reference pointers: encoding, and resolution against the store.

mod cache;
mod handler;

pub use cache::EntityCache;
pub use handler::ReferenceHandler;
