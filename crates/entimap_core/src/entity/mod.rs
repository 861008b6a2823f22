//! Runtime instances: entities, their properties and identity keys.

mod instance;
mod key;
mod property;

pub use instance::Entity;
pub use key::Key;
pub use property::{Property, Reference};
