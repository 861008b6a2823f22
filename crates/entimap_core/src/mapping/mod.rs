//! Class and field descriptors, and the mapper that builds and uses them.

mod class;
mod codec;
mod field;
mod mapper;
mod validator;

pub use class::{LifecycleMethod, ListenerBinding, MappedClass};
pub use field::MappedField;
pub use mapper::{Mapper, MapperBuilder};
