//! Callback signatures.

use crate::entity::Entity;
use entimap_codec::Document;
use std::any::Any;
use std::sync::Arc;

/// Error raised by a lifecycle method or interceptor.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of a lifecycle method: `Some(document)` replaces the running document.
pub type HookResult = Result<Option<Document>, HookError>;

/// A cached external listener instance.
pub type ListenerInstance = Arc<dyn Any + Send + Sync>;

/// Creates listener instances; registered on listener types.
pub type ListenerFactory = Arc<dyn Fn() -> Result<ListenerInstance, HookError> + Send + Sync>;

/// Body of a lifecycle method.
pub type LifecycleFn = Arc<dyn Fn(LifecycleCall<'_>) -> HookResult + Send + Sync>;

/// How many parameters a lifecycle method declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Arity {
    /// No parameters.
    Zero,
    /// One parameter.
    One,
    /// Two parameters.
    Two,
}

/// Arguments handed to a lifecycle method.
///
/// Methods declared on the entity's own type always see the entity (their
/// receiver) and, unless they take no parameters, the running document.
/// Methods declared on a listener type see the listener instance, then the
/// entity when they take one parameter or more, then the running document
/// when they take two.
pub struct LifecycleCall<'a> {
    /// The listener instance, for listener methods.
    pub listener: Option<&'a (dyn Any + Send + Sync)>,
    /// The entity the event is about.
    pub entity: Option<&'a mut Entity>,
    /// The running document.
    pub document: Option<&'a Document>,
}

impl LifecycleCall<'_> {
    /// Downcasts the listener instance.
    pub fn listener<T: Any>(&self) -> Option<&T> {
        self.listener.and_then(|l| l.downcast_ref::<T>())
    }
}
