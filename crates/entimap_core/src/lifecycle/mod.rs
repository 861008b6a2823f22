//! Lifecycle events, callbacks and interceptors.

mod event;
mod hook;
mod interceptor;
mod listener;

pub use event::LifecycleEvent;
pub use hook::{
    Arity, HookError, HookResult, LifecycleCall, LifecycleFn, ListenerFactory, ListenerInstance,
};
pub use interceptor::EntityInterceptor;
pub(crate) use interceptor::dispatch as dispatch_interceptor;
pub use listener::ListenerCache;
