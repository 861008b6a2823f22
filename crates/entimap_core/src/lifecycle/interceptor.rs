//! Process-wide interceptors.

use crate::entity::Entity;
use crate::lifecycle::{HookError, LifecycleEvent};
use crate::mapping::Mapper;
use entimap_codec::Document;

/// Callbacks run for every mapped type after its own lifecycle methods.
///
/// Every method defaults to doing nothing. Interceptors may mutate the
/// entity and the running document; an error aborts the whole operation.
pub trait EntityInterceptor: Send + Sync {
    /// Before the entity is encoded.
    fn pre_persist(
        &self,
        _entity: &mut Entity,
        _document: &mut Document,
        _mapper: &Mapper,
    ) -> Result<(), HookError> {
        Ok(())
    }

    /// After encoding, before the write.
    fn pre_save(
        &self,
        _entity: &mut Entity,
        _document: &mut Document,
        _mapper: &Mapper,
    ) -> Result<(), HookError> {
        Ok(())
    }

    /// Before decoding.
    fn pre_load(
        &self,
        _entity: &mut Entity,
        _document: &mut Document,
        _mapper: &Mapper,
    ) -> Result<(), HookError> {
        Ok(())
    }

    /// After the write.
    fn post_persist(
        &self,
        _entity: &mut Entity,
        _document: &mut Document,
        _mapper: &Mapper,
    ) -> Result<(), HookError> {
        Ok(())
    }

    /// After decoding.
    fn post_load(
        &self,
        _entity: &mut Entity,
        _document: &mut Document,
        _mapper: &Mapper,
    ) -> Result<(), HookError> {
        Ok(())
    }
}

/// Routes an event to the matching interceptor method.
pub(crate) fn dispatch(
    interceptor: &dyn EntityInterceptor,
    event: LifecycleEvent,
    entity: &mut Entity,
    document: &mut Document,
    mapper: &Mapper,
) -> Result<(), HookError> {
    match event {
        LifecycleEvent::PrePersist => interceptor.pre_persist(entity, document, mapper),
        LifecycleEvent::PreSave => interceptor.pre_save(entity, document, mapper),
        LifecycleEvent::PreLoad => interceptor.pre_load(entity, document, mapper),
        LifecycleEvent::PostPersist => interceptor.post_persist(entity, document, mapper),
        LifecycleEvent::PostLoad => interceptor.post_load(entity, document, mapper),
    }
}
