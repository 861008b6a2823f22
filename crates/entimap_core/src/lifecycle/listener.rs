//! Listener instance cache.

use crate::lifecycle::{HookError, ListenerFactory, ListenerInstance};
use crate::schema::ClassName;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::error;

/// Listener instances, one per listener type.
///
/// Shared by every dispatch of every mapped type that names the listener.
/// Creation happens outside the lock, so two threads racing on the first
/// use of a listener may both create one; the race is logged and the last
/// instance written is the one kept.
#[derive(Default)]
pub struct ListenerCache {
    instances: RwLock<HashMap<ClassName, ListenerInstance>>,
}

impl ListenerCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached instance for `class`, creating it on first use.
    ///
    /// # Errors
    ///
    /// Returns the factory's error if the instance cannot be created.
    pub fn get_or_create(
        &self,
        class: &ClassName,
        factory: &ListenerFactory,
    ) -> Result<ListenerInstance, HookError> {
        if let Some(existing) = self.instances.read().get(class) {
            return Ok(existing.clone());
        }

        let instance = factory()?;
        if self
            .instances
            .write()
            .insert(class.clone(), instance.clone())
            .is_some()
        {
            error!(listener = %class, "race condition, created duplicate listener instance");
        }
        Ok(instance)
    }

    /// Returns the cached instance, if one exists.
    pub fn get(&self, class: &ClassName) -> Option<ListenerInstance> {
        self.instances.read().get(class).cloned()
    }

    /// Number of cached instances.
    pub fn len(&self) -> usize {
        self.instances.read().len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.instances.read().is_empty()
    }
}

impl std::fmt::Debug for ListenerCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerCache")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;

    struct Audit;

    struct Numbered(usize);

    #[test]
    fn creates_once_and_reuses() {
        let created = Arc::new(AtomicUsize::new(0));
        let counter = created.clone();
        let factory: ListenerFactory = Arc::new(move || -> Result<ListenerInstance, HookError> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(Audit))
        });

        let cache = ListenerCache::new();
        let class = ClassName::new("Audit");
        let first = cache.get_or_create(&class, &factory).unwrap();
        let second = cache.get_or_create(&class, &factory).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert!(first.downcast_ref::<Audit>().is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn factory_errors_are_not_cached() {
        let factory: ListenerFactory =
            Arc::new(|| -> Result<ListenerInstance, HookError> { Err("no listener today".into()) });
        let cache = ListenerCache::new();
        assert!(cache.get_or_create(&ClassName::new("Broken"), &factory).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn racing_first_use_keeps_one_instance() {
        let created = Arc::new(AtomicUsize::new(0));
        let counter = created.clone();
        let factory: ListenerFactory = Arc::new(move || -> Result<ListenerInstance, HookError> {
            Ok(Arc::new(Numbered(counter.fetch_add(1, Ordering::SeqCst))))
        });

        let cache = Arc::new(ListenerCache::new());
        let barrier = Arc::new(Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let factory = factory.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    cache
                        .get_or_create(&ClassName::new("Numbered"), &factory)
                        .unwrap()
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        for result in &results {
            assert!(result.downcast_ref::<Numbered>().is_some());
        }
        assert_eq!(cache.len(), 1);
        let kept = cache.get(&ClassName::new("Numbered")).unwrap();
        assert!(results.iter().any(|result| Arc::ptr_eq(result, &kept)));
        let made = created.load(Ordering::SeqCst);
        assert!((1..=8).contains(&made));
        assert!(kept.downcast_ref::<Numbered>().unwrap().0 < made);

        let after = cache
            .get_or_create(&ClassName::new("Numbered"), &factory)
            .unwrap();
        assert!(Arc::ptr_eq(&after, &kept));
        assert_eq!(created.load(Ordering::SeqCst), made);
    }
}
