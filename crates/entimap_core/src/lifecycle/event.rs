//! Lifecycle events.

use std::fmt;

/// A point in an entity's persistence cycle where callbacks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LifecycleEvent {
    /// Before the entity is encoded.
    PrePersist,
    /// After encoding, before the document is written.
    PreSave,
    /// Before a document is decoded into the entity.
    PreLoad,
    /// After the document was written.
    PostPersist,
    /// After the entity was decoded.
    PostLoad,
}

impl LifecycleEvent {
    /// Every event, in discovery order.
    pub const ALL: [LifecycleEvent; 5] = [
        LifecycleEvent::PrePersist,
        LifecycleEvent::PreSave,
        LifecycleEvent::PreLoad,
        LifecycleEvent::PostPersist,
        LifecycleEvent::PostLoad,
    ];

    /// Annotation-style name.
    pub fn name(self) -> &'static str {
        match self {
            LifecycleEvent::PrePersist => "PrePersist",
            LifecycleEvent::PreSave => "PreSave",
            LifecycleEvent::PreLoad => "PreLoad",
            LifecycleEvent::PostPersist => "PostPersist",
            LifecycleEvent::PostLoad => "PostLoad",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name())
    }
}
