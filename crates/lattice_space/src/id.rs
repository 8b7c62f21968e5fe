//! Identity types for spaces, behaviors and instances.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// ─────────────────────────────────────────────────────────────────────────────
// SpaceId
// ─────────────────────────────────────────────────────────────────────────────

/// Unique identity of a [`ComponentSpace`](crate::space::ComponentSpace).
///
/// Behaviors and instances remember the space they were created in, so a
/// behavior registered in one space cannot be imported or instantiated in
/// another.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpaceId(Arc<str>);

impl SpaceId {
    /// Generates a fresh, random space identity.
    #[must_use]
    pub fn generate() -> Self {
        Self(Arc::from(nanoid::nanoid!(12)))
    }

    /// Returns the identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// BehaviorId / InstanceId
// ─────────────────────────────────────────────────────────────────────────────

/// Identity of a behavior within its space.
///
/// Allocated when a builder is created and carried over to the registered
/// behavior, so declarations can be attributed to their origin before the
/// behavior exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BehaviorId(u64);

impl BehaviorId {
    /// Returns the raw counter value.
    #[must_use]
    pub fn index(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BehaviorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "behavior#{}", self.0)
    }
}

/// Identity of a constructed component instance within its space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

impl InstanceId {
    /// Returns the raw counter value.
    #[must_use]
    pub fn index(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance#{}", self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Origin
// ─────────────────────────────────────────────────────────────────────────────

/// The behavior a declaration came from.
///
/// Used to tell diamond imports (same origin reached twice) apart from real
/// name collisions, and to name both sides of a conflict in errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin {
    id: BehaviorId,
    name: Arc<str>,
}

impl Origin {
    pub(crate) fn new(id: BehaviorId, name: Option<&str>) -> Self {
        let name = match name {
            Some(name) => Arc::from(name),
            None => Arc::from(id.to_string()),
        };
        Self { id, name }
    }

    /// Returns the behavior identity.
    #[must_use]
    pub fn id(&self) -> BehaviorId {
        self.id
    }

    /// Returns the display name (the given name, or `behavior#N`).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// IdAllocator
// ─────────────────────────────────────────────────────────────────────────────

/// Lock-free allocator for behavior and instance identities of one space.
#[derive(Debug, Default)]
pub(crate) struct IdAllocator {
    next_behavior_id: AtomicU64,
    next_instance_id: AtomicU64,
}

impl IdAllocator {
    pub(crate) fn allocate_behavior_id(&self) -> BehaviorId {
        BehaviorId(self.next_behavior_id.fetch_add(1, Ordering::Relaxed))
    }

    pub(crate) fn allocate_instance_id(&self) -> InstanceId {
        InstanceId(self.next_instance_id.fetch_add(1, Ordering::Relaxed))
    }
}
