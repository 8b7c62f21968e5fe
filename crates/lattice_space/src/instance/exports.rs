//! Per-instance storage for `init` export candidates.

use core::any::Any;
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::id::BehaviorId;

/// A type-erased export candidate.
pub type ExportValue = Arc<dyn Any + Send + Sync>;

struct ExportEntry {
    value: ExportValue,
    type_name: &'static str,
}

/// Export candidates of one instance, keyed by the behavior whose `init`
/// hook produced them.
///
/// Values are stored type-erased and recovered with a checked downcast, so
/// asking for the wrong type yields `None` rather than a panic.
#[derive(Default)]
pub struct ExportStore {
    entries: RwLock<HashMap<BehaviorId, ExportEntry>>,
}

impl ExportStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the candidate of `behavior`, replacing any earlier one.
    pub(crate) fn insert(&self, behavior: BehaviorId, value: ExportValue, type_name: &'static str) {
        self.entries
            .write()
            .insert(behavior, ExportEntry { value, type_name });
    }

    /// Returns the candidate of `behavior` if it exists and is a `T`.
    #[must_use]
    pub fn get<T: Any + Send + Sync>(&self, behavior: BehaviorId) -> Option<Arc<T>> {
        let value = Arc::clone(&self.entries.read().get(&behavior)?.value);
        value.downcast::<T>().ok()
    }

    /// Returns true if `behavior` stored a candidate.
    #[must_use]
    pub fn contains(&self, behavior: BehaviorId) -> bool {
        self.entries.read().contains_key(&behavior)
    }

    /// Returns the Rust type name of the stored candidate, for diagnostics.
    #[must_use]
    pub fn type_name(&self, behavior: BehaviorId) -> Option<&'static str> {
        self.entries.read().get(&behavior).map(|entry| entry.type_name)
    }

    /// Number of stored candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl core::fmt::Debug for ExportStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let entries = self.entries.read();
        f.debug_map()
            .entries(entries.iter().map(|(id, entry)| (id, entry.type_name)))
            .finish()
    }
}
