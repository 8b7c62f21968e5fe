//! Chaining filters: extensions of the fluent builder surface.
//!
//! A behavior declares a [`ChainingFilter`] to offer extra fluent
//! capabilities (or hide built-in ones) to the builders that later import it.
//! The declaring builder's own surface never changes.
//!
//! The filter moves through two phases, modeled by [`Filter`]:
//!
//! ```text
//! declaring builder            importing builder
//! ─────────────────            ─────────────────
//! chaining_filter(f)  ──────►  behavior(parent)
//! Filter::Pending(f)           Filter::Active(f)
//! ```
//!
//! Activation happens only on import. Importing another behavior replaces
//! the active filter (last import wins); importing a behavior without a
//! filter restores the built-in surface.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde_json::Value;

use crate::builder::BehaviorBuilder;
use crate::error::BehaviorError;

/// The built-in fluent capabilities of every builder.
pub const BUILTINS: [&str; 8] = [
    "behavior",
    "chaining_filter",
    "data",
    "definition",
    "export",
    "init",
    "methods",
    "property",
];

/// A capability added by a chaining filter. It receives the consumer's
/// builder and an argument, and returns the updated builder.
pub type CapabilityFn = dyn for<'s> Fn(BehaviorBuilder<'s>, &Value) -> Result<BehaviorBuilder<'s>, BehaviorError>
    + Send
    + Sync;

/// Shared handle to a [`CapabilityFn`].
pub type Capability = Arc<CapabilityFn>;

/// Declared changes to the fluent surface: capabilities added and built-ins
/// removed.
///
/// # Example
///
/// ```
/// use lattice_behavior::ChainingFilter;
///
/// let filter = ChainingFilter::new()
///     .add("extra", |builder, _args| Ok(builder))
///     .remove("export");
///
/// assert!(filter.surface().contains("extra"));
/// assert!(!filter.surface().contains("export"));
/// ```
#[derive(Clone, Default)]
pub struct ChainingFilter {
    added: BTreeMap<String, Capability>,
    removed: BTreeSet<String>,
}

impl ChainingFilter {
    /// Creates a filter that changes nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a capability, replacing one of the same name.
    #[must_use]
    pub fn add<F>(mut self, name: impl Into<String>, capability: F) -> Self
    where
        F: for<'s> Fn(BehaviorBuilder<'s>, &Value) -> Result<BehaviorBuilder<'s>, BehaviorError>
            + Send
            + Sync
            + 'static,
    {
        self.added.insert(name.into(), Arc::new(capability));
        self
    }

    /// Removes a built-in capability from the importer's surface.
    #[must_use]
    pub fn remove(mut self, name: impl Into<String>) -> Self {
        self.removed.insert(name.into());
        self
    }

    /// Looks up an added capability.
    #[must_use]
    pub fn capability(&self, name: &str) -> Option<&Capability> {
        self.added.get(name)
    }

    /// Names of the added capabilities.
    pub fn added(&self) -> impl Iterator<Item = &str> {
        self.added.keys().map(String::as_str)
    }

    /// Names of the removed capabilities.
    pub fn removed(&self) -> impl Iterator<Item = &str> {
        self.removed.iter().map(String::as_str)
    }

    /// Returns true if the filter hides `name`.
    #[must_use]
    pub fn removes(&self, name: &str) -> bool {
        self.removed.contains(name) && !self.added.contains_key(name)
    }

    /// The surface an importer sees: `(BUILTINS - removed) ∪ added`.
    #[must_use]
    pub fn surface(&self) -> BTreeSet<String> {
        let mut surface: BTreeSet<String> = BUILTINS
            .iter()
            .filter(|name| !self.removed.contains(**name))
            .map(|name| (*name).to_string())
            .collect();
        surface.extend(self.added.keys().cloned());
        surface
    }

    /// The surface of a builder without an active filter.
    #[must_use]
    pub fn base_surface() -> BTreeSet<String> {
        BUILTINS.iter().map(|name| (*name).to_string()).collect()
    }
}

impl core::fmt::Debug for ChainingFilter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ChainingFilter")
            .field("added", &self.added.keys().collect::<Vec<_>>())
            .field("removed", &self.removed)
            .finish()
    }
}

/// A chaining filter in one of its two phases.
#[derive(Debug, Clone)]
pub enum Filter {
    /// Declared on a builder, waiting for that behavior to be imported.
    Pending(Arc<ChainingFilter>),
    /// Shaping the surface of a builder that imported the declaring behavior.
    Active(Arc<ChainingFilter>),
}

impl Filter {
    /// Moves the filter into its active phase.
    #[must_use]
    pub fn activate(self) -> Self {
        match self {
            Self::Pending(spec) | Self::Active(spec) => Self::Active(spec),
        }
    }

    /// Returns true once activated.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }

    /// The filter declaration.
    #[must_use]
    pub fn spec(&self) -> &Arc<ChainingFilter> {
        match self {
            Self::Pending(spec) | Self::Active(spec) => spec,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_is_builtins_minus_removed_plus_added() {
        let filter = ChainingFilter::new()
            .add("extra", |builder, _| Ok(builder))
            .remove("data")
            .remove("export");

        let surface = filter.surface();
        assert!(surface.contains("extra"));
        assert!(!surface.contains("data"));
        assert!(!surface.contains("export"));
        assert_eq!(surface.len(), BUILTINS.len() - 2 + 1);
    }

    #[test]
    fn empty_filter_keeps_base_surface() {
        assert_eq!(ChainingFilter::new().surface(), ChainingFilter::base_surface());
    }

    #[test]
    fn added_name_wins_over_removal() {
        let filter = ChainingFilter::new()
            .remove("init")
            .add("init", |builder, _| Ok(builder));
        assert!(!filter.removes("init"));
        assert!(filter.surface().contains("init"));
    }

    #[test]
    fn activation_keeps_the_declaration() {
        let spec = Arc::new(ChainingFilter::new().remove("data"));
        let pending = Filter::Pending(Arc::clone(&spec));
        assert!(!pending.is_active());

        let active = pending.activate();
        assert!(active.is_active());
        assert!(Arc::ptr_eq(active.spec(), &spec));
    }
}
