//! Namespace-merge algebra.
//!
//! A [`Namespace`] is the ordered set of data and property names visible to a
//! behavior, each tagged with the behavior that declared it. Two operations
//! build it up:
//!
//! - [`Namespace::declare`] adds one of the behavior's own names. Any existing
//!   entry is a conflict.
//! - [`Namespace::merge`] unions a parent's namespace. An entry that already
//!   exists with the *same* origin is the same declaration reached through a
//!   second import path and is skipped; any other collision is a conflict.
//!
//! Merging is all-or-nothing: on conflict the namespace is left unchanged.
//!
//! Methods live in a separate [`MethodTable`] where later entries override
//! earlier ones instead of conflicting.

use core::fmt;

use hashbrown::HashMap;

use crate::definition::Method;
use crate::error::DefinitionError;
use crate::id::Origin;

/// Whether a name refers to a data field or a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Produced by a data generator.
    Data,
    /// Declared as a property.
    Property,
}

/// One visible name and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEntry {
    name: String,
    kind: FieldKind,
    origin: Origin,
}

impl FieldEntry {
    /// The field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Data or property.
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// The declaring behavior.
    #[must_use]
    pub fn origin(&self) -> &Origin {
        &self.origin
    }
}

/// Ordered, origin-tracked set of data and property names.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    entries: Vec<FieldEntry>,
    index: HashMap<String, usize>,
}

impl Namespace {
    /// Creates an empty namespace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a name declared directly by `origin`.
    ///
    /// # Errors
    ///
    /// [`DefinitionError::DeclarationConflict`] if the name is already
    /// visible, whoever declared it.
    pub fn declare(
        &mut self,
        name: &str,
        kind: FieldKind,
        origin: &Origin,
    ) -> Result<(), DefinitionError> {
        if let Some(existing) = self.get(name) {
            return Err(DefinitionError::DeclarationConflict {
                name: name.to_string(),
                existing: existing.origin.clone(),
                incoming: origin.clone(),
            });
        }
        self.push(FieldEntry {
            name: name.to_string(),
            kind,
            origin: origin.clone(),
        });
        Ok(())
    }

    /// Unions `other` into this namespace.
    ///
    /// # Errors
    ///
    /// [`DefinitionError::DeclarationConflict`] for the first entry of
    /// `other` (in its order) that collides with an entry of a different
    /// origin. Nothing is merged in that case.
    pub fn merge(&mut self, other: &Namespace) -> Result<(), DefinitionError> {
        let mut incoming = Vec::new();
        for entry in &other.entries {
            match self.get(&entry.name) {
                Some(existing) if existing.origin.id() == entry.origin.id() => {}
                Some(existing) => {
                    return Err(DefinitionError::DeclarationConflict {
                        name: entry.name.clone(),
                        existing: existing.origin.clone(),
                        incoming: entry.origin.clone(),
                    });
                }
                None => incoming.push(entry.clone()),
            }
        }
        for entry in incoming {
            self.push(entry);
        }
        Ok(())
    }

    fn push(&mut self, entry: FieldEntry) {
        self.index.insert(entry.name.clone(), self.entries.len());
        self.entries.push(entry);
    }

    /// Looks up a name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldEntry> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    /// Returns true if the name is visible.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Iterates entries in the order they became visible.
    pub fn iter(&self) -> impl Iterator<Item = &FieldEntry> {
        self.entries.iter()
    }

    /// Iterates the names of one kind, in order.
    pub fn names(&self, kind: FieldKind) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(move |entry| entry.kind == kind)
            .map(|entry| entry.name.as_str())
    }

    /// Number of visible names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no names are visible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MethodTable
// ─────────────────────────────────────────────────────────────────────────────

/// Ordered method table. Re-inserting a name replaces the method in place.
#[derive(Clone, Default)]
pub struct MethodTable {
    entries: Vec<(String, Method, Origin)>,
    index: HashMap<String, usize>,
}

impl MethodTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overrides a method. Returns the origin of the overridden
    /// method, if any.
    pub fn insert(&mut self, name: &str, method: Method, origin: &Origin) -> Option<Origin> {
        if let Some(&i) = self.index.get(name) {
            let previous = core::mem::replace(
                &mut self.entries[i],
                (name.to_string(), method, origin.clone()),
            );
            return Some(previous.2);
        }
        self.index.insert(name.to_string(), self.entries.len());
        self.entries
            .push((name.to_string(), method, origin.clone()));
        None
    }

    /// Looks up a method.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Method> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    /// Returns the origin of the method currently bound to `name`.
    #[must_use]
    pub fn origin_of(&self, name: &str) -> Option<&Origin> {
        self.index.get(name).map(|&i| &self.entries[i].2)
    }

    /// Iterates `(name, method)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Method)> {
        self.entries
            .iter()
            .map(|(name, method, _)| (name.as_str(), method))
    }

    /// Iterates method names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _, _)| name.as_str())
    }

    /// Number of methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::method;
    use crate::id::IdAllocator;
    use serde_json::Value;

    fn origins() -> (Origin, Origin, Origin) {
        let ids = IdAllocator::default();
        (
            Origin::new(ids.allocate_behavior_id(), Some("a")),
            Origin::new(ids.allocate_behavior_id(), Some("b")),
            Origin::new(ids.allocate_behavior_id(), Some("c")),
        )
    }

    #[test]
    fn declare_rejects_duplicates_even_from_same_origin() {
        let (a, _, _) = origins();
        let mut ns = Namespace::new();
        ns.declare("visible", FieldKind::Property, &a).unwrap();

        let err = ns.declare("visible", FieldKind::Data, &a).unwrap_err();
        assert!(matches!(
            err,
            DefinitionError::DeclarationConflict { ref name, .. } if name == "visible"
        ));
    }

    #[test]
    fn merge_skips_same_origin() {
        let (a, b, _) = origins();
        let mut shared = Namespace::new();
        shared.declare("count", FieldKind::Data, &a).unwrap();

        let mut left = Namespace::new();
        left.merge(&shared).unwrap();
        left.declare("label", FieldKind::Property, &b).unwrap();

        // Diamond: `shared` reached a second time.
        left.merge(&shared).unwrap();
        assert_eq!(left.len(), 2);
    }

    #[test]
    fn merge_conflict_names_both_origins_and_leaves_namespace_untouched() {
        let (a, b, c) = origins();
        let mut left = Namespace::new();
        left.declare("label", FieldKind::Property, &a).unwrap();

        let mut right = Namespace::new();
        right.declare("fresh", FieldKind::Data, &b).unwrap();
        right.declare("label", FieldKind::Property, &c).unwrap();

        let err = left.merge(&right).unwrap_err();
        match err {
            DefinitionError::DeclarationConflict {
                name,
                existing,
                incoming,
            } => {
                assert_eq!(name, "label");
                assert_eq!(existing.name(), "a");
                assert_eq!(incoming.name(), "c");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!left.contains("fresh"));
    }

    #[test]
    fn names_filter_by_kind() {
        let (a, _, _) = origins();
        let mut ns = Namespace::new();
        ns.declare("count", FieldKind::Data, &a).unwrap();
        ns.declare("visible", FieldKind::Property, &a).unwrap();

        assert_eq!(ns.names(FieldKind::Data).collect::<Vec<_>>(), ["count"]);
        assert_eq!(ns.names(FieldKind::Property).collect::<Vec<_>>(), ["visible"]);
    }

    #[test]
    fn method_table_overrides_in_place() {
        let (a, b, _) = origins();
        let mut table = MethodTable::new();
        table.insert("toggle", method(|_, _| Value::Null), &a);
        table.insert("reset", method(|_, _| Value::Null), &a);

        let previous = table.insert("toggle", method(|_, _| Value::Bool(true)), &b);
        assert_eq!(previous.map(|o| o.name().to_string()), Some("a".to_string()));
        assert_eq!(table.names().collect::<Vec<_>>(), ["toggle", "reset"]);
        assert_eq!(table.origin_of("toggle").map(Origin::name), Some("b"));
    }
}
