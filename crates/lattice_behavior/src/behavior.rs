//! Registered, immutable behaviors.

use std::sync::Arc;

use lattice_space::definition::{DataMap, FieldKind, RawBehavior};
use lattice_space::{BehaviorId, ComponentInstance, ComponentSpace, InstanceError, Origin};
use serde_json::Value;

use crate::builder::BehaviorBuilder;
use crate::error::BehaviorError;
use crate::filter::ChainingFilter;

/// Selector called by [`Behavior::select`] with the instance and a caller
/// supplied source value.
pub type ExportSelector = Arc<dyn Fn(&ComponentInstance, &Value) -> Value + Send + Sync>;

/// An immutable, composed bundle of declarations.
///
/// Behaviors are cheap to clone and may be imported by any number of
/// builders of the same space.
#[derive(Clone)]
pub struct Behavior {
    raw: RawBehavior,
    export: Option<ExportSelector>,
}

impl Behavior {
    pub(crate) fn new(raw: RawBehavior, export: Option<ExportSelector>) -> Self {
        Self { raw, export }
    }

    /// Starts an anonymous behavior. Shorthand for [`BehaviorBuilder::new`].
    ///
    /// # Errors
    ///
    /// A misuse error if the space is closed.
    pub fn builder(space: &ComponentSpace) -> Result<BehaviorBuilder<'_>, BehaviorError> {
        BehaviorBuilder::new(space)
    }

    /// Starts a named behavior. Shorthand for [`BehaviorBuilder::named`].
    ///
    /// # Errors
    ///
    /// A misuse error if the space is closed.
    pub fn named<'s>(
        space: &'s ComponentSpace,
        name: &str,
    ) -> Result<BehaviorBuilder<'s>, BehaviorError> {
        BehaviorBuilder::named(space, name)
    }

    /// Behavior identity.
    #[must_use]
    pub fn id(&self) -> BehaviorId {
        self.raw.id()
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.raw.name()
    }

    /// Identity plus display name.
    #[must_use]
    pub fn origin(&self) -> &Origin {
        self.raw.origin()
    }

    /// The low-level handle held by the space.
    #[must_use]
    pub fn raw(&self) -> &RawBehavior {
        &self.raw
    }

    /// Direct parents, in import order.
    #[must_use]
    pub fn parents(&self) -> &[RawBehavior] {
        self.raw.parents()
    }

    /// Names of every behavior in the chain, parents first.
    #[must_use]
    pub fn chain_names(&self) -> Vec<String> {
        self.raw.chain().map(|b| b.name().to_string()).collect()
    }

    /// All property names, own and inherited.
    #[must_use]
    pub fn property_names(&self) -> Vec<String> {
        self.field_names(FieldKind::Property)
    }

    /// All data field names, own and inherited.
    #[must_use]
    pub fn data_names(&self) -> Vec<String> {
        self.field_names(FieldKind::Data)
    }

    fn field_names(&self, kind: FieldKind) -> Vec<String> {
        self.raw
            .namespace()
            .names(kind)
            .map(str::to_string)
            .collect()
    }

    /// All method names, own and inherited.
    #[must_use]
    pub fn method_names(&self) -> Vec<String> {
        self.raw.methods().names().map(str::to_string).collect()
    }

    /// The chaining filter this behavior offers its importers.
    #[must_use]
    pub fn chaining_filter(&self) -> Option<Arc<ChainingFilter>> {
        Arc::clone(self.raw.chaining_filter()?)
            .downcast::<ChainingFilter>()
            .ok()
    }

    /// Returns true if an export selector was declared.
    #[must_use]
    pub fn has_export(&self) -> bool {
        self.export.is_some()
    }

    /// Runs the export selector against a live instance.
    ///
    /// Returns `None` if no selector was declared or `instance` was not built
    /// from a chain containing this behavior. Init export candidates are a
    /// separate channel, see [`ComponentInstance::init_export`].
    #[must_use]
    pub fn select(&self, instance: &ComponentInstance, source: &Value) -> Option<Value> {
        let selector = self.export.as_ref()?;
        if !instance.has_behavior(self.id()) {
            return None;
        }
        Some(selector(instance, source))
    }

    /// Constructs an instance with default property values.
    ///
    /// # Errors
    ///
    /// Any [`InstanceError`] raised during construction.
    pub fn instantiate(&self, space: &ComponentSpace) -> Result<ComponentInstance, InstanceError> {
        self.instantiate_with(space, DataMap::new())
    }

    /// Constructs an instance with initial property values.
    ///
    /// # Errors
    ///
    /// Any [`InstanceError`] raised during construction.
    pub fn instantiate_with(
        &self,
        space: &ComponentSpace,
        props: DataMap,
    ) -> Result<ComponentInstance, InstanceError> {
        space.instantiate(&self.raw, props)
    }
}

impl PartialEq for Behavior {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Behavior {}

impl core::fmt::Debug for Behavior {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Behavior")
            .field("raw", &self.raw)
            .field("export", &self.export.is_some())
            .finish()
    }
}
