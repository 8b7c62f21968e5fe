//! The fluent behavior builder.

use core::any::Any;
use std::collections::BTreeSet;
use std::sync::Arc;

use lattice_space::definition::{
    DataGenerator, DataMap, ErasedFilter, FieldKind, Method, PropertyDef, RawBuilder,
};
use lattice_space::instance::{init_hook, BuilderContext};
use lattice_space::{BehaviorId, ComponentInstance, ComponentSpace, MisuseKind, Origin};
use parking_lot::Mutex;
use serde_json::Value;

use crate::behavior::{Behavior, ExportSelector};
use crate::definition::{BehaviorDefinition, DefinitionFilter};
use crate::error::BehaviorError;
use crate::filter::{ChainingFilter, Filter};

/// Finalize state shared by every view of one builder lineage.
///
/// `Building` → `Finalizing` → `Finalized`. A failed `register` goes from
/// `Finalizing` back to `Building`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum BuilderState {
    /// Accepting declaration calls.
    #[default]
    Building,
    /// `register` is running on some view.
    Finalizing,
    /// `register` succeeded on some view.
    Finalized,
}

/// Accumulates the declarations of one behavior.
///
/// Every fluent call takes `&self` and returns a new builder view with the
/// declaration applied, leaving the receiver untouched. This makes failed
/// calls side-effect free and lets a partially built lineage be branched.
/// All views of one lineage share the finalize state: once any of them is
/// registered, every view rejects further declarations.
///
/// Builder views are not meant to be shared across threads; treat each view
/// as consumed by the next call.
///
/// # Example
///
/// ```
/// use lattice_behavior::Behavior;
/// use lattice_space::ComponentSpace;
/// use lattice_space::definition::{method, PropertyDef, PropertyType};
/// use serde_json::Value;
///
/// let space = ComponentSpace::default();
///
/// let x = Behavior::named(&space, "x")?
///     .property("visible", PropertyDef::new(PropertyType::Boolean).with_default(true))?
///     .methods([("toggle", method(|_, _| Value::Null))])?
///     .register()?;
///
/// let y = Behavior::named(&space, "y")?
///     .behavior(&x)?
///     .property("label", PropertyDef::new(PropertyType::String))?
///     .register()?;
///
/// assert_eq!(y.property_names(), ["visible", "label"]);
/// assert_eq!(y.method_names(), ["toggle"]);
/// # Ok::<(), lattice_behavior::BehaviorError>(())
/// ```
#[derive(Clone)]
pub struct BehaviorBuilder<'s> {
    space: &'s ComponentSpace,
    raw: RawBuilder,
    /// Declared by this builder, handed to whoever imports the result.
    pending_filter: Option<Filter>,
    /// Inherited from the most recently imported parent.
    active_filter: Option<Filter>,
    definition_filter: Option<DefinitionFilter>,
    export: Option<ExportSelector>,
    state: Arc<Mutex<BuilderState>>,
}

impl<'s> BehaviorBuilder<'s> {
    /// Starts an anonymous behavior in `space`.
    ///
    /// # Errors
    ///
    /// [`MisuseKind::SpaceClosed`] if the space is closed.
    pub fn new(space: &'s ComponentSpace) -> Result<Self, BehaviorError> {
        Ok(Self::from_raw(space, space.define()?))
    }

    /// Starts a named behavior in `space`.
    ///
    /// # Errors
    ///
    /// [`MisuseKind::SpaceClosed`] if the space is closed.
    pub fn named(space: &'s ComponentSpace, name: &str) -> Result<Self, BehaviorError> {
        Ok(Self::from_raw(space, space.define_named(name)?))
    }

    fn from_raw(space: &'s ComponentSpace, raw: RawBuilder) -> Self {
        Self {
            space,
            raw,
            pending_filter: None,
            active_filter: None,
            definition_filter: None,
            export: None,
            state: Arc::new(Mutex::new(BuilderState::Building)),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Introspection
    // ─────────────────────────────────────────────────────────────────────────

    /// Identity the registered behavior will have.
    #[must_use]
    pub fn id(&self) -> BehaviorId {
        self.raw.id()
    }

    /// Identity plus display name.
    #[must_use]
    pub fn origin(&self) -> &Origin {
        self.raw.origin()
    }

    /// The space the builder belongs to.
    #[must_use]
    pub fn space(&self) -> &'s ComponentSpace {
        self.space
    }

    /// Returns true once any view of this lineage was registered.
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        *self.state.lock() == BuilderState::Finalized
    }

    /// The filter this builder offers to its importers, if declared.
    #[must_use]
    pub fn pending_filter(&self) -> Option<&Filter> {
        self.pending_filter.as_ref()
    }

    /// The filter shaping this builder's own surface, if any.
    #[must_use]
    pub fn active_filter(&self) -> Option<&Filter> {
        self.active_filter.as_ref()
    }

    /// The current fluent surface.
    #[must_use]
    pub fn capabilities(&self) -> BTreeSet<String> {
        match &self.active_filter {
            Some(filter) => filter.spec().surface(),
            None => ChainingFilter::base_surface(),
        }
    }

    /// Returns true if `capability` is on the current surface.
    #[must_use]
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities().contains(capability)
    }

    /// Property names visible so far, own and inherited.
    #[must_use]
    pub fn property_names(&self) -> Vec<String> {
        self.raw
            .namespace()
            .names(FieldKind::Property)
            .map(str::to_string)
            .collect()
    }

    /// Data field names visible so far, own and inherited.
    #[must_use]
    pub fn data_names(&self) -> Vec<String> {
        self.raw
            .namespace()
            .names(FieldKind::Data)
            .map(str::to_string)
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Guards
    // ─────────────────────────────────────────────────────────────────────────

    fn ensure_building(&self) -> Result<(), BehaviorError> {
        if self.is_finalized() {
            return Err(BehaviorError::Misuse(MisuseKind::DeclarationAfterFinalize));
        }
        Ok(())
    }

    fn mismatch(&self, capability: &str) -> BehaviorError {
        BehaviorError::ChainingFilterMismatch {
            capability: capability.to_string(),
            available: self.capabilities().into_iter().collect(),
        }
    }

    /// Checks that a built-in capability may be used on this view.
    fn ensure(&self, capability: &str) -> Result<(), BehaviorError> {
        self.ensure_building()?;
        match &self.active_filter {
            Some(filter) if filter.spec().removes(capability) => Err(self.mismatch(capability)),
            _ => Ok(()),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Fluent declarations
    // ─────────────────────────────────────────────────────────────────────────

    /// Imports a registered behavior as a parent.
    ///
    /// Its fields and methods become visible, and its chaining filter (or
    /// none) replaces the active one. This builder's own pending filter is
    /// kept for the next consumer.
    ///
    /// # Errors
    ///
    /// - [`BehaviorError::DeclarationConflict`] if a field name collides.
    /// - [`MisuseKind::ForeignSpace`] if `parent` is from another space.
    /// - [`BehaviorError::ChainingFilterMismatch`] if `behavior` was removed.
    pub fn behavior(&self, parent: &Behavior) -> Result<Self, BehaviorError> {
        self.ensure("behavior")?;
        let mut next = self.clone();
        next.import(parent)?;
        Ok(next)
    }

    fn import(&mut self, parent: &Behavior) -> Result<(), BehaviorError> {
        self.raw.import(parent.raw())?;
        self.active_filter = parent
            .chaining_filter()
            .map(|spec| Filter::Pending(spec).activate());
        tracing::debug!(
            behavior = %self.raw.origin(),
            parent = %parent.origin(),
            filtered = self.active_filter.is_some(),
            "imported behavior"
        );
        Ok(())
    }

    /// Declares the chaining filter offered to builders that import this
    /// behavior. It does not change this builder's own surface. A second
    /// declaration replaces the first.
    ///
    /// # Errors
    ///
    /// [`BehaviorError::ChainingFilterMismatch`] if `chaining_filter` was
    /// removed, or a misuse error after finalize.
    pub fn chaining_filter(&self, filter: ChainingFilter) -> Result<Self, BehaviorError> {
        self.ensure("chaining_filter")?;
        let mut next = self.clone();
        let spec = Arc::new(filter);
        next.raw.chaining_filter(Arc::clone(&spec) as ErasedFilter);
        next.pending_filter = Some(Filter::Pending(spec));
        Ok(next)
    }

    /// Declares data fields produced by `generate` at construction time.
    ///
    /// The generator is called exactly once per instance and never here.
    ///
    /// # Errors
    ///
    /// [`BehaviorError::DeclarationConflict`] if a field name is visible.
    pub fn data<I, S, F>(&self, fields: I, generate: F) -> Result<Self, BehaviorError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn() -> DataMap + Send + Sync + 'static,
    {
        self.ensure("data")?;
        let mut next = self.clone();
        next.raw.data(DataGenerator::new(fields, generate))?;
        Ok(next)
    }

    /// Declares one property.
    ///
    /// # Errors
    ///
    /// - [`BehaviorError::DeclarationConflict`] if the name is visible.
    /// - [`BehaviorError::PropertyTypeMismatch`] if the default has the
    ///   wrong type.
    pub fn property(&self, name: &str, def: PropertyDef) -> Result<Self, BehaviorError> {
        self.ensure("property")?;
        let mut next = self.clone();
        next.raw.property(name, def)?;
        Ok(next)
    }

    /// Declares methods bound to the eventual instance. A name declared
    /// again overrides the earlier method.
    ///
    /// # Errors
    ///
    /// [`BehaviorError::ChainingFilterMismatch`] if `methods` was removed, or
    /// a misuse error after finalize.
    pub fn methods<I, S>(&self, methods: I) -> Result<Self, BehaviorError>
    where
        I: IntoIterator<Item = (S, Method)>,
        S: AsRef<str>,
    {
        self.ensure("methods")?;
        let mut next = self.clone();
        for (name, method) in methods {
            next.raw.method(name.as_ref(), method);
        }
        Ok(next)
    }

    /// Sets the hook run once per instance after every field of the chain is
    /// materialized. Its return value is stored as this behavior's export
    /// candidate on the instance. A second call replaces the first hook.
    ///
    /// # Errors
    ///
    /// [`BehaviorError::ChainingFilterMismatch`] if `init` was removed, or a
    /// misuse error after finalize.
    pub fn init<F, T>(&self, hook: F) -> Result<Self, BehaviorError>
    where
        F: Fn(&BuilderContext<'_>) -> T + Send + Sync + 'static,
        T: Any + Send + Sync,
    {
        self.ensure("init")?;
        let mut next = self.clone();
        if next.raw.init(init_hook(hook)) {
            tracing::trace!(behavior = %next.raw.origin(), "replaced init hook");
        }
        Ok(next)
    }

    /// Declares the export selector, called by [`Behavior::select`].
    ///
    /// # Errors
    ///
    /// [`BehaviorError::ChainingFilterMismatch`] if `export` was removed, or
    /// a misuse error after finalize.
    pub fn export<F>(&self, selector: F) -> Result<Self, BehaviorError>
    where
        F: Fn(&ComponentInstance, &Value) -> Value + Send + Sync + 'static,
    {
        self.ensure("export")?;
        let mut next = self.clone();
        next.export = Some(Arc::new(selector));
        Ok(next)
    }

    /// Applies a bulk declaration.
    ///
    /// Sections are applied in order: behaviors, properties, data, methods,
    /// observers, init, export, definition filter. Each non-empty section needs its
    /// fluent counterpart on the current surface, as if called one by one.
    ///
    /// # Errors
    ///
    /// The first error any section raises. The receiver is unchanged.
    pub fn definition(&self, def: BehaviorDefinition) -> Result<Self, BehaviorError> {
        self.ensure("definition")?;
        let mut next = self.clone();

        for parent in &def.behaviors {
            next.ensure("behavior")?;
            next.import(parent)?;
        }
        if !def.properties.is_empty() {
            next.ensure("property")?;
        }
        for (name, prop) in def.properties {
            next.raw.property(&name, prop)?;
        }
        if !def.data.is_empty() {
            next.ensure("data")?;
        }
        for generator in def.data {
            next.raw.data(generator)?;
        }
        if !def.methods.is_empty() {
            next.ensure("methods")?;
        }
        for (name, method) in def.methods {
            next.raw.method(&name, method);
        }
        for (name, observer) in def.observers {
            next.raw.observer(&name, observer);
        }
        if let Some(hook) = def.init {
            next.ensure("init")?;
            if next.raw.init(hook) {
                tracing::trace!(behavior = %next.raw.origin(), "replaced init hook");
            }
        }
        if let Some(selector) = def.export {
            next.ensure("export")?;
            next.export = Some(selector);
        }
        if let Some(filter) = def.definition_filter {
            next.definition_filter = Some(filter);
        }
        Ok(next)
    }

    /// Invokes a capability added by the active chaining filter.
    ///
    /// # Errors
    ///
    /// - [`BehaviorError::ChainingFilterMismatch`] if no active filter adds
    ///   `name`.
    /// - Whatever the capability itself returns.
    pub fn invoke(&self, name: &str, args: &Value) -> Result<Self, BehaviorError> {
        self.ensure_building()?;
        let capability = self
            .active_filter
            .as_ref()
            .and_then(|filter| filter.spec().capability(name))
            .cloned()
            .ok_or_else(|| self.mismatch(name))?;
        tracing::trace!(behavior = %self.raw.origin(), capability = name, "invoking capability");
        capability(self.clone(), args)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Finalize
    // ─────────────────────────────────────────────────────────────────────────

    /// Finalizes the lineage into an immutable [`Behavior`].
    ///
    /// 1. Re-validates the full merged namespace.
    /// 2. Runs the definition filter, if one was recorded.
    /// 3. Hands the result to the component space, which validates again.
    ///
    /// The lineage is finalized only if every step succeeds. The definition
    /// filter runs once per `register` attempt that gets past step 1 on an
    /// open space, so exactly once for the attempt that finalizes. No lock is
    /// held while it runs; a `register` issued from inside it on any view of
    /// the lineage fails with [`MisuseKind::AlreadyFinalized`].
    ///
    /// # Errors
    ///
    /// - [`MisuseKind::AlreadyFinalized`] if any view was already registered
    ///   or is being registered.
    /// - [`MisuseKind::SpaceClosed`] if the space is closed.
    /// - Any validation error; the builder stays in `Building`.
    pub fn register(&self) -> Result<Behavior, BehaviorError> {
        {
            let mut state = self.state.lock();
            if *state != BuilderState::Building {
                return Err(BehaviorError::Misuse(MisuseKind::AlreadyFinalized));
            }
            *state = BuilderState::Finalizing;
        }

        let result = self.finalize();
        *self.state.lock() = if result.is_ok() {
            BuilderState::Finalized
        } else {
            BuilderState::Building
        };
        result
    }

    fn finalize(&self) -> Result<Behavior, BehaviorError> {
        if self.space.is_closed() {
            return Err(BehaviorError::Misuse(MisuseKind::SpaceClosed));
        }
        self.raw.validate()?;

        let mut raw = self.raw.clone();
        if let Some(filter) = &self.definition_filter {
            filter(raw.declarations_mut());
            tracing::trace!(behavior = %raw.origin(), "ran definition filter");
        }
        let registered = self.space.register_behavior(&raw)?;
        Ok(Behavior::new(registered, self.export.clone()))
    }
}

impl core::fmt::Debug for BehaviorBuilder<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BehaviorBuilder")
            .field("raw", &self.raw)
            .field("pending_filter", &self.pending_filter)
            .field("active_filter", &self.active_filter)
            .field("definition_filter", &self.definition_filter.is_some())
            .field("export", &self.export.is_some())
            .field("state", &*self.state.lock())
            .finish()
    }
}
