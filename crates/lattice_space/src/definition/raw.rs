//! Low-level builder and behavior handles.
//!
//! [`RawBuilder`] is what [`ComponentSpace::define`](crate::space::ComponentSpace::define)
//! hands out: a plain accumulator of one behavior's own declarations plus
//! the parents it imports. [`ComponentSpace::register_behavior`](crate::space::ComponentSpace::register_behavior)
//! validates the full merged namespace and freezes it into a [`RawBehavior`].
//!
//! Both types are `Clone`; a clone is an independent copy, which is what the
//! high-level builder relies on for its clone-and-extend chain.

use core::any::Any;
use core::fmt;
use std::sync::Arc;

use hashbrown::HashSet;

use crate::definition::fields::value_kind;
use crate::definition::namespace::{FieldKind, MethodTable, Namespace};
use crate::definition::{DataGenerator, Method, Observer, PropertyDef};
use crate::error::{DefinitionError, MisuseKind};
use crate::id::{BehaviorId, Origin, SpaceId};
use crate::instance::InitHook;

/// A chaining filter as stored by the space. The space never looks inside;
/// the layer that registered it downcasts it back.
pub type ErasedFilter = Arc<dyn Any + Send + Sync>;

// ─────────────────────────────────────────────────────────────────────────────
// Declarations
// ─────────────────────────────────────────────────────────────────────────────

/// The declarations a behavior makes itself, in declaration order.
///
/// The `add_*` methods do not check for conflicts; this is the surface a
/// definition filter edits, and everything it adds is validated when the
/// behavior is registered.
#[derive(Clone, Default)]
pub struct Declarations {
    data: Vec<DataGenerator>,
    properties: Vec<(String, PropertyDef)>,
    methods: Vec<(String, Method)>,
    observers: Vec<(String, Observer)>,
    init: Option<InitHook>,
}

impl Declarations {
    /// Adds a data generator.
    pub fn add_data(&mut self, generator: DataGenerator) {
        self.data.push(generator);
    }

    /// Adds a property.
    pub fn add_property(&mut self, name: impl Into<String>, def: PropertyDef) {
        self.properties.push((name.into(), def));
    }

    /// Adds or overrides a method.
    pub fn add_method(&mut self, name: impl Into<String>, method: Method) {
        let name = name.into();
        self.methods.retain(|(existing, _)| *existing != name);
        self.methods.push((name, method));
    }

    /// Adds a field observer.
    pub fn add_observer(&mut self, name: impl Into<String>, observer: Observer) {
        self.observers.push((name.into(), observer));
    }

    /// Removes a method. Returns true if it was present.
    pub fn remove_method(&mut self, name: &str) -> bool {
        let before = self.methods.len();
        self.methods.retain(|(existing, _)| existing != name);
        self.methods.len() != before
    }

    /// Data generators, in order.
    #[must_use]
    pub fn data(&self) -> &[DataGenerator] {
        &self.data
    }

    /// Properties, in order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &PropertyDef)> {
        self.properties
            .iter()
            .map(|(name, def)| (name.as_str(), def))
    }

    /// Methods, in order.
    pub fn methods(&self) -> impl Iterator<Item = (&str, &Method)> {
        self.methods
            .iter()
            .map(|(name, method)| (name.as_str(), method))
    }

    /// Observers, in order.
    pub fn observers(&self) -> impl Iterator<Item = (&str, &Observer)> {
        self.observers
            .iter()
            .map(|(name, observer)| (name.as_str(), observer))
    }

    /// Own property names, in order.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|(name, _)| name.as_str())
    }

    /// Own data field names, in order.
    pub fn data_field_names(&self) -> impl Iterator<Item = &str> {
        self.data
            .iter()
            .flat_map(|generator| generator.fields().iter().map(String::as_str))
    }

    /// The `init` hook, if declared.
    #[must_use]
    pub fn init(&self) -> Option<&InitHook> {
        self.init.as_ref()
    }
}

impl fmt::Debug for Declarations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Declarations")
            .field("data", &self.data_field_names().collect::<Vec<_>>())
            .field("properties", &self.property_names().collect::<Vec<_>>())
            .field(
                "methods",
                &self.methods().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .field("observers", &self.observers.len())
            .field("init", &self.init.is_some())
            .finish()
    }
}

/// Checks a property default against its declared type.
fn check_default(name: &str, def: &PropertyDef) -> Result<(), DefinitionError> {
    match def.default_value() {
        Some(value) if !def.ty().accepts(value) => Err(DefinitionError::PropertyTypeMismatch {
            name: name.to_string(),
            expected: def.ty(),
            found: value_kind(value),
        }),
        _ => Ok(()),
    }
}

/// Every behavior contributing through `parents`, each once: parents
/// depth-first in import order, first occurrence kept.
fn linearize(parents: &[RawBehavior]) -> Vec<RawBehavior> {
    let mut seen = HashSet::new();
    let mut ancestors = Vec::new();
    for parent in parents {
        for behavior in parent.chain() {
            if seen.insert(behavior.id()) {
                ancestors.push(behavior.clone());
            }
        }
    }
    ancestors
}

/// Builds the full namespace and method table of a behavior from scratch.
///
/// Names merge parent by parent in import order. Methods are bound by
/// walking `ancestors` (the linearized chain), so a method declared later in
/// the chain overrides earlier ones however often a behavior is reached.
fn compose(
    origin: &Origin,
    parents: &[RawBehavior],
    ancestors: &[RawBehavior],
    declarations: &Declarations,
) -> Result<(Namespace, MethodTable), DefinitionError> {
    let mut namespace = Namespace::new();
    for parent in parents {
        namespace.merge(parent.namespace())?;
    }

    let mut methods = MethodTable::new();
    for ancestor in ancestors {
        for (name, method) in ancestor.declarations().methods() {
            methods.insert(name, method.clone(), ancestor.origin());
        }
    }

    for field in declarations.data_field_names() {
        namespace.declare(field, FieldKind::Data, origin)?;
    }
    for (name, def) in declarations.properties() {
        check_default(name, def)?;
        namespace.declare(name, FieldKind::Property, origin)?;
    }
    for (name, _) in declarations.observers() {
        if !namespace.contains(name) {
            return Err(DefinitionError::UnknownObserverTarget {
                name: name.to_string(),
                origin: origin.clone(),
            });
        }
    }
    for (name, method) in declarations.methods() {
        methods.insert(name, method.clone(), origin);
    }

    Ok((namespace, methods))
}

// ─────────────────────────────────────────────────────────────────────────────
// RawBuilder
// ─────────────────────────────────────────────────────────────────────────────

/// Low-level behavior accumulator bound to one space and one behavior id.
///
/// Declaration methods check the names they add against everything already
/// visible, so the common conflicts surface at the call that causes them.
#[derive(Clone)]
pub struct RawBuilder {
    origin: Origin,
    space: SpaceId,
    parents: Vec<RawBehavior>,
    declarations: Declarations,
    namespace: Namespace,
    chaining_filter: Option<ErasedFilter>,
}

impl RawBuilder {
    pub(crate) fn new(origin: Origin, space: SpaceId) -> Self {
        Self {
            origin,
            space,
            parents: Vec::new(),
            declarations: Declarations::default(),
            namespace: Namespace::new(),
            chaining_filter: None,
        }
    }

    /// Identity of the behavior being built.
    #[must_use]
    pub fn id(&self) -> BehaviorId {
        self.origin.id()
    }

    /// Origin attached to this builder's own declarations.
    #[must_use]
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Space this builder belongs to.
    #[must_use]
    pub fn space_id(&self) -> &SpaceId {
        &self.space
    }

    /// Imports a registered behavior as a parent.
    ///
    /// # Errors
    ///
    /// - [`MisuseKind::ForeignSpace`] if `parent` was registered elsewhere.
    /// - [`DefinitionError::DeclarationConflict`] if its names collide with
    ///   visible ones. The builder is unchanged on error.
    pub fn import(&mut self, parent: &RawBehavior) -> Result<(), DefinitionError> {
        if parent.space_id() != &self.space {
            return Err(DefinitionError::Misuse(MisuseKind::ForeignSpace));
        }
        self.namespace.merge(parent.namespace())?;
        self.parents.push(parent.clone());
        tracing::trace!(
            behavior = %self.origin,
            parent = %parent.origin(),
            "imported parent behavior"
        );
        Ok(())
    }

    /// Declares a data generator.
    ///
    /// # Errors
    ///
    /// [`DefinitionError::DeclarationConflict`] if any declared field is
    /// already visible or repeated within the generator.
    pub fn data(&mut self, generator: DataGenerator) -> Result<(), DefinitionError> {
        let mut namespace = self.namespace.clone();
        for field in generator.fields() {
            namespace.declare(field, FieldKind::Data, &self.origin)?;
        }
        self.namespace = namespace;
        self.declarations.add_data(generator);
        Ok(())
    }

    /// Declares a property.
    ///
    /// # Errors
    ///
    /// - [`DefinitionError::PropertyTypeMismatch`] if the default has the
    ///   wrong type.
    /// - [`DefinitionError::DeclarationConflict`] if the name is visible.
    pub fn property(&mut self, name: &str, def: PropertyDef) -> Result<(), DefinitionError> {
        check_default(name, &def)?;
        self.namespace
            .declare(name, FieldKind::Property, &self.origin)?;
        self.declarations.add_property(name, def);
        Ok(())
    }

    /// Declares or overrides a method.
    pub fn method(&mut self, name: &str, method: Method) {
        self.declarations.add_method(name, method);
    }

    /// Declares a field observer. The target is checked at registration.
    pub fn observer(&mut self, name: &str, observer: Observer) {
        self.declarations.add_observer(name, observer);
    }

    /// Sets the `init` hook. Returns true if an earlier hook was replaced.
    pub fn init(&mut self, hook: InitHook) -> bool {
        self.declarations.init.replace(hook).is_some()
    }

    /// Registers the chaining filter this behavior offers to its importers.
    pub fn chaining_filter(&mut self, filter: ErasedFilter) {
        self.chaining_filter = Some(filter);
    }

    /// Parents imported so far, in order.
    #[must_use]
    pub fn parents(&self) -> &[RawBehavior] {
        &self.parents
    }

    /// Own declarations.
    #[must_use]
    pub fn declarations(&self) -> &Declarations {
        &self.declarations
    }

    /// Mutable own declarations, for definition filters.
    ///
    /// Changes made here bypass the eager checks and are only validated by
    /// [`validate`](Self::validate) and registration.
    pub fn declarations_mut(&mut self) -> &mut Declarations {
        &mut self.declarations
    }

    /// Names visible so far (eagerly maintained).
    #[must_use]
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Re-validates the full merged namespace from scratch.
    ///
    /// # Errors
    ///
    /// Any [`DefinitionError`] registration would raise.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        let ancestors = linearize(&self.parents);
        compose(&self.origin, &self.parents, &ancestors, &self.declarations).map(|_| ())
    }
}

impl fmt::Debug for RawBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawBuilder")
            .field("origin", &self.origin)
            .field("parents", &self.parents.len())
            .field("declarations", &self.declarations)
            .field("chaining_filter", &self.chaining_filter.is_some())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RawBehavior
// ─────────────────────────────────────────────────────────────────────────────

/// Opaque, immutable handle to a registered behavior.
#[derive(Clone)]
pub struct RawBehavior {
    inner: Arc<RawBehaviorInner>,
}

struct RawBehaviorInner {
    origin: Origin,
    space: SpaceId,
    parents: Vec<RawBehavior>,
    /// Every behavior contributing to this one, each once, parents first.
    ancestors: Vec<RawBehavior>,
    declarations: Declarations,
    namespace: Namespace,
    methods: MethodTable,
    chaining_filter: Option<ErasedFilter>,
}

impl RawBehavior {
    /// Validates and freezes a builder.
    pub(crate) fn freeze(builder: &RawBuilder) -> Result<Self, DefinitionError> {
        let ancestors = linearize(&builder.parents);
        let (namespace, methods) = compose(
            &builder.origin,
            &builder.parents,
            &ancestors,
            &builder.declarations,
        )?;

        Ok(Self {
            inner: Arc::new(RawBehaviorInner {
                origin: builder.origin.clone(),
                space: builder.space.clone(),
                parents: builder.parents.clone(),
                ancestors,
                declarations: builder.declarations.clone(),
                namespace,
                methods,
                chaining_filter: builder.chaining_filter.clone(),
            }),
        })
    }

    /// Behavior identity.
    #[must_use]
    pub fn id(&self) -> BehaviorId {
        self.inner.origin.id()
    }

    /// Identity plus display name.
    #[must_use]
    pub fn origin(&self) -> &Origin {
        &self.inner.origin
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.inner.origin.name()
    }

    /// Space the behavior was registered in.
    #[must_use]
    pub fn space_id(&self) -> &SpaceId {
        &self.inner.space
    }

    /// Direct parents, in import order.
    #[must_use]
    pub fn parents(&self) -> &[RawBehavior] {
        &self.inner.parents
    }

    /// The full chain: every contributing behavior once, parents depth-first
    /// in import order, this behavior last.
    pub fn chain(&self) -> impl Iterator<Item = &RawBehavior> {
        self.inner
            .ancestors
            .iter()
            .chain(core::iter::once(self))
    }

    /// Returns true if `id` is this behavior or one of its ancestors.
    #[must_use]
    pub fn includes(&self, id: BehaviorId) -> bool {
        self.id() == id || self.inner.ancestors.iter().any(|b| b.id() == id)
    }

    /// Own declarations.
    #[must_use]
    pub fn declarations(&self) -> &Declarations {
        &self.inner.declarations
    }

    /// Full merged data/property namespace.
    #[must_use]
    pub fn namespace(&self) -> &Namespace {
        &self.inner.namespace
    }

    /// Full merged method table.
    #[must_use]
    pub fn methods(&self) -> &MethodTable {
        &self.inner.methods
    }

    /// The chaining filter registered by this behavior, type-erased.
    #[must_use]
    pub fn chaining_filter(&self) -> Option<&ErasedFilter> {
        self.inner.chaining_filter.as_ref()
    }
}

impl PartialEq for RawBehavior {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for RawBehavior {}

impl fmt::Debug for RawBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawBehavior")
            .field("origin", &self.inner.origin)
            .field(
                "parents",
                &self.inner.parents.iter().map(Self::name).collect::<Vec<_>>(),
            )
            .field("namespace", &self.inner.namespace)
            .field("methods", &self.inner.methods)
            .finish_non_exhaustive()
    }
}
