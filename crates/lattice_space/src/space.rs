//! The component space: identity scope and registry for behaviors.

use parking_lot::RwLock;

use crate::config::SpaceConfig;
use crate::definition::{DataMap, RawBehavior, RawBuilder};
use crate::error::{DefinitionError, InstanceError, MisuseKind};
use crate::id::{IdAllocator, Origin, SpaceId};
use crate::instance::ComponentInstance;

/// Lifecycle of a space.
///
/// A space moves linearly: `Open` → `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum SpaceState {
    /// Accepting definitions, registrations and instantiations.
    #[default]
    Open,
    /// Torn down by [`ComponentSpace::close`].
    Closed,
}

/// Registry supplying the low-level builder, merge and registration
/// primitives, and scoping behavior identity.
///
/// # Example
///
/// ```
/// use lattice_space::{ComponentSpace, SpaceConfig};
/// use lattice_space::definition::{PropertyDef, PropertyType};
///
/// let space = ComponentSpace::new(SpaceConfig::default());
///
/// let mut builder = space.define_named("visibility").unwrap();
/// builder
///     .property("visible", PropertyDef::new(PropertyType::Boolean).with_default(true))
///     .unwrap();
/// let behavior = space.register_behavior(&builder).unwrap();
///
/// let instance = space.instantiate(&behavior, Default::default()).unwrap();
/// assert_eq!(instance.property("visible").unwrap(), true);
/// ```
pub struct ComponentSpace {
    /// Random identity, carried by every behavior and instance of the space.
    id: SpaceId,

    config: SpaceConfig,

    /// `Open` → `Closed`.
    state: RwLock<SpaceState>,

    /// Behavior and instance identities.
    ids: IdAllocator,

    /// Registered behaviors, in registration order.
    registry: RwLock<Vec<Origin>>,
}

impl Default for ComponentSpace {
    fn default() -> Self {
        Self::new(SpaceConfig::default())
    }
}

impl ComponentSpace {
    /// Creates an open space.
    #[must_use]
    pub fn new(config: SpaceConfig) -> Self {
        let id = SpaceId::generate();
        tracing::debug!(space = %id, name = %config.name, "created component space");
        Self {
            id,
            config,
            state: RwLock::new(SpaceState::Open),
            ids: IdAllocator::default(),
            registry: RwLock::new(Vec::new()),
        }
    }

    /// The space identity.
    #[must_use]
    pub fn id(&self) -> &SpaceId {
        &self.id
    }

    /// The space configuration.
    #[must_use]
    pub fn config(&self) -> &SpaceConfig {
        &self.config
    }

    /// Returns true once [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        *self.state.read() == SpaceState::Closed
    }

    fn ensure_open(&self) -> Result<(), MisuseKind> {
        if self.is_closed() {
            return Err(MisuseKind::SpaceClosed);
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Definition
    // ─────────────────────────────────────────────────────────────────────────

    /// Starts an anonymous behavior. Its display name is its id.
    ///
    /// # Errors
    ///
    /// [`MisuseKind::SpaceClosed`] if the space is closed.
    pub fn define(&self) -> Result<RawBuilder, DefinitionError> {
        self.start(None)
    }

    /// Starts a named behavior.
    ///
    /// # Errors
    ///
    /// [`MisuseKind::SpaceClosed`] if the space is closed.
    pub fn define_named(&self, name: &str) -> Result<RawBuilder, DefinitionError> {
        self.start(Some(name))
    }

    fn start(&self, name: Option<&str>) -> Result<RawBuilder, DefinitionError> {
        self.ensure_open().map_err(DefinitionError::Misuse)?;
        Ok(self.builder(name))
    }

    fn builder(&self, name: Option<&str>) -> RawBuilder {
        let origin = Origin::new(self.ids.allocate_behavior_id(), name);
        tracing::trace!(space = %self.id, behavior = %origin, "defining behavior");
        RawBuilder::new(origin, self.id.clone())
    }

    /// Validates the full merged namespace of `builder` and freezes it into
    /// an immutable behavior.
    ///
    /// # Errors
    ///
    /// - [`MisuseKind::SpaceClosed`] if the space is closed.
    /// - [`MisuseKind::ForeignSpace`] if `builder` came from another space.
    /// - Any validation error of [`RawBuilder::validate`].
    pub fn register_behavior(&self, builder: &RawBuilder) -> Result<RawBehavior, DefinitionError> {
        self.ensure_open().map_err(DefinitionError::Misuse)?;
        if builder.space_id() != &self.id {
            return Err(DefinitionError::Misuse(MisuseKind::ForeignSpace));
        }

        let behavior = RawBehavior::freeze(builder)?;
        self.registry.write().push(behavior.origin().clone());
        tracing::debug!(
            space = %self.id,
            behavior = %behavior.origin(),
            parents = behavior.parents().len(),
            fields = behavior.namespace().len(),
            methods = behavior.methods().len(),
            "registered behavior"
        );
        Ok(behavior)
    }

    /// Number of behaviors registered so far.
    #[must_use]
    pub fn registered_count(&self) -> usize {
        self.registry.read().len()
    }

    /// Display names of registered behaviors, in registration order.
    #[must_use]
    pub fn registered_names(&self) -> Vec<String> {
        self.registry
            .read()
            .iter()
            .map(|origin| origin.name().to_string())
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Instantiation
    // ─────────────────────────────────────────────────────────────────────────

    /// Constructs an instance of `behavior` with initial property values.
    ///
    /// # Errors
    ///
    /// - [`MisuseKind::SpaceClosed`] or [`MisuseKind::ForeignSpace`].
    /// - Any [`InstanceError`] raised while materializing fields.
    pub fn instantiate(
        &self,
        behavior: &RawBehavior,
        props: DataMap,
    ) -> Result<ComponentInstance, InstanceError> {
        self.ensure_open().map_err(InstanceError::Misuse)?;
        if behavior.space_id() != &self.id {
            return Err(InstanceError::Misuse(MisuseKind::ForeignSpace));
        }
        ComponentInstance::construct(self.ids.allocate_instance_id(), &self.config, behavior, props)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Teardown
    // ─────────────────────────────────────────────────────────────────────────

    /// Closes the space. Behaviors and instances already handed out stay
    /// usable; new registrations and instantiations fail.
    ///
    /// Closing twice is a no-op.
    pub fn close(&self) {
        let mut state = self.state.write();
        if *state == SpaceState::Closed {
            return;
        }
        *state = SpaceState::Closed;
        tracing::debug!(
            space = %self.id,
            registered = self.registry.read().len(),
            "closed component space"
        );
    }
}

impl core::fmt::Debug for ComponentSpace {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ComponentSpace")
            .field("id", &self.id)
            .field("name", &self.config.name)
            .field("state", &*self.state.read())
            .field("registered", &self.registered_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_space_rejects_registration() {
        let space = ComponentSpace::default();
        let builder = space.define_named("late").unwrap();
        space.close();
        space.close();

        assert!(space.is_closed());
        assert!(matches!(
            space.register_behavior(&builder),
            Err(DefinitionError::Misuse(MisuseKind::SpaceClosed))
        ));
        assert!(matches!(
            space.define(),
            Err(DefinitionError::Misuse(MisuseKind::SpaceClosed))
        ));
    }

    #[test]
    fn foreign_builder_is_rejected() {
        let home = ComponentSpace::default();
        let away = ComponentSpace::default();
        let builder = away.define().unwrap();

        assert!(matches!(
            home.register_behavior(&builder),
            Err(DefinitionError::Misuse(MisuseKind::ForeignSpace))
        ));
    }

    #[test]
    fn registry_tracks_names_in_order() {
        let space = ComponentSpace::default();
        let first = space.define_named("first").unwrap();
        let second = space.define().unwrap();
        space.register_behavior(&first).unwrap();
        space.register_behavior(&second).unwrap();

        assert_eq!(space.registered_count(), 2);
        assert_eq!(space.registered_names(), ["first", "behavior#1"]);
    }
}
