//! The scoped view handed to `init` hooks.

use core::any::Any;
use std::sync::Arc;

use serde_json::Value;

use crate::definition::Observer;
use crate::error::InstanceError;
use crate::id::{BehaviorId, Origin};
use crate::instance::ComponentInstance;
use crate::instance::exports::ExportValue;

/// Initialization hook: runs once per instance and returns the behavior's
/// export candidate.
pub type InitFn = dyn Fn(&BuilderContext<'_>) -> InitOutput + Send + Sync;

/// Shared handle to an [`InitFn`].
pub type InitHook = Arc<InitFn>;

/// What an [`InitFn`] hands back: the type-erased value plus its type name.
pub struct InitOutput {
    pub(crate) value: ExportValue,
    pub(crate) type_name: &'static str,
}

impl InitOutput {
    /// Wraps any value as an export candidate.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_name: core::any::type_name::<T>(),
        }
    }
}

/// Wraps a closure as an [`InitHook`]. Its return value becomes the export
/// candidate of the declaring behavior.
///
/// ```
/// use lattice_space::instance::init_hook;
///
/// let hook = init_hook(|ctx| ctx.behavior().name().len());
/// # let _ = hook;
/// ```
pub fn init_hook<F, T>(f: F) -> InitHook
where
    F: Fn(&BuilderContext<'_>) -> T + Send + Sync + 'static,
    T: Any + Send + Sync,
{
    Arc::new(move |ctx: &BuilderContext<'_>| InitOutput::new(f(ctx)))
}

/// Capability-scoped handle into an instance under construction.
///
/// A context is created for each `init` hook and only lives for that call.
/// It exposes the instance's fields and methods, lets the hook attach
/// per-instance observers, and reads the export candidates of behaviors
/// whose hooks already ran.
///
/// ```text
/// BuilderContext<'a>
/// ├── instance: &'a ComponentInstance  (fields, methods, observers)
/// └── origin:   &'a Origin             (behavior whose init is running)
/// ```
pub struct BuilderContext<'a> {
    instance: &'a ComponentInstance,
    origin: &'a Origin,
}

impl<'a> BuilderContext<'a> {
    pub(crate) fn new(instance: &'a ComponentInstance, origin: &'a Origin) -> Self {
        Self { instance, origin }
    }

    /// The behavior whose `init` hook is running.
    #[must_use]
    pub fn behavior(&self) -> &Origin {
        self.origin
    }

    /// The instance being constructed.
    #[must_use]
    pub fn instance(&self) -> &'a ComponentInstance {
        self.instance
    }

    /// Reads a data field or property.
    ///
    /// # Errors
    ///
    /// [`InstanceError::UnknownField`] if no field has this name.
    pub fn data(&self, name: &str) -> Result<Value, InstanceError> {
        self.instance.data(name)
    }

    /// Reads a property.
    ///
    /// # Errors
    ///
    /// [`InstanceError::UnknownProperty`] if `name` is not a property.
    pub fn property(&self, name: &str) -> Result<Value, InstanceError> {
        self.instance.property(name)
    }

    /// Writes a data field or property, firing observers on change.
    ///
    /// # Errors
    ///
    /// See [`ComponentInstance::set_data`].
    pub fn set_data(&self, name: &str, value: impl Into<Value>) -> Result<(), InstanceError> {
        self.instance.set_data(name, value)
    }

    /// Calls a method of the merged chain.
    ///
    /// # Errors
    ///
    /// [`InstanceError::UnknownMethod`] if no method has this name.
    pub fn call_method(&self, name: &str, args: Value) -> Result<Value, InstanceError> {
        self.instance.call_method(name, args)
    }

    /// Attaches an observer to one field of this instance only.
    ///
    /// # Errors
    ///
    /// [`InstanceError::UnknownField`] if no field has this name.
    pub fn observe(&self, name: &str, observer: Observer) -> Result<(), InstanceError> {
        self.instance.observe(name, observer)
    }

    /// Reads the export candidate produced by an earlier `init` hook in the
    /// chain. Returns `None` if that hook has not run (or does not exist) or
    /// its value is not a `T`.
    #[must_use]
    pub fn export<T: Any + Send + Sync>(&self, behavior: BehaviorId) -> Option<Arc<T>> {
        self.instance.init_export::<T>(behavior)
    }
}

impl core::fmt::Debug for BuilderContext<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BuilderContext")
            .field("instance", &self.instance.id())
            .field("behavior", self.origin)
            .finish()
    }
}
