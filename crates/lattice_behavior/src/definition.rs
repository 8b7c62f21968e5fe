//! Bulk, non-fluent behavior declarations.

use core::any::Any;
use std::sync::Arc;

use lattice_space::ComponentInstance;
use lattice_space::definition::{DataGenerator, DataMap, Declarations, Method, Observer, PropertyDef};
use lattice_space::instance::{init_hook, BuilderContext, InitHook};
use serde_json::Value;

use crate::behavior::{Behavior, ExportSelector};

/// Post-merge transform over a behavior's own declarations, run once at
/// registration.
pub type DefinitionFilter = Arc<dyn Fn(&mut Declarations) + Send + Sync>;

/// A bulk declaration, applied with
/// [`BehaviorBuilder::definition`](crate::BehaviorBuilder::definition).
///
/// # Example
///
/// ```
/// use lattice_behavior::{Behavior, BehaviorDefinition};
/// use lattice_space::ComponentSpace;
/// use lattice_space::definition::{method, PropertyDef, PropertyType};
/// use serde_json::Value;
///
/// let space = ComponentSpace::default();
/// let def = BehaviorDefinition::new()
///     .with_property("open", PropertyDef::new(PropertyType::Boolean))
///     .with_method("close", method(|instance, _| {
///         instance.set_data("open", false).ok();
///         Value::Null
///     }))
///     .with_definition_filter(|decls| {
///         decls.add_property("closed_count", PropertyDef::new(PropertyType::Number));
///     });
///
/// let dialog = Behavior::named(&space, "dialog")?.definition(def)?.register()?;
/// assert_eq!(dialog.property_names(), ["open", "closed_count"]);
/// # Ok::<(), lattice_behavior::BehaviorError>(())
/// ```
#[derive(Clone, Default)]
pub struct BehaviorDefinition {
    pub(crate) behaviors: Vec<Behavior>,
    pub(crate) properties: Vec<(String, PropertyDef)>,
    pub(crate) data: Vec<DataGenerator>,
    pub(crate) methods: Vec<(String, Method)>,
    pub(crate) observers: Vec<(String, Observer)>,
    pub(crate) init: Option<InitHook>,
    pub(crate) export: Option<ExportSelector>,
    pub(crate) definition_filter: Option<DefinitionFilter>,
}

impl BehaviorDefinition {
    /// Creates an empty definition.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parent behavior.
    #[must_use]
    pub fn with_behavior(mut self, parent: &Behavior) -> Self {
        self.behaviors.push(parent.clone());
        self
    }

    /// Adds a property.
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, def: PropertyDef) -> Self {
        self.properties.push((name.into(), def));
        self
    }

    /// Adds a data generator.
    #[must_use]
    pub fn with_data<I, S, F>(mut self, fields: I, generate: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn() -> DataMap + Send + Sync + 'static,
    {
        self.data.push(DataGenerator::new(fields, generate));
        self
    }

    /// Adds a method.
    #[must_use]
    pub fn with_method(mut self, name: impl Into<String>, method: Method) -> Self {
        self.methods.push((name.into(), method));
        self
    }

    /// Adds a field observer.
    #[must_use]
    pub fn with_observer<F>(mut self, name: impl Into<String>, observer: F) -> Self
    where
        F: Fn(&ComponentInstance, &Value, &Value) + Send + Sync + 'static,
    {
        self.observers.push((name.into(), Arc::new(observer)));
        self
    }

    /// Sets the `init` hook. The last one set wins.
    #[must_use]
    pub fn with_init<F, T>(mut self, hook: F) -> Self
    where
        F: Fn(&BuilderContext<'_>) -> T + Send + Sync + 'static,
        T: Any + Send + Sync,
    {
        self.init = Some(init_hook(hook));
        self
    }

    /// Sets the export selector.
    #[must_use]
    pub fn with_export<F>(mut self, selector: F) -> Self
    where
        F: Fn(&ComponentInstance, &Value) -> Value + Send + Sync + 'static,
    {
        self.export = Some(Arc::new(selector));
        self
    }

    /// Sets the post-merge transform. The last one set wins.
    #[must_use]
    pub fn with_definition_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&mut Declarations) + Send + Sync + 'static,
    {
        self.definition_filter = Some(Arc::new(filter));
        self
    }
}

impl core::fmt::Debug for BehaviorDefinition {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BehaviorDefinition")
            .field(
                "behaviors",
                &self.behaviors.iter().map(Behavior::name).collect::<Vec<_>>(),
            )
            .field(
                "properties",
                &self.properties.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .field("data", &self.data)
            .field(
                "methods",
                &self.methods.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .field("observers", &self.observers.len())
            .field("init", &self.init.is_some())
            .field("export", &self.export.is_some())
            .field("definition_filter", &self.definition_filter.is_some())
            .finish()
    }
}
