//! Component instances.
//!
//! An instance is built from one registered behavior and its whole chain in
//! four steps:
//!
//! 1. Linearize the chain: parents depth-first in import order, each
//!    behavior once, then the behavior itself.
//! 2. Materialize properties (supplied value, else default, else the type's
//!    zero value), then data (each generator invoked exactly once).
//! 3. Run `init` hooks in chain order, storing each result as that
//!    behavior's export candidate.
//! 4. Mark the instance ready.
//!
//! Field storage sits behind a `parking_lot::RwLock`. No lock is held while
//! methods, observers or hooks run, so callbacks may freely read and write
//! the instance they are bound to.

mod context;
mod exports;

pub use context::{init_hook, BuilderContext, InitFn, InitHook, InitOutput};
pub use exports::{ExportStore, ExportValue};

use core::any::Any;
use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;
use serde_json::Value;

use crate::config::SpaceConfig;
use crate::definition::{value_kind, DataMap, FieldKind, MethodTable, Observer, PropertyType, RawBehavior};
use crate::error::InstanceError;
use crate::id::{BehaviorId, InstanceId, Origin, SpaceId};

/// A single constructed component.
pub struct ComponentInstance {
    id: InstanceId,
    space: SpaceId,
    behavior: RawBehavior,
    /// Field names in materialization order.
    names: Vec<String>,
    property_types: HashMap<String, PropertyType>,
    fields: RwLock<HashMap<String, Value>>,
    methods: MethodTable,
    observers: RwLock<HashMap<String, Vec<Observer>>>,
    exports: ExportStore,
    property_type_check: bool,
    ready: AtomicBool,
}

impl ComponentInstance {
    /// Builds an instance of `behavior`. Called by the component space.
    pub(crate) fn construct(
        id: InstanceId,
        config: &SpaceConfig,
        behavior: &RawBehavior,
        mut props: DataMap,
    ) -> Result<Self, InstanceError> {
        let chain: Vec<&RawBehavior> = behavior.chain().collect();
        let namespace = behavior.namespace();

        if let Some(name) = props.keys().find(|name| {
            namespace
                .get(name)
                .is_none_or(|entry| entry.kind() != FieldKind::Property)
        }) {
            return Err(InstanceError::UnknownProperty(name.clone()));
        }

        let mut names = Vec::new();
        let mut fields = HashMap::new();
        let mut property_types = HashMap::new();
        let mut observers: HashMap<String, Vec<Observer>> = HashMap::new();

        for link in &chain {
            for (name, def) in link.declarations().properties() {
                let value = match props.remove(name) {
                    Some(value) => {
                        check_property(config, name, def.ty(), &value)?;
                        value
                    }
                    None => def.initial_value(),
                };
                if let Some(observer) = def.observer() {
                    observers
                        .entry(name.to_string())
                        .or_default()
                        .push(Arc::clone(observer));
                }
                property_types.insert(name.to_string(), def.ty());
                fields.insert(name.to_string(), value);
                names.push(name.to_string());
            }
        }

        // Undeclared keys kept in lenient mode, with the behavior that produced them.
        let mut extras: HashMap<String, Origin> = HashMap::new();
        for link in &chain {
            for generator in link.declarations().data() {
                let mut produced = generator.generate();
                for field in generator.fields() {
                    let value = produced.remove(field).unwrap_or(Value::Null);
                    fields.insert(field.clone(), value);
                    names.push(field.clone());
                }
                for (name, value) in produced {
                    if config.strict_data_fields {
                        return Err(InstanceError::UndeclaredDataField {
                            name,
                            origin: link.origin().clone(),
                        });
                    }
                    let existing = namespace
                        .get(&name)
                        .map(|entry| entry.origin().clone())
                        .or_else(|| extras.get(&name).cloned());
                    if let Some(existing) = existing {
                        return Err(InstanceError::DeclarationConflict {
                            name,
                            existing,
                            incoming: link.origin().clone(),
                        });
                    }
                    tracing::warn!(
                        behavior = %link.origin(),
                        field = %name,
                        "data generator produced an undeclared field; keeping it as instance data"
                    );
                    extras.insert(name.clone(), link.origin().clone());
                    fields.insert(name.clone(), value);
                    names.push(name);
                }
            }
        }

        for link in &chain {
            for (name, observer) in link.declarations().observers() {
                observers
                    .entry(name.to_string())
                    .or_default()
                    .push(Arc::clone(observer));
            }
        }

        let instance = Self {
            id,
            space: behavior.space_id().clone(),
            behavior: behavior.clone(),
            names,
            property_types,
            fields: RwLock::new(fields),
            methods: behavior.methods().clone(),
            observers: RwLock::new(observers),
            exports: ExportStore::new(),
            property_type_check: config.property_type_check,
            ready: AtomicBool::new(false),
        };

        for link in &chain {
            if let Some(hook) = link.declarations().init() {
                let ctx = BuilderContext::new(&instance, link.origin());
                let output = hook(&ctx);
                instance
                    .exports
                    .insert(link.id(), output.value, output.type_name);
                tracing::trace!(
                    instance = %instance.id,
                    behavior = %link.origin(),
                    export = output.type_name,
                    "ran init hook"
                );
            }
        }

        instance.ready.store(true, Ordering::Release);
        tracing::debug!(
            instance = %instance.id,
            behavior = %behavior.origin(),
            chain = chain.len(),
            fields = instance.names.len(),
            "constructed component instance"
        );
        Ok(instance)
    }

    /// Instance identity.
    #[must_use]
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Space the instance was constructed in.
    #[must_use]
    pub fn space_id(&self) -> &SpaceId {
        &self.space
    }

    /// The behavior the instance was constructed from.
    #[must_use]
    pub fn behavior(&self) -> &RawBehavior {
        &self.behavior
    }

    /// Returns true once every `init` hook has run.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Returns true if `behavior` is part of this instance's chain.
    #[must_use]
    pub fn has_behavior(&self, behavior: BehaviorId) -> bool {
        self.behavior.includes(behavior)
    }

    /// Field names (data and properties) in materialization order.
    #[must_use]
    pub fn field_names(&self) -> &[String] {
        &self.names
    }

    /// Reads a data field or property.
    ///
    /// # Errors
    ///
    /// [`InstanceError::UnknownField`] if no field has this name.
    pub fn data(&self, name: &str) -> Result<Value, InstanceError> {
        self.fields
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| InstanceError::UnknownField(name.to_string()))
    }

    /// Reads a property.
    ///
    /// # Errors
    ///
    /// [`InstanceError::UnknownProperty`] if `name` is not a property.
    pub fn property(&self, name: &str) -> Result<Value, InstanceError> {
        if !self.property_types.contains_key(name) {
            return Err(InstanceError::UnknownProperty(name.to_string()));
        }
        self.data(name)
    }

    /// Copies every field value.
    #[must_use]
    pub fn snapshot(&self) -> DataMap {
        let fields = self.fields.read();
        self.names
            .iter()
            .filter_map(|name| Some((name.clone(), fields.get(name)?.clone())))
            .collect()
    }

    /// Writes a data field or property.
    ///
    /// Observers of the field run after the write, with `(new, old)`, and
    /// only if the value actually changed.
    ///
    /// # Errors
    ///
    /// - [`InstanceError::UnknownField`] if no field has this name.
    /// - [`InstanceError::PropertyTypeMismatch`] if a property receives a
    ///   value of the wrong type and type checking is enabled.
    pub fn set_data(&self, name: &str, value: impl Into<Value>) -> Result<(), InstanceError> {
        let value = value.into();
        if let Some(&ty) = self.property_types.get(name) {
            if !ty.accepts(&value) {
                if self.property_type_check {
                    return Err(InstanceError::PropertyTypeMismatch {
                        name: name.to_string(),
                        expected: ty,
                        found: value_kind(&value),
                    });
                }
                tracing::warn!(
                    instance = %self.id,
                    property = name,
                    expected = %ty,
                    found = value_kind(&value),
                    "storing property value of the wrong type"
                );
            }
        }

        let old = {
            let mut fields = self.fields.write();
            let slot = fields
                .get_mut(name)
                .ok_or_else(|| InstanceError::UnknownField(name.to_string()))?;
            if *slot == value {
                return Ok(());
            }
            core::mem::replace(slot, value.clone())
        };

        let observers = self
            .observers
            .read()
            .get(name)
            .cloned()
            .unwrap_or_default();
        for observer in &observers {
            observer(self, &value, &old);
        }
        Ok(())
    }

    /// Calls a method of the merged chain with `args`.
    ///
    /// # Errors
    ///
    /// [`InstanceError::UnknownMethod`] if no method has this name.
    pub fn call_method(&self, name: &str, args: Value) -> Result<Value, InstanceError> {
        let method = self
            .methods
            .get(name)
            .cloned()
            .ok_or_else(|| InstanceError::UnknownMethod(name.to_string()))?;
        Ok(method(self, args))
    }

    /// Names of the bound methods, in chain order.
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.names()
    }

    /// Attaches an observer to one field of this instance.
    ///
    /// # Errors
    ///
    /// [`InstanceError::UnknownField`] if no field has this name.
    pub fn observe(&self, name: &str, observer: Observer) -> Result<(), InstanceError> {
        if !self.fields.read().contains_key(name) {
            return Err(InstanceError::UnknownField(name.to_string()));
        }
        self.observers
            .write()
            .entry(name.to_string())
            .or_default()
            .push(observer);
        Ok(())
    }

    /// Returns the export candidate stored by `behavior`'s `init` hook, if it
    /// ran on this instance and produced a `T`.
    #[must_use]
    pub fn init_export<T: Any + Send + Sync>(&self, behavior: BehaviorId) -> Option<Arc<T>> {
        self.exports.get::<T>(behavior)
    }

    /// All export candidates of this instance.
    #[must_use]
    pub fn exports(&self) -> &ExportStore {
        &self.exports
    }
}

fn check_property(
    config: &SpaceConfig,
    name: &str,
    ty: PropertyType,
    value: &Value,
) -> Result<(), InstanceError> {
    if ty.accepts(value) {
        return Ok(());
    }
    if config.property_type_check {
        return Err(InstanceError::PropertyTypeMismatch {
            name: name.to_string(),
            expected: ty,
            found: value_kind(value),
        });
    }
    tracing::warn!(
        property = name,
        expected = %ty,
        found = value_kind(value),
        "initial property value has the wrong type"
    );
    Ok(())
}

impl core::fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("id", &self.id)
            .field("behavior", self.behavior.origin())
            .field("fields", &self.snapshot())
            .field("ready", &self.is_ready())
            .finish_non_exhaustive()
    }
}
