//! Declaration payloads: properties, data generators, methods and observers.

use core::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::instance::ComponentInstance;

/// Map of field names to values, as produced by data generators and stored
/// on instances.
pub type DataMap = serde_json::Map<String, Value>;

// ─────────────────────────────────────────────────────────────────────────────
// PropertyType
// ─────────────────────────────────────────────────────────────────────────────

/// The value type of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    /// Any value, including `null`.
    #[default]
    Any,
    /// A JSON string.
    String,
    /// A JSON number.
    Number,
    /// A JSON boolean.
    Boolean,
    /// A JSON object or `null`.
    Object,
    /// A JSON array.
    Array,
}

impl PropertyType {
    /// Returns true if `value` is acceptable for this type.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::Any, _)
                | (Self::String, Value::String(_))
                | (Self::Number, Value::Number(_))
                | (Self::Boolean, Value::Bool(_))
                | (Self::Object, Value::Object(_) | Value::Null)
                | (Self::Array, Value::Array(_))
        )
    }

    /// The value a property of this type takes when no default is given.
    #[must_use]
    pub fn zero_value(self) -> Value {
        match self {
            Self::Any | Self::Object => Value::Null,
            Self::String => Value::String(String::new()),
            Self::Number => Value::from(0),
            Self::Boolean => Value::Bool(false),
            Self::Array => Value::Array(Vec::new()),
        }
    }

    /// Returns the lowercase type name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Names the JSON kind of a value, for error messages.
#[must_use]
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Callables
// ─────────────────────────────────────────────────────────────────────────────

/// A method bound to the instance it is called on.
pub type MethodFn = dyn Fn(&ComponentInstance, Value) -> Value + Send + Sync;

/// Shared handle to a [`MethodFn`].
pub type Method = Arc<MethodFn>;

/// Observer called with `(instance, new_value, old_value)` after a field
/// changes.
pub type ObserverFn = dyn Fn(&ComponentInstance, &Value, &Value) + Send + Sync;

/// Shared handle to an [`ObserverFn`].
pub type Observer = Arc<ObserverFn>;

/// Wraps a closure as a [`Method`].
///
/// ```
/// use lattice_space::definition::method;
/// use serde_json::Value;
///
/// let noop = method(|_instance, _args| Value::Null);
/// # let _ = noop;
/// ```
pub fn method<F>(f: F) -> Method
where
    F: Fn(&ComponentInstance, Value) -> Value + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wraps a closure as an [`Observer`].
pub fn observer<F>(f: F) -> Observer
where
    F: Fn(&ComponentInstance, &Value, &Value) + Send + Sync + 'static,
{
    Arc::new(f)
}

// ─────────────────────────────────────────────────────────────────────────────
// PropertyDef
// ─────────────────────────────────────────────────────────────────────────────

/// Declaration of a single property: type, optional default, optional
/// observer.
#[derive(Clone, Default)]
pub struct PropertyDef {
    ty: PropertyType,
    default: Option<Value>,
    observer: Option<Observer>,
}

impl PropertyDef {
    /// Declares a property of the given type with no default.
    #[must_use]
    pub fn new(ty: PropertyType) -> Self {
        Self {
            ty,
            default: None,
            observer: None,
        }
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Sets the observer fired when the property value changes.
    #[must_use]
    pub fn with_observer<F>(mut self, f: F) -> Self
    where
        F: Fn(&ComponentInstance, &Value, &Value) + Send + Sync + 'static,
    {
        self.observer = Some(Arc::new(f));
        self
    }

    /// Returns the declared type.
    #[must_use]
    pub fn ty(&self) -> PropertyType {
        self.ty
    }

    /// Returns the declared default, if any.
    #[must_use]
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Returns the observer, if any.
    #[must_use]
    pub fn observer(&self) -> Option<&Observer> {
        self.observer.as_ref()
    }

    /// The value a fresh instance starts with: the default, or the type's
    /// zero value.
    #[must_use]
    pub fn initial_value(&self) -> Value {
        self.default
            .clone()
            .unwrap_or_else(|| self.ty.zero_value())
    }
}

impl fmt::Debug for PropertyDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDef")
            .field("ty", &self.ty)
            .field("default", &self.default)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// DataGenerator
// ─────────────────────────────────────────────────────────────────────────────

/// Zero-argument factory for instance data.
pub type GeneratorFn = dyn Fn() -> DataMap + Send + Sync;

/// A data declaration: the field names it produces plus the generator that
/// produces them.
///
/// The generator is never invoked at declaration time. Instance construction
/// calls it exactly once per instance.
#[derive(Clone)]
pub struct DataGenerator {
    fields: Vec<String>,
    generate: Arc<GeneratorFn>,
}

impl DataGenerator {
    /// Creates a generator declaring `fields`.
    pub fn new<I, S, F>(fields: I, generate: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn() -> DataMap + Send + Sync + 'static,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            generate: Arc::new(generate),
        }
    }

    /// Returns the declared field names.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Runs the generator.
    #[must_use]
    pub fn generate(&self) -> DataMap {
        (self.generate)()
    }
}

impl fmt::Debug for DataGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataGenerator")
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn type_acceptance() {
        assert!(PropertyType::String.accepts(&json!("a")));
        assert!(!PropertyType::String.accepts(&json!(1)));
        assert!(PropertyType::Object.accepts(&Value::Null));
        assert!(!PropertyType::Array.accepts(&Value::Null));
        assert!(PropertyType::Any.accepts(&json!([1, 2])));
    }

    #[test]
    fn zero_values() {
        assert_eq!(PropertyType::String.zero_value(), json!(""));
        assert_eq!(PropertyType::Number.zero_value(), json!(0));
        assert_eq!(PropertyType::Boolean.zero_value(), json!(false));
        assert_eq!(PropertyType::Array.zero_value(), json!([]));
        assert_eq!(PropertyType::Object.zero_value(), Value::Null);
    }

    #[test]
    fn initial_value_prefers_default() {
        let def = PropertyDef::new(PropertyType::Boolean).with_default(true);
        assert_eq!(def.initial_value(), json!(true));
        assert_eq!(PropertyDef::new(PropertyType::Number).initial_value(), json!(0));
    }

    #[test]
    fn property_type_serde_is_lowercase() {
        let ty: PropertyType = serde_json::from_str("\"boolean\"").unwrap();
        assert_eq!(ty, PropertyType::Boolean);
        assert_eq!(serde_json::to_string(&PropertyType::Array).unwrap(), "\"array\"");
    }

    #[test]
    fn generator_is_lazy() {
        use core::sync::atomic::{AtomicUsize, Ordering};

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let generator = DataGenerator::new(["count"], move || {
            counter.fetch_add(1, Ordering::SeqCst);
            DataMap::new()
        });

        assert_eq!(generator.fields(), ["count".to_string()]);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let _ = generator.generate();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
