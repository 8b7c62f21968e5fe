//! Behavior declarations and the namespace-merge algebra.

mod fields;
mod namespace;
mod raw;

pub use fields::{
    method, observer, value_kind, DataGenerator, DataMap, GeneratorFn, Method, MethodFn,
    Observer, ObserverFn, PropertyDef, PropertyType,
};
pub use namespace::{FieldEntry, FieldKind, MethodTable, Namespace};
pub use raw::{Declarations, ErasedFilter, RawBehavior, RawBuilder};
