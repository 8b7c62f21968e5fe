//! Fluent behavior builders for Lattice (Layer 2).
//!
//! A behavior is a reusable bundle of data fields, properties, methods, an
//! `init` hook and an export selector. Behaviors compose by import: a
//! builder that imports a behavior sees its whole namespace, and names must
//! stay disjoint across the chain.
//!
//! - [`BehaviorBuilder`] - The fluent, finalize-once accumulator
//! - [`Behavior`] - The immutable result of [`BehaviorBuilder::register`]
//! - [`ChainingFilter`] - Extensions of the fluent surface offered to importers
//! - [`BehaviorDefinition`] - Bulk declarations and the post-merge transform
//!
//! # Example
//!
//! ```
//! use lattice_behavior::prelude::*;
//! use lattice_space::ComponentSpace;
//! use lattice_space::definition::{PropertyDef, PropertyType};
//! use serde_json::{json, Value};
//!
//! let space = ComponentSpace::default();
//!
//! // `x` offers an `extra` capability to whoever imports it.
//! let x = Behavior::named(&space, "x")?
//!     .chaining_filter(ChainingFilter::new().add("extra", |builder, args| {
//!         let name = args.as_str().unwrap_or("extra_flag");
//!         builder.property(name, PropertyDef::new(PropertyType::Boolean))
//!     }))?
//!     .register()?;
//!
//! let y = Behavior::named(&space, "y")?
//!     .behavior(&x)?
//!     .invoke("extra", &json!("highlighted"))?
//!     .register()?;
//! assert_eq!(y.property_names(), ["highlighted"]);
//!
//! // Without importing `x`, `extra` is not on the surface.
//! let plain = Behavior::builder(&space)?;
//! assert!(plain.invoke("extra", &Value::Null).is_err());
//! # Ok::<(), BehaviorError>(())
//! ```

/// Registered behaviors.
pub mod behavior;

/// The fluent builder.
pub mod builder;

/// Bulk declarations.
pub mod definition;

/// Error types.
pub mod error;

/// Chaining filters.
pub mod filter;

pub use behavior::{Behavior, ExportSelector};
pub use builder::BehaviorBuilder;
pub use definition::{BehaviorDefinition, DefinitionFilter};
pub use error::BehaviorError;
pub use filter::{Capability, CapabilityFn, ChainingFilter, Filter, BUILTINS};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::behavior::*;
    pub use crate::builder::*;
    pub use crate::definition::*;
    pub use crate::error::*;
    pub use crate::filter::*;
}
