//! The component space for Lattice (Layer 1).
//!
//! `lattice_space` provides the low-level primitives behaviors are built on:
//!
//! - [`space`] - The [`ComponentSpace`] registry and identity scope
//! - [`definition`] - Declarations, the namespace-merge algebra and the raw
//!   builder/behavior handles
//! - [`instance`] - Single-instance construction and the [`BuilderContext`]
//!   handed to `init` hooks
//! - [`config`] - [`SpaceConfig`]
//! - [`error`] - [`DefinitionError`] and [`InstanceError`]
//!
//! # Architecture
//!
//! - **Layer 1** (`lattice_space`): registration and construction primitives (this crate)
//! - **Layer 2** (`lattice_behavior`): the fluent `BehaviorBuilder` and chaining filters
//!
//! # Example
//!
//! ```
//! use lattice_space::prelude::*;
//! use serde_json::{json, Value};
//!
//! let space = ComponentSpace::default();
//!
//! let mut counter = space.define_named("counter").unwrap();
//! counter
//!     .data(DataGenerator::new(["count"], || {
//!         let mut data = DataMap::new();
//!         data.insert("count".into(), json!(0));
//!         data
//!     }))
//!     .unwrap();
//! counter.method(
//!     "increment",
//!     method(|instance, _| {
//!         let next = instance.data("count").unwrap().as_i64().unwrap_or(0) + 1;
//!         instance.set_data("count", next).unwrap();
//!         Value::from(next)
//!     }),
//! );
//! let counter = space.register_behavior(&counter).unwrap();
//!
//! let instance = space.instantiate(&counter, DataMap::new()).unwrap();
//! assert_eq!(instance.call_method("increment", Value::Null).unwrap(), 1);
//! ```

/// Space configuration.
pub mod config;

/// Behavior declarations and namespace merging.
pub mod definition;

/// Error types.
pub mod error;

/// Space, behavior and instance identities.
pub mod id;

/// Component instances and init contexts.
pub mod instance;

/// The component space.
pub mod space;

pub use config::SpaceConfig;
pub use error::{DefinitionError, InstanceError, MisuseKind};
pub use id::{BehaviorId, InstanceId, Origin, SpaceId};
pub use instance::{BuilderContext, ComponentInstance};
pub use space::ComponentSpace;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::config::*;
    pub use crate::definition::*;
    pub use crate::error::*;
    pub use crate::id::*;
    pub use crate::instance::*;
    pub use crate::space::*;
}
