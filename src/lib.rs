//! Composable component behaviors for Rust.
//!
//! See [`lattice_behavior`] for the fluent builder and [`lattice_space`] for
//! the component space and instance construction.

pub use lattice_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use lattice_internal::prelude::*;
}
