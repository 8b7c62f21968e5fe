//! # Lattice Internal Library
//!
//! Re-exports the Lattice crates for convenience.

/// Component spaces, namespaces and instance construction.
pub use lattice_space;

/// Fluent behavior builder and chaining filters.
pub use lattice_behavior;

/// Tracing subscriber setup for hosts.
#[cfg(feature = "diagnostics")]
pub use lattice_diagnostics;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use lattice_behavior::prelude::*;
    pub use lattice_space::prelude::*;

    #[cfg(feature = "diagnostics")]
    pub use lattice_diagnostics::{TracingFormat, TracingSetup};
}
