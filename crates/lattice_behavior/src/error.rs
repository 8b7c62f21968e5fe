//! Errors raised by behavior builders.

use lattice_space::definition::PropertyType;
use lattice_space::{DefinitionError, MisuseKind, Origin};

/// Errors raised while building or registering a behavior.
///
/// Every variant is a programmer error surfaced at the call that caused it.
/// Nothing is retried, and a failed call leaves the builder it was called on
/// unchanged.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BehaviorError {
    /// Two different behaviors declare the same data or property name.
    #[error("`{name}` from `{incoming}` conflicts with the declaration in `{existing}`")]
    DeclarationConflict {
        /// The colliding field name.
        name: String,
        /// Behavior whose declaration was already visible.
        existing: Origin,
        /// Behavior whose declaration collided with it.
        incoming: Origin,
    },

    /// A builder or space was used out of order.
    #[error("misuse: {0}")]
    Misuse(MisuseKind),

    /// A capability outside the active chaining-filter surface was used.
    #[error("capability `{capability}` is not available (available: {})", .available.join(", "))]
    ChainingFilterMismatch {
        /// The requested capability.
        capability: String,
        /// The current fluent surface, sorted.
        available: Vec<String>,
    },

    /// A property default does not match the declared type.
    #[error("property `{name}` expects {expected} but its default is {found}")]
    PropertyTypeMismatch {
        /// The property name.
        name: String,
        /// The declared type.
        expected: PropertyType,
        /// Kind of the offending value.
        found: &'static str,
    },

    /// An observer targets a field no behavior in the chain declares.
    #[error("observer in `{origin}` targets unknown field `{name}`")]
    UnknownObserverTarget {
        /// The observed name.
        name: String,
        /// Behavior declaring the observer.
        origin: Origin,
    },
}

impl From<DefinitionError> for BehaviorError {
    fn from(error: DefinitionError) -> Self {
        match error {
            DefinitionError::DeclarationConflict {
                name,
                existing,
                incoming,
            } => Self::DeclarationConflict {
                name,
                existing,
                incoming,
            },
            DefinitionError::Misuse(kind) => Self::Misuse(kind),
            DefinitionError::PropertyTypeMismatch {
                name,
                expected,
                found,
            } => Self::PropertyTypeMismatch {
                name,
                expected,
                found,
            },
            DefinitionError::UnknownObserverTarget { name, origin } => {
                Self::UnknownObserverTarget { name, origin }
            }
        }
    }
}
