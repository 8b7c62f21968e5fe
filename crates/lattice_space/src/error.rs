//! Errors raised by the component space.

use core::fmt;

use crate::definition::PropertyType;
use crate::id::Origin;

/// Ways a builder or space can be used out of order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MisuseKind {
    /// `register` was called on a builder that is already finalized.
    AlreadyFinalized,
    /// A declaration call was issued after the builder was finalized.
    DeclarationAfterFinalize,
    /// The component space has been closed.
    SpaceClosed,
    /// A behavior registered in another component space was used here.
    ForeignSpace,
}

impl fmt::Display for MisuseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::AlreadyFinalized => "builder was already finalized",
            Self::DeclarationAfterFinalize => "declaration issued after the builder was finalized",
            Self::SpaceClosed => "component space is closed",
            Self::ForeignSpace => "behavior belongs to a different component space",
        };
        f.write_str(message)
    }
}

/// Errors raised while declaring or registering a behavior.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DefinitionError {
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

/// Errors raised while constructing or driving a component instance.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InstanceError {
    /// No data field or property has this name.
    #[error("unknown field `{0}`")]
    UnknownField(String),

    /// An initial value was supplied for a name that is not a property.
    #[error("unknown property `{0}`")]
    UnknownProperty(String),

    /// No method has this name.
    #[error("unknown method `{0}`")]
    UnknownMethod(String),

    /// A data generator produced a field it did not declare.
    #[error("data generator of `{origin}` produced undeclared field `{name}`")]
    UndeclaredDataField {
        /// The generated field name.
        name: String,
        /// Behavior owning the generator.
        origin: Origin,
    },

    /// A property value does not match the declared type.
    #[error("property `{name}` expects {expected} but got {found}")]
    PropertyTypeMismatch {
        /// The property name.
        name: String,
        /// The declared type.
        expected: PropertyType,
        /// Kind of the offending value.
        found: &'static str,
    },

    /// A generated field collides with a field of another behavior.
    #[error("generated field `{name}` from `{incoming}` conflicts with `{existing}`")]
    DeclarationConflict {
        /// The colliding field name.
        name: String,
        /// Behavior that already owns the name.
        existing: Origin,
        /// Behavior whose generator produced it.
        incoming: Origin,
    },

    /// The space or behavior was used out of order.
    #[error("misuse: {0}")]
    Misuse(MisuseKind),
}
