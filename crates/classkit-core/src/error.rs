//! Error types for class registration and attribute access.
//!
//! Errors are split by phase, in the same spirit as a compile/runtime split:
//!
//! ```text
//! ClasskitError (top-level wrapper)
//! ├── RegistrationError - class definition and ordering synthesis errors
//! └── AccessError       - attribute access and comparison errors
//! ```
//!
//! Registration errors are configuration mistakes and surface when a class
//! is defined or transformed, never at first use. Access errors surface at
//! the point of misuse and are never silently swallowed.

use thiserror::Error;

use crate::ordering::CompareOp;
use crate::type_hash::TypeHash;

/// Errors raised while defining, registering, or transforming classes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistrationError {
    /// Keyed-ordering synthesis was requested for a class that declares no
    /// key-extraction function.
    #[error("class '{class}' has no key function to derive ordering from")]
    MissingKeyFn { class: String },

    /// A class with the same name is already registered.
    #[error("class '{class}' is already registered")]
    DuplicateClass { class: String },

    /// The base class named by a definition is not registered.
    #[error("base class of '{class}' is not registered")]
    UnknownBase { class: String },

    /// A weak descriptor's storage slot collides with another descriptor.
    #[error("weak slot '{slot}' on class '{class}' collides with descriptor '{name}'")]
    WeakSlotCollision {
        class: String,
        slot: String,
        name: String,
    },

    /// The class hash does not name a registered class.
    #[error("class {hash} is not registered")]
    Unregistered { hash: TypeHash },
}

/// Errors raised by attribute access and comparison at use time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AccessError {
    /// The handle does not refer to a live instance.
    #[error("object handle is stale or freed")]
    DeadObject,

    /// The class hash does not name a registered class.
    #[error("class {hash} is not registered")]
    UnknownClass { hash: TypeHash },

    /// No descriptor or instance field under this name.
    #[error("'{class}' object has no attribute '{name}'")]
    UnknownAttribute { class: String, name: String },

    /// The attribute exists but cannot be read through the class itself.
    #[error("attribute '{name}' is not readable on the class")]
    NotClassReadable { name: String },

    /// Delete on a slot with nothing stored in it.
    #[error("'{class}' object has no value to delete for '{name}'")]
    NothingToDelete { class: String, name: String },

    /// A weak attribute was assigned a value without heap identity.
    #[error("cannot create weak reference to {type_name} value")]
    NotWeaklyReferenceable { type_name: &'static str },

    /// Neither operand could decide an ordering comparison.
    #[error("'{op}' not supported between '{left}' and '{right}'")]
    Unorderable {
        op: CompareOp,
        left: String,
        right: String,
    },

    /// A synthesized ordering operation extracted keys with no defined
    /// ordering between them.
    #[error("'{op}' not supported between incomparable key values")]
    IncomparableKeys { op: CompareOp },

    /// An instance's class chain declares no key function.
    #[error("class '{class}' has no key function")]
    MissingKey { class: String },
}

/// Top-level error wrapping both phases.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClasskitError {
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Access(#[from] AccessError),
}

/// Convenience alias for results carrying a [`ClasskitError`].
pub type ClasskitResult<T> = Result<T, ClasskitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_error_display() {
        let err = RegistrationError::MissingKeyFn {
            class: "Span".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "class 'Span' has no key function to derive ordering from"
        );
    }

    #[test]
    fn access_error_display_uses_op_symbol() {
        let err = AccessError::Unorderable {
            op: CompareOp::Lt,
            left: "Span".to_string(),
            right: "int".to_string(),
        };
        assert_eq!(err.to_string(), "'<' not supported between 'Span' and 'int'");
    }

    #[test]
    fn wrapper_converts_from_both_phases() {
        let registration: ClasskitError = RegistrationError::DuplicateClass {
            class: "Span".to_string(),
        }
        .into();
        let access: ClasskitError = AccessError::DeadObject.into();
        assert!(matches!(registration, ClasskitError::Registration(_)));
        assert!(matches!(access, ClasskitError::Access(_)));
    }
}
