//! classkit - class-related utilities for an explicit object model.
//!
//! Facade over [`classkit_core`]: descriptors for class-scoped, lazy,
//! computed, and weak attributes, plus keyed-ordering synthesis, all driven
//! through an [`ObjectModel`](classkit_core::ObjectModel).

pub use classkit_core::{
    AccessError, ClassAccessor, ClassDef, ClasskitError, ClasskitResult, CmpOutcome, CompareOp,
    CompareOps, Comparator, Descriptor, Instance, InstanceAccessor, ObjectHandle, ObjectHeap,
    ObjectModel, RegistrationError, TypeHash, Value, derive_keyed_ordering,
};

// Re-export main types
pub mod prelude {
    pub use classkit_core::{
        AccessError, ClassDef, ClasskitError, CmpOutcome, CompareOp, CompareOps, Descriptor,
        Instance, ObjectHandle, ObjectModel, RegistrationError, TypeHash, Value,
        derive_keyed_ordering,
    };
}
