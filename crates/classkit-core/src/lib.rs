//! Core object model for classkit.
//!
//! classkit augments an explicit class/instance model with attribute
//! behaviors the plain model lacks:
//!
//! - [`Descriptor::ClassProperty`] - read-only property computed from the
//!   class rather than the instance
//! - [`Descriptor::Lazy`] - computed once, cached as an ordinary field,
//!   replaceable and evictable
//! - [`Descriptor::Weak`] - attribute slot holding a non-owning reference
//!   that reads null once the referent is gone
//! - [`Descriptor::Computed`] - computed on every read until a direct write
//!   shadows it
//! - [`derive_keyed_ordering`] - synthesizes the six relational operations
//!   of a class from a single key-extraction function
//!
//! The [`ObjectModel`] ties these together: it owns the class registry and
//! the instance heap and exposes the attribute and comparison protocols.

pub mod class;
pub mod descriptor;
pub mod error;
pub mod heap;
pub mod model;
pub mod object;
pub mod ordering;
pub mod type_hash;
pub mod value;

pub use class::ClassDef;
pub use descriptor::{ClassAccessor, Descriptor, InstanceAccessor};
pub use error::{AccessError, ClasskitError, ClasskitResult, RegistrationError};
pub use heap::{ObjectHandle, ObjectHeap};
pub use model::ObjectModel;
pub use object::Instance;
pub use ordering::{CmpOutcome, CompareOp, CompareOps, Comparator, derive_keyed_ordering};
pub use type_hash::TypeHash;
pub use value::Value;
