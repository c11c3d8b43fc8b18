//! Named attribute slots installed on classes.
//!
//! Each descriptor kind reproduces one attribute-access behavior on top of
//! the explicit model: the class holds the descriptor, the instance field
//! map holds whatever per-instance state the behavior needs. Descriptors
//! are shared by every instance of the class and hold no per-instance data
//! themselves.

use std::fmt;
use std::sync::Arc;

use crate::class::ClassDef;
use crate::object::Instance;
use crate::value::Value;

/// Accessor invoked with the class itself (class-scoped properties).
///
/// Wrapped in `Arc` so descriptors of different signatures can be stored
/// uniformly and cloned cheaply.
pub type ClassAccessor = Arc<dyn Fn(&ClassDef) -> Value + Send + Sync>;

/// Accessor invoked with the instance (lazy and computed properties, key
/// extraction).
pub type InstanceAccessor = Arc<dyn Fn(&Instance) -> Value + Send + Sync>;

/// A named attribute slot on a class.
#[derive(Clone)]
pub enum Descriptor {
    /// Read-only property computed from the class, never the instance.
    ///
    /// Re-invoked on every read, whether the read goes through the class or
    /// through an instance. A direct instance write shadows it rather than
    /// updating it; deleting the shadow re-exposes the descriptor.
    ClassProperty(ClassAccessor),

    /// Lazily computed once per instance.
    ///
    /// The first read invokes the accessor and writes the result into the
    /// instance's own field map under the slot's name, so later reads find
    /// the field first and never reach the descriptor again. Writing
    /// replaces the cached value; deleting it makes the next read recompute.
    Lazy(InstanceAccessor),

    /// Computed on every read until a direct write shadows it.
    ///
    /// Deleting the shadow puts the descriptor back in charge.
    Computed(InstanceAccessor),

    /// Non-owning attribute slot.
    ///
    /// Stores an object handle without taking a reference, and reads null
    /// once the referent is gone.
    Weak {
        /// Field-map key the handle is stored under.
        slot: String,
    },
}

impl Descriptor {
    /// Create a class-scoped property from an accessor.
    pub fn class_property<F>(accessor: F) -> Self
    where
        F: Fn(&ClassDef) -> Value + Send + Sync + 'static,
    {
        Descriptor::ClassProperty(Arc::new(accessor))
    }

    /// Create a lazily-memoized property from an accessor.
    pub fn lazy<F>(accessor: F) -> Self
    where
        F: Fn(&Instance) -> Value + Send + Sync + 'static,
    {
        Descriptor::Lazy(Arc::new(accessor))
    }

    /// Create an overwritable computed property from an accessor.
    pub fn computed<F>(accessor: F) -> Self
    where
        F: Fn(&Instance) -> Value + Send + Sync + 'static,
    {
        Descriptor::Computed(Arc::new(accessor))
    }

    /// Create a weak attribute storing its handle under `slot`.
    pub fn weak(slot: impl Into<String>) -> Self {
        Descriptor::Weak { slot: slot.into() }
    }

    /// Whether writes and deletes are routed through the descriptor.
    ///
    /// A data descriptor keeps control of its slot even when an instance
    /// field of the same name exists; non-data descriptors are shadowed by
    /// the field map.
    pub fn is_data(&self) -> bool {
        matches!(self, Descriptor::Weak { .. })
    }

    /// Short name for the descriptor kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Descriptor::ClassProperty(_) => "class_property",
            Descriptor::Lazy(_) => "lazy",
            Descriptor::Computed(_) => "computed",
            Descriptor::Weak { .. } => "weak",
        }
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Descriptor::Weak { slot } => {
                f.debug_struct("Weak").field("slot", slot).finish()
            }
            other => f.debug_struct(other.kind()).finish_non_exhaustive(),
        }
    }
}
