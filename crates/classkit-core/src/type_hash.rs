//! Deterministic hash-based class identity.
//!
//! Provides [`TypeHash`], a 64-bit hash that uniquely identifies a registered
//! class. Hashes are computed from class names rather than handed out
//! sequentially, so:
//!
//! - A class keeps the same identity regardless of registration order
//! - A base class can be referenced before it is registered
//! - Lookups need a single map probe, with no secondary name→id table
//!
//! # Examples
//!
//! ```
//! use classkit_core::TypeHash;
//!
//! let span = TypeHash::from_name("TimeSpan");
//! assert_eq!(span, TypeHash::from_name("TimeSpan"));
//! assert_ne!(span, TypeHash::from_name("Interval"));
//! ```

use std::fmt;

use xxhash_rust::xxh64::xxh64;

/// Domain marker mixed into class hashes so a class name can never collide
/// with hashes computed for other entity kinds.
const CLASS_DOMAIN: u64 = 0x51c3a8b07e2d94f5;

/// A deterministic 64-bit hash identifying a registered class.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeHash(u64);

impl TypeHash {
    /// Compute the hash for a class name.
    pub fn from_name(name: &str) -> Self {
        Self(xxh64(name.as_bytes(), CLASS_DOMAIN))
    }

    /// Raw hash value.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash(0x{:016x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.0)
    }
}
