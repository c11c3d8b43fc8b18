//! Instance storage.

use rustc_hash::FxHashMap;

use crate::type_hash::TypeHash;
use crate::value::Value;

/// An instance of a registered class.
///
/// Carries only the class identity and the instance's own field map. All
/// descriptor machinery lives on the class; anything per-instance a
/// descriptor needs (a memoized value, a weak slot) is written here. That is
/// what lets one descriptor serve every instance of its class.
#[derive(Debug, Clone)]
pub struct Instance {
    class: TypeHash,
    fields: FxHashMap<String, Value>,
}

impl Instance {
    /// Create a new instance of the given class with no fields.
    pub fn new(class: TypeHash) -> Self {
        Self {
            class,
            fields: FxHashMap::default(),
        }
    }

    /// The instance's class.
    pub fn class(&self) -> TypeHash {
        self.class
    }

    /// Read a field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Write a field, returning the previous value if any.
    pub fn set_field(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(name.into(), value)
    }

    /// Remove a field, returning its value if it existed.
    pub fn remove_field(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    /// Check whether a field exists.
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Number of fields currently stored.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Consume the instance, yielding its field map.
    pub fn into_fields(self) -> FxHashMap<String, Value> {
        self.fields
    }
}
