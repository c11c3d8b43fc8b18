//! Class registry entries.
//!
//! A [`ClassDef`] is shared, read-only configuration: descriptors, the key
//! function, and comparison behavior all live here and serve every instance
//! of the class. Nothing in a `ClassDef` changes per instance.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::descriptor::{Descriptor, InstanceAccessor};
use crate::object::Instance;
use crate::ordering::{CmpOutcome, CompareOp, CompareOps, Comparator};
use crate::type_hash::TypeHash;
use crate::value::Value;

/// Registry entry for a class.
#[derive(Clone)]
pub struct ClassDef {
    /// Class name.
    name: String,
    /// Hash identity derived from the name.
    type_hash: TypeHash,
    /// Base class (single inheritance).
    base: Option<TypeHash>,

    // === Attribute access ===
    /// Named descriptor slots.
    descriptors: FxHashMap<String, Descriptor>,

    // === Comparison ===
    /// Key-extraction function backing keyed ordering.
    key_fn: Option<InstanceAccessor>,
    /// Hand-written comparison operations.
    comparators: FxHashMap<CompareOp, Comparator>,
    /// Operations filled in by keyed-ordering synthesis. The class they
    /// were synthesized on supplies the instance-of guard at evaluation.
    synthesized: CompareOps,
}

impl ClassDef {
    /// Create a new class definition.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let type_hash = TypeHash::from_name(&name);
        Self {
            name,
            type_hash,
            base: None,
            descriptors: FxHashMap::default(),
            key_fn: None,
            comparators: FxHashMap::default(),
            synthesized: CompareOps::empty(),
        }
    }

    // === Builder Methods ===

    /// Set the base class.
    pub fn with_base(mut self, base: TypeHash) -> Self {
        self.base = Some(base);
        self
    }

    /// Install a descriptor under the given slot name.
    pub fn with_descriptor(mut self, name: impl Into<String>, descriptor: Descriptor) -> Self {
        self.descriptors.insert(name.into(), descriptor);
        self
    }

    /// Set the key-extraction function.
    pub fn with_key<F>(mut self, key_fn: F) -> Self
    where
        F: Fn(&Instance) -> Value + Send + Sync + 'static,
    {
        self.key_fn = Some(Arc::new(key_fn));
        self
    }

    /// Define a comparison operation by hand.
    ///
    /// Hand-written operations are never overwritten by synthesis.
    pub fn with_comparator<F>(mut self, op: CompareOp, comparator: F) -> Self
    where
        F: Fn(&Instance, &Instance) -> CmpOutcome + Send + Sync + 'static,
    {
        self.comparators.insert(op, Arc::new(comparator));
        self
    }

    // === Query Methods ===

    /// Class name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Hash identity.
    pub fn type_hash(&self) -> TypeHash {
        self.type_hash
    }

    /// Base class, if any.
    pub fn base(&self) -> Option<TypeHash> {
        self.base
    }

    /// Find a descriptor by slot name.
    pub fn find_descriptor(&self, name: &str) -> Option<&Descriptor> {
        self.descriptors.get(name)
    }

    /// Iterate over descriptor slots.
    pub fn descriptors(&self) -> impl Iterator<Item = (&str, &Descriptor)> {
        self.descriptors.iter().map(|(name, desc)| (name.as_str(), desc))
    }

    /// Check whether this class declares a key function.
    pub fn has_key(&self) -> bool {
        self.key_fn.is_some()
    }

    /// The key-extraction function, if declared.
    pub fn key_fn(&self) -> Option<&InstanceAccessor> {
        self.key_fn.as_ref()
    }

    /// A hand-written comparison operation, if defined.
    pub fn comparator(&self, op: CompareOp) -> Option<&Comparator> {
        self.comparators.get(&op)
    }

    /// The set of hand-written operations.
    pub fn declared_ops(&self) -> CompareOps {
        self.comparators
            .keys()
            .fold(CompareOps::empty(), |acc, op| acc | op.flag())
    }

    /// The set of synthesized operations.
    pub fn synthesized_ops(&self) -> CompareOps {
        self.synthesized
    }

    /// Whether this class handles the operation itself (hand-written or
    /// synthesized), as opposed to inheriting or deferring.
    pub fn handles_op(&self, op: CompareOp) -> bool {
        self.comparators.contains_key(&op) || self.synthesized.contains(op.flag())
    }

    pub(crate) fn mark_synthesized(&mut self, ops: CompareOps) {
        self.synthesized |= ops;
    }
}

impl fmt::Debug for ClassDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDef")
            .field("name", &self.name)
            .field("type_hash", &self.type_hash)
            .field("base", &self.base)
            .field("descriptors", &self.descriptors)
            .field("has_key", &self.key_fn.is_some())
            .field("declared", &self.declared_ops())
            .field("synthesized", &self.synthesized)
            .finish()
    }
}
