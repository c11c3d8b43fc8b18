//! Central object model: class registry, instance heap, and the attribute
//! and comparison protocols.
//!
//! # Storage Model
//!
//! - **Classes**: stored in a single map by `TypeHash`, with a name reverse
//!   index for lookups by string.
//! - **Instances**: allocated on the [`ObjectHeap`]; [`instantiate`] hands
//!   the caller a handle owning one strong reference, released with
//!   [`release`].
//!
//! # Attribute Protocol
//!
//! `get_attr`/`set_attr`/`del_attr` resolve a name against the instance's
//! class chain and its own field map. Data descriptors (weak attributes)
//! always intercept; non-data descriptors (class properties, lazy and
//! computed properties) yield to an existing instance field, which is what
//! lets a computed slot be shadowed and a lazy slot be cached.
//!
//! # Comparison Protocol
//!
//! `compare` asks the left operand's class to evaluate the operation; a
//! [`CmpOutcome::NotApplicable`] answer routes the reflected operation to
//! the right operand; if neither side applies, equality falls back to
//! identity and ordering fails. The double-dispatch retry some hosts do
//! implicitly is an explicit step here.
//!
//! # Thread Safety
//!
//! `ObjectModel` is **not** thread-safe. In particular the lazy first-read
//! transition (compute, then write the field) is not race-free under
//! concurrent first access; callers needing concurrency must wrap the model
//! in external synchronization.
//!
//! [`instantiate`]: ObjectModel::instantiate
//! [`release`]: ObjectModel::release

use rustc_hash::FxHashMap;

use crate::class::ClassDef;
use crate::descriptor::Descriptor;
use crate::error::{AccessError, RegistrationError};
use crate::heap::{ObjectHandle, ObjectHeap};
use crate::object::Instance;
use crate::ordering::{self, CmpOutcome, CompareOp, CompareOps};
use crate::type_hash::TypeHash;
use crate::value::Value;

/// Class registry plus instance heap.
#[derive(Debug, Default)]
pub struct ObjectModel {
    /// Classes stored by hash (primary storage).
    classes: FxHashMap<TypeHash, ClassDef>,
    /// Reverse index: name -> hash.
    names: FxHashMap<String, TypeHash>,
    /// Instance storage.
    heap: ObjectHeap,
}

impl ObjectModel {
    /// Create a new empty model.
    pub fn new() -> Self {
        Self::default()
    }

    // ==========================================================================
    // Registration
    // ==========================================================================

    /// Register a class definition.
    ///
    /// Rejects duplicate names, unregistered base classes, and weak
    /// descriptors whose storage slot collides with another descriptor on
    /// the class body.
    pub fn register_class(&mut self, class: ClassDef) -> Result<TypeHash, RegistrationError> {
        if self.names.contains_key(class.name()) {
            return Err(RegistrationError::DuplicateClass {
                class: class.name().to_string(),
            });
        }
        if let Some(base) = class.base()
            && !self.classes.contains_key(&base)
        {
            return Err(RegistrationError::UnknownBase {
                class: class.name().to_string(),
            });
        }
        for (name, descriptor) in class.descriptors() {
            if let Descriptor::Weak { slot } = descriptor
                && slot != name
                && class.find_descriptor(slot).is_some()
            {
                return Err(RegistrationError::WeakSlotCollision {
                    class: class.name().to_string(),
                    slot: slot.clone(),
                    name: name.to_string(),
                });
            }
        }

        let hash = class.type_hash();
        log::debug!("registered class '{}' ({})", class.name(), hash);
        self.names.insert(class.name().to_string(), hash);
        self.classes.insert(hash, class);
        Ok(hash)
    }

    /// Derive keyed ordering for an already-registered class.
    ///
    /// Same transformation as [`ordering::derive_keyed_ordering`], applied
    /// in place through the registry.
    pub fn derive_ordering(&mut self, class: TypeHash) -> Result<CompareOps, RegistrationError> {
        let def = self
            .classes
            .get_mut(&class)
            .ok_or(RegistrationError::Unregistered { hash: class })?;
        ordering::derive_keyed_ordering(def)
    }

    // ==========================================================================
    // Lookup
    // ==========================================================================

    /// Get a class by hash.
    pub fn class(&self, hash: TypeHash) -> Option<&ClassDef> {
        self.classes.get(&hash)
    }

    /// Get a class by name.
    pub fn class_by_name(&self, name: &str) -> Option<&ClassDef> {
        self.names.get(name).and_then(|hash| self.classes.get(hash))
    }

    /// Check whether the handle refers to an instance of the class or of
    /// any subclass of it.
    pub fn is_instance(&self, handle: ObjectHandle, class: TypeHash) -> bool {
        let Some(instance) = self.heap.get(handle) else {
            return false;
        };
        let mut current = Some(instance.class());
        while let Some(hash) = current {
            if hash == class {
                return true;
            }
            current = self.classes.get(&hash).and_then(|def| def.base());
        }
        false
    }

    /// Read-only view of an instance.
    pub fn instance(&self, handle: ObjectHandle) -> Option<&Instance> {
        self.heap.get(handle)
    }

    // ==========================================================================
    // Instance Lifecycle
    // ==========================================================================

    /// Allocate a new instance of a registered class.
    ///
    /// The returned handle owns one strong reference; pair it with
    /// [`release`](Self::release).
    pub fn instantiate(&mut self, class: TypeHash) -> Result<ObjectHandle, AccessError> {
        if !self.classes.contains_key(&class) {
            return Err(AccessError::UnknownClass { hash: class });
        }
        let handle = self.heap.allocate(Instance::new(class));
        log::trace!("allocated {:?} of class {}", handle, class);
        Ok(handle)
    }

    /// Increment an instance's reference count.
    pub fn add_ref(&mut self, handle: ObjectHandle) -> bool {
        self.heap.add_ref(handle)
    }

    /// Decrement an instance's reference count, freeing it at zero.
    ///
    /// Freeing an instance releases the strong references held in its
    /// fields, cascading to any objects it was the last owner of. Weak
    /// entries are skipped; they never owned their referent. Returns true
    /// if the instance itself was freed.
    pub fn release(&mut self, handle: ObjectHandle) -> bool {
        let mut freed_root = false;
        let mut pending = vec![handle];
        while let Some(current) = pending.pop() {
            if let Some(freed) = self.heap.release(current) {
                if current == handle {
                    freed_root = true;
                }
                for value in freed.into_fields().into_values() {
                    if let Value::Object(child) = value {
                        pending.push(child);
                    }
                }
            }
        }
        freed_root
    }

    /// Reference count of an instance.
    pub fn ref_count(&self, handle: ObjectHandle) -> Option<u32> {
        self.heap.ref_count(handle)
    }

    /// Check whether an instance is still alive.
    pub fn is_alive(&self, handle: ObjectHandle) -> bool {
        self.heap.is_alive(handle)
    }

    /// Number of live instances on the heap.
    pub fn live_objects(&self) -> usize {
        self.heap.live_count()
    }

    // ==========================================================================
    // Attribute Protocol
    // ==========================================================================

    /// Read an attribute on an instance.
    pub fn get_attr(&mut self, handle: ObjectHandle, name: &str) -> Result<Value, AccessError> {
        let class_hash = self
            .heap
            .get(handle)
            .ok_or(AccessError::DeadObject)?
            .class();
        let descriptor = self.descriptor_for(class_hash, name).cloned();

        match descriptor {
            // Data descriptors win over the field map.
            Some(Descriptor::Weak { slot }) => Ok(self.read_weak(handle, &slot)),
            other => {
                // The instance's own fields shadow non-data descriptors.
                // This is also what makes a lazy slot free after first
                // computation: the cached field is found here and the
                // descriptor never runs again.
                if let Some(value) = self.instance_field(handle, name) {
                    return Ok(value);
                }
                match other {
                    Some(Descriptor::ClassProperty(get)) => {
                        let class = self
                            .classes
                            .get(&class_hash)
                            .ok_or(AccessError::UnknownClass { hash: class_hash })?;
                        Ok(get(class))
                    }
                    Some(Descriptor::Lazy(init)) => {
                        let value = {
                            let instance =
                                self.heap.get(handle).ok_or(AccessError::DeadObject)?;
                            init(instance)
                        };
                        log::trace!("computed lazy attribute '{}' on {:?}", name, handle);
                        if let Value::Object(child) = &value {
                            self.heap.add_ref(*child);
                        }
                        if let Some(instance) = self.heap.get_mut(handle) {
                            instance.set_field(name, value.clone());
                        }
                        Ok(value)
                    }
                    Some(Descriptor::Computed(get)) => {
                        let instance = self.heap.get(handle).ok_or(AccessError::DeadObject)?;
                        Ok(get(instance))
                    }
                    _ => Err(self.unknown_attribute(class_hash, name)),
                }
            }
        }
    }

    /// Write an attribute on an instance.
    ///
    /// Weak descriptors intercept the write; any other name writes the
    /// instance's own field map directly, shadowing a non-data descriptor
    /// of the same name if one exists.
    pub fn set_attr(
        &mut self,
        handle: ObjectHandle,
        name: &str,
        value: Value,
    ) -> Result<(), AccessError> {
        let class_hash = self
            .heap
            .get(handle)
            .ok_or(AccessError::DeadObject)?
            .class();
        let weak_slot = match self.descriptor_for(class_hash, name) {
            Some(Descriptor::Weak { slot }) => Some(slot.clone()),
            _ => None,
        };
        match weak_slot {
            Some(slot) => self.write_weak(handle, &slot, value),
            None => self.write_field(handle, name, value),
        }
    }

    /// Delete an attribute on an instance.
    ///
    /// Weak descriptors delete their storage entry; any other name removes
    /// the instance field. Deleting a slot with nothing stored is an error,
    /// which covers both an unset weak attribute and an uncomputed lazy
    /// slot.
    pub fn del_attr(&mut self, handle: ObjectHandle, name: &str) -> Result<(), AccessError> {
        let class_hash = self
            .heap
            .get(handle)
            .ok_or(AccessError::DeadObject)?
            .class();
        let slot = match self.descriptor_for(class_hash, name) {
            Some(Descriptor::Weak { slot }) => Some(slot.clone()),
            _ => None,
        };
        let target = slot.as_deref().unwrap_or(name);
        let previous = self
            .heap
            .get_mut(handle)
            .ok_or(AccessError::DeadObject)?
            .remove_field(target);
        match previous {
            Some(Value::Object(old)) => {
                self.release(old);
                Ok(())
            }
            Some(_) => Ok(()),
            None => Err(AccessError::NothingToDelete {
                class: self.class_name(class_hash),
                name: name.to_string(),
            }),
        }
    }

    /// Read an attribute through the class itself.
    ///
    /// Only class-scoped properties are readable this way; the accessor is
    /// invoked with the class the read went through.
    pub fn class_attr(&self, class: TypeHash, name: &str) -> Result<Value, AccessError> {
        let queried = self
            .classes
            .get(&class)
            .ok_or(AccessError::UnknownClass { hash: class })?;
        match self.descriptor_for(class, name) {
            Some(Descriptor::ClassProperty(get)) => Ok(get(queried)),
            Some(_) => Err(AccessError::NotClassReadable {
                name: name.to_string(),
            }),
            None => Err(AccessError::UnknownAttribute {
                class: queried.name().to_string(),
                name: name.to_string(),
            }),
        }
    }

    // ==========================================================================
    // Comparison Protocol
    // ==========================================================================

    /// Evaluate a relational operation between two values.
    ///
    /// Tries in order:
    /// 1. The left operand's operation
    /// 2. The reflected operation on the right operand
    /// 3. Identity fallback for `==`/`!=`; an error for ordering
    pub fn compare(&self, op: CompareOp, left: &Value, right: &Value) -> Result<bool, AccessError> {
        match self.half_compare(op, left, right)? {
            CmpOutcome::Bool(decided) => Ok(decided),
            CmpOutcome::NotApplicable => match self.half_compare(op.reflected(), right, left)? {
                CmpOutcome::Bool(decided) => Ok(decided),
                CmpOutcome::NotApplicable => self.compare_fallback(op, left, right),
            },
        }
    }

    // ==========================================================================
    // Internal: attribute access
    // ==========================================================================

    /// Find the descriptor a name resolves to along the class chain.
    fn descriptor_for(&self, class: TypeHash, name: &str) -> Option<&Descriptor> {
        let mut current = Some(class);
        while let Some(hash) = current {
            let def = self.classes.get(&hash)?;
            if let Some(descriptor) = def.find_descriptor(name) {
                return Some(descriptor);
            }
            current = def.base();
        }
        None
    }

    fn instance_field(&self, handle: ObjectHandle, name: &str) -> Option<Value> {
        self.heap.get(handle).and_then(|inst| inst.field(name)).cloned()
    }

    /// Read a weak slot: null when unset or when the referent died, and in
    /// the latter case the dangling entry is dropped rather than left
    /// around.
    fn read_weak(&mut self, handle: ObjectHandle, slot: &str) -> Value {
        let entry = self.instance_field(handle, slot);
        match entry {
            Some(Value::Weak(target)) => {
                if self.heap.is_alive(target) {
                    Value::Object(target)
                } else {
                    log::trace!("dropping dead weak entry '{}' on {:?}", slot, handle);
                    if let Some(instance) = self.heap.get_mut(handle) {
                        instance.remove_field(slot);
                    }
                    Value::Null
                }
            }
            _ => Value::Null,
        }
    }

    fn write_weak(
        &mut self,
        handle: ObjectHandle,
        slot: &str,
        value: Value,
    ) -> Result<(), AccessError> {
        let target = match value {
            Value::Object(target) => target,
            other => {
                return Err(AccessError::NotWeaklyReferenceable {
                    type_name: other.type_name(),
                });
            }
        };
        if !self.heap.is_alive(target) {
            return Err(AccessError::DeadObject);
        }
        let previous = self
            .heap
            .get_mut(handle)
            .ok_or(AccessError::DeadObject)?
            .set_field(slot, Value::Weak(target));
        if let Some(Value::Object(old)) = previous {
            self.release(old);
        }
        Ok(())
    }

    fn write_field(
        &mut self,
        handle: ObjectHandle,
        name: &str,
        value: Value,
    ) -> Result<(), AccessError> {
        if let Value::Object(child) = &value
            && !self.heap.add_ref(*child)
        {
            return Err(AccessError::DeadObject);
        }
        let previous = self
            .heap
            .get_mut(handle)
            .ok_or(AccessError::DeadObject)?
            .set_field(name, value);
        if let Some(Value::Object(old)) = previous {
            self.release(old);
        }
        Ok(())
    }

    fn unknown_attribute(&self, class: TypeHash, name: &str) -> AccessError {
        AccessError::UnknownAttribute {
            class: self.class_name(class),
            name: name.to_string(),
        }
    }

    fn class_name(&self, hash: TypeHash) -> String {
        self.classes
            .get(&hash)
            .map(|def| def.name().to_string())
            .unwrap_or_else(|| hash.to_string())
    }

    // ==========================================================================
    // Internal: comparison
    // ==========================================================================

    /// Ask one operand to evaluate the operation.
    fn half_compare(
        &self,
        op: CompareOp,
        lhs: &Value,
        rhs: &Value,
    ) -> Result<CmpOutcome, AccessError> {
        match lhs {
            Value::Object(handle) => self.object_compare(op, *handle, rhs),
            plain => Ok(plain_compare(op, plain, rhs)),
        }
    }

    /// Resolve the operation along the instance's class chain: the nearest
    /// hand-written comparator or synthesized operation wins.
    fn object_compare(
        &self,
        op: CompareOp,
        handle: ObjectHandle,
        other: &Value,
    ) -> Result<CmpOutcome, AccessError> {
        let instance = self.heap.get(handle).ok_or(AccessError::DeadObject)?;
        let mut current = Some(instance.class());
        while let Some(hash) = current {
            let class = self
                .classes
                .get(&hash)
                .ok_or(AccessError::UnknownClass { hash })?;
            if let Some(comparator) = class.comparator(op) {
                // Hand-written operations only see live instances; anything
                // else defers.
                let outcome = match other.as_object().and_then(|h| self.heap.get(h)) {
                    Some(other_instance) => comparator(instance, other_instance),
                    None => CmpOutcome::NotApplicable,
                };
                return Ok(outcome);
            }
            if class.synthesized_ops().contains(op.flag()) {
                return self.keyed_compare(op, class, instance, other);
            }
            current = class.base();
        }
        Ok(CmpOutcome::NotApplicable)
    }

    /// Synthesized operation: guard on instance-of the class the synthesis
    /// ran on, then compare extracted keys.
    fn keyed_compare(
        &self,
        op: CompareOp,
        origin: &ClassDef,
        instance: &Instance,
        other: &Value,
    ) -> Result<CmpOutcome, AccessError> {
        let Some(other_handle) = other.as_object() else {
            return Ok(CmpOutcome::NotApplicable);
        };
        if !self.is_instance(other_handle, origin.type_hash()) {
            return Ok(CmpOutcome::NotApplicable);
        }
        let other_instance = self.heap.get(other_handle).ok_or(AccessError::DeadObject)?;
        let left_key = self.extract_key(instance)?;
        let right_key = self.extract_key(other_instance)?;
        match op {
            CompareOp::Eq => Ok(CmpOutcome::Bool(left_key.eq_loose(&right_key))),
            CompareOp::Ne => Ok(CmpOutcome::Bool(!left_key.eq_loose(&right_key))),
            _ => {
                let Some(ord) = left_key.try_cmp(&right_key) else {
                    return Err(AccessError::IncomparableKeys { op });
                };
                Ok(CmpOutcome::Bool(op.evaluate(Some(ord))))
            }
        }
    }

    /// Extract an instance's key through its own class chain, so a subclass
    /// key function overrides the base's.
    fn extract_key(&self, instance: &Instance) -> Result<Value, AccessError> {
        let mut current = Some(instance.class());
        while let Some(hash) = current {
            let class = self
                .classes
                .get(&hash)
                .ok_or(AccessError::UnknownClass { hash })?;
            if let Some(key_fn) = class.key_fn() {
                return Ok(key_fn(instance));
            }
            current = class.base();
        }
        Err(AccessError::MissingKey {
            class: self.class_name(instance.class()),
        })
    }

    /// Neither operand decided: equality falls back to identity, ordering
    /// has nowhere left to go.
    fn compare_fallback(
        &self,
        op: CompareOp,
        left: &Value,
        right: &Value,
    ) -> Result<bool, AccessError> {
        match op {
            CompareOp::Eq => Ok(left == right),
            CompareOp::Ne => Ok(left != right),
            _ => Err(AccessError::Unorderable {
                op,
                left: self.value_type_name(left),
                right: self.value_type_name(right),
            }),
        }
    }

    fn value_type_name(&self, value: &Value) -> String {
        match value {
            Value::Object(handle) => self
                .heap
                .get(*handle)
                .map(|instance| self.class_name(instance.class()))
                .unwrap_or_else(|| "object".to_string()),
            other => other.type_name().to_string(),
        }
    }
}

/// Evaluate an operation whose left operand is a plain (non-object) value.
///
/// Equality between plain values is always decided. Ordering is decided
/// only inside a domain that defines it (numbers with numbers, strings with
/// strings, ...); everything else defers so an object operand on the right
/// gets its chance, and pairs nobody can order end up as errors.
fn plain_compare(op: CompareOp, lhs: &Value, rhs: &Value) -> CmpOutcome {
    if matches!(rhs, Value::Object(_) | Value::Weak(_)) {
        return CmpOutcome::NotApplicable;
    }
    match op {
        CompareOp::Eq => CmpOutcome::Bool(lhs.eq_loose(rhs)),
        CompareOp::Ne => CmpOutcome::Bool(!lhs.eq_loose(rhs)),
        _ if !ordered_domain(lhs, rhs) => CmpOutcome::NotApplicable,
        _ => CmpOutcome::Bool(op.evaluate(lhs.try_cmp(rhs))),
    }
}

/// Whether two plain values live in a domain with a defined ordering.
fn ordered_domain(lhs: &Value, rhs: &Value) -> bool {
    use Value::*;
    matches!(
        (lhs, rhs),
        (Int(_) | Float(_), Int(_) | Float(_))
            | (Bool(_), Bool(_))
            | (Str(_), Str(_))
            | (Tuple(_), Tuple(_))
            | (Null, Null)
    )
}
