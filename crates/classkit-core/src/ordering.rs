//! Comparison operations synthesized from a key-extraction function.
//!
//! Writing six near-identical relational methods per class is tedious;
//! [`derive_keyed_ordering`] fills in whichever of the six a class does not
//! define by hand, deferring to the class's key function. Evaluation lives
//! in the object model, which also implements the reflected-operand fallback
//! when one side reports [`CmpOutcome::NotApplicable`].

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::class::ClassDef;
use crate::error::RegistrationError;
use crate::object::Instance;

/// The six relational operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl CompareOp {
    /// All six operations, in synthesis order.
    pub const ALL: [CompareOp; 6] = [
        CompareOp::Eq,
        CompareOp::Ne,
        CompareOp::Lt,
        CompareOp::Le,
        CompareOp::Gt,
        CompareOp::Ge,
    ];

    /// The operation that answers the same question with operands swapped.
    ///
    /// `a < b` holds exactly when `b > a`, so a right operand asked to
    /// handle a comparison the left could not evaluates the reflection.
    pub fn reflected(self) -> CompareOp {
        match self {
            CompareOp::Eq => CompareOp::Eq,
            CompareOp::Ne => CompareOp::Ne,
            CompareOp::Lt => CompareOp::Gt,
            CompareOp::Le => CompareOp::Ge,
            CompareOp::Gt => CompareOp::Lt,
            CompareOp::Ge => CompareOp::Le,
        }
    }

    /// Apply the operation to a (possibly undefined) ordering.
    ///
    /// An undefined ordering decides false for everything except `!=`,
    /// matching how unordered floating-point values behave.
    pub fn evaluate(self, ord: Option<Ordering>) -> bool {
        match self {
            CompareOp::Eq => matches!(ord, Some(Ordering::Equal)),
            CompareOp::Ne => !matches!(ord, Some(Ordering::Equal)),
            CompareOp::Lt => matches!(ord, Some(Ordering::Less)),
            CompareOp::Le => matches!(ord, Some(Ordering::Less | Ordering::Equal)),
            CompareOp::Gt => matches!(ord, Some(Ordering::Greater)),
            CompareOp::Ge => matches!(ord, Some(Ordering::Greater | Ordering::Equal)),
        }
    }

    /// Flag bit for this operation.
    pub fn flag(self) -> CompareOps {
        match self {
            CompareOp::Eq => CompareOps::EQ,
            CompareOp::Ne => CompareOps::NE,
            CompareOp::Lt => CompareOps::LT,
            CompareOp::Le => CompareOps::LE,
            CompareOp::Gt => CompareOps::GT,
            CompareOp::Ge => CompareOps::GE,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        };
        write!(f, "{}", s)
    }
}

bitflags::bitflags! {
    /// A set of relational operations.
    ///
    /// Classes record up front which operations are hand-written and which
    /// were filled in by synthesis, so no method-table introspection is ever
    /// needed at comparison time.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CompareOps: u8 {
        /// `==`
        const EQ = 1 << 0;
        /// `!=`
        const NE = 1 << 1;
        /// `<`
        const LT = 1 << 2;
        /// `<=`
        const LE = 1 << 3;
        /// `>`
        const GT = 1 << 4;
        /// `>=`
        const GE = 1 << 5;
    }
}

impl From<CompareOp> for CompareOps {
    fn from(op: CompareOp) -> Self {
        op.flag()
    }
}

/// Result of asking one operand to evaluate a comparison.
///
/// `NotApplicable` is a sentinel distinct from both true and false: it means
/// this operand cannot decide the comparison and the caller should try the
/// reflected operation on the other operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOutcome {
    /// The comparison was decided.
    Bool(bool),
    /// This operand cannot decide; defer to the other operand.
    NotApplicable,
}

impl CmpOutcome {
    /// Check if this outcome defers to the other operand.
    pub fn is_not_applicable(self) -> bool {
        matches!(self, CmpOutcome::NotApplicable)
    }
}

/// A hand-written comparison operation on a class.
///
/// Receives the two instances and either decides the comparison or defers
/// with [`CmpOutcome::NotApplicable`].
pub type Comparator = Arc<dyn Fn(&Instance, &Instance) -> CmpOutcome + Send + Sync>;

/// Fill in the missing relational operations of a class from its key
/// function.
///
/// Fails immediately if the class declares no key function; the error is
/// never deferred to the first comparison. Operations already hand-written
/// on the class are left untouched, and re-deriving is a no-op for
/// operations already synthesized. Returns the set of operations added by
/// this call.
pub fn derive_keyed_ordering(class: &mut ClassDef) -> Result<CompareOps, RegistrationError> {
    if !class.has_key() {
        return Err(RegistrationError::MissingKeyFn {
            class: class.name().to_string(),
        });
    }

    let mut added = CompareOps::empty();
    for op in CompareOp::ALL {
        if class.comparator(op).is_none() && !class.synthesized_ops().contains(op.flag()) {
            added |= op.flag();
        }
    }
    class.mark_synthesized(added);
    log::debug!(
        "derived {} comparison op(s) for class '{}'",
        added.bits().count_ones(),
        class.name()
    );
    Ok(added)
}
