//! Integration tests for keyed-ordering synthesis and the comparison
//! protocol, including the reflected-operand fallback.

use classkit::prelude::*;

/// A span class keyed on `(start, end)`.
fn span_class() -> ClassDef {
    ClassDef::new("TimeSpan").with_key(|instance| {
        Value::Tuple(vec![
            instance.field("start").cloned().unwrap_or(Value::Null),
            instance.field("end").cloned().unwrap_or(Value::Null),
        ])
    })
}

fn make_span(model: &mut ObjectModel, class: TypeHash, start: i64, end: i64) -> ObjectHandle {
    let handle = model.instantiate(class).unwrap();
    model.set_attr(handle, "start", Value::Int(start)).unwrap();
    model.set_attr(handle, "end", Value::Int(end)).unwrap();
    handle
}

fn keyed_model() -> (ObjectModel, TypeHash) {
    let mut model = ObjectModel::new();
    let mut class = span_class();
    derive_keyed_ordering(&mut class).unwrap();
    let hash = model.register_class(class).unwrap();
    (model, hash)
}

// =============================================================================
// Synthesized Relational Operations
// =============================================================================

#[test]
fn keys_order_lexicographically() {
    let (mut model, class) = keyed_model();
    let a = make_span(&mut model, class, 1, 3);
    let b = make_span(&mut model, class, 2, 0);
    let left = Value::Object(a);
    let right = Value::Object(b);

    assert!(model.compare(CompareOp::Lt, &left, &right).unwrap());
    assert!(model.compare(CompareOp::Le, &left, &right).unwrap());
    assert!(!model.compare(CompareOp::Gt, &left, &right).unwrap());
    assert!(!model.compare(CompareOp::Ge, &left, &right).unwrap());

    assert!(model.compare(CompareOp::Gt, &right, &left).unwrap());
    assert!(model.compare(CompareOp::Ge, &right, &left).unwrap());
    assert!(!model.compare(CompareOp::Lt, &right, &left).unwrap());
}

#[test]
fn equality_follows_key_equality() {
    let (mut model, class) = keyed_model();
    let a = make_span(&mut model, class, 1, 3);
    let b = make_span(&mut model, class, 2, 0);
    let c = make_span(&mut model, class, 1, 3);

    assert!(!model.compare(CompareOp::Eq, &Value::Object(a), &Value::Object(b)).unwrap());
    assert!(model.compare(CompareOp::Ne, &Value::Object(a), &Value::Object(b)).unwrap());
    assert!(model.compare(CompareOp::Eq, &Value::Object(a), &Value::Object(c)).unwrap());
    assert!(!model.compare(CompareOp::Ne, &Value::Object(a), &Value::Object(c)).unwrap());
}

#[test]
fn comparing_against_a_raw_value_never_panics_and_is_not_equal() {
    let (mut model, class) = keyed_model();
    let a = make_span(&mut model, class, 1, 3);
    let raw = Value::Tuple(vec![Value::Int(1), Value::Int(3)]);

    // Same shape as the key, but not an instance: not equal.
    assert!(!model.compare(CompareOp::Eq, &Value::Object(a), &raw).unwrap());
    assert!(model.compare(CompareOp::Ne, &Value::Object(a), &raw).unwrap());
}

#[test]
fn ordering_against_a_raw_value_is_unorderable() {
    let (mut model, class) = keyed_model();
    let a = make_span(&mut model, class, 1, 3);

    let err = model
        .compare(CompareOp::Lt, &Value::Object(a), &Value::Int(1))
        .unwrap_err();
    assert!(matches!(err, AccessError::Unorderable { .. }));

    let err = model
        .compare(CompareOp::Ge, &Value::Int(1), &Value::Object(a))
        .unwrap_err();
    assert!(matches!(err, AccessError::Unorderable { .. }));
}

#[test]
fn instances_of_unrelated_classes_are_unorderable_but_unequal() {
    let (mut model, span) = keyed_model();
    let mut other_class = ClassDef::new("Point").with_key(|_| Value::Int(0));
    derive_keyed_ordering(&mut other_class).unwrap();
    let point = model.register_class(other_class).unwrap();

    let a = make_span(&mut model, span, 1, 3);
    let b = model.instantiate(point).unwrap();

    assert!(!model.compare(CompareOp::Eq, &Value::Object(a), &Value::Object(b)).unwrap());
    let err = model
        .compare(CompareOp::Lt, &Value::Object(a), &Value::Object(b))
        .unwrap_err();
    assert!(matches!(err, AccessError::Unorderable { .. }));
}

// =============================================================================
// Hand-Written Operations Are Preserved
// =============================================================================

#[test]
fn user_defined_eq_is_left_untouched() {
    let mut model = ObjectModel::new();
    let mut class = span_class()
        // Pathological on purpose: everything is equal.
        .with_comparator(CompareOp::Eq, |_, _| CmpOutcome::Bool(true));
    derive_keyed_ordering(&mut class).unwrap();
    let hash = model.register_class(class).unwrap();

    let a = make_span(&mut model, hash, 1, 3);
    let b = make_span(&mut model, hash, 2, 0);

    // The hand-written operation answers for `==` ...
    assert!(model.compare(CompareOp::Eq, &Value::Object(a), &Value::Object(b)).unwrap());
    // ... while `<` still follows key order.
    assert!(model.compare(CompareOp::Lt, &Value::Object(a), &Value::Object(b)).unwrap());
    // `!=` was synthesized separately and follows the keys too.
    assert!(model.compare(CompareOp::Ne, &Value::Object(a), &Value::Object(b)).unwrap());
}

#[test]
fn reflected_operand_handles_what_the_left_cannot() {
    let mut model = ObjectModel::new();
    let plain = model.register_class(ClassDef::new("Plain")).unwrap();
    let eager = model
        .register_class(
            ClassDef::new("Eager")
                .with_comparator(CompareOp::Gt, |_, _| CmpOutcome::Bool(true)),
        )
        .unwrap();

    let left = model.instantiate(plain).unwrap();
    let right = model.instantiate(eager).unwrap();

    // `Plain` has no operations, so `left < right` is answered by the
    // reflected `right > left`.
    assert!(model
        .compare(CompareOp::Lt, &Value::Object(left), &Value::Object(right))
        .unwrap());
}

// =============================================================================
// Synthesis Preconditions and Application
// =============================================================================

#[test]
fn deriving_without_a_key_fails_before_any_instance_exists() {
    let mut class = ClassDef::new("Keyless");
    let err = derive_keyed_ordering(&mut class).unwrap_err();
    assert!(matches!(err, RegistrationError::MissingKeyFn { .. }));
}

#[test]
fn deriving_through_the_model_transforms_a_registered_class() {
    let mut model = ObjectModel::new();
    let hash = model.register_class(span_class()).unwrap();

    // Before the transformation the class has no comparison behavior.
    let a = make_span(&mut model, hash, 1, 3);
    let b = make_span(&mut model, hash, 2, 0);
    let err = model
        .compare(CompareOp::Lt, &Value::Object(a), &Value::Object(b))
        .unwrap_err();
    assert!(matches!(err, AccessError::Unorderable { .. }));

    let added = model.derive_ordering(hash).unwrap();
    assert_eq!(added, CompareOps::all());
    assert!(model.compare(CompareOp::Lt, &Value::Object(a), &Value::Object(b)).unwrap());
}

#[test]
fn subclasses_compare_against_the_base() {
    let (mut model, span) = keyed_model();
    let meeting = model
        .register_class(ClassDef::new("Meeting").with_base(span))
        .unwrap();

    let base = make_span(&mut model, span, 1, 3);
    let derived = make_span(&mut model, meeting, 2, 0);

    // The instance-of guard accepts subclasses in both directions.
    assert!(model.compare(CompareOp::Lt, &Value::Object(base), &Value::Object(derived)).unwrap());
    assert!(model.compare(CompareOp::Gt, &Value::Object(derived), &Value::Object(base)).unwrap());
}

#[test]
fn subclass_key_override_participates_in_base_comparisons() {
    let (mut model, span) = keyed_model();
    let reversed = model
        .register_class(
            ClassDef::new("ReversedSpan").with_base(span).with_key(|instance| {
                Value::Tuple(vec![
                    instance.field("end").cloned().unwrap_or(Value::Null),
                    instance.field("start").cloned().unwrap_or(Value::Null),
                ])
            }),
        )
        .unwrap();

    let base = make_span(&mut model, span, 1, 3);
    let derived = make_span(&mut model, reversed, 2, 0);

    // The derived instance's key is (0, 2), so it sorts before (1, 3).
    assert!(model.compare(CompareOp::Lt, &Value::Object(derived), &Value::Object(base)).unwrap());
}

// =============================================================================
// Key Edge Cases
// =============================================================================

#[test]
fn incomparable_keys_error_on_ordering_but_decide_equality() {
    let mut model = ObjectModel::new();
    let mut class = ClassDef::new("Mixed").with_key(|instance| {
        instance.field("key").cloned().unwrap_or(Value::Null)
    });
    derive_keyed_ordering(&mut class).unwrap();
    let hash = model.register_class(class).unwrap();

    let a = model.instantiate(hash).unwrap();
    let b = model.instantiate(hash).unwrap();
    model.set_attr(a, "key", Value::Int(1)).unwrap();
    model.set_attr(b, "key", Value::from("one")).unwrap();

    let err = model
        .compare(CompareOp::Lt, &Value::Object(a), &Value::Object(b))
        .unwrap_err();
    assert!(matches!(err, AccessError::IncomparableKeys { .. }));
    assert!(!model.compare(CompareOp::Eq, &Value::Object(a), &Value::Object(b)).unwrap());
}

#[test]
fn sorting_by_synthesized_ordering() {
    let (mut model, class) = keyed_model();
    let mut spans = vec![
        make_span(&mut model, class, 3, 1),
        make_span(&mut model, class, 1, 3),
        make_span(&mut model, class, 2, 0),
        make_span(&mut model, class, 1, 0),
    ];

    spans.sort_by(|a, b| {
        if model
            .compare(CompareOp::Lt, &Value::Object(*a), &Value::Object(*b))
            .unwrap()
        {
            std::cmp::Ordering::Less
        } else if model
            .compare(CompareOp::Eq, &Value::Object(*a), &Value::Object(*b))
            .unwrap()
        {
            std::cmp::Ordering::Equal
        } else {
            std::cmp::Ordering::Greater
        }
    });

    let starts: Vec<Value> = spans
        .iter()
        .map(|handle| model.instance(*handle).unwrap().field("start").cloned().unwrap())
        .collect();
    assert_eq!(
        starts,
        vec![Value::Int(1), Value::Int(1), Value::Int(2), Value::Int(3)]
    );
}
