use super::*;
use crate::test_fixtures::{Customer, Order};
use std::collections::HashSet;

#[test]
fn reference_values_compare_by_identity() {
    let a = ObjectRef::new(Order::new("A-1"));
    let b = ObjectRef::new(Order::new("A-1"));

    assert_eq!(Value::Object(a.clone()), Value::Object(a.clone()));
    assert_ne!(Value::Object(a), Value::Object(b));
}

#[test]
fn floats_hash_and_compare_by_bits() {
    let mut set = HashSet::new();
    set.insert(Value::Float(f64::NAN));
    set.insert(Value::Float(f64::NAN));
    set.insert(Value::Float(1.5));

    assert_eq!(set.len(), 2);
}

#[test]
fn null_matches_every_kind() {
    assert!(Value::Null.matches(&ValueKind::TEXT));
    assert!(Value::Null.matches(&ValueKind::object::<Order>()));
    assert!(Value::Null.matches(&ValueKind::collection::<Order>()));
}

#[test]
fn object_values_match_only_their_declared_type() {
    let order = Value::Object(ObjectRef::new(Order::new("B-2")));

    assert!(order.matches(&ValueKind::object::<Order>()));
    assert!(!order.matches(&ValueKind::object::<Customer>()));
    assert!(!order.matches(&ValueKind::collection::<Order>()));
    assert!(!order.matches(&ValueKind::TEXT));
}

#[test]
fn cast_reports_member_and_actual_kind() {
    let err = Value::Int(4)
        .cast::<String>("name")
        .expect_err("int should not cast to text");

    assert_eq!(
        err,
        MemberError::InvalidValue {
            member: "name".to_string(),
            actual: "int".to_string(),
        }
    );
}

#[test]
fn optional_cast_accepts_null() {
    let email: Option<String> = Value::Null.cast("email").expect("null should cast to None");
    assert_eq!(email, None);

    let email: Option<String> = Value::text("a@b.c")
        .cast("email")
        .expect("text should cast to Some");
    assert_eq!(email.as_deref(), Some("a@b.c"));
}

#[test]
fn kind_labels_name_referenced_types() {
    assert_eq!(
        ValueKind::collection::<Order>().to_string(),
        "collection<Order>"
    );
    assert_eq!(Value::text("x").kind_label(), "text");
    assert_eq!(Value::Null.kind_label(), "null");
}
