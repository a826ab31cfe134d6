use super::*;
use crate::test_fixtures::{Customer, Order};

#[test]
fn type_key_identity_follows_rust_type() {
    assert_eq!(TypeKey::of::<Order>(), TypeKey::of::<Order>());
    assert_ne!(TypeKey::of::<Order>(), TypeKey::of::<Customer>());
    assert_eq!(TypeKey::of::<Order>().short_name(), "Order");
}

#[test]
fn weak_handles_expire_with_the_instance() {
    let order = ObjectRef::new(Order::new("W-1"));
    let weak = order.downgrade();

    assert!(weak.is_alive());
    assert!(weak.refers_to(&order));

    drop(order);

    assert!(!weak.is_alive());
    assert!(weak.upgrade().is_none());
}

#[test]
fn collection_remove_only_drops_first_match() {
    let orders = CollectionRef::new::<Order>();
    let a = ObjectRef::new(Order::new("A"));
    let b = ObjectRef::new(Order::new("B"));

    orders.push(a.clone());
    orders.push(b.clone());
    orders.push(a.clone());

    assert!(orders.remove(&a));
    assert_eq!(orders.items(), vec![b, a.clone()]);
    assert!(orders.contains(&a));
}

#[test]
fn collection_items_are_a_detached_copy() {
    let orders = CollectionRef::new::<Order>();
    orders.push(ObjectRef::new(Order::new("C")));

    let copy = orders.items();
    orders.replace(Vec::new());

    assert_eq!(copy.len(), 1);
    assert!(orders.is_empty());
}

#[test]
fn typed_access_downcasts_to_concrete_type() {
    let order = ObjectRef::new(Order::new("D-4"));

    let code = order.with(|o: &Order| o.code.clone());
    assert_eq!(code.as_deref(), Some("D-4"));

    let wrong = order.with(|_: &Customer| ());
    assert!(wrong.is_none());
}

#[test]
fn observer_ids_are_unique() {
    assert_ne!(ObserverId::generate(), ObserverId::generate());
}
