use super::*;
use crate::{
    config::IntrospectionConfig,
    error::{ConfigurationError, ErrorClass, ErrorDetail},
    test_fixtures::{Address, Customer, Order, OrderLine},
    traits::{Declare, DomainObject, MemberError},
    value::{Value, ValueKind},
};
use std::{sync::Barrier, thread};

fn cache() -> TemplateCache {
    TemplateCache::new(
        IntrospectionConfig::default(),
        ClassConfigurations::default(),
    )
}

fn cache_with(configuration: ClassConfiguration) -> TemplateCache {
    let mut configurations = ClassConfigurations::default();
    configurations
        .register(configuration)
        .expect("configuration should register");

    TemplateCache::new(IntrospectionConfig::default(), configurations)
}

macro_rules! inert_domain_object {
    ($name:ident) => {
        struct $name;

        impl DomainObject for $name {
            fn get(&self, name: &str) -> Result<Value, MemberError> {
                Err(MemberError::Unknown(name.to_string()))
            }

            fn set(&mut self, name: &str, _: Value) -> Result<(), MemberError> {
                Err(MemberError::Unknown(name.to_string()))
            }
        }
    };
}

inert_domain_object!(Conflicted);
inert_domain_object!(TwoKeys);
inert_domain_object!(Duplicated);

impl Declare for Conflicted {
    fn declaration() -> ClassDeclaration {
        ClassDeclaration::new("Conflicted").property(
            PropertyDeclaration::new("title", ValueKind::TEXT)
                .attribute(Attribute::MaxLength(10))
                .attribute(Attribute::MaxLength(12)),
        )
    }
}

impl Declare for TwoKeys {
    fn declaration() -> ClassDeclaration {
        ClassDeclaration::new("TwoKeys")
            .entity()
            .property(PropertyDeclaration::new("a", ValueKind::ULID).attribute(Attribute::Key))
            .property(PropertyDeclaration::new("b", ValueKind::ULID).attribute(Attribute::Key))
    }
}

impl Declare for Duplicated {
    fn declaration() -> ClassDeclaration {
        ClassDeclaration::new("Duplicated")
            .property(PropertyDeclaration::new("total", ValueKind::INT))
            .method(MethodDeclaration::new("total"))
    }
}

#[test]
fn template_is_built_once_per_type() {
    let cache = cache();

    let first = cache
        .class_template(TypeKey::of::<Customer>())
        .expect("customer template should build");
    let second = cache
        .class_template(TypeKey::of::<Customer>())
        .expect("customer template should resolve");

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.len(), 1);
}

#[test]
fn concurrent_lookups_observe_a_single_template() {
    let cache = Arc::new(cache());
    let barrier = Arc::new(Barrier::new(6));

    let templates: Vec<_> = (0..6)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                cache
                    .class_template(TypeKey::of::<Order>())
                    .expect("order template should build")
            })
        })
        .map(|handle| handle.join().expect("thread should not panic"))
        .collect();

    assert!(templates.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
}

#[test]
fn class_flags_follow_declaration_and_tracking_properties() {
    let cache = cache();
    let customer = cache
        .class_template(TypeKey::of::<Customer>())
        .expect("customer template should build");
    let address = cache
        .class_template(TypeKey::of::<Address>())
        .expect("address template should build");

    assert!(customer.is_entity());
    assert!(customer.is_aggregate_root());
    assert!(customer.is_persistable());
    assert!(customer.is_creatable());
    assert!(address.is_value_object());
    assert!(!address.is_persistable());
    assert!(!address.is_creatable());
}

#[test]
fn id_and_version_are_found_by_naming_convention_and_locked() {
    let cache = cache();
    let customer = cache
        .class_template(TypeKey::of::<Customer>())
        .expect("customer template should build");
    let order = cache
        .class_template(TypeKey::of::<Order>())
        .expect("order template should build");

    let id = customer.id_property().expect("customer should have an id");
    assert_eq!(id.name(), "id");
    assert!(!id.can_write());
    assert!(!id.is_visible());
    assert!(id.is_framework());

    let version = customer
        .version_property()
        .expect("customer should have a version");
    assert_eq!(version.name(), "version");
    assert!(!version.can_write());

    assert_eq!(order.id_property().map(|p| p.name()), Some("order_id"));
    assert!(order.version_property().is_none());
}

#[test]
fn explicit_key_attribute_wins_over_convention() {
    let cache = cache();
    let line = cache
        .class_template(TypeKey::of::<OrderLine>())
        .expect("line template should build");

    assert_eq!(line.id_property().map(|p| p.name()), Some("id"));
}

#[test]
fn two_explicit_keys_are_a_configuration_error() {
    let err = cache()
        .class_template(TypeKey::of::<TwoKeys>())
        .expect_err("two keys should fail");

    assert_eq!(err.class, ErrorClass::Configuration);
    assert!(matches!(
        err.detail,
        Some(ErrorDetail::Configuration(
            ConfigurationError::AmbiguousTrackingProperty { .. }
        ))
    ));
}

#[test]
fn conflicting_member_attributes_fail_every_lookup() {
    let cache = cache();

    for _ in 0..2 {
        let err = cache
            .class_template(TypeKey::of::<Conflicted>())
            .expect_err("conflicting attributes should fail");
        assert_eq!(
            err.message,
            "Conflicted.title declares 'max_length' more than once with conflicting values"
        );
    }
}

#[test]
fn duplicate_member_names_are_rejected() {
    let err = cache()
        .class_template(TypeKey::of::<Duplicated>())
        .expect_err("duplicate members should fail");

    assert!(err.is_configuration());
    assert!(err.message.contains("'total'"));
}

#[test]
fn configuration_overrides_declared_attributes() {
    let configuration = ClassConfiguration::for_type::<Customer>()
        .configure_property("name", [Attribute::MaxLength(20)])
        .and_then(|c| c.configure_parameter("rename", "first", [Attribute::Required(false)]))
        .expect("configuration should build");
    let cache = cache_with(configuration);

    let customer = cache
        .class_template(TypeKey::of::<Customer>())
        .expect("customer template should build");
    let name = customer.property("name").expect("name should exist");
    let rename = customer.method("rename").expect("rename should exist");

    assert_eq!(name.attributes().max_length(), Some(20));
    assert_eq!(
        name.attributes().entry(AttributeKind::MaxLength).map(|e| e.source),
        Some(AttributeSource::Configuration)
    );
    assert!(!rename.parameter("first").expect("first should exist").is_required());
}

#[test]
fn configuration_for_unknown_member_fails_the_build() {
    let configuration = ClassConfiguration::for_type::<Order>()
        .configure_method("cancel", [Attribute::Visible(false)])
        .expect("configuration should build");

    let err = cache_with(configuration)
        .class_template(TypeKey::of::<Order>())
        .expect_err("unknown method configuration should fail");

    assert!(err.is_configuration());
}

#[test]
fn member_templates_describe_kinds_and_relationships() {
    let cache = cache();
    let customer = cache
        .class_template(TypeKey::of::<Customer>())
        .expect("customer template should build");

    let orders = customer.property("orders").expect("orders should exist");
    assert!(orders.is_collection());
    assert!(!orders.is_non_reference());
    assert_eq!(orders.relationship(), Some(Relationship::Owns));

    let address = customer.property("address").expect("address should exist");
    assert!(address.is_domain_object());

    let email = customer.property("email").expect("email should exist");
    assert!(email.is_non_reference());
    assert_eq!(email.relationship(), None);

    let add_orders = customer.method("add_orders").expect("add_orders should exist");
    assert_eq!(add_orders.arity(), 1);
    assert_eq!(add_orders.returns(), Some(&ValueKind::INT));
}

#[test]
fn finalising_resolves_backing_fields() {
    let cache = cache();
    let customer = cache
        .class_template(TypeKey::of::<Customer>())
        .expect("customer template should build");

    assert!(!customer.is_finalised());
    customer.finalise();
    assert!(customer.is_finalised());

    let backing = |name: &str| {
        customer
            .property(name)
            .and_then(|p| p.backing_field_name().map(str::to_string))
    };
    assert_eq!(backing("name").as_deref(), Some("_name"));
    assert_eq!(backing("email").as_deref(), Some("m_email"));
    assert_eq!(backing("orders"), None);
}

#[test]
fn collection_template_wraps_element_template() {
    let cache = cache();
    let orders = cache
        .collection_template(TypeKey::of::<Order>())
        .expect("collection template should build");
    let order = cache
        .class_template(TypeKey::of::<Order>())
        .expect("order template should resolve");

    assert_eq!(orders.name(), "Collection<Order>");
    assert!(Arc::ptr_eq(orders.element(), &order));
}

#[test]
fn template_for_value_branches_on_runtime_kind() {
    let cache = cache();

    assert!(cache.template_for(&Value::Null).expect("null should resolve").is_none());
    let text = cache
        .template_for(&Value::text("hello"))
        .expect("text should resolve")
        .expect("text should have a template");
    assert_eq!(text.name(), "text");
    assert!(!text.is_class());
}

#[test]
fn create_instance_uses_declared_constructor() {
    let cache = cache();
    let order = cache
        .class_template(TypeKey::of::<Order>())
        .expect("order template should build");
    let address = cache
        .class_template(TypeKey::of::<Address>())
        .expect("address template should build");

    let instance = order.create_instance().expect("order should be creatable");
    assert_eq!(instance.type_key(), TypeKey::of::<Order>());

    let err = address
        .create_instance()
        .expect_err("address has no constructor");
    assert!(err.is_argument());
}
