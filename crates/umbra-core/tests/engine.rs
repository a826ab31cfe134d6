use std::sync::{Arc, Once};
use ulid::Ulid;
use umbra_core::{
    config::EngineConfig,
    persistence::MemoryPersistence,
    prelude::*,
    proxy::ChangeNotification,
};

fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

///
/// Parent
///

struct Parent {
    id: Ulid,
    name: String,
    children: CollectionRef,
}

impl Parent {
    fn new(name: &str) -> Self {
        Self {
            id: Ulid::new(),
            name: name.to_string(),
            children: CollectionRef::new::<Child>(),
        }
    }
}

impl Declare for Parent {
    fn declaration() -> ClassDeclaration {
        ClassDeclaration::new("Parent")
            .aggregate_root()
            .property(PropertyDeclaration::new("id", ValueKind::ULID))
            .property(PropertyDeclaration::new("name", ValueKind::TEXT))
            .property(
                PropertyDeclaration::new("children", ValueKind::collection::<Child>())
                    .attribute(Attribute::Relationship(Relationship::Owns)),
            )
            .method(MethodDeclaration::new("add_some_child_objects").returns(ValueKind::INT))
            .constructor(|| ObjectRef::new(Self::new("")))
    }
}

impl DomainObject for Parent {
    fn get(&self, name: &str) -> Result<Value, MemberError> {
        Ok(match name {
            "id" => Value::Ulid(self.id),
            "name" => Value::text(&self.name),
            "children" => Value::Collection(self.children.clone()),
            other => return Err(MemberError::Unknown(other.to_string())),
        })
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), MemberError> {
        match name {
            "id" => self.id = value.cast(name)?,
            "name" => self.name = value.cast(name)?,
            "children" => self.children = value.cast(name)?,
            other => return Err(MemberError::Unknown(other.to_string())),
        }

        Ok(())
    }

    fn invoke(&mut self, name: &str, _args: &[Value]) -> Result<Value, MemberError> {
        match name {
            "add_some_child_objects" => {
                for _ in 0..3 {
                    self.children.push(ObjectRef::new(Child::new("")));
                }
                Ok(Value::Int(3))
            }
            other => Err(MemberError::Unknown(other.to_string())),
        }
    }
}

///
/// Child
///

struct Child {
    id: Ulid,
    label: String,
}

impl Child {
    fn new(label: &str) -> Self {
        Self {
            id: Ulid::new(),
            label: label.to_string(),
        }
    }
}

impl Declare for Child {
    fn declaration() -> ClassDeclaration {
        ClassDeclaration::new("Child")
            .entity()
            .property(PropertyDeclaration::new("child_id", ValueKind::ULID))
            .property(PropertyDeclaration::new("label", ValueKind::TEXT))
            .constructor(|| ObjectRef::new(Self::new("")))
    }
}

impl DomainObject for Child {
    fn get(&self, name: &str) -> Result<Value, MemberError> {
        Ok(match name {
            "child_id" => Value::Ulid(self.id),
            "label" => Value::text(&self.label),
            other => return Err(MemberError::Unknown(other.to_string())),
        })
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), MemberError> {
        match name {
            "child_id" => self.id = value.cast(name)?,
            "label" => self.label = value.cast(name)?,
            other => return Err(MemberError::Unknown(other.to_string())),
        }

        Ok(())
    }
}

fn children_proxy(parent: &ObjectProxy) -> CollectionProxy {
    parent
        .get_collection("children")
        .expect("children should read")
        .expect("children is never null")
}

///
/// Tests
///

#[test]
fn a_checkpoint_reports_exactly_what_a_method_added() {
    init_tracing();
    let engine = Engine::new().expect("engine should build");
    let parent = ObjectRef::new(Parent::new("root"));
    let proxy = engine.proxy(&parent).expect("proxy should build");
    let checkpoint = engine.checkpoint();

    let tracked = engine
        .track(|| proxy.invoke("add_some_child_objects", &[]))
        .into_result()
        .expect("method should run");

    assert_eq!(tracked.value, Value::Int(3));
    let additions = &tracked.modifications.collection_additions;
    assert_eq!(additions.len(), 3);
    assert_eq!(tracked.modifications.new_objects.len(), 3);
    assert!(additions.windows(2).all(|pair| pair[0].sequence < pair[1].sequence));

    // reading modifications has no side effects
    let again = engine.modifications_since(checkpoint);
    assert_eq!(again.collection_additions.len(), 3);

    let last = additions.last().map(|add| add.sequence).expect("three additions");
    assert!(engine.modifications_since(last).is_empty());
}

#[test]
fn saving_is_all_or_nothing() {
    init_tracing();
    let store = Arc::new(
        MemoryPersistence::new()
            .register::<Parent>()
            .register::<Child>(),
    );
    let labels = ClassConfiguration::for_type::<Child>()
        .configure_property("label", [Attribute::MinLength(1)])
        .expect("label configuration should register");
    let engine = Engine::builder()
        .configure(labels)
        .expect("configuration should apply")
        .persistence(store.clone())
        .build()
        .expect("engine should build");
    let parent = ObjectRef::new(Parent::new("root"));
    let proxy = engine.proxy(&parent).expect("proxy should build");
    proxy
        .invoke("add_some_child_objects", &[])
        .expect("method should run");

    let rejected = engine.save(proxy.observer());

    assert!(rejected.is_failed());
    assert_eq!(rejected.messages().len(), 3);
    assert!(store.is_empty());
    assert!(proxy.observer().tracker().has_dirty_object_graph());

    let children = children_proxy(&proxy);
    for index in 0..children.len() {
        children
            .get(index)
            .expect("child should proxy")
            .expect("child exists")
            .set("label", format!("child {index}"))
            .expect("label should set");
    }
    let saved = engine.save(proxy.observer());

    assert!(saved.is_passed());
    assert_eq!(store.len(), 4);
    assert!(proxy.observer().tracker().is_persistent());
    assert!(!proxy.observer().tracker().has_dirty_object_graph());
    assert!(!children.observer().tracker().is_dirty());
}

#[test]
fn proxies_publish_collection_changes() {
    let engine = Engine::new().expect("engine should build");
    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let subscription = engine.subscribe(move |n| sink.lock().push(n.clone()));

    let parent = ObjectRef::new(Parent::new("root"));
    let proxy = engine.proxy(&parent).expect("proxy should build");
    let child = ObjectRef::new(Child::new("only"));
    children_proxy(&proxy).add(&child).expect("add should succeed");

    assert!(engine.unsubscribe(subscription));
    children_proxy(&proxy).remove(&child).expect("remove should succeed");

    let seen = seen.lock();
    assert_eq!(seen.len(), 1);
    assert!(matches!(
        seen[0],
        ChangeNotification::CollectionChanged { .. }
    ));
}

#[test]
fn configuration_loads_from_toml() {
    let config = EngineConfig::from_toml_str(
        "[tracking]\nlazy_load_persistent = false\n\n[identity]\nreject_duplicates = true\n",
    )
    .expect("configuration should parse");

    assert!(!config.tracking.lazy_load_persistent);
    assert!(config.identity.reject_duplicates);

    let store = Arc::new(MemoryPersistence::new().register::<Parent>());
    let engine = Engine::builder()
        .config(config)
        .persistence(store.clone())
        .build()
        .expect("engine should build");
    let parent = ObjectRef::new(Parent::new("root"));
    store.insert_persisted(&parent, None);

    let observer = engine.observe(&parent).expect("parent should observe");
    assert!(observer.tracker().is_persistent());
    assert!(
        !observer
            .property("children")
            .expect("children exists")
            .is_lazy_load_pending()
    );

    let err = EngineConfig::from_toml_str("[tracking]\nunknown = 1\n")
        .expect_err("unknown keys are rejected");
    assert!(err.to_string().contains("unknown"));
}

#[test]
fn ending_a_session_forgets_every_observer() {
    let engine = Engine::new().expect("engine should build");
    let parent = ObjectRef::new(Parent::new("root"));
    let first = engine.observe(&parent).expect("parent should observe");

    engine.end_session();
    let second = engine.observe(&parent).expect("parent should observe");

    assert!(!Arc::ptr_eq(&first, &second));
    assert!(engine.cache().len() >= 2);
}
