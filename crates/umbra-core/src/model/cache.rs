use crate::{
    config::IntrospectionConfig,
    error::Error,
    model::{
        ClassConfigurations, ClassTemplate, CollectionTemplate, Template, TemplateKey,
        ValueTemplate,
    },
    obs::sink::{self, MetricsEvent},
    types::TypeKey,
    value::{ScalarKind, Value},
};
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    sync::{Arc, OnceLock},
};

type Slot = Arc<OnceLock<Result<Template, Error>>>;

///
/// TemplateCache
///
/// Application-scoped registry of templates. Entries are built on first
/// lookup, exactly once per key, and are never evicted. A failed build is
/// cached too, so every caller sees the same configuration error.
///

#[derive(Debug)]
pub struct TemplateCache {
    introspection: IntrospectionConfig,
    configurations: ClassConfigurations,
    slots: Mutex<HashMap<TemplateKey, Slot>>,
}

impl TemplateCache {
    #[must_use]
    pub fn new(introspection: IntrospectionConfig, configurations: ClassConfigurations) -> Self {
        Self {
            introspection,
            configurations,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve the template for a key, building it on first use.
    pub fn get_template(&self, key: TemplateKey) -> Result<Template, Error> {
        // The map lock only guards slot lookup; builds run outside it so a
        // collection template may resolve its element template re-entrantly.
        let slot = Arc::clone(self.slots.lock().entry(key).or_default());

        slot.get_or_init(|| self.build(key)).clone()
    }

    pub fn class_template(&self, key: TypeKey) -> Result<Arc<ClassTemplate>, Error> {
        match self.get_template(TemplateKey::Class(key))? {
            Template::Class(template) => Ok(template),
            other => Err(Error::observer_invariant(format!(
                "template for {key} resolved to {}",
                other.name()
            ))),
        }
    }

    pub fn collection_template(&self, element: TypeKey) -> Result<Arc<CollectionTemplate>, Error> {
        match self.get_template(TemplateKey::Collection(element))? {
            Template::Collection(template) => Ok(template),
            other => Err(Error::observer_invariant(format!(
                "collection template for {element} resolved to {}",
                other.name()
            ))),
        }
    }

    #[must_use]
    pub fn value_template(&self, kind: ScalarKind) -> Arc<ValueTemplate> {
        match self.get_template(TemplateKey::Value(kind)) {
            Ok(Template::Value(template)) => template,
            _ => Arc::new(ValueTemplate::new(kind)),
        }
    }

    /// Template describing a runtime value; `None` for null.
    pub fn template_for(&self, value: &Value) -> Result<Option<Template>, Error> {
        let key = match value {
            Value::Null => return Ok(None),
            Value::Object(obj) => TemplateKey::Class(obj.type_key()),
            Value::Collection(coll) => TemplateKey::Collection(coll.element_type()),
            scalar => match scalar.scalar_kind() {
                Some(kind) => TemplateKey::Value(kind),
                None => return Ok(None),
            },
        };

        self.get_template(key).map(Some)
    }

    #[must_use]
    pub const fn introspection(&self) -> &IntrospectionConfig {
        &self.introspection
    }

    /// Number of resolved or in-flight entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    fn build(&self, key: TemplateKey) -> Result<Template, Error> {
        let template = match key {
            TemplateKey::Class(type_key) => {
                let declaration = type_key.declaration();
                let template = ClassTemplate::build(
                    type_key,
                    &declaration,
                    self.configurations.get(&type_key),
                    &self.introspection,
                )
                .inspect_err(|err| {
                    tracing::warn!(
                        class = %declaration.name(),
                        error = %err,
                        "template build failed"
                    );
                })?;

                Template::Class(Arc::new(template))
            }
            TemplateKey::Collection(element) => {
                let element = self.class_template(element)?;
                Template::Collection(Arc::new(CollectionTemplate::new(element)))
            }
            TemplateKey::Value(kind) => Template::Value(Arc::new(ValueTemplate::new(kind))),
        };

        tracing::debug!(template = %template.name(), "template built");
        sink::record(MetricsEvent::TemplateBuilt);

        Ok(template)
    }
}
