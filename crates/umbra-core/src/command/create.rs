use crate::{
    command::{ActionResult, Tracked, track},
    proxy::{ObjectProxy, ProxyBuilder},
    types::TypeKey,
};

///
/// CreateObjectCommand
///
/// Constructs a new instance of a creatable class and observes it. The
/// returned proxy is the only strong handle to the instance, so the caller
/// decides how long it lives.
///

pub struct CreateObjectCommand<'a> {
    proxies: &'a ProxyBuilder,
}

impl<'a> CreateObjectCommand<'a> {
    #[must_use]
    pub const fn new(proxies: &'a ProxyBuilder) -> Self {
        Self { proxies }
    }

    pub fn invoke(&self, type_key: TypeKey) -> ActionResult<Tracked<ObjectProxy>> {
        let retriever = self.proxies.context().retriever();

        track(self.proxies, || {
            let template = retriever.cache().templates().class_template(type_key)?;
            let instance = template.create_instance()?;
            let observer = retriever.object_observer(&instance)?;
            tracing::debug!(observer = %observer.id(), r#type = template.name(), "object created");

            self.proxies.object_proxy(&observer)
        })
    }
}
