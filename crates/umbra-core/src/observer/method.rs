use crate::{
    error::{ArgumentError, Error, ErrorOrigin},
    model::MethodTemplate,
    types::{ObjectRef, WeakObjectRef},
    value::Value,
};
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

///
/// MethodObserver
///
/// Holds the parameter values staged for one method of one instance until
/// the method is invoked.
///

#[derive(Debug)]
pub struct MethodObserver {
    template: Arc<MethodTemplate>,
    target: RwLock<WeakObjectRef>,
    parameters: Mutex<IndexMap<String, Option<Value>>>,
}

impl MethodObserver {
    pub(crate) fn new(template: Arc<MethodTemplate>, target: &ObjectRef) -> Self {
        let parameters = template
            .parameters()
            .map(|parameter| (parameter.name().to_string(), None))
            .collect();

        Self {
            template,
            target: RwLock::new(target.downgrade()),
            parameters: Mutex::new(parameters),
        }
    }

    #[must_use]
    pub const fn template(&self) -> &Arc<MethodTemplate> {
        &self.template
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.template.name()
    }

    /// Stage a parameter value. The value must match the declared kind.
    pub fn set_parameter(&self, name: &str, value: impl Into<Value>) -> Result<(), Error> {
        let value = value.into();
        let Some(parameter) = self.template.parameter(name) else {
            return Err(Error::unknown_member(
                ErrorOrigin::Observer,
                &self.template.full_name(),
                name,
            ));
        };

        if !value.matches(parameter.kind()) {
            return Err(ArgumentError::KindMismatch {
                owner: self.template.full_name(),
                member: name.to_string(),
                expected: parameter.kind().to_string(),
                actual: value.kind_label(),
            }
            .into_error(ErrorOrigin::Observer));
        }

        self.parameters.lock().insert(name.to_string(), Some(value));

        Ok(())
    }

    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<Value> {
        self.parameters.lock().get(name).cloned().flatten()
    }

    /// Required parameters that are unset or null, in declaration order.
    #[must_use]
    pub fn missing_required_parameters(&self) -> Vec<String> {
        let staged = self.parameters.lock();

        self.template
            .parameters()
            .filter(|parameter| parameter.is_required())
            .filter(|parameter| {
                staged
                    .get(parameter.name())
                    .and_then(Option::as_ref)
                    .is_none_or(Value::is_null)
            })
            .map(|parameter| parameter.name().to_string())
            .collect()
    }

    /// Positional arguments; unset parameters become null.
    #[must_use]
    pub fn arguments(&self) -> Vec<Value> {
        let staged = self.parameters.lock();

        self.template
            .parameters()
            .map(|parameter| {
                staged
                    .get(parameter.name())
                    .cloned()
                    .flatten()
                    .unwrap_or(Value::Null)
            })
            .collect()
    }

    pub fn reset_parameters(&self) {
        for value in self.parameters.lock().values_mut() {
            *value = None;
        }
    }

    #[must_use]
    pub fn target(&self) -> Option<ObjectRef> {
        self.target.read().upgrade()
    }

    pub(crate) fn rebind(&self, target: &ObjectRef) {
        *self.target.write() = target.downgrade();
    }
}
