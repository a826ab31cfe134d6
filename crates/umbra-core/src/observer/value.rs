use crate::{model::ValueTemplate, types::ObserverId, value::Value};
use std::sync::Arc;

///
/// ValueObserver
/// Observer for a scalar value. Scalars are cached by value and never change.
///

#[derive(Debug)]
pub struct ValueObserver {
    id: ObserverId,
    template: Arc<ValueTemplate>,
    value: Value,
}

impl ValueObserver {
    pub(crate) fn new(template: Arc<ValueTemplate>, value: Value) -> Self {
        Self {
            id: ObserverId::generate(),
            template,
            value,
        }
    }

    #[must_use]
    pub const fn id(&self) -> ObserverId {
        self.id
    }

    #[must_use]
    pub const fn template(&self) -> &Arc<ValueTemplate> {
        &self.template
    }

    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }
}
