use crate::{model::PropertyTemplate, observer::Observer};
use parking_lot::Mutex;
use std::{fmt, sync::Arc};

///
/// PropertyObserver
///
/// Per-instance view of one property: its lazy-load state and the observer
/// of the value it last resolved to.
///

pub struct PropertyObserver {
    template: Arc<PropertyTemplate>,
    state: Mutex<PropertyState>,
}

struct PropertyState {
    lazy_load_pending: bool,
    resolved: Option<Observer>,
}

impl PropertyObserver {
    pub(crate) fn new(template: Arc<PropertyTemplate>, lazy: bool) -> Self {
        let lazy_load_pending = lazy && !template.is_non_reference();

        Self {
            template,
            state: Mutex::new(PropertyState {
                lazy_load_pending,
                resolved: None,
            }),
        }
    }

    #[must_use]
    pub const fn template(&self) -> &Arc<PropertyTemplate> {
        &self.template
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.template.name()
    }

    /// True while an object or collection property has not been read yet.
    #[must_use]
    pub fn is_lazy_load_pending(&self) -> bool {
        self.state.lock().lazy_load_pending
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        !self.is_lazy_load_pending()
    }

    pub(crate) fn mark_loaded(&self) {
        self.state.lock().lazy_load_pending = false;
    }

    /// Observer of the value this property pointed at when last resolved.
    #[must_use]
    pub fn resolved(&self) -> Option<Observer> {
        self.state.lock().resolved.clone()
    }

    pub(crate) fn set_resolved(&self, observer: Option<Observer>) {
        self.state.lock().resolved = observer;
    }

    /// Re-apply the lazy-load policy and drop any resolved value.
    pub(crate) fn reset(&self, lazy: bool) {
        let mut state = self.state.lock();
        state.lazy_load_pending = lazy && !self.template.is_non_reference();
        state.resolved = None;
    }
}

impl fmt::Debug for PropertyObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();

        f.debug_struct("PropertyObserver")
            .field("property", &self.template.full_name())
            .field("lazy_load_pending", &state.lazy_load_pending)
            .field("resolved", &state.resolved.as_ref().and_then(Observer::id))
            .finish()
    }
}
