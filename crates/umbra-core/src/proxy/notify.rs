use crate::types::ObserverId;
use parking_lot::RwLock;
use serde::Serialize;
use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

///
/// CollectionAction
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum CollectionAction {
    Added,
    Removed,
}

///
/// ChangeNotification
/// Published after a proxied mutation has reached the wrapped instance.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub enum ChangeNotification {
    PropertyChanged {
        object: ObserverId,
        property: String,
    },
    MethodInvoked {
        object: ObserverId,
        method: String,
    },
    CollectionChanged {
        collection: ObserverId,
        action: CollectionAction,
        element: Option<ObserverId>,
    },
}

///
/// SubscriptionId
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct SubscriptionId(u64);

type Subscriber = Arc<dyn Fn(&ChangeNotification) + Send + Sync>;

///
/// ChangeNotifier
///
/// Fan-out of change notifications to registered listeners. Listeners run
/// outside the registry lock and may subscribe or unsubscribe re-entrantly.
///

#[derive(Default)]
pub struct ChangeNotifier {
    next_id: AtomicU64,
    subscribers: RwLock<Vec<(SubscriptionId, Subscriber)>>,
}

impl ChangeNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&ChangeNotification) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.write().push((id, Arc::new(listener)));

        id
    }

    /// Returns false when the subscription was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|(existing, _)| *existing != id);

        subscribers.len() != before
    }

    pub fn publish(&self, notification: &ChangeNotification) {
        let listeners: Vec<Subscriber> = self
            .subscribers
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            listener(notification);
        }
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn sample(property: &str) -> ChangeNotification {
        ChangeNotification::PropertyChanged {
            object: ObserverId::generate(),
            property: property.to_string(),
        }
    }

    #[test]
    fn publish_reaches_every_subscriber_in_order() {
        let notifier = ChangeNotifier::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second"] {
            let seen = Arc::clone(&seen);
            notifier.subscribe(move |_| seen.lock().push(tag));
        }
        notifier.publish(&sample("name"));

        assert_eq!(*seen.lock(), vec!["first", "second"]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let notifier = ChangeNotifier::new();
        let count = Arc::new(AtomicU64::new(0));

        let id = {
            let count = Arc::clone(&count);
            notifier.subscribe(move |_| {
                count.fetch_add(1, Ordering::Relaxed);
            })
        };
        notifier.publish(&sample("name"));

        assert!(notifier.unsubscribe(id));
        assert!(
            !notifier.unsubscribe(id),
            "second unsubscribe should be a no-op"
        );
        notifier.publish(&sample("name"));

        assert_eq!(count.load(Ordering::Relaxed), 1);
        assert_eq!(notifier.subscriber_count(), 0);
    }

    #[test]
    fn listener_may_subscribe_while_publishing() {
        let notifier = Arc::new(ChangeNotifier::new());
        let inner = Arc::clone(&notifier);
        notifier.subscribe(move |_| {
            inner.subscribe(|_| {});
        });

        notifier.publish(&sample("email"));

        assert_eq!(notifier.subscriber_count(), 2);
    }
}
