//! Cross-view invalidation bus.
//!
//! Publishing a topic synchronously runs every handler registered for it,
//! in subscription order. There is no payload: a handler's only job is to
//! re-run its own fetch.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Any favorite, oshi toggle or visibility change touching lists.
    OshiListCatalogChanged,
    /// Any change to the viewer's series favorites.
    UserSeriesChanged,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::OshiListCatalogChanged => "oshi-list-catalog-changed",
            Topic::UserSeriesChanged => "user-series-changed",
        }
    }
}

type Handler = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: HashMap<Topic, Vec<(u64, Handler)>>,
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Cheap to clone; clones share the same registry.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<Mutex<Registry>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, topic: Topic, handler: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut registry = lock(&self.registry);
        let id = registry.next_id;
        registry.next_id += 1;
        registry
            .handlers
            .entry(topic)
            .or_default()
            .push((id, Arc::new(handler)));

        tracing::debug!(topic = topic.as_str(), subscription_id = id, "Subscribed");

        Subscription {
            topic,
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Notifies every live subscriber of `topic` and returns how many ran.
    ///
    /// Handlers run outside the registry lock, so they may subscribe or
    /// unsubscribe. A panicking handler is logged and the rest still run.
    pub fn publish(&self, topic: Topic) -> usize {
        let handlers: Vec<Handler> = lock(&self.registry)
            .handlers
            .get(&topic)
            .map(|handlers| handlers.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default();

        tracing::debug!(
            topic = topic.as_str(),
            handler_count = handlers.len(),
            "Publishing"
        );

        for (idx, handler) in handlers.iter().enumerate() {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| handler()));

            if result.is_err() {
                tracing::error!(topic = topic.as_str(), handler = idx, "Event handler panicked");
            }
        }

        handlers.len()
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        lock(&self.registry)
            .handlers
            .get(&topic)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = lock(&self.registry);
        let counts: HashMap<&'static str, usize> = registry
            .handlers
            .iter()
            .map(|(topic, handlers)| (topic.as_str(), handlers.len()))
            .collect();

        f.debug_struct("EventBus").field("subscribers", &counts).finish()
    }
}

/// Handle returned by [`EventBus::subscribe`].
///
/// Dropping the handle keeps the handler registered; call
/// [`Subscription::unsubscribe`] to remove it.
#[derive(Debug)]
pub struct Subscription {
    topic: Topic,
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn topic(&self) -> Topic {
        self.topic
    }

    pub fn unsubscribe(self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };

        let mut registry = lock(&registry);
        if let Some(handlers) = registry.handlers.get_mut(&self.topic) {
            handlers.retain(|(id, _)| *id != self.id);
        }

        tracing::debug!(topic = self.topic.as_str(), subscription_id = self.id, "Unsubscribed");
    }
}
