//! Named-topic publish/subscribe with synchronous, ordered delivery.
//!
//! The bus is the only transport between overlay components: the logger
//! publishes render events, modals publish lifecycle events, and the console
//! is a pure subscriber. Delivery is synchronous on the publisher's call
//! stack, in subscription order, with no priorities, no async dispatch, and
//! no cancellation beyond [`EventBus::unsubscribe`].
//!
//! # Topics
//!
//! A topic is created implicitly on first subscription and lives for the
//! bus's lifetime (unsubscribing every handler leaves an empty topic behind,
//! which is still publishable). Publishing to a topic that has *never* been
//! subscribed to returns [`EventError::TopicNotFound`] unless the bus was
//! constructed silent, in which case it is a no-op.
//!
//! # Re-entrancy
//!
//! Handlers may subscribe, unsubscribe, and publish from inside a delivery.
//! Dispatch iterates over a snapshot of the topic's handler list, so
//! mutations made during delivery take effect on the next publish, never on
//! the in-flight one.
//!
//! # Example
//!
//! ```
//! use kibitz_core::{EventBus, Handler};
//! use serde_json::json;
//!
//! let bus = EventBus::new(false);
//! bus.subscribe("gui/log", Handler::new(|data, topic| {
//!     assert_eq!(topic, "gui/log");
//!     assert_eq!(data["msg"], "hello");
//! }));
//! bus.publish("gui/log", &json!({ "msg": "hello" })).unwrap();
//! ```

use crate::error::EventError;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A subscribable event handler.
///
/// Cheap to clone; clones share identity. Identity (not name, not equality of
/// behavior) is what [`EventBus::unsubscribe`] matches on, so keep a clone of
/// the handler you subscribed if you intend to remove it later.
#[derive(Clone)]
pub struct Handler {
    f: Arc<dyn Fn(&Value, &str) + Send + Sync>,
}

impl Handler {
    /// Wrap a closure taking `(data, topic)`.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value, &str) + Send + Sync + 'static,
    {
        Self { f: Arc::new(f) }
    }

    /// Whether two handles refer to the same underlying handler.
    #[must_use]
    pub fn same(&self, other: &Handler) -> bool {
        Arc::ptr_eq(&self.f, &other.f)
    }

    fn call(&self, data: &Value, topic: &str) {
        (self.f)(data, topic)
    }
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Handler({:p})", Arc::as_ptr(&self.f))
    }
}

#[derive(Clone)]
struct Subscription {
    handler: Handler,
    once: bool,
    /// Set the moment a one-shot subscription is claimed by a delivery, so a
    /// re-entrant publish of the same topic cannot fire it a second time.
    spent: Arc<AtomicBool>,
}

/// The topic registry.
///
/// Intended usage is one bus per overlay instance, wrapped in `Arc` and
/// injected into every component that publishes or subscribes.
pub struct EventBus {
    topics: Mutex<HashMap<String, Vec<Subscription>>>,
    silent: bool,
}

impl EventBus {
    /// Create a bus. `silent` suppresses the unknown-topic publish error
    /// (configuration option `events.silent`).
    #[must_use]
    pub fn new(silent: bool) -> Self {
        Self {
            topics: Mutex::new(HashMap::new()),
            silent,
        }
    }

    /// Register `handler` under `topic`, creating the topic if absent.
    ///
    /// No de-duplication: subscribing the same handler twice makes it fire
    /// twice per publish.
    pub fn subscribe(&self, topic: &str, handler: Handler) {
        self.insert(topic, handler, false);
    }

    /// Register a one-shot handler: it is removed after its first delivery.
    pub fn subscribe_once(&self, topic: &str, handler: Handler) {
        self.insert(topic, handler, true);
    }

    fn insert(&self, topic: &str, handler: Handler, once: bool) {
        let sub = Subscription {
            handler,
            once,
            spent: Arc::new(AtomicBool::new(false)),
        };
        self.topics
            .lock()
            .entry(topic.to_string())
            .or_default()
            .push(sub);
    }

    /// Remove the first subscription under `topic` whose handler is
    /// identity-equal to `handler`. No-op when nothing matches.
    pub fn unsubscribe(&self, topic: &str, handler: &Handler) {
        let mut topics = self.topics.lock();
        if let Some(subs) = topics.get_mut(topic) {
            if let Some(pos) = subs.iter().position(|s| s.handler.same(handler)) {
                subs.remove(pos);
            }
        }
    }

    /// Invoke every handler registered for `topic` in subscription order,
    /// passing `(data, topic)`.
    ///
    /// # Errors
    ///
    /// [`EventError::TopicNotFound`] when the topic has never been subscribed
    /// to and the bus is not silent.
    pub fn publish(&self, topic: &str, data: &Value) -> Result<(), EventError> {
        let snapshot: Vec<Subscription> = {
            let topics = self.topics.lock();
            match topics.get(topic) {
                Some(subs) => subs.clone(),
                None if self.silent => return Ok(()),
                None => return Err(EventError::TopicNotFound(topic.to_string())),
            }
        };

        let mut fired_once = false;
        for sub in &snapshot {
            if sub.once && sub.spent.swap(true, Ordering::Relaxed) {
                continue;
            }
            sub.handler.call(data, topic);
            fired_once |= sub.once;
        }

        if fired_once {
            let mut topics = self.topics.lock();
            if let Some(subs) = topics.get_mut(topic) {
                subs.retain(|s| !s.spent.load(Ordering::Relaxed));
            }
        }
        Ok(())
    }

    /// Number of live subscriptions under `topic` (0 when the topic has
    /// never been created).
    #[must_use]
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics.lock().get(topic).map_or(0, Vec::len)
    }

    /// Whether the topic has ever been subscribed to.
    #[must_use]
    pub fn topic_exists(&self, topic: &str) -> bool {
        self.topics.lock().contains_key(topic)
    }

    /// Whether unknown-topic publishes are suppressed.
    #[must_use]
    pub fn is_silent(&self) -> bool {
        self.silent
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("topics", &self.topics.lock().len())
            .field("silent", &self.silent)
            .finish()
    }
}

/// Wrap a non-object payload as `{"data": ...}` so downstream formatting has
/// a uniform shape to render. Objects pass through unchanged. This is purely
/// a presentation convenience — the bus always delivers the caller's value
/// as published.
#[must_use]
pub fn envelope(data: &Value) -> Value {
    if data.is_object() {
        data.clone()
    } else {
        json!({ "data": data })
    }
}
