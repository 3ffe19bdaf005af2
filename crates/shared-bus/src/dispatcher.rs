//! # Event Dispatcher
//!
//! Ordered multimap from topic name to a stably sorted list of listener
//! records, with the three dispatch modes the chat engine relies on.
//!
//! | Mode | Handlers invoked | Stops when |
//! |------|------------------|------------|
//! | `notify` | `Handler::Notify` | never |
//! | `notify_until` | `Handler::Until` | a handler claims the event |
//! | `filter` | `Handler::Filter` | never; the last value wins |
//!
//! Handlers whose capability does not match the dispatch mode are skipped.

use crate::events::{Event, Payload};
use crate::listener::{Handler, Listener, ListenerId, Plugin};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

#[derive(Debug, Clone)]
struct ListenerRecord {
    id: ListenerId,
    priority: i32,
    handler: Handler,
}

/// Priority-ordered publish/transform bus.
///
/// Lower priority numbers run earlier; ties run in registration order.
/// Handlers are snapshotted before invocation, so a handler may attach or
/// detach listeners while an event is in flight.
#[derive(Debug, Default)]
pub struct Dispatcher {
    /// Listener records by topic, sorted by priority.
    listeners: RwLock<HashMap<String, Vec<ListenerRecord>>>,

    /// Counter for generating listener ids.
    next_id: AtomicU64,

    /// Total events dispatched.
    events_dispatched: AtomicU64,
}

impl Dispatcher {
    /// Create an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `topic` at `priority`.
    pub fn attach(&self, topic: impl Into<String>, handler: Handler, priority: i32) -> ListenerId {
        let topic = topic.into();
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let capability = handler.capability();

        let mut listeners = self.listeners.write();
        let records = listeners.entry(topic.clone()).or_default();
        // Insert after every record with an equal or lower priority.
        let position = records.partition_point(|record| record.priority <= priority);
        records.insert(
            position,
            ListenerRecord {
                id,
                priority,
                handler,
            },
        );

        debug!(
            topic = %topic,
            listener = id.0,
            priority,
            capability,
            "Listener attached"
        );
        id
    }

    /// Register a prepared listener.
    pub fn attach_listener(&self, listener: Listener) -> ListenerId {
        self.attach(listener.topic, listener.handler, listener.priority)
    }

    /// Register every listener contributed by `plugin`.
    pub fn attach_plugin(&self, plugin: Arc<dyn Plugin>) -> Vec<ListenerId> {
        let name = plugin.name();
        let ids: Vec<ListenerId> = plugin
            .listeners()
            .into_iter()
            .map(|listener| self.attach_listener(listener))
            .collect();
        debug!(plugin = name, listeners = ids.len(), "Plugin attached");
        ids
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn detach(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let mut removed = false;
        for records in listeners.values_mut() {
            let before = records.len();
            records.retain(|record| record.id != id);
            removed |= records.len() != before;
        }
        listeners.retain(|_, records| !records.is_empty());
        if removed {
            debug!(listener = id.0, "Listener detached");
        }
        removed
    }

    /// Broadcast `event` to every notify handler of its topic.
    pub fn notify(&self, mut event: Event) -> Event {
        for handler in self.snapshot(event.name()) {
            match handler {
                Handler::Notify(f) => f(&mut event),
                other => skip(&event, &other),
            }
        }
        event
    }

    /// Offer `event` to until handlers in priority order, stopping at the
    /// first one that claims it.
    pub fn notify_until(&self, mut event: Event) -> Event {
        for handler in self.snapshot(event.name()) {
            match handler {
                Handler::Until(f) => {
                    if f(&mut event) || event.is_processed() {
                        event.mark_processed();
                        break;
                    }
                }
                other => skip(&event, &other),
            }
        }
        event
    }

    /// Pipe `value` through every filter handler of the topic. The final
    /// value is stored as the event's return value.
    pub fn filter(&self, mut event: Event, value: Payload) -> Event {
        let mut value = value;
        for handler in self.snapshot(event.name()) {
            match handler {
                Handler::Filter(f) => value = f(&mut event, value),
                other => skip(&event, &other),
            }
        }
        event.set_return_value(value);
        event
    }

    /// Number of listeners registered for `topic`.
    #[must_use]
    pub fn listener_count(&self, topic: &str) -> usize {
        self.listeners.read().get(topic).map_or(0, Vec::len)
    }

    /// True if any listener is registered for `topic`.
    #[must_use]
    pub fn has_listeners(&self, topic: &str) -> bool {
        self.listener_count(topic) > 0
    }

    /// Total number of events dispatched so far.
    #[must_use]
    pub fn events_dispatched(&self) -> u64 {
        self.events_dispatched.load(Ordering::Relaxed)
    }

    fn snapshot(&self, topic: &str) -> Vec<Handler> {
        self.events_dispatched.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .read()
            .get(topic)
            .map(|records| records.iter().map(|r| r.handler.clone()).collect())
            .unwrap_or_default()
    }
}

fn skip(event: &Event, handler: &Handler) {
    trace!(
        topic = %event.name(),
        capability = handler.capability(),
        "Skipping handler with mismatched capability"
    );
}
