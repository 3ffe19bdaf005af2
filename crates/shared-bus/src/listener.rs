//! # Listeners
//!
//! Capability-tagged handlers registered against topics with an explicit
//! priority, and the `Plugin` trait bundling a set of them.

use crate::events::{Event, Payload};
use crate::DEFAULT_PRIORITY;
use std::fmt;
use std::sync::Arc;

/// Broadcast handler; return value ignored.
pub type NotifyFn = dyn Fn(&mut Event) + Send + Sync;

/// First-responder handler; `true` claims the event and stops propagation.
pub type UntilFn = dyn Fn(&mut Event) -> bool + Send + Sync;

/// Transform handler; receives the current value and returns the next.
pub type FilterFn = dyn Fn(&mut Event, Payload) -> Payload + Send + Sync;

/// A handler tagged with the dispatch mode it answers to.
#[derive(Clone)]
pub enum Handler {
    /// Invoked by `Dispatcher::notify`.
    Notify(Arc<NotifyFn>),
    /// Invoked by `Dispatcher::notify_until`.
    Until(Arc<UntilFn>),
    /// Invoked by `Dispatcher::filter`.
    Filter(Arc<FilterFn>),
}

impl Handler {
    /// Wrap a broadcast closure.
    pub fn notify<F>(f: F) -> Self
    where
        F: Fn(&mut Event) + Send + Sync + 'static,
    {
        Self::Notify(Arc::new(f))
    }

    /// Wrap a first-responder closure.
    pub fn until<F>(f: F) -> Self
    where
        F: Fn(&mut Event) -> bool + Send + Sync + 'static,
    {
        Self::Until(Arc::new(f))
    }

    /// Wrap a transform closure.
    pub fn filter<F>(f: F) -> Self
    where
        F: Fn(&mut Event, Payload) -> Payload + Send + Sync + 'static,
    {
        Self::Filter(Arc::new(f))
    }

    /// Capability name, for logging.
    #[must_use]
    pub fn capability(&self) -> &'static str {
        match self {
            Self::Notify(_) => "notify",
            Self::Until(_) => "until",
            Self::Filter(_) => "filter",
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler::{}", self.capability())
    }
}

/// Handle returned by registration, used to detach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// A registration request: topic, handler and priority.
#[derive(Debug, Clone)]
pub struct Listener {
    /// Topic name.
    pub topic: String,
    /// The handler.
    pub handler: Handler,
    /// Lower runs earlier.
    pub priority: i32,
}

impl Listener {
    /// Listener at the default priority.
    pub fn new(topic: impl Into<String>, handler: Handler) -> Self {
        Self::with_priority(topic, handler, DEFAULT_PRIORITY)
    }

    /// Listener at an explicit priority.
    pub fn with_priority(topic: impl Into<String>, handler: Handler, priority: i32) -> Self {
        Self {
            topic: topic.into(),
            handler,
            priority,
        }
    }
}

/// A bundle of listeners contributed by one extension.
///
/// `listeners` takes `Arc<Self>` so handlers can capture the plugin.
///
/// # Example
///
/// ```rust,ignore
/// struct AcceptAll;
///
/// impl Plugin for AcceptAll {
///     fn name(&self) -> &'static str { "accept-all" }
///     fn listeners(self: Arc<Self>) -> Vec<Listener> {
///         vec![Listener::new(topics::AUTH_CHECK, Handler::until(|_| true))]
///     }
/// }
/// ```
pub trait Plugin: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// The listeners to register.
    fn listeners(self: Arc<Self>) -> Vec<Listener>;
}
