//! # Subscriber Registry
//!
//! The set of waiting long-poll/socket subscribers.
//!
//! A subscription is present iff it has not been offered a deliverable
//! message since its last attach. Fan-out follows a snapshot-swap-append
//! discipline:
//!
//! ```text
//! take_all()  ──→  local snapshot   (live list now empty)
//!                      │
//!            ┌─────────┴─────────┐
//!         visible             hidden
//!            │                   │
//!       deliver, drop      register() ──→ live list (may already hold
//!                                        subscriptions attached by sinks
//!                                        during this pass)
//! ```
//!
//! `close()` drains the list for the last time. A closed registry refuses
//! every later `register()` and hands the subscription back, so nothing can
//! be parked behind a shutdown drain.

use crate::ports::outbound::DeliverySink;
use shared_types::{SubscriberId, UserId, UserIdentity};
use std::fmt;
use std::sync::Arc;

/// True when both handles point at the same sink allocation.
#[must_use]
pub fn same_sink(a: &Arc<dyn DeliverySink>, b: &Arc<dyn DeliverySink>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

/// A parked subscriber.
#[derive(Clone)]
pub struct Subscription {
    pub id: SubscriberId,
    pub sink: Arc<dyn DeliverySink>,
    pub user: Option<UserIdentity>,
}

impl Subscription {
    /// True if this subscription delivers into `sink`.
    #[must_use]
    pub fn is_bound_to(&self, sink: &Arc<dyn DeliverySink>) -> bool {
        same_sink(&self.sink, sink)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("user", &self.user.as_ref().map(|u| &u.id))
            .finish_non_exhaustive()
    }
}

/// Waiting subscriptions in registration order.
#[derive(Debug, Default)]
pub struct SubscriberRegistry {
    waiting: Vec<Subscription>,
    next_id: u64,
    closed: bool,
}

impl SubscriberRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the identity a new attach is evaluated under.
    pub fn allocate_id(&mut self) -> SubscriberId {
        self.next_id += 1;
        SubscriberId(self.next_id)
    }

    /// Park a subscription. A closed registry returns it untouched.
    pub fn register(&mut self, subscription: Subscription) -> Result<(), Subscription> {
        if self.closed {
            return Err(subscription);
        }
        self.waiting.push(subscription);
        Ok(())
    }

    /// Drain the live list, leaving it empty.
    pub fn take_all(&mut self) -> Vec<Subscription> {
        std::mem::take(&mut self.waiting)
    }

    /// Drain the live list and refuse all further registrations.
    pub fn close(&mut self) -> Vec<Subscription> {
        self.closed = true;
        self.take_all()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Remove every subscription bound to `sink`; returns how many.
    pub fn remove_sink(&mut self, sink: &Arc<dyn DeliverySink>) -> usize {
        let before = self.waiting.len();
        self.waiting.retain(|subscription| !subscription.is_bound_to(sink));
        before - self.waiting.len()
    }

    /// Subscriptions bound to `user`.
    #[must_use]
    pub fn waiting_for(&self, user: &UserId) -> usize {
        self.waiting
            .iter()
            .filter(|s| s.user.as_ref().is_some_and(|u| &u.id == user))
            .count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.waiting.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waiting.is_empty()
    }
}
