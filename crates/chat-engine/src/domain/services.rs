//! # Output Filter
//!
//! Per-(subscriber, message) visibility decision built on the dispatcher:
//!
//! 1. `message.read.prevent` (first responder): a claim hides the message.
//! 2. `message.read.filter` (transform): rewrites the externally visible
//!    shape of a clone for this reader.
//!
//! The stored original is never handed to listeners.

use shared_bus::{topics, Dispatcher, Event, Payload};
use shared_types::{Message, SubscriberId, UserIdentity};
use std::sync::Arc;
use tracing::{trace, warn};

/// Visibility and per-reader transformation of stored messages.
#[derive(Debug, Clone)]
pub struct OutputFilter {
    dispatcher: Arc<Dispatcher>,
}

impl OutputFilter {
    #[must_use]
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// The message as `subscriber` should see it, or `None` if hidden.
    #[must_use]
    pub fn visible(
        &self,
        user: Option<&UserIdentity>,
        subscriber: SubscriberId,
        message: &Message,
    ) -> Option<Message> {
        let prevent = self.dispatcher.notify_until(
            Event::new(topics::MESSAGE_READ_PREVENT)
                .with_user(user.cloned())
                .with_subscriber(subscriber)
                .with_message(message.clone()),
        );
        if prevent.is_processed() {
            trace!(message = %message.id, %subscriber, "Message hidden from reader");
            return None;
        }

        let mut filtered = self.dispatcher.filter(
            Event::new(topics::MESSAGE_READ_FILTER)
                .with_user(user.cloned())
                .with_subscriber(subscriber),
            Payload::Message(message.clone()),
        );
        match filtered.take_return_value() {
            Some(Payload::Message(visible)) => Some(visible),
            other => {
                warn!(
                    message = %message.id,
                    %subscriber,
                    returned = other.as_ref().map_or("nothing", Payload::kind),
                    "Read filter returned a non-message payload; hiding message"
                );
                None
            }
        }
    }

    /// Filter a newest-first scan window and return the visible messages
    /// oldest first.
    #[must_use]
    pub fn replay(
        &self,
        window: Vec<Message>,
        user: Option<&UserIdentity>,
        subscriber: SubscriberId,
    ) -> Vec<Message> {
        let mut visible: Vec<Message> = window
            .iter()
            .filter_map(|message| self.visible(user, subscriber, message))
            .collect();
        visible.reverse();
        visible
    }
}
