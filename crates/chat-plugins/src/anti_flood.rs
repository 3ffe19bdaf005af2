//! # Flood Control
//!
//! Counts messages per sender inside a time frame that opens with the
//! sender's first message. Messages beyond `count` within `window` are
//! annotated `meta.flood = true`: the sender still sees them, every other
//! reader does not.
//!
//! | Topic | Mode | Effect |
//! |-------|------|--------|
//! | `message.received` | filter | count, annotate, reply `flood` |
//! | `message.read.prevent` | until | hide flooded messages from others |
//! | `chat.periodic` | notify | drop expired sender frames |

use crate::{lifecycle_listeners, on_received};
use parking_lot::Mutex;
use shared_bus::{topics, Handler, Listener, Plugin};
use shared_types::{window_start, Message, Response, TimeSource, Timestamp, UserId, UserIdentity};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Reply entry set for the poster of a flooded message.
pub const LOCKED_NOTICE: &str = "Message is locked";

#[derive(Debug, Clone, Copy)]
struct Frame {
    opened: Timestamp,
    count: u32,
}

/// Per-sender flood detection.
pub struct AntiFlood {
    count: u32,
    window: Duration,
    clock: Arc<dyn TimeSource>,
    frames: Mutex<HashMap<UserId, Frame>>,
}

impl AntiFlood {
    /// Messages allowed per window.
    pub const DEFAULT_COUNT: u32 = 5;

    /// Window length.
    pub const DEFAULT_WINDOW: Duration = Duration::from_secs(15);

    #[must_use]
    pub fn new(count: u32, window: Duration, clock: Arc<dyn TimeSource>) -> Self {
        Self {
            count,
            window,
            clock,
            frames: Mutex::new(HashMap::new()),
        }
    }

    /// Number of senders currently tracked.
    #[must_use]
    pub fn tracked_senders(&self) -> usize {
        self.frames.lock().len()
    }

    fn on_message(&self, message: &mut Message, response: &mut Response) {
        message.annotate("flood", false);
        let Some(sender) = message.author_id().cloned() else {
            return;
        };

        let now = self.clock.now();
        let expired_before = window_start(now, self.window);
        let mut frames = self.frames.lock();
        let frame = frames.entry(sender.clone()).or_insert(Frame {
            opened: now,
            count: 0,
        });
        if frame.opened < expired_before {
            *frame = Frame {
                opened: now,
                count: 0,
            };
        }
        frame.count += 1;

        if frame.count > self.count {
            message.annotate("flood", true);
            response.insert("flood", LOCKED_NOTICE);
            debug!(message = %message.id, sender = %sender, count = frame.count, "Message marked as flood");
        }
    }

    fn purge(&self) {
        let expired_before = window_start(self.clock.now(), self.window);
        let mut frames = self.frames.lock();
        let before = frames.len();
        frames.retain(|_, frame| frame.opened >= expired_before);
        let purged = before - frames.len();
        if purged > 0 {
            debug!(purged, "Purged expired flood frames");
        }
    }
}

/// True when `reader` must not see `message`.
fn hides(message: &Message, reader: Option<&UserIdentity>) -> bool {
    if !message.flag("flood") {
        return false;
    }
    match reader {
        None => true,
        Some(reader) => message.author_id() != Some(&reader.id),
    }
}

impl Plugin for AntiFlood {
    fn name(&self) -> &'static str {
        "anti-flood"
    }

    fn listeners(self: Arc<Self>) -> Vec<Listener> {
        let mut listeners = lifecycle_listeners(self.name());

        let this = Arc::clone(&self);
        listeners.push(Listener::new(
            topics::MESSAGE_RECEIVED,
            on_received(move |message, response| this.on_message(message, response)),
        ));
        listeners.push(Listener::new(
            topics::MESSAGE_READ_PREVENT,
            Handler::until(|event| {
                event
                    .context
                    .message
                    .as_ref()
                    .is_some_and(|message| hides(message, event.context.user.as_ref()))
            }),
        ));
        let this = Arc::clone(&self);
        listeners.push(Listener::new(
            topics::CHAT_PERIODIC,
            Handler::notify(move |_| this.purge()),
        ));
        listeners
    }
}
