//! Direct messages: `">recipient: text"`.
//!
//! The recipient is recorded as `meta.to`; the read-prevent check then
//! hides the message from everyone but the sender and the recipient.

use crate::{lifecycle_listeners, on_received};
use shared_bus::{topics, Handler, Listener, Plugin};
use shared_types::{Message, UserIdentity};
use std::sync::Arc;
use tracing::trace;

/// Reply entry set for the poster of a direct message.
pub const SENT_NOTICE: &str = "Message has been sent";

/// Direct-message plugin.
#[derive(Debug, Clone, Copy, Default)]
pub struct Direct;

/// Split `">name: text"` into recipient and body.
///
/// Rejected: no leading `>`, a space right after it, no colon, or a
/// trailing colon.
#[must_use]
pub fn parse_direct(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix('>')?;
    if rest.starts_with(' ') || text.ends_with(':') {
        return None;
    }
    let (to, body) = rest.split_once(':')?;
    Some((to, body.trim_start()))
}

/// True when `reader` is the recipient or the sender of a direct message.
fn can_read(reader: &UserIdentity, message: &Message, to: &str) -> bool {
    let mut candidates = vec![to];
    if let Some(from) = &message.from {
        candidates.push(from.name.as_str());
        if from.has_account {
            candidates.push(from.id.as_str());
        }
    }
    let reader_ip = reader.ip.map(|ip| ip.to_string());
    candidates.iter().any(|candidate| {
        reader.answers_to(candidate) || reader_ip.as_deref() == Some(*candidate)
    })
}

impl Plugin for Direct {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn listeners(self: Arc<Self>) -> Vec<Listener> {
        let mut listeners = lifecycle_listeners(self.name());
        listeners.push(Listener::new(
            topics::MESSAGE_RECEIVED,
            on_received(|message, response| {
                let Some((to, body)) = parse_direct(&message.text) else {
                    return;
                };
                let (to, body) = (to.to_string(), body.to_string());
                trace!(to = %to, "Direct message");
                message.annotate("to", to);
                message.text = body;
                response.insert("direct", SENT_NOTICE);
            }),
        ));
        listeners.push(Listener::new(
            topics::MESSAGE_READ_PREVENT,
            Handler::until(|event| {
                let Some(message) = event.context.message.as_ref() else {
                    return false;
                };
                let Some(to) = message.meta_str("to") else {
                    return false;
                };
                match event.context.user.as_ref() {
                    None => true,
                    Some(reader) => !can_read(reader, message, to),
                }
            }),
        ));
        listeners
    }
}
