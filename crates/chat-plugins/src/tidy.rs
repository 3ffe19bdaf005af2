//! HTML escaping of message text.

use crate::{lifecycle_listeners, on_received};
use shared_bus::{topics, Listener, Plugin};
use std::sync::Arc;

/// Escapes `&`, `<`, `>` and `"` in incoming text.
///
/// Runs after the default priority so that parsers looking for `>` (direct
/// messages) see the raw text.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tidy;

impl Tidy {
    pub const PRIORITY: i32 = 200;
}

/// Escape the HTML metacharacters of `text`.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

impl Plugin for Tidy {
    fn name(&self) -> &'static str {
        "tidy"
    }

    fn listeners(self: Arc<Self>) -> Vec<Listener> {
        let mut listeners = lifecycle_listeners(self.name());
        listeners.push(Listener::with_priority(
            topics::MESSAGE_RECEIVED,
            on_received(|message, _| message.text = escape(&message.text)),
            Self::PRIORITY,
        ));
        listeners
    }
}
