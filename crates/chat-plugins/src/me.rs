//! "/me" actions.

use crate::{lifecycle_listeners, on_received};
use shared_bus::{topics, Listener, Plugin};
use std::sync::Arc;

const PREFIX: &str = "/me ";

/// Strips a leading `"/me "` and records it as `meta.me`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Me;

impl Plugin for Me {
    fn name(&self) -> &'static str {
        "me"
    }

    fn listeners(self: Arc<Self>) -> Vec<Listener> {
        let mut listeners = lifecycle_listeners(self.name());
        listeners.push(Listener::new(
            topics::MESSAGE_RECEIVED,
            on_received(|message, _| {
                let action = message.text.strip_prefix(PREFIX).map(str::to_string);
                message.annotate("me", action.is_some());
                if let Some(rest) = action {
                    message.text = rest;
                }
            }),
        ));
        listeners
    }
}
