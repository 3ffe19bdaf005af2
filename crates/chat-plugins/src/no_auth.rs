//! Accept-everyone authentication.

use crate::lifecycle_listeners;
use shared_bus::{topics, Handler, Listener, Plugin};
use std::sync::Arc;

/// Answers `auth.check` affirmatively for every caller, anonymous ones
/// included.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

impl Plugin for NoAuth {
    fn name(&self) -> &'static str {
        "no-auth"
    }

    fn listeners(self: Arc<Self>) -> Vec<Listener> {
        let mut listeners = lifecycle_listeners(self.name());
        listeners.push(Listener::new(topics::AUTH_CHECK, Handler::until(|_| true)));
        listeners
    }
}
