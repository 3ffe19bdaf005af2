//! # Chat Plugins
//!
//! Reference listeners built on the `shared-bus` pipeline contract.
//!
//! | Plugin | Topics | Priority |
//! |--------|--------|----------|
//! | `NoAuth` | `auth.check` | default |
//! | `Whoami` | `message.received` | 10 |
//! | `Direct` | `message.received`, `message.read.prevent` | default |
//! | `Me` | `message.received` | default |
//! | `AntiFlood` | `message.received`, `message.read.prevent`, `chat.periodic` | default |
//! | `Tidy` | `message.received` | 200 |
//!
//! Every plugin also listens on `chat.init` / `chat.shutdown` and logs under
//! the engine span handed out with `chat.init`.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod anti_flood;
pub mod direct;
pub mod me;
pub mod no_auth;
pub mod tidy;
pub mod whoami;

pub use anti_flood::AntiFlood;
pub use direct::Direct;
pub use me::Me;
pub use no_auth::NoAuth;
pub use tidy::Tidy;
pub use whoami::Whoami;

use shared_bus::{topics, Event, Handler, Listener, Payload, Plugin};
use shared_types::{Message, Response, TimeSource};
use std::sync::Arc;
use tracing::debug;

/// The default plugin set, in registration order.
#[must_use]
pub fn standard_set(clock: Arc<dyn TimeSource>) -> Vec<Arc<dyn Plugin>> {
    vec![
        Arc::new(NoAuth),
        Arc::new(Whoami),
        Arc::new(Direct),
        Arc::new(Me),
        Arc::new(AntiFlood::new(
            AntiFlood::DEFAULT_COUNT,
            AntiFlood::DEFAULT_WINDOW,
            clock,
        )),
        Arc::new(Tidy),
    ]
}

/// `chat.init` / `chat.shutdown` logging listeners for `plugin`.
pub(crate) fn lifecycle_listeners(plugin: &'static str) -> Vec<Listener> {
    vec![
        Listener::new(
            topics::CHAT_INIT,
            Handler::notify(move |event| log_transition(event, plugin, "Initializing plugin")),
        ),
        Listener::new(
            topics::CHAT_SHUTDOWN,
            Handler::notify(move |event| log_transition(event, plugin, "Shutting down plugin")),
        ),
    ]
}

fn log_transition(event: &Event, plugin: &'static str, what: &'static str) {
    match &event.context.span {
        Some(span) => span.in_scope(|| debug!(plugin, "{what}")),
        None => debug!(plugin, "{what}"),
    }
}

/// Wrap a closure over the candidate message of a `message.received` pass.
///
/// Vetoed passes and foreign payloads flow through untouched.
pub(crate) fn on_received<F>(f: F) -> Handler
where
    F: Fn(&mut Message, &mut Response) + Send + Sync + 'static,
{
    Handler::filter(move |_, value| match value {
        Payload::Ingest(mut ingest) => {
            if let Some(message) = ingest.message.as_mut() {
                f(message, &mut ingest.response);
            }
            Payload::Ingest(ingest)
        }
        other => other,
    })
}
