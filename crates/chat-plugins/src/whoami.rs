//! `/whoami` console command.

use crate::lifecycle_listeners;
use serde_json::Value;
use shared_bus::{topics, Handler, Listener, Payload, Plugin};
use std::sync::Arc;

const COMMAND: &str = "/whoami";

/// Consumes `/whoami` and answers with the caller's profile.
///
/// The command message is vetoed: it is neither stored nor broadcast.
#[derive(Debug, Clone, Copy, Default)]
pub struct Whoami;

impl Whoami {
    /// Runs ahead of the content listeners.
    pub const PRIORITY: i32 = 10;
}

impl Plugin for Whoami {
    fn name(&self) -> &'static str {
        "whoami"
    }

    fn listeners(self: Arc<Self>) -> Vec<Listener> {
        let mut listeners = lifecycle_listeners(self.name());
        listeners.push(Listener::with_priority(
            topics::MESSAGE_RECEIVED,
            Handler::filter(|_, value| match value {
                Payload::Ingest(ingest)
                    if ingest
                        .message
                        .as_ref()
                        .is_some_and(|m| m.text.trim() == COMMAND) =>
                {
                    let profile = ingest
                        .message
                        .as_ref()
                        .and_then(|m| serde_json::to_value(&m.from).ok())
                        .unwrap_or(Value::Null);
                    let mut ingest = ingest.veto();
                    ingest.response.insert("whoami", profile);
                    Payload::Ingest(ingest)
                }
                other => other,
            }),
            Self::PRIORITY,
        ));
        listeners
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::receive;
    use shared_bus::Dispatcher;
    use shared_types::UserIdentity;

    #[test]
    fn test_whoami_is_consumed() {
        let bus = Dispatcher::new();
        bus.attach_plugin(Arc::new(Whoami));

        let ingest = receive(&bus, "/whoami", Some(UserIdentity::account("42", "ann")));
        assert!(ingest.message.is_none());
        let profile = ingest.response.get("whoami").unwrap();
        assert_eq!(profile["id"], "42");
        assert_eq!(profile["name"], "ann");
    }

    #[test]
    fn test_anonymous_whoami() {
        let bus = Dispatcher::new();
        bus.attach_plugin(Arc::new(Whoami));

        let ingest = receive(&bus, "/whoami", None);
        assert!(ingest.message.is_none());
        assert_eq!(ingest.response.get("whoami"), Some(&Value::Null));
    }

    #[test]
    fn test_other_text_untouched() {
        let bus = Dispatcher::new();
        bus.attach_plugin(Arc::new(Whoami));

        let ingest = receive(&bus, "who am i?", None);
        assert_eq!(ingest.message.unwrap().text, "who am i?");
        assert!(ingest.response.is_empty());
    }
}
