//! # Engine + Standard Plugin Flows
//!
//! Drives `ChatService` with the `chat-plugins` standard set attached to a
//! shared dispatcher and checks what each reader ends up seeing.
//!
//! ## Flows Tested
//!
//! 1. **Direct messages**: only sender and recipient are woken or replayed
//! 2. **Flood control**: excess messages stay visible to their author only
//! 3. **Console commands**: `/whoami` answers without touching history
//! 4. **Ordering of transforms**: direct parsing runs before escaping
//! 5. **Shutdown**: subscribers parked behind a hidden message still get
//!    the terminal notice

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use parking_lot::Mutex;

    use chat_engine::{
        AttachOutcome, ChatApi, ChatConfig, ChatService, DeliverySink, SinkError, SHUTDOWN_NOTICE,
    };
    use chat_plugins::{anti_flood::LOCKED_NOTICE, direct::SENT_NOTICE, standard_set, AntiFlood};
    use shared_bus::Dispatcher;
    use shared_types::{Args, ManualTimeSource, Message, MessageId, UserIdentity};

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    const START: u64 = 50_000_000;

    /// Sink recording every batch it is handed.
    #[derive(Default)]
    struct Inbox {
        batches: Mutex<Vec<Vec<Message>>>,
    }

    impl Inbox {
        fn texts(&self) -> Vec<String> {
            self.batches
                .lock()
                .iter()
                .flatten()
                .map(|m| m.text.clone())
                .collect()
        }

        fn batch_count(&self) -> usize {
            self.batches.lock().len()
        }

        fn last(&self) -> Option<Message> {
            self.batches.lock().last().and_then(|b| b.last().cloned())
        }
    }

    impl DeliverySink for Inbox {
        fn deliver(&self, messages: Vec<Message>) -> Result<(), SinkError> {
            self.batches.lock().push(messages);
            Ok(())
        }
    }

    struct Chat {
        service: ChatService,
        clock: Arc<ManualTimeSource>,
    }

    impl Chat {
        fn start() -> Self {
            let clock = Arc::new(ManualTimeSource::new(START));
            let dispatcher = Arc::new(Dispatcher::new());
            for plugin in standard_set(clock.clone()) {
                dispatcher.attach_plugin(plugin);
            }
            let service =
                ChatService::with_time_source(ChatConfig::default(), dispatcher, clock.clone())
                    .unwrap();
            service.init().unwrap();
            Self { service, clock }
        }

        fn post(&self, from: &str, text: &str) -> shared_types::Response {
            self.service
                .recv(text, Some(UserIdentity::guest(from)), Args::new())
                .unwrap()
        }

        /// Attach `reader` and return its inbox with the attach outcome.
        fn attach(&self, reader: &str, cursor: Option<MessageId>) -> (Arc<Inbox>, AttachOutcome) {
            let inbox = Arc::new(Inbox::default());
            let sink: Arc<dyn DeliverySink> = inbox.clone();
            let outcome = self
                .service
                .attach_poller(Some(UserIdentity::guest(reader)), sink, cursor)
                .unwrap();
            (inbox, outcome)
        }
    }

    // =========================================================================
    // DIRECT MESSAGES
    // =========================================================================

    #[test]
    fn test_direct_message_wakes_only_sender_and_recipient() {
        let chat = Chat::start();
        let (ann, _) = chat.attach("ann", None);
        let (bob, _) = chat.attach("bob", None);
        let (carol, _) = chat.attach("carol", None);
        assert_eq!(chat.service.waiting_count(), 3);

        let response = chat.post("ann", ">bob: psst");
        assert_eq!(
            response.get("direct").and_then(|v| v.as_str()),
            Some(SENT_NOTICE)
        );

        assert_eq!(ann.texts(), vec!["psst"]);
        assert_eq!(bob.texts(), vec!["psst"]);
        assert!(carol.texts().is_empty());
        // Carol stays parked for the next visible message.
        assert_eq!(chat.service.waiting_count(), 1);

        chat.post("ann", "hello all");
        assert_eq!(carol.texts(), vec!["hello all"]);
        assert_eq!(chat.service.waiting_count(), 0);
    }

    #[test]
    fn test_direct_message_kept_out_of_foreign_replay() {
        let chat = Chat::start();
        chat.post("ann", "public one");
        chat.post("ann", ">bob: private");
        chat.post("bob", "public two");

        let (carol, outcome) = chat.attach("carol", None);
        assert_eq!(outcome, AttachOutcome::Replayed { count: 2 });
        assert_eq!(carol.texts(), vec!["public one", "public two"]);

        let (bob, outcome) = chat.attach("bob", None);
        assert_eq!(outcome, AttachOutcome::Replayed { count: 3 });
        assert_eq!(bob.texts(), vec!["public one", "private", "public two"]);

        // Every message is still in history, private or not.
        assert_eq!(chat.service.history_len(), 3);
    }

    #[test]
    fn test_cursor_past_private_tail_parks_outsider() {
        let chat = Chat::start();
        chat.post("ann", "hi");
        let cursor = chat.service.history_snapshot()[0].id;
        chat.post("ann", ">bob: only bob");

        let (carol, outcome) = chat.attach("carol", Some(cursor));
        assert!(outcome.is_waiting());
        assert_eq!(carol.batch_count(), 0);

        let (bob, outcome) = chat.attach("bob", Some(cursor));
        assert_eq!(outcome, AttachOutcome::Replayed { count: 1 });
        assert_eq!(bob.texts(), vec!["only bob"]);
    }

    // =========================================================================
    // FLOOD CONTROL
    // =========================================================================

    #[test]
    fn test_flooded_message_visible_to_author_only() {
        let chat = Chat::start();
        let limit = AntiFlood::DEFAULT_COUNT as usize;

        for n in 0..limit {
            let response = chat.post("ann", &format!("msg {n}"));
            assert!(response.get("flood").is_none());
        }
        let response = chat.post("ann", "one too many");
        assert_eq!(
            response.get("flood").and_then(|v| v.as_str()),
            Some(LOCKED_NOTICE)
        );

        let (bob, outcome) = chat.attach("bob", None);
        assert_eq!(outcome, AttachOutcome::Replayed { count: limit });
        assert!(!bob.texts().contains(&"one too many".to_string()));

        let (ann, outcome) = chat.attach("ann", None);
        assert_eq!(outcome, AttachOutcome::Replayed { count: limit + 1 });
        assert_eq!(ann.last().unwrap().text, "one too many");
    }

    #[test]
    fn test_flood_frame_expires_with_time() {
        let chat = Chat::start();
        for _ in 0..=AntiFlood::DEFAULT_COUNT {
            chat.post("ann", "spam");
        }
        assert!(chat.service.history_snapshot().last().unwrap().flag("flood"));

        chat.clock
            .advance(AntiFlood::DEFAULT_WINDOW + Duration::from_secs(1));
        assert!(chat.service.periodic_tick());

        let response = chat.post("ann", "calm again");
        assert!(response.get("flood").is_none());
        assert!(!chat.service.history_snapshot().last().unwrap().flag("flood"));
    }

    // =========================================================================
    // CONSOLE COMMANDS AND TRANSFORMS
    // =========================================================================

    #[test]
    fn test_whoami_answers_without_storing() {
        let chat = Chat::start();
        let (bob, _) = chat.attach("bob", None);

        let response = chat.post("ann", "/whoami");
        let profile = response.get("whoami").unwrap();
        assert_eq!(profile["name"], "ann");
        assert_eq!(profile["has_account"], false);

        assert_eq!(chat.service.history_len(), 0);
        assert_eq!(bob.batch_count(), 0);
        assert_eq!(chat.service.waiting_count(), 1);
    }

    #[test]
    fn test_direct_parsed_before_escaping() {
        let chat = Chat::start();
        let response = chat.post("ann", ">bob: <b>hi</b>");
        assert!(response.get("direct").is_some());

        let stored = chat.service.history_snapshot().pop().unwrap();
        assert_eq!(stored.meta_str("to"), Some("bob"));
        assert_eq!(stored.text, "&lt;b&gt;hi&lt;/b&gt;");
    }

    #[test]
    fn test_me_action_annotated() {
        let chat = Chat::start();
        chat.post("ann", "/me waves");
        chat.post("ann", "plain");

        let history = chat.service.history_snapshot();
        assert_eq!(history[0].text, "waves");
        assert!(history[0].flag("me"));
        assert!(!history[1].flag("me"));
    }

    // =========================================================================
    // SHUTDOWN
    // =========================================================================

    #[test]
    fn test_shutdown_reaches_subscriber_behind_hidden_message() {
        let chat = Chat::start();
        let (carol, _) = chat.attach("carol", None);
        chat.post("ann", ">bob: not for carol");
        assert_eq!(carol.batch_count(), 0);

        assert_eq!(chat.service.shutdown().unwrap(), 1);
        let notice = carol.last().unwrap();
        assert!(notice.is_system());
        assert_eq!(notice.text, SHUTDOWN_NOTICE);
        assert!(chat.service.recv("late", None, Args::new()).is_err());
    }
}
