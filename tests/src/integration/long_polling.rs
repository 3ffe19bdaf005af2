//! # Long-Polling Client Tests
//!
//! Async clients talk to the engine through `ChannelSink`, the way a
//! transport adapter would: attach, await one batch, re-attach with the
//! last delivered id as cursor.
//!
//! ```text
//! client ──attach(cursor)──→ ChatService ──deliver──→ ChannelSink ──→ rx
//!    ↑                                                                │
//!    └──────────────────── cursor = last id ←──────────────────────────┘
//! ```

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::time::Duration;

    use rand::Rng;
    use tokio::time::timeout;
    use tokio_stream::StreamExt;

    use chat_engine::{
        ChannelSink, ChatApi, ChatConfig, ChatService, DeliverySink, LifecycleState,
        SHUTDOWN_NOTICE,
    };
    use chat_plugins::{standard_set, NoAuth, Tidy};
    use chat_runtime::ChatRuntime;
    use shared_bus::{Dispatcher, Plugin};
    use shared_types::{Args, MessageId, SystemTimeSource, TimeSource, UserIdentity};

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    const POSTERS: usize = 4;
    const PER_POSTER: usize = 10;
    const TOTAL: usize = POSTERS * PER_POSTER;

    fn open_chat(capacity: usize) -> Arc<ChatService> {
        let dispatcher = Arc::new(Dispatcher::new());
        dispatcher.attach_plugin(Arc::new(NoAuth));
        dispatcher.attach_plugin(Arc::new(Tidy));
        let config = ChatConfig {
            history_capacity: capacity,
            ..ChatConfig::default()
        };
        let service = ChatService::new(config, dispatcher).unwrap();
        service.init().unwrap();
        Arc::new(service)
    }

    fn guest(name: &str) -> Option<UserIdentity> {
        Some(UserIdentity::guest(name))
    }

    /// Poll until `expected` messages were seen, returning their texts in
    /// delivery order.
    async fn poll_until(service: Arc<ChatService>, reader: String, expected: usize) -> Vec<String> {
        let mut seen = Vec::with_capacity(expected);
        let mut cursor: Option<MessageId> = None;

        while seen.len() < expected {
            let (sink, mut rx) = ChannelSink::channel();
            service
                .attach_poller(guest(&reader), Arc::new(sink), cursor)
                .unwrap();

            let batch = timeout(Duration::from_secs(5), rx.recv())
                .await
                .expect("poll timed out")
                .expect("sink dropped without delivery");
            cursor = batch.last().map(|m| m.id);
            seen.extend(batch.into_iter().map(|m| m.text));
        }
        seen
    }

    // =========================================================================
    // CONCURRENT CLIENTS
    // =========================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_pollers_see_every_message_once() {
        let service = open_chat(TOTAL * 2);

        let pollers: Vec<_> = (0..3)
            .map(|n| tokio::spawn(poll_until(Arc::clone(&service), format!("reader-{n}"), TOTAL)))
            .collect();

        let posters: Vec<_> = (0..POSTERS)
            .map(|p| {
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    for n in 0..PER_POSTER {
                        let pause = rand::thread_rng().gen_range(0..3);
                        tokio::time::sleep(Duration::from_millis(pause)).await;
                        service
                            .recv(&format!("{p}:{n}"), guest(&format!("poster-{p}")), Args::new())
                            .unwrap();
                    }
                })
            })
            .collect();

        for poster in posters {
            poster.await.unwrap();
        }

        for poller in pollers {
            let seen = poller.await.unwrap();
            assert_eq!(seen.len(), TOTAL, "duplicate or missing deliveries");
            let unique: HashSet<_> = seen.iter().collect();
            assert_eq!(unique.len(), TOTAL);

            // Per-poster order is preserved.
            for p in 0..POSTERS {
                let order: Vec<usize> = seen
                    .iter()
                    .filter_map(|text| text.split_once(':'))
                    .filter(|(poster, _)| *poster == p.to_string())
                    .map(|(_, n)| n.parse().unwrap())
                    .collect();
                assert_eq!(order, (0..PER_POSTER).collect::<Vec<_>>());
            }
        }
        assert_eq!(service.history_len(), TOTAL);
    }

    #[tokio::test]
    async fn test_closed_client_does_not_block_others() {
        let service = open_chat(20);

        let (gone, gone_rx) = ChannelSink::channel();
        let (live, mut live_rx) = ChannelSink::channel();
        service.attach_poller(guest("gone"), Arc::new(gone), None).unwrap();
        service.attach_poller(guest("live"), Arc::new(live), None).unwrap();
        drop(gone_rx);

        service.recv("still here", guest("ann"), Args::new()).unwrap();

        let batch = live_rx.recv().await.unwrap();
        assert_eq!(batch[0].text, "still here");
        assert_eq!(service.waiting_count(), 0);
    }

    #[tokio::test]
    async fn test_detached_client_channel_closes() {
        let service = open_chat(20);

        let (sink, mut rx) = ChannelSink::channel();
        let sink: Arc<dyn DeliverySink> = Arc::new(sink);
        service.attach_poller(guest("bob"), Arc::clone(&sink), None).unwrap();

        assert_eq!(service.detach_poller(&sink).unwrap(), 1);
        drop(sink);

        service.recv("after detach", guest("ann"), Args::new()).unwrap();
        assert!(rx.recv().await.is_none());
    }

    // =========================================================================
    // RUNTIME SHUTDOWN
    // =========================================================================

    #[tokio::test]
    async fn test_runtime_stop_ends_client_streams() {
        let clock: Arc<dyn TimeSource> = Arc::new(SystemTimeSource);
        let runtime =
            ChatRuntime::with_time_source(ChatConfig::default(), standard_set(clock.clone()), clock)
                .unwrap();
        runtime.start().await.unwrap();
        let service = runtime.service();

        let mut streams = Vec::new();
        for reader in ["ann", "bob"] {
            let (sink, stream) = ChannelSink::stream();
            service.attach_poller(guest(reader), Arc::new(sink), None).unwrap();
            streams.push(stream);
        }

        assert_eq!(runtime.stop().await.unwrap(), 2);
        assert_eq!(service.state(), LifecycleState::ShutDown);

        for mut stream in streams {
            let batch = stream.next().await.unwrap();
            assert_eq!(batch.len(), 1);
            assert!(batch[0].is_system());
            assert_eq!(batch[0].text, SHUTDOWN_NOTICE);
            // The drained subscription released its sender.
            assert!(stream.next().await.is_none());
        }
    }

    #[tokio::test]
    async fn test_runtime_with_custom_plugin_list() {
        let plugins: Vec<Arc<dyn Plugin>> = vec![Arc::new(NoAuth)];
        let runtime = ChatRuntime::new(ChatConfig::default(), plugins).unwrap();
        runtime.start().await.unwrap();
        let service = runtime.service();

        // Without Tidy nothing is escaped.
        service.recv("<raw>", guest("ann"), Args::new()).unwrap();
        let (sink, mut rx) = ChannelSink::channel();
        service.attach_poller(guest("bob"), Arc::new(sink), None).unwrap();
        assert_eq!(rx.recv().await.unwrap()[0].text, "<raw>");

        assert_eq!(runtime.stop().await.unwrap(), 0);
    }
}
