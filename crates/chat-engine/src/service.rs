//! # Chat Service
//!
//! Delivery engine implementing the `ChatApi` port.
//!
//! ## Ingestion (`recv`)
//!
//! ```text
//! lifecycle gate → auth.check → Message::new → message.received
//!     → [stored?] history.push + fan-out
//!     → message.request.response → caller
//! ```
//!
//! ## Subscription (`attach_poller`)
//!
//! Replay after the cursor (or within the recency window) through the
//! output filter. A non-empty replay is delivered at once and nothing is
//! registered; otherwise the subscriber is parked until a visible message
//! arrives.
//!
//! ## Locking
//!
//! State sits behind `parking_lot` mutexes so every operation takes
//! `&self`. The history, registry and lifecycle mutexes are never held
//! while listeners or sinks run: a sink may call back into the service
//! (typically to re-attach) from inside `deliver`.
//!
//! Stored messages are fanned out in storage order: `recv` holds a
//! reentrant ingest lock from the lifecycle re-check through the history
//! push to the end of fan-out, and `shutdown` holds it for its whole run.
//! Sinks invoked by fan-out or by the shutdown drain therefore run under
//! the ingest lock. They may post or shut down from the same thread, but
//! must not block on a `recv` running on another thread.
//!
//! Locks are taken ingest, then history, then registry. A subscriber is
//! parked while the history lock is held and only if no message was
//! stored since its replay scan, so a concurrent `recv` either shows up in
//! the rescan or finds the subscriber registered.
//!
//! `shutdown` closes the registry as it drains it. Parking into a closed
//! registry is refused: `attach_poller` fails with `Uninitialized`, and a
//! hidden subscriber fan-out tries to put back gets the shutdown notice.

use crate::domain::{
    AttachOutcome, ChatConfig, ChatError, ChatResult, ConfigError, FanOutSummary, HistoryStore,
    Lifecycle, LifecycleState, OutputFilter, ReplayBound, SubscriberRegistry, Subscription,
};
use crate::ports::{ChatApi, DeliverySink, SystemTimeSource, TimeSource};
use parking_lot::{Mutex, ReentrantMutex};
use shared_bus::{topics, Dispatcher, Event, Ingest, Payload};
use shared_types::{window_start, Args, Message, MessageId, Response, SubscriberId, UserIdentity};
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Span};

/// Text of the terminal notice sent to waiting subscribers on shutdown.
pub const SHUTDOWN_NOTICE: &str = "Chat is shutting down";

/// The chat delivery engine.
pub struct ChatService {
    config: ChatConfig,
    dispatcher: Arc<Dispatcher>,
    filter: OutputFilter,
    clock: Arc<dyn TimeSource>,
    lifecycle: Mutex<Lifecycle>,
    history: Mutex<HistoryStore>,
    registry: Mutex<SubscriberRegistry>,
    /// Held from `history.push` through fan-out.
    ingest: ReentrantMutex<()>,
    /// Handed to listeners on `chat.init` so they log under the engine.
    span: Span,
}

impl ChatService {
    /// Create an engine using the wall clock.
    pub fn new(config: ChatConfig, dispatcher: Arc<Dispatcher>) -> Result<Self, ConfigError> {
        Self::with_time_source(config, dispatcher, Arc::new(SystemTimeSource))
    }

    /// Create an engine with an explicit clock.
    pub fn with_time_source(
        config: ChatConfig,
        dispatcher: Arc<Dispatcher>,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            history: Mutex::new(HistoryStore::new(config.history_capacity)),
            filter: OutputFilter::new(Arc::clone(&dispatcher)),
            registry: Mutex::new(SubscriberRegistry::new()),
            lifecycle: Mutex::new(Lifecycle::new()),
            ingest: ReentrantMutex::new(()),
            span: info_span!("chat", capacity = config.history_capacity),
            config,
            dispatcher,
            clock,
        })
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.lifecycle.lock().state()
    }

    /// Number of stored messages.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.lock().len()
    }

    /// Stored messages, oldest first.
    #[must_use]
    pub fn history_snapshot(&self) -> Vec<Message> {
        self.history.lock().chronological()
    }

    /// Number of parked subscribers.
    #[must_use]
    pub fn waiting_count(&self) -> usize {
        self.registry.lock().len()
    }

    #[must_use]
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    fn ensure_initialized(&self, operation: &'static str) -> ChatResult<()> {
        self.lifecycle.lock().ensure_initialized(operation)
    }

    /// Run the `message.received` pass. A wrong payload variant counts as
    /// a veto with an empty reply.
    fn transform_incoming(&self, message: Message, author: Option<UserIdentity>) -> Ingest {
        let id = message.id;
        let mut event = self.dispatcher.filter(
            Event::new(topics::MESSAGE_RECEIVED).with_user(author),
            Payload::Ingest(Ingest::new(message)),
        );
        match event.take_return_value() {
            Some(Payload::Ingest(ingest)) => ingest,
            other => {
                warn!(
                    message = %id,
                    returned = other.as_ref().map_or("nothing", Payload::kind),
                    "Ingestion filter returned a non-ingest payload; dropping message"
                );
                Ingest::default()
            }
        }
    }

    /// Run the `message.request.response` pass over the accumulator.
    fn shape_response(
        &self,
        response: Response,
        author: Option<UserIdentity>,
        stored: Option<Message>,
    ) -> Response {
        let mut event = Event::new(topics::MESSAGE_REQUEST_RESPONSE).with_user(author);
        if let Some(message) = stored {
            event = event.with_message(message);
        }
        let mut event = self
            .dispatcher
            .filter(event, Payload::Response(response.clone()));
        match event.take_return_value() {
            Some(Payload::Response(shaped)) => shaped,
            other => {
                warn!(
                    returned = other.as_ref().map_or("nothing", Payload::kind),
                    "Response filter returned a non-response payload; keeping reply"
                );
                response
            }
        }
    }

    /// Offer a freshly stored message to every waiting subscriber.
    ///
    /// The live registry is emptied first, so sinks that re-attach during
    /// this pass wait for the next message. Subscribers the message is
    /// hidden from are put back untouched, or sent the shutdown notice if
    /// the registry was closed meanwhile.
    fn fan_out(&self, message: &Message) -> FanOutSummary {
        let snapshot = self.registry.lock().take_all();
        let mut summary = FanOutSummary::default();

        for subscription in snapshot {
            match self
                .filter
                .visible(subscription.user.as_ref(), subscription.id, message)
            {
                None => {
                    let outcome = self.registry.lock().register(subscription);
                    match outcome {
                        Ok(()) => summary.reinserted += 1,
                        Err(subscription) => {
                            debug!(subscriber = %subscription.id, "Registry closed; sending shutdown notice");
                            self.send_shutdown_notice(&subscription);
                        }
                    }
                }
                Some(visible) => {
                    if self.deliver(subscription.id, subscription.sink.as_ref(), vec![visible]) {
                        summary.delivered += 1;
                    } else {
                        summary.failed += 1;
                    }
                }
            }
        }
        summary
    }

    fn send_shutdown_notice(&self, subscription: &Subscription) {
        // Unconditionally visible: bypasses the output filter.
        let notice = Message::system(SHUTDOWN_NOTICE, self.clock.now());
        self.deliver(subscription.id, subscription.sink.as_ref(), vec![notice]);
    }

    /// Invoke one sink in isolation. Errors are logged and swallowed.
    fn deliver(&self, subscriber: SubscriberId, sink: &dyn DeliverySink, batch: Vec<Message>) -> bool {
        debug_assert!(!batch.is_empty());
        let size = batch.len();
        match sink.deliver(batch) {
            Ok(()) => true,
            Err(err) => {
                warn!(%subscriber, batch = size, error = %err, "Delivery sink failed");
                false
            }
        }
    }
}

impl ChatApi for ChatService {
    fn init(&self) -> ChatResult<()> {
        let _guard = self.span.enter();
        if let Err(err) = self.lifecycle.lock().begin_init() {
            warn!(error = %err, "Rejected chat initialization");
            return Err(err);
        }

        info!(
            history_capacity = self.config.history_capacity,
            recency_window_secs = self.config.recency_window_secs,
            "Chat initialized"
        );
        self.dispatcher
            .notify(Event::new(topics::CHAT_INIT).with_span(self.span.clone()));
        Ok(())
    }

    fn shutdown(&self) -> ChatResult<usize> {
        let _guard = self.span.enter();
        // Waits for any in-flight store and fan-out to finish.
        let _order = self.ingest.lock();
        self.lifecycle.lock().begin_shutdown()?;

        self.dispatcher
            .notify(Event::new(topics::CHAT_SHUTDOWN).with_span(self.span.clone()));

        let drained = self.registry.lock().close();
        for subscription in &drained {
            self.send_shutdown_notice(subscription);
        }

        info!(drained = drained.len(), "Chat shut down");
        Ok(drained.len())
    }

    fn recv(&self, text: &str, user: Option<UserIdentity>, args: Args) -> ChatResult<Response> {
        let _guard = self.span.enter();
        self.ensure_initialized("recv")?;

        let auth = self
            .dispatcher
            .notify_until(Event::new(topics::AUTH_CHECK).with_user(user));
        if !auth.is_processed() {
            warn!("No auth listener accepted the poster");
            return Err(ChatError::AuthRejected);
        }
        // The auth listener may resolve or replace the identity.
        let author = auth.context.user;

        let message = Message::new(text, author.clone(), args, self.clock.now());
        let Ingest { message, response } = self.transform_incoming(message, author.clone());

        let stored = match message {
            Some(message) => {
                let _order = self.ingest.lock();
                // A shutdown may have run since the gate at the top.
                self.ensure_initialized("recv")?;
                if let Some(evicted) = self.history.lock().push(message.clone()) {
                    debug!(evicted = %evicted.id, "History full; evicted oldest message");
                }
                let summary = self.fan_out(&message);
                debug!(
                    message = %message.id,
                    user = ?author.as_ref().map(|u| u.id.as_str()),
                    delivered = summary.delivered,
                    reinserted = summary.reinserted,
                    failed = summary.failed,
                    "Message stored and fanned out"
                );
                Some(message)
            }
            None => {
                debug!(
                    user = ?author.as_ref().map(|u| u.id.as_str()),
                    "Message consumed by a listener; not stored"
                );
                None
            }
        };

        Ok(self.shape_response(response, author, stored))
    }

    fn attach_poller(
        &self,
        user: Option<UserIdentity>,
        sink: Arc<dyn DeliverySink>,
        cursor: Option<MessageId>,
    ) -> ChatResult<AttachOutcome> {
        let _guard = self.span.enter();
        self.ensure_initialized("attach_poller")?;

        let subscriber = self.registry.lock().allocate_id();
        let bound = match cursor {
            Some(cursor) => ReplayBound::After(cursor),
            None => ReplayBound::Since(window_start(
                self.clock.now(),
                self.config.recency_window(),
            )),
        };
        loop {
            let (window, seen) = {
                let history = self.history.lock();
                (history.window(bound), history.appended())
            };
            let replay = self.filter.replay(window, user.as_ref(), subscriber);

            if !replay.is_empty() {
                let count = replay.len();
                debug!(%subscriber, count, "Replaying history");
                self.deliver(subscriber, sink.as_ref(), replay);
                return Ok(AttachOutcome::Replayed { count });
            }

            // Park only if nothing was stored while the filter ran.
            let history = self.history.lock();
            if history.appended() == seen {
                let parked = self.registry.lock().register(Subscription {
                    id: subscriber,
                    sink: Arc::clone(&sink),
                    user: user.clone(),
                });
                drop(history);
                if parked.is_err() {
                    debug!(%subscriber, "Chat shut down during replay; not parking");
                    return Err(ChatError::Uninitialized {
                        operation: "attach_poller",
                    });
                }
                debug!(%subscriber, "Nothing to replay; subscriber waiting");
                return Ok(AttachOutcome::Waiting { subscriber });
            }
            debug!(%subscriber, "History changed during replay; rescanning");
        }
    }

    fn detach_poller(&self, sink: &Arc<dyn DeliverySink>) -> ChatResult<usize> {
        let _guard = self.span.enter();
        self.ensure_initialized("detach_poller")?;

        let removed = self.registry.lock().remove_sink(sink);
        debug!(removed, "Poller detached");
        Ok(removed)
    }

    fn periodic_tick(&self) -> bool {
        let _guard = self.span.enter();
        if self.state() != LifecycleState::Initialized {
            debug!(state = %self.state(), "Skipping periodic tick");
            return false;
        }
        self.dispatcher.notify(Event::new(topics::CHAT_PERIODIC));
        true
    }
}
