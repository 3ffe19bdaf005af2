//! # Pipeline Events
//!
//! Defines the event envelope that flows through the dispatcher, the
//! topics the chat engine publishes, and the typed payloads threaded
//! through transform passes.

use serde_json::{Map, Value};
use shared_types::{Message, Response, SubscriberId, UserIdentity};

/// Topic names published by the chat engine.
pub mod topics {
    /// Engine initialised; listeners self-configure.
    pub const CHAT_INIT: &str = "chat.init";
    /// Engine shutting down; listeners flush and release.
    pub const CHAT_SHUTDOWN: &str = "chat.shutdown";
    /// Externally timed housekeeping tick.
    pub const CHAT_PERIODIC: &str = "chat.periodic";
    /// First-responder authentication of the poster.
    pub const AUTH_CHECK: &str = "auth.check";
    /// Transform pass over a freshly received message.
    pub const MESSAGE_RECEIVED: &str = "message.received";
    /// Transform pass over the reply returned to the poster.
    pub const MESSAGE_REQUEST_RESPONSE: &str = "message.request.response";
    /// First-responder veto hiding a message from one reader.
    pub const MESSAGE_READ_PREVENT: &str = "message.read.prevent";
    /// Per-reader transform of a visible message.
    pub const MESSAGE_READ_FILTER: &str = "message.read.filter";
}

/// Side-channel context carried by an event.
///
/// Fields are populated according to the topic; `extra` is free-form.
#[derive(Debug, Clone, Default)]
pub struct EventContext {
    /// The user the event concerns (poster or reader).
    pub user: Option<UserIdentity>,
    /// The waiting subscriber a read event is evaluated for.
    pub subscriber: Option<SubscriberId>,
    /// The message under evaluation (read events, response pass).
    pub message: Option<Message>,
    /// Engine span, handed out on `chat.init` for listener logging.
    pub span: Option<tracing::Span>,
    /// Additional free-form context.
    pub extra: Map<String, Value>,
}

/// Value threaded through `message.received`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ingest {
    /// The candidate message; `None` means "do not store or broadcast".
    pub message: Option<Message>,
    /// Reply accumulator returned to the poster.
    pub response: Response,
}

impl Ingest {
    /// Start an ingestion pass for `message` with an empty reply.
    #[must_use]
    pub fn new(message: Message) -> Self {
        Self {
            message: Some(message),
            response: Response::new(),
        }
    }

    /// Drop the message while keeping the reply (command consumed).
    #[must_use]
    pub fn veto(mut self) -> Self {
        self.message = None;
        self
    }
}

/// Value piped through a `filter` dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// `message.received`.
    Ingest(Ingest),
    /// `message.read.filter`.
    Message(Message),
    /// `message.request.response`.
    Response(Response),
}

impl Payload {
    /// Extract an ingestion value.
    #[must_use]
    pub fn into_ingest(self) -> Option<Ingest> {
        match self {
            Self::Ingest(ingest) => Some(ingest),
            _ => None,
        }
    }

    /// Extract a message value.
    #[must_use]
    pub fn into_message(self) -> Option<Message> {
        match self {
            Self::Message(message) => Some(message),
            _ => None,
        }
    }

    /// Extract a response value.
    #[must_use]
    pub fn into_response(self) -> Option<Response> {
        match self {
            Self::Response(response) => Some(response),
            _ => None,
        }
    }

    /// Variant name, for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ingest(_) => "ingest",
            Self::Message(_) => "message",
            Self::Response(_) => "response",
        }
    }
}

/// An event dispatched through the pipeline.
#[derive(Debug, Clone)]
pub struct Event {
    name: String,
    /// Side-channel context.
    pub context: EventContext,
    processed: bool,
    return_value: Option<Payload>,
}

impl Event {
    /// Create an unprocessed event with empty context.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            context: EventContext::default(),
            processed: false,
            return_value: None,
        }
    }

    /// Attach the concerned user.
    #[must_use]
    pub fn with_user(mut self, user: Option<UserIdentity>) -> Self {
        self.context.user = user;
        self
    }

    /// Attach the evaluated subscriber.
    #[must_use]
    pub fn with_subscriber(mut self, subscriber: SubscriberId) -> Self {
        self.context.subscriber = Some(subscriber);
        self
    }

    /// Attach the message under evaluation.
    #[must_use]
    pub fn with_message(mut self, message: Message) -> Self {
        self.context.message = Some(message);
        self
    }

    /// Attach a logging span.
    #[must_use]
    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.context.span = Some(span);
        self
    }

    /// Topic name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True once a first responder claimed the event.
    #[must_use]
    pub fn is_processed(&self) -> bool {
        self.processed
    }

    /// Claim the event.
    pub fn mark_processed(&mut self) {
        self.processed = true;
    }

    /// Result of the last `filter` dispatch, if any.
    #[must_use]
    pub fn return_value(&self) -> Option<&Payload> {
        self.return_value.as_ref()
    }

    /// Take the result of the last `filter` dispatch.
    pub fn take_return_value(&mut self) -> Option<Payload> {
        self.return_value.take()
    }

    pub(crate) fn set_return_value(&mut self, value: Payload) {
        self.return_value = Some(value);
    }
}
