//! Inbound port: the API a transport adapter drives.

use crate::domain::{AttachOutcome, ChatResult};
use crate::ports::outbound::DeliverySink;
use shared_types::{Args, MessageId, Response, UserIdentity};
use std::sync::Arc;

/// Chat engine API.
///
/// Every operation except `init` and `periodic_tick` fails with
/// `ChatError::Uninitialized` outside the `Initialized` state and then has
/// no side effect.
pub trait ChatApi: Send + Sync {
    /// Uninitialized -> Initialized; broadcasts `chat.init`.
    fn init(&self) -> ChatResult<()>;

    /// Initialized -> ShutDown; broadcasts `chat.shutdown` and drains every
    /// waiting subscriber with one terminal system message. Returns the
    /// number of subscribers drained.
    fn shutdown(&self) -> ChatResult<usize>;

    /// Authenticate, transform, store and fan out one message; returns the
    /// reply built for the poster.
    fn recv(&self, text: &str, user: Option<UserIdentity>, args: Args) -> ChatResult<Response>;

    /// Replay history after `cursor` (or within the recency window) or park
    /// the subscriber until the next visible message.
    fn attach_poller(
        &self,
        user: Option<UserIdentity>,
        sink: Arc<dyn DeliverySink>,
        cursor: Option<MessageId>,
    ) -> ChatResult<AttachOutcome>;

    /// Remove every waiting subscription bound to `sink`.
    fn detach_poller(&self, sink: &Arc<dyn DeliverySink>) -> ChatResult<usize>;

    /// Broadcast `chat.periodic` if initialized. Returns whether it did.
    fn periodic_tick(&self) -> bool;
}
