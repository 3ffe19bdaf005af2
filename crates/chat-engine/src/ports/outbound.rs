//! Outbound ports: where delivered messages go.

use shared_types::Message;
use thiserror::Error;

pub use shared_types::{SystemTimeSource, TimeSource};

/// A delivery sink could not accept a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    /// The receiving side is gone (client disconnected).
    #[error("delivery sink is closed")]
    Closed,

    /// Transport-level failure.
    #[error("delivery failed: {0}")]
    Transport(String),
}

/// Opaque delivery target of a waiting subscriber.
///
/// The engine calls `deliver` with a non-empty, chronologically ordered
/// batch and does not wait for the transport to finish. Implementations
/// may call back into the engine (for example to re-attach).
///
/// Sink identity for `detach_poller` is the `Arc` allocation, not value
/// equality.
pub trait DeliverySink: Send + Sync {
    /// Hand a batch of messages to the transport.
    fn deliver(&self, messages: Vec<Message>) -> Result<(), SinkError>;
}

impl<F> DeliverySink for F
where
    F: Fn(Vec<Message>) -> Result<(), SinkError> + Send + Sync,
{
    fn deliver(&self, messages: Vec<Message>) -> Result<(), SinkError> {
        self(messages)
    }
}
