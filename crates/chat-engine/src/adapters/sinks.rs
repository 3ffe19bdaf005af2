//! Channel-backed delivery sink.
//!
//! Bridges the synchronous engine to an async transport: the engine pushes
//! batches into an unbounded mpsc channel and never waits; the transport
//! consumes them as a `Stream`.

use crate::ports::outbound::{DeliverySink, SinkError};
use shared_types::Message;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Delivery sink writing batches into a tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Vec<Message>>,
}

impl ChannelSink {
    /// Create a sink and the receiving end for the transport.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Vec<Message>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Create a sink and a stream of delivered batches.
    #[must_use]
    pub fn stream() -> (Self, UnboundedReceiverStream<Vec<Message>>) {
        let (sink, rx) = Self::channel();
        (sink, UnboundedReceiverStream::new(rx))
    }

    /// True once the receiving side was dropped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl DeliverySink for ChannelSink {
    fn deliver(&self, messages: Vec<Message>) -> Result<(), SinkError> {
        self.tx.send(messages).map_err(|_| SinkError::Closed)
    }
}
