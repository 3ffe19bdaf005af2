//! Results reported by engine operations.

use serde::{Deserialize, Serialize};
use shared_types::SubscriberId;

/// What `attach_poller` did with the new subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachOutcome {
    /// History was replayed in one batch; nothing was registered.
    Replayed { count: usize },
    /// Nothing replayable; the subscriber is parked.
    Waiting { subscriber: SubscriberId },
}

impl AttachOutcome {
    /// True if the subscriber was parked in the registry.
    #[must_use]
    pub fn is_waiting(&self) -> bool {
        matches!(self, Self::Waiting { .. })
    }
}

/// Counters of one fan-out pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanOutSummary {
    /// Sinks that accepted the message.
    pub delivered: usize,
    /// Subscribers the message was hidden from; still waiting.
    pub reinserted: usize,
    /// Sinks that returned an error; consumed.
    pub failed: usize,
}
