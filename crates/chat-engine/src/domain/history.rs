//! # History Store - Bounded Rolling Message Cache
//!
//! Fixed-capacity, most-recent-first sequence of stored messages.
//!
//! ## Invariants Enforced
//!
//! - Size never exceeds capacity; inserting into a full store evicts the
//!   oldest entry (`push()`)
//! - Always holds the most recent messages, newest at the front
//!
//! ## Replay Scan
//!
//! A replay walks from newest to oldest and stops at the first message
//! outside its `ReplayBound`: the cursor message itself, or the first
//! message older than the recency window. Nothing past that point is
//! visited.

use shared_types::{Message, MessageId, Timestamp};
use std::collections::VecDeque;

/// Where a replay scan stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayBound {
    /// Resume strictly after this message.
    After(MessageId),
    /// Initial sync: only messages dated at or after this instant.
    Since(Timestamp),
}

impl ReplayBound {
    /// True while the scan may continue past `message`.
    #[must_use]
    pub fn admits(&self, message: &Message) -> bool {
        match self {
            Self::After(cursor) => message.id != *cursor,
            Self::Since(not_before) => message.date >= *not_before,
        }
    }
}

/// Bounded most-recent-first message store.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    capacity: usize,
    /// Front is the newest message.
    entries: VecDeque<Message>,
    appended: u64,
}

impl HistoryStore {
    /// Creates an empty store holding at most `capacity` messages.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
            appended: 0,
        }
    }

    /// Inserts `message` as the newest entry, returning the evicted oldest
    /// entry when the store was full.
    pub fn push(&mut self, message: Message) -> Option<Message> {
        self.entries.push_front(message);
        self.appended += 1;
        let mut evicted = None;
        while self.entries.len() > self.capacity {
            evicted = self.entries.pop_back();
        }
        evicted
    }

    /// Clones the messages a replay may visit, newest first.
    #[must_use]
    pub fn window(&self, bound: ReplayBound) -> Vec<Message> {
        self.entries
            .iter()
            .take_while(|message| bound.admits(message))
            .cloned()
            .collect()
    }

    /// Iterates newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter()
    }

    /// Clones the whole history, oldest first.
    #[must_use]
    pub fn chronological(&self) -> Vec<Message> {
        self.entries.iter().rev().cloned().collect()
    }

    /// The newest message.
    #[must_use]
    pub fn latest(&self) -> Option<&Message> {
        self.entries.front()
    }

    /// True if `id` is still held.
    #[must_use]
    pub fn contains(&self, id: &MessageId) -> bool {
        self.entries.iter().any(|message| message.id == *id)
    }

    /// Number of stored messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Messages pushed since creation, evicted ones included.
    #[must_use]
    pub fn appended(&self) -> u64 {
        self.appended
    }

    /// Configured capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
