//! # Shared Bus - Event Pipeline for Chat Listeners
//!
//! The pluggable middleware chain the chat engine consumes for
//! authorization, content transformation and response shaping.
//!
//! ## Dispatch Modes
//!
//! - **notify:** every listener runs, return values ignored (lifecycle and
//!   periodic broadcasts)
//! - **notify_until:** listeners run until one claims the event (auth
//!   check, per-reader visibility veto)
//! - **filter:** a value is piped through every listener (all transform
//!   passes)
//!
//! ```text
//! ┌──────────────┐   attach(topic, handler, priority)   ┌──────────────┐
//! │   Plugins    │ ───────────────────────────────────→ │  Dispatcher  │
//! └──────────────┘                                      │  topic → [..]│
//!                                                       └──────┬───────┘
//! ┌──────────────┐   notify / notify_until / filter            │
//! │ Chat Engine  │ ←───────────────────────────────────────────┘
//! └──────────────┘
//! ```
//!
//! Lower priority numbers run earlier; ties run in registration order.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod dispatcher;
pub mod events;
pub mod listener;

// Re-export main types
pub use dispatcher::Dispatcher;
pub use events::{topics, Event, EventContext, Ingest, Payload};
pub use listener::{Handler, Listener, ListenerId, Plugin};

/// Priority used when a listener does not ask for one.
pub const DEFAULT_PRIORITY: i32 = 100;
