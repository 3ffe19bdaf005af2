//! # Chat Engine
//!
//! Message ingestion and delivery core of the chat bus.
//!
//! ## Purpose
//!
//! Accepts a message, authorizes and transforms it through the listener
//! pipeline (`shared-bus`), stores it in a bounded rolling history, and
//! delivers it to waiting subscribers with one-message-per-wake-up
//! long-poll semantics, cursor-based resumption and per-subscriber output
//! filtering.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | History never exceeds capacity | `domain/history.rs` - `push()` evicts oldest |
//! | Subscription present iff not yet offered a visible message | `service.rs` - `fan_out()` |
//! | No sink ever receives an empty batch | `service.rs` - `attach_poller()`, `fan_out()` |
//! | Init only from `Uninitialized`; `ShutDown` is terminal | `domain/lifecycle.rs` |
//! | Hidden message never reaches that reader's sink | `domain/services.rs` - `OutputFilter` |
//!
//! ## Lifecycle
//!
//! ```text
//! [Uninitialized] ──init()──→ [Initialized] ──shutdown()──→ [ShutDown]
//!        │                          │
//!        └── recv / attach / detach ┘ fail with `Uninitialized` outside
//!                                     the middle state
//! ```
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      OUTER LAYER                                │
//! │  adapters/sinks.rs - ChannelSink (tokio mpsc → Stream)          │
//! │  service.rs        - ChatService (implements ChatApi)           │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ implements ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      MIDDLE LAYER                               │
//! │  ports/inbound.rs  - ChatApi trait                              │
//! │  ports/outbound.rs - DeliverySink, TimeSource traits            │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      INNER LAYER                                │
//! │  domain/history.rs   - HistoryStore, ReplayBound                │
//! │  domain/registry.rs  - SubscriberRegistry, Subscription         │
//! │  domain/services.rs  - OutputFilter (prevent + read filter)     │
//! │  domain/lifecycle.rs - Lifecycle state machine                  │
//! │  domain/config.rs    - ChatConfig                               │
//! │  domain/errors.rs    - ChatError enum                           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! let bus = Arc::new(Dispatcher::new());
//! bus.attach_plugin(Arc::new(NoAuth));
//!
//! let chat = ChatService::new(ChatConfig::default(), bus)?;
//! chat.init()?;
//!
//! let (sink, mut stream) = ChannelSink::stream();
//! chat.attach_poller(Some(user), Arc::new(sink), None)?;
//! chat.recv("hello", Some(author), Args::new())?;
//! ```

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::*;
pub use domain::*;
pub use ports::*;
pub use service::{ChatService, SHUTDOWN_NOTICE};
