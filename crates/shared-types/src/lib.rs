//! # Shared Types Crate
//!
//! This crate contains the chat domain entities exchanged between the
//! event pipeline (`shared-bus`), the delivery engine and the listeners.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: `Message`, `UserIdentity` and friends are
//!   defined once here.
//! - **Immutable History**: a stored `Message` is never mutated; listeners
//!   that reshape a message per reader work on a clone.
//! - **Opaque Identity**: the engine keys users by `UserId` only; every
//!   other attribute belongs to the listeners.

pub mod entities;
pub mod time;

pub use entities::*;
pub use time::*;
