//! Adapters (hexagonal architecture).

pub mod sinks;

pub use sinks::ChannelSink;
