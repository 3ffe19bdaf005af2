//! Ports (hexagonal architecture).

pub mod inbound;
pub mod outbound;

pub use inbound::ChatApi;
pub use outbound::{DeliverySink, SinkError, SystemTimeSource, TimeSource};
