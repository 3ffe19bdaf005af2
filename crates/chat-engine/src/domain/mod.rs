//! Domain layer: pure engine state and policies.

pub mod config;
pub mod errors;
pub mod history;
pub mod lifecycle;
pub mod registry;
pub mod services;
pub mod value_objects;

pub use config::{ChatConfig, ConfigError};
pub use errors::{ChatError, ChatResult};
pub use history::{HistoryStore, ReplayBound};
pub use lifecycle::{Lifecycle, LifecycleState};
pub use registry::{same_sink, SubscriberRegistry, Subscription};
pub use services::OutputFilter;
pub use value_objects::{AttachOutcome, FanOutSummary};
