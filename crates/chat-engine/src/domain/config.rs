//! Engine configuration with validation.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Chat engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Maximum number of messages kept in the rolling history.
    pub history_capacity: usize,
    /// Maximum age (seconds) of a message replayed to a cursor-less subscriber.
    pub recency_window_secs: u64,
    /// Interval (seconds) between `chat.periodic` ticks, driven by the runtime.
    pub periodic_interval_secs: u64,
    /// Default log filter when `RUST_LOG` is not set.
    pub log_level: String,
}

impl ChatConfig {
    /// Default rolling history size.
    pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

    /// Default recency window: one hour.
    pub const DEFAULT_RECENCY_WINDOW_SECS: u64 = 3_600;

    /// Default housekeeping interval: one minute.
    pub const DEFAULT_PERIODIC_INTERVAL_SECS: u64 = 60;

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_capacity == 0 {
            return Err(ConfigError::ZeroHistoryCapacity);
        }
        if self.recency_window_secs == 0 {
            return Err(ConfigError::ZeroRecencyWindow);
        }
        if self.periodic_interval_secs == 0 {
            return Err(ConfigError::ZeroPeriodicInterval);
        }
        Ok(())
    }

    /// Recency window as a duration.
    #[must_use]
    pub fn recency_window(&self) -> Duration {
        Duration::from_secs(self.recency_window_secs)
    }

    /// Housekeeping interval as a duration.
    #[must_use]
    pub fn periodic_interval(&self) -> Duration {
        Duration::from_secs(self.periodic_interval_secs)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_capacity: Self::DEFAULT_HISTORY_CAPACITY,
            recency_window_secs: Self::DEFAULT_RECENCY_WINDOW_SECS,
            periodic_interval_secs: Self::DEFAULT_PERIODIC_INTERVAL_SECS,
            log_level: "info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("history_capacity must be greater than 0")]
    ZeroHistoryCapacity,
    #[error("recency_window_secs must be greater than 0")]
    ZeroRecencyWindow,
    #[error("periodic_interval_secs must be greater than 0")]
    ZeroPeriodicInterval,
}
