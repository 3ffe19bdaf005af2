//! Configuration from environment variables.
//!
//! # Environment Variables
//!
//! - `CHAT_HISTORY_CAPACITY`: messages kept in history (default: 20)
//! - `CHAT_RECENCY_WINDOW_SECS`: initial-sync window (default: 3600)
//! - `CHAT_PERIODIC_INTERVAL_SECS`: housekeeping interval (default: 60)
//! - `CHAT_LOG_LEVEL`: log filter when `RUST_LOG` is unset (default: info)

use crate::RuntimeError;
use chat_engine::ChatConfig;
use std::env;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

pub const ENV_HISTORY_CAPACITY: &str = "CHAT_HISTORY_CAPACITY";
pub const ENV_RECENCY_WINDOW_SECS: &str = "CHAT_RECENCY_WINDOW_SECS";
pub const ENV_PERIODIC_INTERVAL_SECS: &str = "CHAT_PERIODIC_INTERVAL_SECS";
pub const ENV_LOG_LEVEL: &str = "CHAT_LOG_LEVEL";

/// Load the configuration from the process environment.
pub fn load_config() -> Result<ChatConfig, RuntimeError> {
    load_config_from(|key| env::var(key).ok())
}

/// Load the configuration, resolving variables through `lookup`.
pub fn load_config_from<F>(lookup: F) -> Result<ChatConfig, RuntimeError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = ChatConfig::default();

    if let Some(value) = parse_var(&lookup, ENV_HISTORY_CAPACITY)? {
        config.history_capacity = value;
    }
    if let Some(value) = parse_var(&lookup, ENV_RECENCY_WINDOW_SECS)? {
        config.recency_window_secs = value;
    }
    if let Some(value) = parse_var(&lookup, ENV_PERIODIC_INTERVAL_SECS)? {
        config.periodic_interval_secs = value;
    }
    if let Some(level) = lookup(ENV_LOG_LEVEL) {
        EnvFilter::try_new(&level).map_err(|e| RuntimeError::InvalidOverride {
            var: ENV_LOG_LEVEL,
            value: level.clone(),
            reason: e.to_string(),
        })?;
        config.log_level = level;
    }

    config.validate()?;
    Ok(config)
}

fn parse_var<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, RuntimeError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|e: T::Err| RuntimeError::InvalidOverride {
            var,
            value: raw.clone(),
            reason: e.to_string(),
        })
}
