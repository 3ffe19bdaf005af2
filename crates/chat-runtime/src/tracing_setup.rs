//! Tracing subscriber setup.

use crate::RuntimeError;
use chat_engine::ChatConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a fmt subscriber filtered by `RUST_LOG`, falling back to the
/// configured level.
///
/// Returns `Ok(false)` when a global subscriber is already installed.
pub fn init_tracing(config: &ChatConfig) -> Result<bool, RuntimeError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| RuntimeError::InvalidOverride {
            var: "log_level",
            value: config.log_level.clone(),
            reason: e.to_string(),
        })?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(log_level = %config.log_level, "Tracing initialized");
    }
    Ok(installed)
}
