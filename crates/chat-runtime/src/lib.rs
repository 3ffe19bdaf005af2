//! # Chat Runtime
//!
//! Wires the chat engine into a running process.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (`load_config`, environment overrides)
//! 2. Install tracing (`init_tracing`)
//! 3. Build the dispatcher and register plugins (`ChatRuntime::new`)
//! 4. Initialize the engine and spawn the periodic ticker (`start`)
//! 5. Hand `service()` to the transport adapter
//!
//! ```text
//! ┌──────────────┐  chat.periodic every N secs  ┌──────────────┐
//! │ ticker task  │ ───────────────────────────→ │ ChatService  │
//! └──────┬───────┘                              └──────────────┘
//!        │ watch::Receiver<bool>
//! ┌──────┴───────┐
//! │  stop()      │  signal, await ticker, shutdown()
//! └──────────────┘
//! ```

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod config;
pub mod tracing_setup;

pub use config::{load_config, load_config_from};
pub use tracing_setup::init_tracing;

use anyhow::{Context, Result};
use chat_engine::{ChatApi, ChatConfig, ChatError, ChatService, ConfigError};
use parking_lot::Mutex;
use shared_bus::{Dispatcher, Plugin};
use shared_types::{SystemTimeSource, TimeSource};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Runtime errors.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// An environment override could not be parsed.
    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidOverride {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error(transparent)]
    Engine(#[from] ChatError),
}

/// A chat engine together with its periodic ticker.
pub struct ChatRuntime {
    service: Arc<ChatService>,
    shutdown_tx: watch::Sender<bool>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl ChatRuntime {
    /// Build the dispatcher, register `plugins` in order and construct the
    /// engine.
    pub fn new(config: ChatConfig, plugins: Vec<Arc<dyn Plugin>>) -> Result<Self, RuntimeError> {
        Self::with_time_source(config, plugins, Arc::new(SystemTimeSource))
    }

    /// Same as `new` with an explicit clock.
    pub fn with_time_source(
        config: ChatConfig,
        plugins: Vec<Arc<dyn Plugin>>,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self, RuntimeError> {
        let dispatcher = Arc::new(Dispatcher::new());
        for plugin in plugins {
            dispatcher.attach_plugin(plugin);
        }
        let service = ChatService::with_time_source(config, dispatcher, clock)?;
        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self {
            service: Arc::new(service),
            shutdown_tx,
            ticker: Mutex::new(None),
        })
    }

    /// Shared engine handle for the transport adapter.
    #[must_use]
    pub fn service(&self) -> Arc<ChatService> {
        Arc::clone(&self.service)
    }

    /// Initialize the engine and spawn the periodic ticker.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn start(&self) -> Result<()> {
        self.service.init().context("Failed to initialize chat")?;

        let service = Arc::clone(&self.service);
        let period = self.service.config().periodic_interval();
        let mut shutdown = self.shutdown_tx.subscribe();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        service.periodic_tick();
                    }
                    _ = shutdown.changed() => {
                        debug!("Periodic ticker stopping");
                        break;
                    }
                }
            }
        });
        *self.ticker.lock() = Some(handle);

        info!(
            periodic_interval_secs = period.as_secs(),
            "Chat runtime started"
        );
        Ok(())
    }

    /// Stop the ticker and shut the engine down. Returns the number of
    /// subscribers drained.
    pub async fn stop(&self) -> Result<usize> {
        // No receiver only means the ticker is already gone.
        let _ = self.shutdown_tx.send(true);

        let ticker = self.ticker.lock().take();
        if let Some(handle) = ticker {
            handle.await.context("Periodic ticker panicked")?;
        }

        let drained = self.service.shutdown().context("Failed to shut down chat")?;
        info!(drained, "Chat runtime stopped");
        Ok(drained)
    }
}
