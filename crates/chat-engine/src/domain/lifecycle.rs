//! Lifecycle gate wrapping every public engine operation.
//!
//! ```text
//! Uninitialized ──init()──→ Initialized ──shutdown()──→ ShutDown
//! ```
//!
//! `ShutDown` is terminal: an engine instance is single-use.

use super::errors::{ChatError, ChatResult};
use std::fmt;

/// Engine lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LifecycleState {
    #[default]
    Uninitialized,
    Initialized,
    ShutDown,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Initialized => "initialized",
            Self::ShutDown => "shut down",
        };
        f.write_str(name)
    }
}

/// State machine behind the engine's lifecycle mutex.
#[derive(Debug, Default)]
pub struct Lifecycle {
    state: LifecycleState,
}

impl Lifecycle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uninitialized -> Initialized. Any other starting state is rejected
    /// without a transition.
    pub fn begin_init(&mut self) -> ChatResult<()> {
        match self.state {
            LifecycleState::Uninitialized => {
                self.state = LifecycleState::Initialized;
                Ok(())
            }
            state => Err(ChatError::ReinitializationForbidden { state }),
        }
    }

    /// Initialized -> ShutDown.
    pub fn begin_shutdown(&mut self) -> ChatResult<()> {
        self.ensure_initialized("shutdown")?;
        self.state = LifecycleState::ShutDown;
        Ok(())
    }

    /// Fails with `Uninitialized` unless the engine is serving traffic.
    pub fn ensure_initialized(&self, operation: &'static str) -> ChatResult<()> {
        if self.state == LifecycleState::Initialized {
            Ok(())
        } else {
            Err(ChatError::Uninitialized { operation })
        }
    }

    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.state
    }
}
