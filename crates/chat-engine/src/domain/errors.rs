//! Chat engine error types.
//!
//! All failures are local and synchronous; the engine never retries. The
//! transport adapter decides how they map to client-visible responses.

use super::lifecycle::LifecycleState;
use thiserror::Error;

/// Result alias for engine operations.
pub type ChatResult<T> = Result<T, ChatError>;

/// Chat engine error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    /// Operation attempted outside the `Initialized` state.
    #[error("chat is not initialized (operation: {operation})")]
    Uninitialized { operation: &'static str },

    /// `init()` called on an engine that already left `Uninitialized`.
    #[error("chat cannot be initialized again (state: {state})")]
    ReinitializationForbidden { state: LifecycleState },

    /// No `auth.check` listener accepted the poster.
    #[error("authentication rejected")]
    AuthRejected,
}
