// Layer 1: Standard library imports
use std::io;

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
// (none)

/// Errors surfaced by [`ActorSystem`](super::ActorSystem) operations.
#[derive(Debug, Error)]
pub enum SystemError {
    /// The supplied configuration failed validation.
    #[error("invalid system configuration: {0}")]
    InvalidConfig(String),

    /// The OS refused to start the actor's thread.
    #[error("failed to spawn actor thread: {0}")]
    SpawnFailed(#[from] io::Error),
}
