//! Error types for blockmix-render.

use thiserror::Error;

/// Errors from render-side setup and control.
#[derive(Error, Debug)]
pub enum Error {
    /// Core type rejected its input
    #[error(transparent)]
    Core(#[from] blockmix_core::Error),

    /// Render configuration out of range
    #[error("Invalid render config: {0}")]
    InvalidConfig(String),

    /// Render thread could not be spawned
    #[error("Failed to spawn render thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// Render thread has already exited
    #[error("Render thread is not running")]
    NotRunning,
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
