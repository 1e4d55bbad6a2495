//! Centralized error type for the blockmix umbrella crate.
//!
//! Wraps the core and render errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] blockmix_core::Error),

    #[error("Render: {0}")]
    Render(#[from] blockmix_render::Error),

    /// The engine was operated before `init()`
    #[error("Engine is not initialized")]
    NotInitialized,

    /// `take_sink()` was already called
    #[error("Sink processor was already taken")]
    SinkTaken,

    /// A command recipient has gone away
    #[error("Command channel closed")]
    ChannelClosed,

    /// A command queue is full because its recipient is not being driven
    #[error("Command queue full")]
    CommandQueueFull,
}

pub type Result<T> = std::result::Result<T, Error>;
