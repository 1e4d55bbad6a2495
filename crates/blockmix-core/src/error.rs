//! Error types for blockmix-core.

use thiserror::Error;

/// Error type for blockmix-core operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid tempo: {0}. Must be finite and greater than zero")]
    InvalidTempo(f64),

    #[error("Invalid ticks per beat: {0}. Must be greater than zero")]
    InvalidTicksPerBeat(u32),

    #[error("Invalid song: {0}")]
    InvalidSong(String),

    #[error("Invalid sample {sample_id}: {reason}")]
    InvalidSample { sample_id: u32, reason: String },

    #[error("Invalid ring buffer: capacity={capacity}, block={block}")]
    InvalidRing { capacity: usize, block: usize },

    #[error("Invalid device: {0}")]
    InvalidDevice(String),

    #[cfg(feature = "cpal-output")]
    #[error("Audio device not available")]
    DeviceNotAvailable(#[from] cpal::DefaultStreamConfigError),

    #[cfg(feature = "cpal-output")]
    #[error("Failed to build audio stream")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[cfg(feature = "cpal-output")]
    #[error("Failed to play audio stream")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[cfg(feature = "cpal-output")]
    #[error("Failed to enumerate devices")]
    DevicesError(#[from] cpal::DevicesError),
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;
