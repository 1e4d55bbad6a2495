//! Commands for the render thread.

use blockmix_core::{SampleBuffer, SeekTarget, SongData, TempoMap};
use std::sync::Arc;

/// Command sent to the [`RenderThread`](crate::RenderThread).
#[derive(Debug, Clone)]
pub enum RenderCommand {
    /// Replace the song and restart from tick 0.
    Song {
        song: Box<SongData>,
        /// Map built from `song` by the sender, which validated it.
        tempo_map: Arc<TempoMap>,
        epoch: u64,
    },
    /// Register or replace one sample's audio.
    Sample {
        sample_id: u32,
        buffer: Arc<SampleBuffer>,
    },
    /// Reposition to an absolute target.
    Seek { target: SeekTarget, epoch: u64 },
    /// Silence everything and return to the origin.
    Stop { epoch: u64 },
    /// Leave the render loop.
    Shutdown,
}

impl RenderCommand {
    /// Reset epoch carried by this command, if any.
    pub fn epoch(&self) -> Option<u64> {
        match self {
            RenderCommand::Song { epoch, .. }
            | RenderCommand::Seek { epoch, .. }
            | RenderCommand::Stop { epoch } => Some(*epoch),
            RenderCommand::Sample { .. } | RenderCommand::Shutdown => None,
        }
    }
}
