//! # blockmix - Real-time Sample Mixing Engine
//!
//! Plays songs made of sample-triggering notes on a tick grid with tempo
//! changes. A render thread mixes fixed-size blocks ahead of time into a
//! lock-free ring; the host audio callback drains the ring through a
//! [`SinkProcessor`] that never blocks, allocates or fails.
//!
//! ## Architecture
//!
//! blockmix is an umbrella crate that coordinates:
//! - **blockmix-core** - Tempo map, transports, SPSC ring, playback state, sink processor
//! - **blockmix-render** - Scheduler, voice pool, resamplers, adaptive load balancer, render thread
//!
//! ## Quick Start
//!
//! ```ignore
//! use blockmix::prelude::*;
//!
//! let engine = BlockmixEngine::builder()
//!     .sample_rate(48000.0)
//!     .build()?;
//! engine.init()?;
//!
//! engine.load_sample(1, SampleBuffer::mono(kick))?;
//!
//! let mut song = SongData::new(120.0, 4);
//! song.add_note(NoteEvent::new(0, 1));
//! engine.load_song(song)?;
//!
//! let mut sink = engine.take_sink()?;
//! engine.play()?;
//! // in the audio callback:
//! sink.process(&mut left, &mut right);
//! ```
//!
//! ## Feature Flags
//!
//! - `cpal-output` - `BlockmixEngine::start_output()` drives the sink from a CPAL device

/// Re-export of blockmix-core for direct access
pub use blockmix_core as core;

/// Re-export of blockmix-render for direct access
pub use blockmix_render as render;

pub use blockmix_core::{
    tempo_from_ticks_per_second, EngineConfig, NoteEvent, PlaybackSnapshot, PlaybackState,
    SampleBuffer, SeekTarget, SinkProcessor, SongData, TempoChangeEvent, TempoMap,
};

pub use blockmix_render::{BalancerTuning, RenderConfig, RenderStatsSnapshot, ResamplerTier};

mod error;
pub use error::{Error, Result};

mod config;
pub use config::BlockmixConfig;

mod builder;
mod engine;

pub use builder::BlockmixEngineBuilder;
pub use engine::BlockmixEngine;

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::{BlockmixEngine, BlockmixEngineBuilder};

    pub use crate::{BlockmixConfig, Error, Result};

    pub use crate::{
        NoteEvent, PlaybackSnapshot, ResamplerTier, SampleBuffer, SeekTarget, SinkProcessor,
        SongData, TempoChangeEvent,
    };
}
