//! Time domain and real-time consumer side of the blockmix engine.
//!
//! # Primary API
//!
//! - [`TempoMap`]: tick/seconds/frame conversion for one song
//! - [`RingBuffer`]: lock-free SPSC hand-off between render and playback
//! - [`SinkProcessor`]: the host callback's view of the engine
//! - [`PlaybackState`]: atomics published by the sink for any reader
//!
//! # Feature-gated APIs
//!
//! - `"cpal-output"`: [`OutputStream`] drives a sink from the default device

pub mod error;
pub use error::{Error, Result};

pub mod config;
pub use config::{EngineConfig, MAX_BLOCK_SIZE};

pub mod lockfree;
pub use lockfree::{AtomicCursor, AtomicDouble, AtomicFlag, AtomicFloat};

pub mod tempo_map;
pub use tempo_map::{tempo_from_ticks_per_second, TempoMap, TempoMapEntry};

mod song;
pub use song::{NoteEvent, SongData, TempoChangeEvent};

mod sample;
pub use sample::SampleBuffer;

pub mod transport;
pub use transport::{PlaybackTransport, RenderTransport, SeekTarget, Transport};

pub mod ring;
pub use ring::{ReadOutcome, RingBuffer, RingConsumer, RingProducer};

mod state;
pub use state::{PlaybackSnapshot, PlaybackState};

mod command;
pub use command::SinkCommand;

mod sink;
pub use sink::SinkProcessor;

#[cfg(feature = "cpal-output")]
mod output;
#[cfg(feature = "cpal-output")]
pub use output::{device_sample_rate, OutputStream};
