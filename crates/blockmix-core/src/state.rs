//! Playback state published by the real-time consumer.
//!
//! Every field is written only by the sink and is independently consistent.
//! Readers must not assume two fields were published by the same callback.

use crate::lockfree::AtomicFlag;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct PlaybackState {
    frame: AtomicU64,
    tick_milli: AtomicU64,
    tempo_milli: AtomicU64,
    active_voices: AtomicU32,
    playing: AtomicFlag,
    underrun_count: AtomicU64,
}

impl PlaybackState {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn publish_position(&self, frame: u64, tick: f64, tempo: f64) {
        self.frame.store(frame, Ordering::Relaxed);
        self.tick_milli.store(to_milli(tick), Ordering::Relaxed);
        self.tempo_milli.store(to_milli(tempo), Ordering::Relaxed);
    }

    #[inline]
    pub fn publish_voices(&self, voices: u32) {
        self.active_voices.store(voices, Ordering::Relaxed);
    }

    #[inline]
    pub fn publish_playing(&self, playing: bool) {
        self.playing.set(playing);
    }

    #[inline]
    pub fn record_underrun(&self) {
        self.underrun_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frame(&self) -> u64 {
        self.frame.load(Ordering::Relaxed)
    }

    /// Current tick, with millitick resolution.
    pub fn tick(&self) -> f64 {
        self.tick_milli.load(Ordering::Relaxed) as f64 / 1000.0
    }

    pub fn tempo(&self) -> f64 {
        self.tempo_milli.load(Ordering::Relaxed) as f64 / 1000.0
    }

    pub fn active_voices(&self) -> u32 {
        self.active_voices.load(Ordering::Relaxed)
    }

    pub fn is_playing(&self) -> bool {
        self.playing.get()
    }

    pub fn underrun_count(&self) -> u64 {
        self.underrun_count.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            frame: self.frame(),
            tick_milli: self.tick_milli.load(Ordering::Relaxed),
            tempo_milli: self.tempo_milli.load(Ordering::Relaxed),
            active_voices: self.active_voices(),
            playing: self.is_playing(),
            underrun_count: self.underrun_count(),
        }
    }
}

#[inline]
fn to_milli(value: f64) -> u64 {
    (value.max(0.0) * 1000.0).round() as u64
}

/// Field-by-field copy of [`PlaybackState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackSnapshot {
    pub frame: u64,
    pub tick_milli: u64,
    pub tempo_milli: u64,
    pub active_voices: u32,
    pub playing: bool,
    pub underrun_count: u64,
}

impl PlaybackSnapshot {
    pub fn tick(&self) -> f64 {
        self.tick_milli as f64 / 1000.0
    }

    pub fn tempo(&self) -> f64 {
        self.tempo_milli as f64 / 1000.0
    }
}
