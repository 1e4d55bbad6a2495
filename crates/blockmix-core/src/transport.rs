//! Frame-position transports for the render and playback sides.
//!
//! Both sides derive their position independently from the same absolute
//! [`SeekTarget`], so a seek never depends on message order between them.

use crate::TempoMap;
use arc_swap::ArcSwapOption;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Absolute seek destination.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SeekTarget {
    Seconds(f64),
    Tick(f64),
}

impl SeekTarget {
    /// Resolves the target to a frame. A tick target without a tempo map resolves to 0.
    pub fn to_frame(self, tempo: Option<&TempoMap>, sample_rate: f64) -> u64 {
        match self {
            SeekTarget::Seconds(seconds) if seconds.is_finite() && seconds > 0.0 => {
                (seconds * sample_rate).round() as u64
            }
            SeekTarget::Seconds(_) => 0,
            SeekTarget::Tick(tick) => tempo.map_or(0, |map| map.ticks_to_frames(tick)),
        }
    }
}

/// Frame counter at a fixed sample rate.
#[derive(Debug, Clone)]
pub struct Transport {
    frame: u64,
    sample_rate: f64,
}

impl Transport {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            frame: 0,
            sample_rate,
        }
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    #[inline]
    pub fn current_seconds(&self) -> f64 {
        self.frame as f64 / self.sample_rate
    }

    #[inline]
    pub fn current_tick(&self, tempo: Option<&TempoMap>) -> f64 {
        tempo.map_or(0.0, |map| map.frames_to_ticks(self.frame))
    }

    #[inline]
    pub fn advance(&mut self, frames: usize) {
        self.frame += frames as u64;
    }

    pub fn seek(&mut self, target: SeekTarget, tempo: Option<&TempoMap>) {
        self.frame = target.to_frame(tempo, self.sample_rate);
    }

    pub fn rewind(&mut self) {
        self.frame = 0;
    }
}

/// Producer-side transport; owns the song's tempo map.
#[derive(Debug, Clone)]
pub struct RenderTransport {
    transport: Transport,
    tempo: Option<Arc<TempoMap>>,
}

impl RenderTransport {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            transport: Transport::new(sample_rate),
            tempo: None,
        }
    }

    /// Installs a new song's tempo map and rewinds to the start.
    pub fn load(&mut self, tempo: Arc<TempoMap>) {
        self.tempo = Some(tempo);
        self.transport.rewind();
    }

    pub fn tempo_map(&self) -> Option<&Arc<TempoMap>> {
        self.tempo.as_ref()
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.transport.frame()
    }

    #[inline]
    pub fn current_tick(&self) -> f64 {
        self.transport.current_tick(self.tempo.as_deref())
    }

    #[inline]
    pub fn current_seconds(&self) -> f64 {
        self.transport.current_seconds()
    }

    #[inline]
    pub fn advance(&mut self, frames: usize) {
        self.transport.advance(frames);
    }

    pub fn seek(&mut self, target: SeekTarget) {
        self.transport.seek(target, self.tempo.as_deref());
    }

    pub fn rewind(&mut self) {
        self.transport.rewind();
    }
}

/// Consumer-side transport with the play/pause/stop gate.
///
/// Reads the tempo map through an [`ArcSwapOption`] shared with the control
/// plane, so replacing the song never blocks the audio thread.
#[derive(Debug)]
pub struct PlaybackTransport {
    transport: Transport,
    tempo: Arc<ArcSwapOption<TempoMap>>,
    playing: bool,
}

impl PlaybackTransport {
    pub fn new(sample_rate: f64, tempo: Arc<ArcSwapOption<TempoMap>>) -> Self {
        Self {
            transport: Transport::new(sample_rate),
            tempo,
            playing: false,
        }
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Pauses and returns to the origin.
    pub fn stop(&mut self) {
        self.playing = false;
        self.transport.rewind();
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Advances only while playing.
    #[inline]
    pub fn advance(&mut self, frames: usize) {
        if self.playing {
            self.transport.advance(frames);
        }
    }

    pub fn seek(&mut self, target: SeekTarget) {
        let tempo = self.tempo.load();
        self.transport.seek(target, tempo.as_deref());
    }

    pub fn rewind(&mut self) {
        self.transport.rewind();
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.transport.frame()
    }

    #[inline]
    pub fn current_tick(&self) -> f64 {
        let tempo = self.tempo.load();
        self.transport.current_tick(tempo.as_deref())
    }

    /// `(frame, tick, tempo)` read against a single tempo map load.
    #[inline]
    pub fn position(&self) -> (u64, f64, f64) {
        let tempo = self.tempo.load();
        match tempo.as_deref() {
            Some(map) => {
                let tick = self.transport.current_tick(Some(map));
                (self.frame(), tick, map.tempo_at(tick))
            }
            None => (self.frame(), 0.0, 0.0),
        }
    }
}
