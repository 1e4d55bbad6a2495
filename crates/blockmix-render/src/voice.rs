//! Polyphonic voice pool with oldest-first stealing.

use blockmix_core::{NoteEvent, SampleBuffer};
use hashbrown::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;

/// One sounding instance of a sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Voice {
    pub sample_id: u32,
    /// Fractional read position in source frames.
    pub position: f64,
    pub gain: f32,
    pub pan: f32,
    pub pitch_ratio: f64,
}

impl From<&NoteEvent> for Voice {
    fn from(note: &NoteEvent) -> Self {
        Self {
            sample_id: note.sample_id,
            position: 0.0,
            gain: note.gain,
            pan: note.pan,
            pitch_ratio: note.pitch_ratio,
        }
    }
}

/// Voices in spawn order (front is oldest) plus the sample table they read from.
#[derive(Debug)]
pub struct VoiceManager {
    voices: VecDeque<Voice>,
    max_voices: usize,
    samples: HashMap<u32, Arc<SampleBuffer>>,
}

impl VoiceManager {
    pub fn new(max_voices: usize) -> Self {
        Self {
            voices: VecDeque::with_capacity(max_voices),
            max_voices,
            samples: HashMap::new(),
        }
    }

    /// Starts a voice for `note`, evicting the oldest voices if at capacity.
    pub fn spawn(&mut self, note: &NoteEvent) {
        if self.max_voices == 0 {
            return;
        }
        while self.voices.len() >= self.max_voices {
            self.voices.pop_front();
        }
        self.voices.push_back(Voice::from(note));
    }

    /// Sets the cap and drops the oldest voices above it.
    pub fn trim_voices(&mut self, max_voices: usize) {
        self.max_voices = max_voices;
        if self.voices.len() > max_voices {
            let excess = self.voices.len() - max_voices;
            self.voices.drain(..excess);
        }
    }

    /// Drops `floor(count * ratio)` of the oldest voices.
    pub fn kill_voices_ratio(&mut self, ratio: f64) {
        let ratio = if ratio.is_nan() {
            0.0
        } else {
            ratio.clamp(0.0, 1.0)
        };
        let kill = (self.voices.len() as f64 * ratio).floor() as usize;
        self.voices.drain(..kill.min(self.voices.len()));
    }

    pub fn reset_voices(&mut self) {
        self.voices.clear();
    }

    /// Registers or replaces the audio for `sample_id`.
    pub fn load_sample(&mut self, sample_id: u32, buffer: Arc<SampleBuffer>) {
        self.samples.insert(sample_id, buffer);
    }

    pub fn sample(&self, sample_id: u32) -> Option<&Arc<SampleBuffer>> {
        self.samples.get(&sample_id)
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn active_count(&self) -> usize {
        self.voices.len()
    }

    #[inline]
    pub fn max_voices(&self) -> usize {
        self.max_voices
    }

    pub fn voices(&self) -> impl Iterator<Item = &Voice> {
        self.voices.iter()
    }

    pub(crate) fn parts_mut(
        &mut self,
    ) -> (&mut VecDeque<Voice>, &HashMap<u32, Arc<SampleBuffer>>) {
        (&mut self.voices, &self.samples)
    }
}
