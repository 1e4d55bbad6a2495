//! Song data handed over by a song loader.

use crate::{Error, Result, TempoMap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A note to be triggered at `tick`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub tick: u32,
    pub sample_id: u32,
    /// Playback rate relative to the sample's native pitch.
    pub pitch_ratio: f64,
    /// Linear gain in `[0, 1]`.
    pub gain: f32,
    /// Stereo position in `[-1, 1]`, negative is left.
    pub pan: f32,
}

impl NoteEvent {
    pub fn new(tick: u32, sample_id: u32) -> Self {
        Self {
            tick,
            sample_id,
            pitch_ratio: 1.0,
            gain: 1.0,
            pan: 0.0,
        }
    }

    pub fn with_pitch(mut self, pitch_ratio: f64) -> Self {
        self.pitch_ratio = pitch_ratio;
        self
    }

    pub fn with_gain(mut self, gain: f32) -> Self {
        self.gain = gain;
        self
    }

    pub fn with_pan(mut self, pan: f32) -> Self {
        self.pan = pan;
        self
    }

    fn validate(&self, key: u32) -> Result<()> {
        if self.tick != key {
            return Err(Error::InvalidSong(format!(
                "note at tick {} stored under tick {key}",
                self.tick
            )));
        }
        if !(0.0..=1.0).contains(&self.gain) {
            return Err(Error::InvalidSong(format!(
                "note at tick {key}: gain {} outside [0, 1]",
                self.gain
            )));
        }
        if !(-1.0..=1.0).contains(&self.pan) {
            return Err(Error::InvalidSong(format!(
                "note at tick {key}: pan {} outside [-1, 1]",
                self.pan
            )));
        }
        if !self.pitch_ratio.is_finite() || self.pitch_ratio <= 0.0 {
            return Err(Error::InvalidSong(format!(
                "note at tick {key}: pitch ratio {} must be positive",
                self.pitch_ratio
            )));
        }
        Ok(())
    }
}

/// A tempo change taking effect at `tick`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoChangeEvent {
    pub tick: u32,
    /// Beats per minute.
    pub tempo: f64,
}

/// A complete song: notes and tempo changes indexed by tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SongData {
    pub notes_by_tick: BTreeMap<u32, Vec<NoteEvent>>,
    pub tempo_changes_by_tick: BTreeMap<u32, f64>,
    pub ticks_per_beat: u32,
    /// Beats per minute before the first tempo change.
    pub initial_tempo: f64,
}

impl SongData {
    pub fn new(initial_tempo: f64, ticks_per_beat: u32) -> Self {
        Self {
            initial_tempo,
            ticks_per_beat,
            ..Default::default()
        }
    }

    /// Adds a note under its own tick.
    pub fn add_note(&mut self, note: NoteEvent) {
        self.notes_by_tick.entry(note.tick).or_default().push(note);
    }

    pub fn add_tempo_change(&mut self, change: TempoChangeEvent) {
        self.tempo_changes_by_tick.insert(change.tick, change.tempo);
    }

    pub fn note_count(&self) -> usize {
        self.notes_by_tick.values().map(Vec::len).sum()
    }

    /// Last tick that carries a note or tempo change.
    pub fn last_tick(&self) -> Option<u32> {
        let notes = self.notes_by_tick.keys().next_back().copied();
        let tempo = self.tempo_changes_by_tick.keys().next_back().copied();
        notes.max(tempo)
    }

    /// Validates every note and builds the song's tempo map.
    pub fn tempo_map(&self, sample_rate: f64) -> Result<TempoMap> {
        for (&tick, notes) in &self.notes_by_tick {
            for note in notes {
                note.validate(tick)?;
            }
        }
        TempoMap::from_changes(
            &self.tempo_changes_by_tick,
            self.initial_tempo,
            self.ticks_per_beat,
            sample_rate,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song() -> SongData {
        let mut song = SongData::new(120.0, 4);
        song.add_note(NoteEvent::new(0, 1));
        song.add_note(NoteEvent::new(0, 2).with_pan(-0.5));
        song.add_note(NoteEvent::new(8, 1).with_gain(0.25));
        song.add_tempo_change(TempoChangeEvent {
            tick: 16,
            tempo: 60.0,
        });
        song
    }

    #[test]
    fn test_valid_song_builds_tempo_map() {
        let song = song();
        assert_eq!(song.note_count(), 3);
        assert_eq!(song.last_tick(), Some(16));
        let map = song.tempo_map(48000.0).unwrap();
        assert_eq!(map.entries().len(), 2);
    }

    #[test]
    fn test_rejects_misfiled_note() {
        let mut song = song();
        song.notes_by_tick
            .entry(4)
            .or_default()
            .push(NoteEvent::new(5, 1));
        let err = song.tempo_map(48000.0).unwrap_err();
        assert!(matches!(err, Error::InvalidSong(_)));
        assert!(err.to_string().contains("tick 5"));
    }

    #[test]
    fn test_rejects_out_of_range_note_fields() {
        for note in [
            NoteEvent::new(2, 1).with_gain(1.5),
            NoteEvent::new(2, 1).with_pan(-1.1),
            NoteEvent::new(2, 1).with_pitch(0.0),
            NoteEvent::new(2, 1).with_pitch(f64::NAN),
        ] {
            let mut song = song();
            song.add_note(note);
            assert!(song.tempo_map(48000.0).is_err(), "accepted {note:?}");
        }
    }

    #[test]
    fn test_rejects_bad_tempo() {
        let mut song = song();
        song.add_tempo_change(TempoChangeEvent { tick: 4, tempo: 0.0 });
        assert!(matches!(
            song.tempo_map(48000.0),
            Err(Error::InvalidTempo(_))
        ));
    }

    #[test]
    fn test_deserialize_song() {
        let json = r#"{
            "notes_by_tick": {
                "0": [{ "tick": 0, "sample_id": 3, "pitch_ratio": 2.0, "gain": 0.5, "pan": 0.0 }]
            },
            "tempo_changes_by_tick": { "32": 180.0 },
            "ticks_per_beat": 4,
            "initial_tempo": 150.0
        }"#;
        let song: SongData = serde_json::from_str(json).unwrap();
        assert_eq!(song.notes_by_tick[&0][0].sample_id, 3);
        assert_eq!(song.tempo_changes_by_tick[&32], 180.0);
        assert!(song.tempo_map(48000.0).is_ok());
    }
}
