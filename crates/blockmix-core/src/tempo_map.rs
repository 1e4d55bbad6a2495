//! Piecewise-constant tempo map over song ticks.

use crate::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;

const MICROS_PER_SECOND: f64 = 1_000_000.0;

/// Converts a song tempo stored as ticks per second into beats per minute.
///
/// Note Block Studio files store their tempo this way; at four ticks per beat
/// this is `tps * 15`.
#[inline]
pub fn tempo_from_ticks_per_second(ticks_per_second: f64, ticks_per_beat: u32) -> f64 {
    ticks_per_second * 60.0 / ticks_per_beat as f64
}

/// One constant-tempo segment, starting at `tick`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TempoMapEntry {
    pub tick: u32,
    pub tempo: f64,
    pub micros_per_tick: f64,
    /// Elapsed time at `tick` since tick 0.
    pub cumulative_micros: f64,
}

/// Immutable tick/time mapping built once per song.
#[derive(Debug, Clone)]
pub struct TempoMap {
    entries: Vec<TempoMapEntry>,
    ticks_per_beat: u32,
    sample_rate: f64,
}

impl TempoMap {
    /// Constant-tempo map.
    pub fn new(tempo: f64, ticks_per_beat: u32, sample_rate: f64) -> Result<Self> {
        Self::from_changes(&BTreeMap::new(), tempo, ticks_per_beat, sample_rate)
    }

    /// Builds the map from tempo changes keyed by tick.
    ///
    /// If no change exists at tick 0, `initial_tempo` covers the song start.
    pub fn from_changes(
        changes: &BTreeMap<u32, f64>,
        initial_tempo: f64,
        ticks_per_beat: u32,
        sample_rate: f64,
    ) -> Result<Self> {
        if ticks_per_beat == 0 {
            return Err(Error::InvalidTicksPerBeat(ticks_per_beat));
        }
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "sample_rate {sample_rate} must be positive"
            )));
        }
        check_tempo(initial_tempo)?;
        for &tempo in changes.values() {
            check_tempo(tempo)?;
        }

        let mut points: Vec<(u32, f64)> = Vec::with_capacity(changes.len() + 1);
        if !changes.contains_key(&0) {
            points.push((0, initial_tempo));
        }
        points.extend(changes.iter().map(|(&tick, &tempo)| (tick, tempo)));

        let mut entries: Vec<TempoMapEntry> = Vec::with_capacity(points.len());
        for (tick, tempo) in points {
            let cumulative_micros = match entries.last() {
                Some(prev) => {
                    prev.cumulative_micros + (tick - prev.tick) as f64 * prev.micros_per_tick
                }
                None => 0.0,
            };
            entries.push(TempoMapEntry {
                tick,
                tempo,
                micros_per_tick: micros_per_tick(tempo, ticks_per_beat),
                cumulative_micros,
            });
        }

        Ok(Self {
            entries,
            ticks_per_beat,
            sample_rate,
        })
    }

    pub fn ticks_to_seconds(&self, tick: f64) -> f64 {
        let tick = sanitize(tick);
        let entry = self.entry_for_tick(tick);
        (entry.cumulative_micros + (tick - entry.tick as f64) * entry.micros_per_tick)
            / MICROS_PER_SECOND
    }

    pub fn seconds_to_ticks(&self, seconds: f64) -> f64 {
        let micros = sanitize(seconds) * MICROS_PER_SECOND;
        let idx = self
            .entries
            .partition_point(|e| e.cumulative_micros <= micros)
            .saturating_sub(1);
        let entry = &self.entries[idx];
        entry.tick as f64 + (micros - entry.cumulative_micros) / entry.micros_per_tick
    }

    #[inline]
    pub fn ticks_to_frames(&self, tick: f64) -> u64 {
        (self.ticks_to_seconds(tick) * self.sample_rate).round() as u64
    }

    #[inline]
    pub fn frames_to_ticks(&self, frames: u64) -> f64 {
        self.seconds_to_ticks(frames as f64 / self.sample_rate)
    }

    /// Tempo in BPM of the segment containing `tick`.
    #[inline]
    pub fn tempo_at(&self, tick: f64) -> f64 {
        self.entry_for_tick(sanitize(tick)).tempo
    }

    #[inline]
    pub fn ticks_per_beat(&self) -> u32 {
        self.ticks_per_beat
    }

    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn entries(&self) -> &[TempoMapEntry] {
        &self.entries
    }

    fn entry_for_tick(&self, tick: f64) -> &TempoMapEntry {
        let idx = self
            .entries
            .partition_point(|e| e.tick as f64 <= tick)
            .saturating_sub(1);
        &self.entries[idx]
    }
}

#[inline]
fn micros_per_tick(tempo: f64, ticks_per_beat: u32) -> f64 {
    60.0 * MICROS_PER_SECOND / (tempo * ticks_per_beat as f64)
}

#[inline]
fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

fn check_tempo(tempo: f64) -> Result<()> {
    if tempo.is_finite() && tempo > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidTempo(tempo))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_with(changes: &[(u32, f64)], initial: f64) -> TempoMap {
        let changes: BTreeMap<u32, f64> = changes.iter().copied().collect();
        TempoMap::from_changes(&changes, initial, 4, 48000.0).unwrap()
    }

    #[test]
    fn test_constant_tempo_conversion() {
        // 120 BPM at 4 ticks per beat = 8 ticks per second
        let map = TempoMap::new(120.0, 4, 48000.0).unwrap();
        assert!((map.ticks_to_seconds(8.0) - 1.0).abs() < 1e-9);
        assert!((map.seconds_to_ticks(1.0) - 8.0).abs() < 1e-9);
        assert_eq!(map.ticks_to_frames(8.0), 48000);
        assert!((map.frames_to_ticks(24000) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_tempo_change() {
        let map = map_with(&[(480, 240.0)], 120.0);

        let seconds = map.ticks_to_seconds(480.0);
        assert!((seconds - 60.0).abs() < 1e-9, "Expected 60.0, got {}", seconds);

        let seconds = map.ticks_to_seconds(960.0);
        assert!((seconds - 90.0).abs() < 1e-9, "Expected 90.0, got {}", seconds);
    }

    #[test]
    fn test_entries_serialize_for_inspection() {
        let map = map_with(&[(480, 240.0)], 120.0);
        let json = serde_json::to_value(map.entries()).unwrap();

        assert_eq!(json.as_array().unwrap().len(), 2);
        assert_eq!(json[1]["tick"], 480);
        assert_eq!(json[1]["tempo"], 240.0);
        assert_eq!(json[1]["micros_per_tick"], 62_500.0);
        assert_eq!(json[1]["cumulative_micros"], 60_000_000.0);
    }

    #[test]
    fn test_seconds_to_ticks_with_tempo_changes() {
        let map = map_with(&[(480, 240.0)], 120.0);

        let ticks = map.seconds_to_ticks(30.0);
        assert!((ticks - 240.0).abs() < 1e-9, "Expected 240.0, got {}", ticks);

        let ticks = map.seconds_to_ticks(75.0);
        assert!((ticks - 720.0).abs() < 1e-9, "Expected 720.0, got {}", ticks);
    }

    #[test]
    fn test_synthetic_start_entry() {
        let map = map_with(&[(16, 60.0)], 150.0);
        assert_eq!(map.entries().len(), 2);
        assert_eq!(map.entries()[0].tick, 0);
        assert_eq!(map.entries()[0].tempo, 150.0);

        // An explicit change at tick 0 replaces the initial tempo
        let map = map_with(&[(0, 60.0)], 150.0);
        assert_eq!(map.entries().len(), 1);
        assert_eq!(map.tempo_at(0.0), 60.0);
    }

    #[test]
    fn test_tempo_at() {
        let map = map_with(&[(8, 60.0), (16, 240.0)], 120.0);
        assert_eq!(map.tempo_at(0.0), 120.0);
        assert_eq!(map.tempo_at(7.99), 120.0);
        assert_eq!(map.tempo_at(8.0), 60.0);
        assert_eq!(map.tempo_at(1000.0), 240.0);
    }

    #[test]
    fn test_negative_input_clamps_to_origin() {
        let map = TempoMap::new(120.0, 4, 48000.0).unwrap();
        assert_eq!(map.ticks_to_seconds(-5.0), 0.0);
        assert_eq!(map.seconds_to_ticks(-1.0), 0.0);
        assert_eq!(map.ticks_to_seconds(f64::NAN), 0.0);
    }

    #[test]
    fn test_rejects_invalid_tempo() {
        assert!(matches!(
            TempoMap::new(0.0, 4, 48000.0),
            Err(Error::InvalidTempo(_))
        ));
        let changes: BTreeMap<u32, f64> = [(4, -10.0)].into_iter().collect();
        assert!(matches!(
            TempoMap::from_changes(&changes, 120.0, 4, 48000.0),
            Err(Error::InvalidTempo(_))
        ));
        assert!(matches!(
            TempoMap::new(f64::INFINITY, 4, 48000.0),
            Err(Error::InvalidTempo(_))
        ));
    }

    #[test]
    fn test_rejects_zero_ticks_per_beat() {
        assert!(matches!(
            TempoMap::new(120.0, 0, 48000.0),
            Err(Error::InvalidTicksPerBeat(0))
        ));
    }

    #[test]
    fn test_ticks_per_second_conversion() {
        // Note Block Studio: 10 ticks per second at 4 ticks per beat
        assert_eq!(tempo_from_ticks_per_second(10.0, 4), 150.0);
        assert_eq!(tempo_from_ticks_per_second(20.0, 4), 20.0 * 15.0);

        let map = TempoMap::new(tempo_from_ticks_per_second(10.0, 4), 4, 48000.0).unwrap();
        assert!((map.ticks_to_seconds(10.0) - 1.0).abs() < 1e-9);
    }
}
