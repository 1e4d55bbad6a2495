//! Tick-indexed event lookup with at-most-once delivery per tick.

use blockmix_core::{NoteEvent, TempoChangeEvent};
use hashbrown::HashMap;
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Positions this close below an integer tick count as that tick.
///
/// Seeking to a tick goes through frames and back, which can land a hair
/// short of the integer.
const TICK_SNAP: f64 = 1e-6;

/// An event due at the current tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScheduledEvent {
    Note(NoteEvent),
    Tempo(TempoChangeEvent),
}

/// Events collected for one render block.
pub type EventBatch = SmallVec<[ScheduledEvent; 16]>;

#[derive(Debug, Default)]
pub struct Scheduler {
    notes: HashMap<u32, Vec<NoteEvent>>,
    tempo_changes: HashMap<u32, f64>,
    /// Last tick served; `None` until the first query after a load or seek.
    last_tick: Option<u32>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces both maps and forgets the last served tick.
    pub fn load_song(
        &mut self,
        notes_by_tick: BTreeMap<u32, Vec<NoteEvent>>,
        tempo_changes_by_tick: BTreeMap<u32, f64>,
    ) {
        self.notes = notes_by_tick.into_iter().collect();
        self.tempo_changes = tempo_changes_by_tick.into_iter().collect();
        self.last_tick = None;
    }

    /// Forgets the last served tick so the next query is delivered.
    pub fn reset_cursor(&mut self) {
        self.last_tick = None;
    }

    pub fn last_tick(&self) -> Option<u32> {
        self.last_tick
    }

    /// Appends the events at `floor(tick)` unless that tick was the last one served.
    pub fn collect_events(&mut self, tick: f64, out: &mut EventBatch) {
        let Some(tick) = floor_tick(tick) else {
            return;
        };
        if self.last_tick == Some(tick) {
            return;
        }
        self.serve(tick, out);
    }

    /// Appends the events of every tick after the last served one through `floor(tick)`.
    ///
    /// Right after a load or seek only `floor(tick)` itself is served.
    pub fn collect_through(&mut self, tick: f64, out: &mut EventBatch) {
        let Some(target) = floor_tick(tick) else {
            return;
        };
        let start = match self.last_tick {
            None => target,
            Some(last) if last < target => last + 1,
            Some(_) => return,
        };
        for t in start..=target {
            self.serve(t, out);
        }
    }

    fn serve(&mut self, tick: u32, out: &mut EventBatch) {
        if let Some(notes) = self.notes.get(&tick) {
            out.extend(notes.iter().copied().map(ScheduledEvent::Note));
        }
        if let Some(&tempo) = self.tempo_changes.get(&tick) {
            out.push(ScheduledEvent::Tempo(TempoChangeEvent { tick, tempo }));
        }
        self.last_tick = Some(tick);
    }
}

#[inline]
fn floor_tick(tick: f64) -> Option<u32> {
    if !tick.is_finite() || tick < -TICK_SNAP {
        return None;
    }
    Some((tick + TICK_SNAP).floor().min(u32::MAX as f64) as u32)
}
