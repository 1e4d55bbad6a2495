//! Render-side telemetry published by the render thread.
//!
//! Every field is an independent atomic; a snapshot is not consistent across
//! fields.

use crate::ResamplerTier;
use blockmix_core::{AtomicDouble, AtomicFloat};
use std::sync::atomic::{AtomicU64, AtomicU8, AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct RenderStats {
    blocks_rendered: AtomicU64,
    active_voices: AtomicUsize,
    max_voices: AtomicUsize,
    resampler: AtomicU8,
    smoothed_load: AtomicFloat,
    decisions_applied: AtomicU64,
    /// Tempo of the last tempo change the scheduler served (0 until one is served)
    last_tempo: AtomicDouble,
    /// Ring resets completed through the handshake
    ring_resets: AtomicU64,
}

impl RenderStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_block(&self, active_voices: usize, smoothed_load: f64) {
        self.blocks_rendered.fetch_add(1, Ordering::Relaxed);
        self.active_voices.store(active_voices, Ordering::Relaxed);
        self.smoothed_load.set(smoothed_load as f32);
    }

    #[inline]
    pub fn record_policy(&self, max_voices: usize, resampler: ResamplerTier) {
        self.max_voices.store(max_voices, Ordering::Relaxed);
        self.resampler.store(resampler.as_u8(), Ordering::Relaxed);
    }

    #[inline]
    pub fn record_decision(&self) {
        self.decisions_applied.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_tempo(&self, tempo: f64) {
        self.last_tempo.set(tempo);
    }

    #[inline]
    pub fn record_ring_reset(&self) {
        self.ring_resets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RenderStatsSnapshot {
        RenderStatsSnapshot {
            blocks_rendered: self.blocks_rendered.load(Ordering::Relaxed),
            active_voices: self.active_voices.load(Ordering::Relaxed),
            max_voices: self.max_voices.load(Ordering::Relaxed),
            resampler: ResamplerTier::from_u8(self.resampler.load(Ordering::Relaxed))
                .unwrap_or_default(),
            smoothed_load: self.smoothed_load.get() as f64,
            decisions_applied: self.decisions_applied.load(Ordering::Relaxed),
            last_tempo: self.last_tempo.get(),
            ring_resets: self.ring_resets.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`RenderStats`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RenderStatsSnapshot {
    pub blocks_rendered: u64,
    pub active_voices: usize,
    pub max_voices: usize,
    pub resampler: ResamplerTier,
    /// Render time over block duration, smoothed by the balancer
    pub smoothed_load: f64,
    pub decisions_applied: u64,
    pub last_tempo: f64,
    pub ring_resets: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_recording() {
        let stats = RenderStats::new();
        stats.record_policy(128, ResamplerTier::Linear);
        stats.record_block(12, 0.25);
        stats.record_block(10, 0.5);
        stats.record_decision();
        stats.record_tempo(140.0);
        stats.record_ring_reset();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.blocks_rendered, 2);
        assert_eq!(snapshot.active_voices, 10);
        assert_eq!(snapshot.max_voices, 128);
        assert_eq!(snapshot.resampler, ResamplerTier::Linear);
        assert!((snapshot.smoothed_load - 0.5).abs() < 1e-6);
        assert_eq!(snapshot.decisions_applied, 1);
        assert_eq!(snapshot.last_tempo, 140.0);
        assert_eq!(snapshot.ring_resets, 1);
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = RenderStats::new().snapshot();
        assert_eq!(snapshot.blocks_rendered, 0);
        assert_eq!(snapshot.resampler, ResamplerTier::Nearest);
    }
}
