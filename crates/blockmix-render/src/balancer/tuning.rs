//! Thresholds and step sizes for the adaptive balancer.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Tunables for [`AdaptiveLoadBalancer`](super::AdaptiveLoadBalancer).
///
/// Intervals and cooldowns are counted in rendered blocks. Loads are block
/// render time over block duration; fills are ring fill levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalancerTuning {
    /// Blocks ignored after (re)activation (default: 5)
    pub warmup_blocks: u32,
    /// Load EMA smoothing factor (default: 0.1)
    pub load_alpha: f64,
    /// Fill EMA smoothing factor (default: 0.2)
    pub fill_alpha: f64,
    /// Fill trend EMA smoothing factor (default: 0.2)
    pub trend_alpha: f64,
    /// Per-block decay of the peak load (default: 0.8)
    pub peak_decay: f64,
    /// Single measurements are clamped to this load (default: 4.0)
    pub max_load_ratio: f64,

    /// Lowest voice cap the balancer shrinks to (default: 64)
    pub min_voices: usize,
    /// Highest voice cap the balancer grows to (default: 4096)
    pub max_voices: usize,
    /// Cautious growth step (default: 8)
    pub grow_step: usize,
    /// Growth step when the pool is nearly saturated (default: 32)
    pub fast_grow_step: usize,
    /// Shrink step under sustained or high load (default: 16)
    pub shrink_step: usize,
    /// Minimum blocks between cautious growth steps (default: 240)
    pub slow_grow_interval: u64,
    /// Minimum blocks between shrink steps (default: 30)
    pub shrink_interval: u64,
    /// Voice utilisation that triggers fast growth (default: 0.85)
    pub tight_utilisation: f64,
    /// Voice utilisation that allows cautious growth (default: 0.7)
    pub high_utilisation: f64,

    /// Fill below which the circuit breaker may trip (default: 0.2)
    pub fill_critical: f64,
    /// Smoothed fill at or below which sustained overload is declared (default: 0.35)
    pub fill_low: f64,
    /// Smoothed fill at or above which the ring counts as healthy (default: 0.6)
    pub fill_healthy: f64,
    /// Fill falling faster than this per block counts as collapsing (default: 0.02)
    pub trend_collapse: f64,

    /// Peak load that trips the breaker on a critical fill (default: 1.2)
    pub breaker_peak_load: f64,
    /// Voice cap multiplier on a breaker trip (default: 0.8)
    pub breaker_shrink: f64,
    /// Kill ratio of the first trip (default: 0.2, plus one strike step)
    pub kill_base: f64,
    /// Kill ratio added per strike (default: 0.1)
    pub kill_per_strike: f64,
    /// Kill ratio ceiling (default: 0.5)
    pub kill_max: f64,
    /// Strike ceiling (default: 4)
    pub max_strikes: u32,
    /// Trips within this many blocks of the last one escalate (default: 240)
    pub strike_window: u64,
    /// Cooldown after a trip (default: 60, plus per strike)
    pub cooldown_base: u32,
    /// Cooldown added per strike (default: 30)
    pub cooldown_per_strike: u32,

    /// Load EMA above which overload is sustained (default: 0.98)
    pub sustained_load: f64,
    /// Load EMA above which load is high (default: 0.9)
    pub high_load: f64,
    /// Load EMA below which the engine is healthy (default: 0.85)
    pub healthy_load: f64,
    /// Minimum blocks since the last policy change before upgrading quality (default: 200)
    pub upgrade_interval: u64,
}

impl Default for BalancerTuning {
    fn default() -> Self {
        Self {
            warmup_blocks: 5,
            load_alpha: 0.1,
            fill_alpha: 0.2,
            trend_alpha: 0.2,
            peak_decay: 0.8,
            max_load_ratio: 4.0,

            min_voices: 64,
            max_voices: 4096,
            grow_step: 8,
            fast_grow_step: 32,
            shrink_step: 16,
            slow_grow_interval: 240,
            shrink_interval: 30,
            tight_utilisation: 0.85,
            high_utilisation: 0.7,

            fill_critical: 0.2,
            fill_low: 0.35,
            fill_healthy: 0.6,
            trend_collapse: 0.02,

            breaker_peak_load: 1.2,
            breaker_shrink: 0.8,
            kill_base: 0.2,
            kill_per_strike: 0.1,
            kill_max: 0.5,
            max_strikes: 4,
            strike_window: 240,
            cooldown_base: 60,
            cooldown_per_strike: 30,

            sustained_load: 0.98,
            high_load: 0.9,
            healthy_load: 0.85,
            upgrade_interval: 200,
        }
    }
}

impl BalancerTuning {
    pub fn validate(&self) -> Result<()> {
        for (name, alpha) in [
            ("load_alpha", self.load_alpha),
            ("fill_alpha", self.fill_alpha),
            ("trend_alpha", self.trend_alpha),
        ] {
            if !(alpha > 0.0 && alpha <= 1.0) {
                return Err(Error::InvalidConfig(format!("{name} {alpha} outside (0, 1]")));
            }
        }
        if !(0.0..1.0).contains(&self.peak_decay) {
            return Err(Error::InvalidConfig(format!(
                "peak_decay {} outside [0, 1)",
                self.peak_decay
            )));
        }
        if !(self.fill_critical < self.fill_low && self.fill_low < self.fill_healthy) {
            return Err(Error::InvalidConfig(format!(
                "fill thresholds must increase: critical {} < low {} < healthy {}",
                self.fill_critical, self.fill_low, self.fill_healthy
            )));
        }
        if !(self.healthy_load < self.high_load && self.high_load < self.sustained_load) {
            return Err(Error::InvalidConfig(format!(
                "load thresholds must increase: healthy {} < high {} < sustained {}",
                self.healthy_load, self.high_load, self.sustained_load
            )));
        }
        if self.min_voices == 0 || self.min_voices > self.max_voices {
            return Err(Error::InvalidConfig(format!(
                "voice bounds {}..={} are invalid",
                self.min_voices, self.max_voices
            )));
        }
        if !(0.0..=1.0).contains(&self.kill_max) || self.max_strikes == 0 {
            return Err(Error::InvalidConfig(
                "kill_max must be in [0, 1] and max_strikes non-zero".into(),
            ));
        }
        Ok(())
    }
}
