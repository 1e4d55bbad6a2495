//! Adaptive load balancer.
//!
//! Reacts fast to protect the ring from running dry and recovers slowly.
//! Tiers are checked in priority order once per block:
//!
//! 1. circuit breaker: critical fill with a load spike or a collapsing fill
//! 2. sustained overload: downgrade quality and shrink the voice cap
//! 3. high load: shrink the voice cap only
//! 4. healthy: grow the voice cap, upgrade quality after a long quiet period
//! 5. neutral: nothing

use super::{Balancer, BalancerDecision, BalancerMetrics, BalancerTuning};
use crate::ResamplerTier;
use std::time::Instant;

#[derive(Debug)]
pub struct AdaptiveLoadBalancer {
    tuning: BalancerTuning,
    /// Real-time duration of one block in seconds.
    block_seconds: f64,
    active: bool,
    started: Option<Instant>,

    block: u64,
    warmup_remaining: u32,

    load_ema: Option<f64>,
    peak_load: f64,
    fill_ema: Option<f64>,
    fill_trend: f64,
    last_fill: Option<f64>,

    cooldown: u32,
    strikes: u32,
    last_breaker: Option<u64>,
    last_policy_change: u64,
    last_shrink: Option<u64>,
    last_slow_grow: u64,
}

impl AdaptiveLoadBalancer {
    pub fn new(block_size: usize, sample_rate: f64, tuning: BalancerTuning) -> Self {
        let warmup = tuning.warmup_blocks;
        Self {
            tuning,
            block_seconds: block_size as f64 / sample_rate,
            active: true,
            started: None,
            block: 0,
            warmup_remaining: warmup,
            load_ema: None,
            peak_load: 0.0,
            fill_ema: None,
            fill_trend: 0.0,
            last_fill: None,
            cooldown: 0,
            strikes: 0,
            last_breaker: None,
            last_policy_change: 0,
            last_shrink: None,
            last_slow_grow: 0,
        }
    }

    pub fn tuning(&self) -> &BalancerTuning {
        &self.tuning
    }

    pub fn is_warming_up(&self) -> bool {
        self.warmup_remaining > 0
    }

    pub fn cooldown_remaining(&self) -> u32 {
        self.cooldown
    }

    pub fn strikes(&self) -> u32 {
        self.strikes
    }

    /// Feeds one block's load measurement.
    ///
    /// `load` is render time over block duration. The first measurement after
    /// warm-up seeds the smoothed signals.
    pub fn observe(&mut self, load: f64, metrics: &BalancerMetrics) -> Option<BalancerDecision> {
        if !self.active {
            return None;
        }
        self.block += 1;
        if self.warmup_remaining > 0 {
            self.warmup_remaining -= 1;
            return None;
        }

        let t = &self.tuning;
        let load = if load.is_finite() {
            load.clamp(0.0, t.max_load_ratio)
        } else {
            t.max_load_ratio
        };
        let fill = if metrics.buffer_fill.is_nan() {
            0.0
        } else {
            metrics.buffer_fill.clamp(0.0, 1.0)
        };

        let load_ema = smooth(self.load_ema, load, t.load_alpha);
        let fill_ema = smooth(self.fill_ema, fill, t.fill_alpha);
        self.load_ema = Some(load_ema);
        self.fill_ema = Some(fill_ema);
        self.peak_load = (self.peak_load * t.peak_decay).max(load);
        if let Some(prev) = self.last_fill {
            self.fill_trend += (fill - prev - self.fill_trend) * t.trend_alpha;
        }
        self.last_fill = Some(fill);

        let collapsing = self.fill_trend < -t.trend_collapse;
        if self.cooldown == 0
            && fill < t.fill_critical
            && (self.peak_load > t.breaker_peak_load || collapsing)
        {
            return self.trip(metrics);
        }

        if self.cooldown > 0 {
            self.cooldown -= 1;
            return None;
        }

        let t = &self.tuning;
        if load_ema > t.sustained_load && fill_ema <= t.fill_low {
            return self.shrink(metrics, true);
        }
        if load_ema > t.high_load && fill_ema < t.fill_healthy {
            return self.shrink(metrics, false);
        }
        if load_ema < t.healthy_load && fill_ema >= t.fill_healthy {
            return self.recover(metrics);
        }
        None
    }

    fn trip(&mut self, metrics: &BalancerMetrics) -> Option<BalancerDecision> {
        let t = &self.tuning;
        let within_window = self
            .last_breaker
            .is_some_and(|last| self.block - last <= t.strike_window);
        if !within_window {
            self.strikes = 0;
        }
        self.strikes = (self.strikes + 1).min(t.max_strikes);

        let strikes = self.strikes;
        let kill = (t.kill_base + t.kill_per_strike * strikes as f64).min(t.kill_max);
        let shrunk = ((metrics.max_voices as f64 * t.breaker_shrink).floor() as usize)
            .max(t.min_voices)
            .min(metrics.max_voices);

        self.cooldown = t.cooldown_base + t.cooldown_per_strike * strikes;
        self.last_breaker = Some(self.block);
        self.last_policy_change = self.block;
        self.peak_load = 1.0;

        Some(BalancerDecision {
            max_voices: (shrunk != metrics.max_voices).then_some(shrunk),
            resampler: (metrics.resampler != ResamplerTier::LOWEST)
                .then_some(ResamplerTier::LOWEST),
            kill_voices_ratio: Some(kill),
        })
    }

    fn shrink(&mut self, metrics: &BalancerMetrics, downgrade: bool) -> Option<BalancerDecision> {
        let t = &self.tuning;
        if self
            .last_shrink
            .is_some_and(|last| self.block - last < t.shrink_interval)
        {
            return None;
        }

        let shrunk = metrics
            .max_voices
            .saturating_sub(t.shrink_step)
            .max(t.min_voices)
            .min(metrics.max_voices);
        let lower = metrics.resampler.downgrade();
        let decision = BalancerDecision {
            max_voices: (shrunk != metrics.max_voices).then_some(shrunk),
            resampler: (downgrade && lower != metrics.resampler).then_some(lower),
            kill_voices_ratio: None,
        };
        if decision.is_empty() {
            return None;
        }

        self.last_shrink = Some(self.block);
        self.last_policy_change = self.block;
        Some(decision)
    }

    fn recover(&mut self, metrics: &BalancerMetrics) -> Option<BalancerDecision> {
        let t = &self.tuning;
        let mut decision = BalancerDecision::default();

        if metrics.max_voices < t.max_voices {
            let utilisation = if metrics.max_voices == 0 {
                1.0
            } else {
                metrics.active_voices as f64 / metrics.max_voices as f64
            };
            if utilisation >= t.tight_utilisation {
                decision.max_voices = Some((metrics.max_voices + t.fast_grow_step).min(t.max_voices));
            } else if utilisation >= t.high_utilisation
                && self.block - self.last_slow_grow >= t.slow_grow_interval
            {
                decision.max_voices = Some((metrics.max_voices + t.grow_step).min(t.max_voices));
                self.last_slow_grow = self.block;
            }
        }

        if self.block - self.last_policy_change >= t.upgrade_interval
            && metrics.resampler < ResamplerTier::HIGHEST
        {
            decision.resampler = Some(metrics.resampler.upgrade());
            self.last_policy_change = self.block;
        }

        (!decision.is_empty()).then_some(decision)
    }
}

impl Balancer for AdaptiveLoadBalancer {
    fn set_active(&mut self, active: bool) {
        if active && !self.active {
            self.rearm();
        }
        self.active = active;
    }

    fn rearm(&mut self) {
        self.warmup_remaining = self.tuning.warmup_blocks;
        self.started = None;
        self.load_ema = None;
        self.peak_load = 0.0;
        self.fill_ema = None;
        self.fill_trend = 0.0;
        self.last_fill = None;
    }

    fn begin_process(&mut self) {
        self.started = Some(Instant::now());
    }

    fn end_process(&mut self, metrics: &BalancerMetrics) -> Option<BalancerDecision> {
        let elapsed = self.started.take()?.elapsed();
        self.observe(elapsed.as_secs_f64() / self.block_seconds, metrics)
    }

    fn smoothed_load(&self) -> f64 {
        self.load_ema.unwrap_or(0.0)
    }
}

#[inline]
fn smooth(previous: Option<f64>, value: f64, alpha: f64) -> f64 {
    match previous {
        Some(prev) => prev + (value - prev) * alpha,
        None => value,
    }
}
