//! Render thread configuration.

use crate::balancer::BalancerTuning;
use crate::{Error, ResamplerTier, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for the render engine and its thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Voice cap before the balancer adjusts it (default: 256)
    pub initial_max_voices: usize,
    /// Resampler tier before the balancer adjusts it (default: cubic)
    pub resampler: ResamplerTier,
    /// Use the adaptive balancer; otherwise voices and quality stay fixed (default: true)
    pub adaptive: bool,
    /// How long the render thread waits for commands when the ring is full, in ms (default: 2)
    pub idle_wait_ms: u64,
    /// Blocks rendered per pass before commands are checked again (default: 8)
    pub max_blocks_per_pass: usize,
    pub tuning: BalancerTuning,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            initial_max_voices: 256,
            resampler: ResamplerTier::default(),
            adaptive: true,
            idle_wait_ms: 2,
            max_blocks_per_pass: 8,
            tuning: BalancerTuning::default(),
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.initial_max_voices == 0 {
            return Err(Error::InvalidConfig(
                "initial_max_voices must be non-zero".into(),
            ));
        }
        if self.max_blocks_per_pass == 0 {
            return Err(Error::InvalidConfig(
                "max_blocks_per_pass must be non-zero".into(),
            ));
        }
        if self.idle_wait_ms == 0 || self.idle_wait_ms > 1000 {
            return Err(Error::InvalidConfig(format!(
                "idle_wait_ms {} outside 1..=1000",
                self.idle_wait_ms
            )));
        }
        self.tuning.validate()
    }

    pub fn idle_wait(&self) -> Duration {
        Duration::from_millis(self.idle_wait_ms)
    }
}
