//! Engine configuration shared by the render and playback sides.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Largest block the render side produces in one pass.
pub const MAX_BLOCK_SIZE: usize = 8192;

/// Configuration for the shared parts of the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Output sample rate in Hz (default: 48000)
    pub sample_rate: f64,
    /// Frames rendered per block (default: 128)
    pub block_size: usize,
    /// Ring buffer capacity in stereo frames (default: 4096, a multiple of `block_size`)
    pub ring_capacity: usize,
    /// Bounded capacity of each control channel (default: 256)
    pub command_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            block_size: 128,
            ring_capacity: 4096,
            command_capacity: 256,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if !(8000.0..=384000.0).contains(&self.sample_rate) {
            return Err(Error::InvalidConfig(format!(
                "sample_rate {} out of range (8000-384000 Hz)",
                self.sample_rate
            )));
        }
        if self.block_size == 0 || self.block_size > MAX_BLOCK_SIZE {
            return Err(Error::InvalidConfig(format!(
                "block_size {} out of range (1-{MAX_BLOCK_SIZE})",
                self.block_size
            )));
        }
        if self.ring_capacity < self.block_size * 2 || self.ring_capacity % self.block_size != 0 {
            return Err(Error::InvalidRing {
                capacity: self.ring_capacity,
                block: self.block_size,
            });
        }
        if self.command_capacity == 0 {
            return Err(Error::InvalidConfig("command_capacity must be non-zero".into()));
        }
        Ok(())
    }

    /// Real-time duration of one block in seconds.
    #[inline]
    pub fn block_seconds(&self) -> f64 {
        self.block_size as f64 / self.sample_rate
    }
}
