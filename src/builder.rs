//! Builder for configuring and constructing a `BlockmixEngine`.

use crate::{BlockmixConfig, BlockmixEngine, Result};
use blockmix_render::{BalancerTuning, ResamplerTier};

/// Building validates the configuration but starts nothing; call
/// [`BlockmixEngine::init`] to allocate the ring and spawn the render thread.
///
/// # Example
///
/// ```ignore
/// use blockmix::prelude::*;
///
/// let engine = BlockmixEngine::builder()
///     .sample_rate(48000.0)
///     .block_size(128)
///     .build()?;
/// engine.init()?;
///
/// let mut sink = engine.take_sink()?;
/// // hand `sink` to the host audio callback
/// ```
#[derive(Debug, Clone, Default)]
pub struct BlockmixEngineBuilder {
    config: BlockmixConfig,
    output_device: Option<usize>,
}

impl BlockmixEngineBuilder {
    /// Replaces every setting at once, e.g. with a deserialized config.
    pub fn config(mut self, config: BlockmixConfig) -> Self {
        self.config = config;
        self
    }

    /// Default: 48000
    pub fn sample_rate(mut self, sample_rate: f64) -> Self {
        self.config.engine.sample_rate = sample_rate;
        self
    }

    /// Default: 128
    pub fn block_size(mut self, frames: usize) -> Self {
        self.config.engine.block_size = frames;
        self
    }

    /// Default: 4096
    pub fn ring_capacity(mut self, frames: usize) -> Self {
        self.config.engine.ring_capacity = frames;
        self
    }

    /// Default: 256
    pub fn command_capacity(mut self, capacity: usize) -> Self {
        self.config.engine.command_capacity = capacity;
        self
    }

    /// Default: 256
    pub fn max_voices(mut self, voices: usize) -> Self {
        self.config.render.initial_max_voices = voices;
        self
    }

    /// Default: cubic
    pub fn resampler(mut self, tier: ResamplerTier) -> Self {
        self.config.render.resampler = tier;
        self
    }

    /// Default: true
    pub fn adaptive(mut self, adaptive: bool) -> Self {
        self.config.render.adaptive = adaptive;
        self
    }

    pub fn tuning(mut self, tuning: BalancerTuning) -> Self {
        self.config.render.tuning = tuning;
        self
    }

    /// Output device for [`BlockmixEngine::start_output`]. Default: system default.
    pub fn output_device(mut self, index: usize) -> Self {
        self.output_device = Some(index);
        self
    }

    pub fn build(self) -> Result<BlockmixEngine> {
        self.config.validate()?;
        Ok(BlockmixEngine::from_parts(self.config, self.output_device))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setters_reach_config() {
        let engine = BlockmixEngine::builder()
            .sample_rate(44100.0)
            .block_size(256)
            .ring_capacity(2048)
            .max_voices(64)
            .resampler(ResamplerTier::Nearest)
            .adaptive(false)
            .build()
            .unwrap();

        let config = engine.config();
        assert_eq!(config.engine.sample_rate, 44100.0);
        assert_eq!(config.engine.block_size, 256);
        assert_eq!(config.render.initial_max_voices, 64);
        assert_eq!(config.render.resampler, ResamplerTier::Nearest);
        assert!(!config.render.adaptive);
        assert!(!engine.is_initialized());
    }

    #[test]
    fn test_invalid_config_fails_build() {
        assert!(BlockmixEngine::builder().block_size(0).build().is_err());
        assert!(BlockmixEngine::builder()
            .block_size(128)
            .ring_capacity(200)
            .build()
            .is_err());
        assert!(BlockmixEngine::builder().max_voices(0).build().is_err());
    }
}
