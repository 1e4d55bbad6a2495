//! Top-level engine configuration.

use crate::Result;
use blockmix_core::EngineConfig;
use blockmix_render::RenderConfig;
use serde::{Deserialize, Serialize};

/// Shared engine settings plus render-side settings.
///
/// ```ignore
/// let config: BlockmixConfig = serde_json::from_str(r#"{
///     "engine": { "sample_rate": 44100, "block_size": 256 },
///     "render": { "resampler": "linear" }
/// }"#)?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockmixConfig {
    pub engine: EngineConfig,
    pub render: RenderConfig,
}

impl BlockmixConfig {
    pub fn validate(&self) -> Result<()> {
        self.engine.validate()?;
        self.render.validate()?;
        Ok(())
    }
}
