//! Fractional-position sample readers.
//!
//! Every reader clamps each tap to `[0, len - 1]` and returns `0.0` for an
//! empty buffer, so any position is safe to pass.

use serde::{Deserialize, Serialize};

/// Reads `buffer` at a fractional frame position.
pub type ResampleFn = fn(&[f32], f64) -> f32;

/// Interpolation quality, ordered by cost.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ResamplerTier {
    Nearest = 0,
    Linear = 1,
    #[default]
    Cubic = 2,
}

const RESAMPLERS: [ResampleFn; 3] = [nearest, linear, cubic];

impl ResamplerTier {
    pub const LOWEST: ResamplerTier = ResamplerTier::Nearest;
    pub const HIGHEST: ResamplerTier = ResamplerTier::Cubic;

    /// The reader for this tier.
    #[inline]
    pub fn resampler(self) -> ResampleFn {
        RESAMPLERS[self as usize]
    }

    /// One tier cheaper, saturating at [`Self::LOWEST`].
    pub fn downgrade(self) -> Self {
        match self {
            ResamplerTier::Cubic => ResamplerTier::Linear,
            ResamplerTier::Linear | ResamplerTier::Nearest => ResamplerTier::Nearest,
        }
    }

    /// One tier better, saturating at [`Self::HIGHEST`].
    pub fn upgrade(self) -> Self {
        match self {
            ResamplerTier::Nearest => ResamplerTier::Linear,
            ResamplerTier::Linear | ResamplerTier::Cubic => ResamplerTier::Cubic,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(ResamplerTier::Nearest),
            1 => Some(ResamplerTier::Linear),
            2 => Some(ResamplerTier::Cubic),
            _ => None,
        }
    }
}

#[inline]
fn tap(buffer: &[f32], index: f64) -> f32 {
    let last = buffer.len() - 1;
    let i = if index > 0.0 {
        (index as usize).min(last)
    } else {
        0
    };
    buffer[i]
}

/// Nearest neighbour.
pub fn nearest(buffer: &[f32], position: f64) -> f32 {
    if buffer.is_empty() {
        return 0.0;
    }
    tap(buffer, position.round())
}

/// Two-tap linear interpolation.
pub fn linear(buffer: &[f32], position: f64) -> f32 {
    if buffer.is_empty() {
        return 0.0;
    }
    let position = position.max(0.0);
    let base = position.floor();
    let frac = (position - base) as f32;

    let y0 = tap(buffer, base);
    let y1 = tap(buffer, base + 1.0);
    y0 + (y1 - y0) * frac
}

/// Four-tap Catmull-Rom interpolation.
pub fn cubic(buffer: &[f32], position: f64) -> f32 {
    if buffer.is_empty() {
        return 0.0;
    }
    let position = position.max(0.0);
    let base = position.floor();
    let t = (position - base) as f32;

    let y0 = tap(buffer, base - 1.0);
    let y1 = tap(buffer, base);
    let y2 = tap(buffer, base + 1.0);
    let y3 = tap(buffer, base + 2.0);

    let a = -0.5 * y0 + 1.5 * y1 - 1.5 * y2 + 0.5 * y3;
    let b = y0 - 2.5 * y1 + 2.0 * y2 - 0.5 * y3;
    let c = -0.5 * y0 + 0.5 * y2;

    ((a * t + b) * t + c) * t + y1
}
