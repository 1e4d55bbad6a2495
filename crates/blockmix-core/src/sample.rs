//! Decoded instrument audio.

use crate::{Error, Result};

/// Per-channel `f32` audio for one instrument sample.
///
/// One channel is played on both sides; with two or more, channel 0 feeds the
/// left output and channel 1 the right.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: Option<f64>,
}

impl SampleBuffer {
    pub fn new(channels: Vec<Vec<f32>>) -> Self {
        Self {
            channels,
            sample_rate: None,
        }
    }

    pub fn mono(data: Vec<f32>) -> Self {
        Self::new(vec![data])
    }

    pub fn stereo(left: Vec<f32>, right: Vec<f32>) -> Self {
        Self::new(vec![left, right])
    }

    /// Native sample rate of the decoded audio. Without one the engine rate is assumed.
    pub fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = Some(sample_rate);
        self
    }

    pub fn validate(&self, sample_id: u32) -> Result<()> {
        let invalid = |reason: String| Error::InvalidSample { sample_id, reason };

        let Some(first) = self.channels.first() else {
            return Err(invalid("no channels".into()));
        };
        if first.is_empty() {
            return Err(invalid("empty channel data".into()));
        }
        if let Some(ch) = self.channels.iter().position(|c| c.len() != first.len()) {
            return Err(invalid(format!(
                "channel {ch} has {} frames, expected {}",
                self.channels[ch].len(),
                first.len()
            )));
        }
        if let Some(rate) = self.sample_rate {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(invalid(format!("sample rate {rate} must be positive")));
            }
        }
        Ok(())
    }

    /// Length in frames.
    #[inline]
    pub fn len(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    #[inline]
    pub fn left(&self) -> &[f32] {
        self.channels.first().map_or(&[], Vec::as_slice)
    }

    #[inline]
    pub fn right(&self) -> &[f32] {
        self.channels
            .get(1)
            .or_else(|| self.channels.first())
            .map_or(&[], Vec::as_slice)
    }

    #[inline]
    pub fn is_stereo(&self) -> bool {
        self.channels.len() > 1
    }

    pub fn sample_rate(&self) -> Option<f64> {
        self.sample_rate
    }

    /// Source frames advanced per output frame at unit pitch.
    #[inline]
    pub fn rate_ratio(&self, engine_rate: f64) -> f64 {
        self.sample_rate.map_or(1.0, |rate| rate / engine_rate)
    }
}
