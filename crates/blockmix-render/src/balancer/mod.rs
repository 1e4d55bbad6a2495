//! Load balancing between render quality and real-time safety.

mod adaptive;
mod tuning;

pub use adaptive::AdaptiveLoadBalancer;
pub use tuning::BalancerTuning;

use crate::ResamplerTier;

/// Render-side measurements handed to the balancer after each block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalancerMetrics {
    pub active_voices: usize,
    pub max_voices: usize,
    /// Ring fill level in `[0, 1]`.
    pub buffer_fill: f64,
    pub resampler: ResamplerTier,
}

/// Changes the render engine should apply before the next block.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BalancerDecision {
    pub max_voices: Option<usize>,
    pub resampler: Option<ResamplerTier>,
    /// Fraction of the oldest voices to drop immediately.
    pub kill_voices_ratio: Option<f64>,
}

impl BalancerDecision {
    pub fn is_empty(&self) -> bool {
        self.max_voices.is_none() && self.resampler.is_none() && self.kill_voices_ratio.is_none()
    }
}

/// Per-block controller around the render loop.
pub trait Balancer: Send {
    /// Enables or disables decisions. Activation restarts the warm-up.
    fn set_active(&mut self, active: bool);

    /// Restarts the warm-up and forgets smoothed signals.
    fn rearm(&mut self);

    /// Called before rendering a block.
    fn begin_process(&mut self);

    /// Called after rendering a block.
    fn end_process(&mut self, metrics: &BalancerMetrics) -> Option<BalancerDecision>;

    /// Smoothed render load, 1.0 meaning a block takes its full real-time budget.
    fn smoothed_load(&self) -> f64 {
        0.0
    }
}

/// Balancer that never changes anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticBalancer;

impl Balancer for StaticBalancer {
    fn set_active(&mut self, _active: bool) {}

    fn rearm(&mut self) {}

    fn begin_process(&mut self) {}

    fn end_process(&mut self, _metrics: &BalancerMetrics) -> Option<BalancerDecision> {
        None
    }
}
