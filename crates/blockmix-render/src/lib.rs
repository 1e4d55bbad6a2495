//! Render side of the blockmix engine.
//!
//! # Primary API
//!
//! - [`RenderEngine`]: scheduler, voice pool and mixer writing blocks into the ring
//! - [`RenderThread`]: dedicated thread driving a `RenderEngine` from a command channel
//! - [`Balancer`]: per-block load control, [`AdaptiveLoadBalancer`] by default
//! - [`ResamplerTier`]: interpolation quality the mixer reads samples with

pub mod error;
pub use error::{Error, Result};

mod config;
pub use config::RenderConfig;

pub mod resampler;
pub use resampler::{ResampleFn, ResamplerTier};

pub mod scheduler;
pub use scheduler::{EventBatch, ScheduledEvent, Scheduler};

pub mod voice;
pub use voice::{Voice, VoiceManager};

pub mod balancer;
pub use balancer::{
    AdaptiveLoadBalancer, Balancer, BalancerDecision, BalancerMetrics, BalancerTuning,
    StaticBalancer,
};

mod stats;
pub use stats::{RenderStats, RenderStatsSnapshot};

mod request;
pub use request::RenderCommand;

mod engine;
pub use engine::RenderEngine;

mod thread;
pub use thread::RenderThread;
