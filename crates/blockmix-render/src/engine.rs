//! Block renderer: scheduler → voices → mix → ring.
//!
//! The engine is single-threaded state owned by the render thread. Each
//! [`render_block`](RenderEngine::render_block) produces exactly one block and
//! writes it to the ring, or does nothing when the ring has no room or a reset
//! handshake is still pending.

use crate::balancer::{
    AdaptiveLoadBalancer, Balancer, BalancerDecision, BalancerMetrics, StaticBalancer,
};
use crate::scheduler::{EventBatch, ScheduledEvent, Scheduler};
use crate::voice::VoiceManager;
use crate::{RenderCommand, RenderConfig, RenderStats, ResamplerTier, Result};
use blockmix_core::{
    EngineConfig, RenderTransport, RingProducer, SampleBuffer, SeekTarget, SongData, TempoMap,
};
use std::sync::Arc;
use tracing::{debug, info};

pub struct RenderEngine {
    scheduler: Scheduler,
    voices: VoiceManager,
    transport: RenderTransport,
    balancer: Box<dyn Balancer>,
    tier: ResamplerTier,
    ring: RingProducer,
    stats: Arc<RenderStats>,
    sample_rate: f64,
    block_size: usize,
    left: Vec<f32>,
    right: Vec<f32>,
    events: EventBatch,
    /// Epoch of a ring reset the consumer has not acknowledged yet.
    pending_reset: Option<u64>,
}

impl RenderEngine {
    pub fn new(
        engine: &EngineConfig,
        render: &RenderConfig,
        ring: RingProducer,
        stats: Arc<RenderStats>,
    ) -> Result<Self> {
        engine.validate()?;
        render.validate()?;

        let mut balancer: Box<dyn Balancer> = if render.adaptive {
            Box::new(AdaptiveLoadBalancer::new(
                engine.block_size,
                engine.sample_rate,
                render.tuning.clone(),
            ))
        } else {
            Box::new(StaticBalancer)
        };
        // Idle until a song is loaded
        balancer.set_active(false);
        stats.record_policy(render.initial_max_voices, render.resampler);

        Ok(Self {
            scheduler: Scheduler::new(),
            voices: VoiceManager::new(render.initial_max_voices),
            transport: RenderTransport::new(engine.sample_rate),
            balancer,
            tier: render.resampler,
            ring,
            stats,
            sample_rate: engine.sample_rate,
            block_size: engine.block_size,
            left: vec![0.0; engine.block_size],
            right: vec![0.0; engine.block_size],
            events: EventBatch::new(),
            pending_reset: None,
        })
    }

    /// Replaces the balancer, e.g. with a [`StaticBalancer`] for offline use.
    pub fn with_balancer(mut self, mut balancer: Box<dyn Balancer>) -> Self {
        balancer.set_active(self.transport.tempo_map().is_some());
        self.balancer = balancer;
        self
    }

    pub fn stats(&self) -> Arc<RenderStats> {
        Arc::clone(&self.stats)
    }

    pub fn voices(&self) -> &VoiceManager {
        &self.voices
    }

    pub fn transport(&self) -> &RenderTransport {
        &self.transport
    }

    pub fn resampler(&self) -> ResamplerTier {
        self.tier
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn pending_reset(&self) -> Option<u64> {
        self.pending_reset
    }

    /// Applies one command. Returns `false` for [`RenderCommand::Shutdown`].
    pub fn handle_command(&mut self, cmd: RenderCommand) -> bool {
        match cmd {
            RenderCommand::Song {
                song,
                tempo_map,
                epoch,
            } => self.load_song(*song, tempo_map, epoch),
            RenderCommand::Sample { sample_id, buffer } => self.load_sample(sample_id, buffer),
            RenderCommand::Seek { target, epoch } => self.seek(target, epoch),
            RenderCommand::Stop { epoch } => self.stop(epoch),
            RenderCommand::Shutdown => return false,
        }
        true
    }

    /// Installs a validated song and its tempo map, restarting from tick 0.
    pub fn load_song(&mut self, song: SongData, tempo_map: Arc<TempoMap>, epoch: u64) {
        let note_count = song.note_count();
        let SongData {
            notes_by_tick,
            tempo_changes_by_tick,
            ..
        } = song;

        self.scheduler.load_song(notes_by_tick, tempo_changes_by_tick);
        self.transport.load(tempo_map);
        self.request_reset(epoch);
        self.balancer.set_active(true);
        info!(note_count, epoch, "song loaded");
    }

    pub fn load_sample(&mut self, sample_id: u32, buffer: Arc<SampleBuffer>) {
        debug!(sample_id, frames = buffer.len(), "sample loaded");
        self.voices.load_sample(sample_id, buffer);
    }

    pub fn seek(&mut self, target: SeekTarget, epoch: u64) {
        self.transport.seek(target);
        self.request_reset(epoch);
        debug!(?target, frame = self.transport.frame(), epoch, "render seek");
    }

    pub fn stop(&mut self, epoch: u64) {
        self.transport.rewind();
        self.request_reset(epoch);
        debug!(epoch, "render stop");
    }

    fn request_reset(&mut self, epoch: u64) {
        self.voices.reset_voices();
        self.scheduler.reset_cursor();
        self.balancer.rearm();
        self.pending_reset = Some(self.pending_reset.map_or(epoch, |e| e.max(epoch)));
    }

    /// Completes a pending ring reset if the consumer has parked for it.
    ///
    /// Returns `true` when nothing is pending anymore.
    pub fn sync_ring(&mut self) -> bool {
        let Some(epoch) = self.pending_reset else {
            return true;
        };
        if !self.ring.try_reset(epoch) {
            return false;
        }
        self.pending_reset = None;
        self.stats.record_ring_reset();
        debug!(epoch, "ring reset");
        true
    }

    /// Whether [`render_block`](Self::render_block) would produce a block now.
    #[inline]
    pub fn can_render(&self) -> bool {
        self.pending_reset.is_none() && self.ring.has_space(self.block_size)
    }

    /// Renders one block into the ring.
    ///
    /// Returns `false` without touching any state when the ring is full or a
    /// reset is pending.
    pub fn render_block(&mut self) -> bool {
        if !self.can_render() {
            return false;
        }

        self.balancer.begin_process();

        self.events.clear();
        self.scheduler
            .collect_through(self.transport.current_tick(), &mut self.events);
        for event in self.events.drain(..) {
            match event {
                ScheduledEvent::Note(note) => self.voices.spawn(&note),
                ScheduledEvent::Tempo(change) => {
                    self.stats.record_tempo(change.tempo);
                    debug!(tick = change.tick, tempo = change.tempo, "tempo change");
                }
            }
        }

        self.mix();
        self.transport.advance(self.block_size);

        let metrics = BalancerMetrics {
            active_voices: self.voices.active_count(),
            max_voices: self.voices.max_voices(),
            buffer_fill: self.ring.fill_level(),
            resampler: self.tier,
        };
        if let Some(decision) = self.balancer.end_process(&metrics) {
            self.apply_decision(decision);
        }

        let active = self.voices.active_count();
        let tag = u32::try_from(active).unwrap_or(u32::MAX);
        self.ring.write(&self.left, &self.right, tag);
        self.stats.record_block(active, self.balancer.smoothed_load());
        true
    }

    fn mix(&mut self) {
        self.left.fill(0.0);
        self.right.fill(0.0);

        let read = self.tier.resampler();
        let sample_rate = self.sample_rate;
        let block = self.block_size;
        let (left, right) = (&mut self.left, &mut self.right);
        let (voices, samples) = self.voices.parts_mut();

        voices.retain_mut(|voice| {
            // Not loaded yet: keep the voice where it is
            let Some(sample) = samples.get(&voice.sample_id) else {
                return true;
            };
            let len = sample.len() as f64;
            let step = voice.pitch_ratio * sample.rate_ratio(sample_rate);
            let gain_left = voice.gain * (1.0 - voice.pan.max(0.0));
            let gain_right = voice.gain * (1.0 + voice.pan.min(0.0));
            let src_left = sample.left();
            let src_right = sample.right();
            let stereo = sample.is_stereo();

            for (i, (l, r)) in left.iter_mut().zip(right.iter_mut()).enumerate() {
                let pos = voice.position + i as f64 * step;
                if pos >= len {
                    return false;
                }
                let value_left = read(src_left, pos);
                let value_right = if stereo {
                    read(src_right, pos)
                } else {
                    value_left
                };
                *l += value_left * gain_left;
                *r += value_right * gain_right;
            }

            voice.position += block as f64 * step;
            true
        });
    }

    fn apply_decision(&mut self, decision: BalancerDecision) {
        if let Some(tier) = decision.resampler {
            self.tier = tier;
        }
        if let Some(max_voices) = decision.max_voices {
            self.voices.trim_voices(max_voices);
        }
        if let Some(ratio) = decision.kill_voices_ratio {
            self.voices.kill_voices_ratio(ratio);
        }
        self.stats.record_decision();
        self.stats.record_policy(self.voices.max_voices(), self.tier);
        debug!(
            ?decision,
            active = self.voices.active_count(),
            "balancer decision applied"
        );
    }
}
