//! Real-time consumer driven by the host audio callback.
//!
//! Nothing in here allocates, locks, or returns an error. Every failure has a
//! silent fallback: a dry ring becomes silence plus an underrun count, and a
//! pending reset becomes silence until the render side catches up.

use crate::config::MAX_BLOCK_SIZE;
use crate::ring::RingConsumer;
use crate::{PlaybackState, PlaybackTransport, SinkCommand};
use crossbeam_channel::Receiver;
use std::sync::Arc;

pub struct SinkProcessor {
    commands: Receiver<SinkCommand>,
    ring: RingConsumer,
    transport: PlaybackTransport,
    state: Arc<PlaybackState>,
    /// Reset epoch the sink is parked on.
    pending_epoch: Option<u64>,
    voices: u32,
    scratch_left: Vec<f32>,
    scratch_right: Vec<f32>,
}

impl SinkProcessor {
    pub fn new(
        commands: Receiver<SinkCommand>,
        ring: RingConsumer,
        transport: PlaybackTransport,
        state: Arc<PlaybackState>,
    ) -> Self {
        Self {
            commands,
            ring,
            transport,
            state,
            pending_epoch: None,
            voices: 0,
            scratch_left: vec![0.0; MAX_BLOCK_SIZE],
            scratch_right: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    pub fn state(&self) -> Arc<PlaybackState> {
        Arc::clone(&self.state)
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.transport.is_playing()
    }

    /// Whether the sink is waiting for the ring to be reset.
    #[inline]
    pub fn is_parked(&self) -> bool {
        self.pending_epoch.is_some()
    }

    /// Frames rendered ahead and not yet played.
    #[inline]
    pub fn buffered_frames(&self) -> usize {
        self.ring.available()
    }

    /// Applies pending commands and resumes if the ring has been reset.
    ///
    /// [`process`](Self::process) does this itself; hosts may call it to poll
    /// readiness between callbacks.
    pub fn sync(&mut self) {
        self.process_commands();
        if let Some(epoch) = self.pending_epoch {
            if self.ring.is_reset(epoch) {
                self.pending_epoch = None;
            }
        }
    }

    /// Fills planar stereo output for one callback.
    pub fn process(&mut self, out_left: &mut [f32], out_right: &mut [f32]) {
        let frames = out_left.len().min(out_right.len());
        let (out_left, out_right) = (&mut out_left[..frames], &mut out_right[..frames]);

        self.sync();

        if self.pending_epoch.is_some() || !self.transport.is_playing() {
            out_left.fill(0.0);
            out_right.fill(0.0);
            self.publish();
            return;
        }

        let outcome = self.ring.read(out_left, out_right);
        if outcome.frames < frames {
            out_left[outcome.frames..].fill(0.0);
            out_right[outcome.frames..].fill(0.0);
            self.state.record_underrun();
        }
        if let Some(voices) = outcome.voices {
            self.voices = voices;
        }

        self.transport.advance(outcome.frames);
        self.publish();
    }

    /// Fills interleaved output with any channel count.
    ///
    /// Channels 0 and 1 receive left and right; a mono device gets their
    /// average and any further channels are silent.
    pub fn process_interleaved(&mut self, output: &mut [f32], channels: usize) {
        if channels == 0 {
            return;
        }
        let mut left = std::mem::take(&mut self.scratch_left);
        let mut right = std::mem::take(&mut self.scratch_right);

        for chunk in output.chunks_mut(MAX_BLOCK_SIZE * channels) {
            let frames = chunk.len() / channels;
            self.process(&mut left[..frames], &mut right[..frames]);

            for (i, frame) in chunk.chunks_exact_mut(channels).enumerate() {
                if channels == 1 {
                    frame[0] = (left[i] + right[i]) * 0.5;
                    continue;
                }
                frame[0] = left[i];
                frame[1] = right[i];
                frame[2..].fill(0.0);
            }
        }

        self.scratch_left = left;
        self.scratch_right = right;
    }

    fn process_commands(&mut self) {
        while let Ok(cmd) = self.commands.try_recv() {
            match cmd {
                SinkCommand::Play => self.transport.play(),
                SinkCommand::Pause => self.transport.pause(),
                SinkCommand::Stop { epoch } => {
                    self.transport.stop();
                    self.park(epoch);
                }
                SinkCommand::Seek { target, epoch } => {
                    self.transport.seek(target);
                    self.park(epoch);
                }
                SinkCommand::Song { epoch } => {
                    self.transport.rewind();
                    self.park(epoch);
                }
            }
        }
    }

    fn park(&mut self, epoch: u64) {
        let epoch = self.pending_epoch.map_or(epoch, |pending| pending.max(epoch));
        self.pending_epoch = Some(epoch);
        self.voices = 0;
        self.ring.park(epoch);
    }

    fn publish(&self) {
        let (frame, tick, tempo) = self.transport.position();
        self.state.publish_position(frame, tick, tempo);
        self.state.publish_voices(self.voices);
        self.state.publish_playing(self.transport.is_playing());
    }
}
