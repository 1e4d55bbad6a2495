//! BlockmixEngine: the control plane in front of the render and playback sides.

use crate::{BlockmixConfig, Error, Result};
use arc_swap::ArcSwapOption;
use blockmix_core::{
    PlaybackSnapshot, PlaybackState, PlaybackTransport, RingBuffer, SampleBuffer, SeekTarget,
    SinkCommand, SinkProcessor, SongData, TempoMap,
};
use blockmix_render::{
    RenderCommand, RenderEngine, RenderStats, RenderStatsSnapshot, RenderThread,
};
use crossbeam_channel::{bounded, Sender, TrySendError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[cfg(feature = "cpal-output")]
use blockmix_core::OutputStream;

/// Real-time sample mixing engine.
///
/// Owns the render thread and hands the [`SinkProcessor`] to whoever drives
/// the audio device. Every control method only validates and enqueues; the
/// render thread and the sink apply commands in the order they were sent.
///
/// # Example
///
/// ```ignore
/// use blockmix::prelude::*;
///
/// let engine = BlockmixEngine::builder().build()?;
/// engine.init()?;
///
/// engine.load_sample(1, SampleBuffer::mono(kick))?;
/// engine.load_song(song)?;
/// engine.play()?;
///
/// let state = engine.playback()?;
/// println!("tick {:.1} with {} voices", state.tick(), state.active_voices);
/// ```
pub struct BlockmixEngine {
    config: BlockmixConfig,
    #[cfg_attr(not(feature = "cpal-output"), allow(dead_code))]
    output_device: Option<usize>,
    running: Mutex<Option<Running>>,
    next_epoch: AtomicU64,
}

/// Everything `init()` allocates.
struct Running {
    render: RenderThread,
    render_tx: Sender<RenderCommand>,
    sink_tx: Sender<SinkCommand>,
    sink: Option<SinkProcessor>,
    state: Arc<PlaybackState>,
    stats: Arc<RenderStats>,
    tempo: Arc<ArcSwapOption<TempoMap>>,
    #[cfg(feature = "cpal-output")]
    output: Option<OutputStream>,
}

impl BlockmixEngine {
    pub fn builder() -> crate::BlockmixEngineBuilder {
        crate::BlockmixEngineBuilder::default()
    }

    pub(crate) fn from_parts(config: BlockmixConfig, output_device: Option<usize>) -> Self {
        Self {
            config,
            output_device,
            running: Mutex::new(None),
            next_epoch: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &BlockmixConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> f64 {
        self.config.engine.sample_rate
    }

    pub fn is_initialized(&self) -> bool {
        self.running.lock().is_some()
    }

    /// Allocates the ring and playback state, spawns the render thread and
    /// creates the sink. Calling it again is a no-op.
    pub fn init(&self) -> Result<()> {
        let mut running = self.running.lock();
        if running.is_some() {
            return Ok(());
        }

        let engine_config = &self.config.engine;
        let render_config = &self.config.render;

        let ring = RingBuffer::new(engine_config.ring_capacity, engine_config.block_size)?;
        let (producer, consumer) = ring.split();

        let stats = Arc::new(RenderStats::new());
        let render_engine =
            RenderEngine::new(engine_config, render_config, producer, Arc::clone(&stats))?;
        let mut render = RenderThread::new(
            render_engine,
            render_config,
            engine_config.command_capacity,
        );
        render.start()?;

        let tempo = Arc::new(ArcSwapOption::empty());
        let state = Arc::new(PlaybackState::new());
        let (sink_tx, sink_rx) = bounded(engine_config.command_capacity);
        let sink = SinkProcessor::new(
            sink_rx,
            consumer,
            PlaybackTransport::new(engine_config.sample_rate, Arc::clone(&tempo)),
            Arc::clone(&state),
        );

        info!(
            sample_rate = engine_config.sample_rate,
            block_size = engine_config.block_size,
            ring_capacity = engine_config.ring_capacity,
            "engine initialized"
        );

        *running = Some(Running {
            render_tx: render.command_sender(),
            render,
            sink_tx,
            sink: Some(sink),
            state,
            stats,
            tempo,
            #[cfg(feature = "cpal-output")]
            output: None,
        });
        Ok(())
    }

    /// Validates and publishes a new song, restarting playback from tick 0.
    ///
    /// On a validation error nothing changes and the previous song stays loaded.
    pub fn load_song(&self, song: SongData) -> Result<()> {
        self.with_running("load_song", |running| {
            let tempo_map = match song.tempo_map(self.sample_rate()) {
                Ok(map) => Arc::new(map),
                Err(e) => {
                    warn!("song rejected: {e}");
                    return Err(e.into());
                }
            };

            running.ensure_render()?;
            let epoch = self.next_epoch();
            send_sink(&running.sink_tx, SinkCommand::Song { epoch })?;
            running.tempo.store(Some(Arc::clone(&tempo_map)));
            debug!(
                notes = song.note_count(),
                tempo_entries = tempo_map.entries().len(),
                epoch,
                "publishing song"
            );
            send_render(
                &running.render_tx,
                RenderCommand::Song {
                    song: Box::new(song),
                    tempo_map,
                    epoch,
                },
            )
        })
    }

    /// Registers or replaces the audio for `sample_id`.
    pub fn load_sample(&self, sample_id: u32, buffer: SampleBuffer) -> Result<()> {
        self.with_running("load_sample", |running| {
            buffer.validate(sample_id)?;
            running.ensure_render()?;
            send_render(
                &running.render_tx,
                RenderCommand::Sample {
                    sample_id,
                    buffer: Arc::new(buffer),
                },
            )
        })
    }

    /// Repositions both sides; audio rendered for the old position is discarded.
    pub fn seek(&self, target: SeekTarget) -> Result<()> {
        self.with_running("seek", |running| {
            running.ensure_render()?;
            let epoch = self.next_epoch();
            send_sink(&running.sink_tx, SinkCommand::Seek { target, epoch })?;
            debug!(?target, epoch, "seek");
            send_render(&running.render_tx, RenderCommand::Seek { target, epoch })
        })
    }

    pub fn play(&self) -> Result<()> {
        self.with_running("play", |running| {
            send_sink(&running.sink_tx, SinkCommand::Play)
        })
    }

    pub fn pause(&self) -> Result<()> {
        self.with_running("pause", |running| {
            send_sink(&running.sink_tx, SinkCommand::Pause)
        })
    }

    /// Pauses, silences every voice and returns to the origin.
    pub fn stop(&self) -> Result<()> {
        self.with_running("stop", |running| {
            running.ensure_render()?;
            let epoch = self.next_epoch();
            send_sink(&running.sink_tx, SinkCommand::Stop { epoch })?;
            send_render(&running.render_tx, RenderCommand::Stop { epoch })
        })
    }

    /// State last published by the sink.
    pub fn playback(&self) -> Result<PlaybackSnapshot> {
        self.with_running("playback", |running| Ok(running.state.snapshot()))
    }

    /// Shared handle to the sink's published state.
    pub fn playback_state(&self) -> Result<Arc<PlaybackState>> {
        self.with_running("playback_state", |running| Ok(Arc::clone(&running.state)))
    }

    pub fn render_stats(&self) -> Result<RenderStatsSnapshot> {
        self.with_running("render_stats", |running| Ok(running.stats.snapshot()))
    }

    /// Hands the sink to a host audio callback. Succeeds once per `init()`.
    pub fn take_sink(&self) -> Result<SinkProcessor> {
        self.with_running("take_sink", |running| {
            running.sink.take().ok_or(Error::SinkTaken)
        })
    }

    /// Drives the sink from the configured CPAL output device.
    #[cfg(feature = "cpal-output")]
    pub fn start_output(&self) -> Result<()> {
        self.with_running("start_output", |running| {
            let sink = running.sink.take().ok_or(Error::SinkTaken)?;
            let stream = OutputStream::start(sink, self.output_device, self.sample_rate())?;
            info!(channels = stream.channels(), "output stream started");
            running.output = Some(stream);
            Ok(())
        })
    }

    /// Stops the render thread and releases the ring. `init()` may be called again.
    pub fn shutdown(&self) {
        if let Some(running) = self.running.lock().take() {
            drop(running);
            info!("engine shut down");
        }
    }

    fn next_epoch(&self) -> u64 {
        self.next_epoch.fetch_add(1, Ordering::Relaxed)
    }

    fn with_running<T>(
        &self,
        operation: &str,
        f: impl FnOnce(&mut Running) -> Result<T>,
    ) -> Result<T> {
        let mut running = self.running.lock();
        match running.as_mut() {
            Some(running) => f(running),
            None => {
                error!("{operation} called before init()");
                Err(Error::NotInitialized)
            }
        }
    }
}

impl Drop for BlockmixEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Running {
    /// Checked before any reset is queued: a parked sink needs a live render side.
    fn ensure_render(&self) -> Result<()> {
        if self.render.is_running() {
            return Ok(());
        }
        warn!("render thread is not running");
        Err(Error::ChannelClosed)
    }
}

impl Drop for Running {
    fn drop(&mut self) {
        // Output first so the callback stops before the render side goes away
        #[cfg(feature = "cpal-output")]
        self.output.take();
        self.render.stop();
    }
}

fn send_render(tx: &Sender<RenderCommand>, cmd: RenderCommand) -> Result<()> {
    tx.send(cmd).map_err(|_| Error::ChannelClosed)
}

fn send_sink(tx: &Sender<SinkCommand>, cmd: SinkCommand) -> Result<()> {
    tx.try_send(cmd).map_err(|e| match e {
        TrySendError::Full(_) => Error::CommandQueueFull,
        TrySendError::Disconnected(_) => Error::ChannelClosed,
    })
}
