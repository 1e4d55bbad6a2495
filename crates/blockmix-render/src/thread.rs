//! Background thread driving a [`RenderEngine`].

use crate::{Error, RenderCommand, RenderConfig, RenderEngine, RenderStats, Result};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thread_priority::ThreadPriority;
use tracing::{info, warn};

/// Render thread: drains commands, then fills the ring while it has room.
pub struct RenderThread {
    command_tx: Sender<RenderCommand>,
    command_rx: Option<Receiver<RenderCommand>>,
    engine: Option<RenderEngine>,
    stats: Arc<RenderStats>,
    thread_handle: Option<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    idle_wait: Duration,
    max_blocks_per_pass: usize,
}

impl RenderThread {
    pub fn new(engine: RenderEngine, config: &RenderConfig, channel_capacity: usize) -> Self {
        let (tx, rx) = bounded(channel_capacity);
        Self {
            command_tx: tx,
            command_rx: Some(rx),
            stats: engine.stats(),
            engine: Some(engine),
            thread_handle: None,
            shutdown: Arc::new(AtomicBool::new(false)),
            idle_wait: config.idle_wait(),
            max_blocks_per_pass: config.max_blocks_per_pass,
        }
    }

    pub fn command_sender(&self) -> Sender<RenderCommand> {
        self.command_tx.clone()
    }

    pub fn stats(&self) -> Arc<RenderStats> {
        Arc::clone(&self.stats)
    }

    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Spawns the thread. Calling it again while running is a no-op.
    pub fn start(&mut self) -> Result<()> {
        if self.thread_handle.is_some() {
            return Ok(());
        }
        let (Some(rx), Some(engine)) = (self.command_rx.take(), self.engine.take()) else {
            return Err(Error::NotRunning);
        };

        let shutdown = Arc::clone(&self.shutdown);
        let idle_wait = self.idle_wait;
        let budget = self.max_blocks_per_pass;

        let handle = thread::Builder::new()
            .name("blockmix-render".into())
            .spawn(move || {
                if let Err(e) = thread_priority::set_current_thread_priority(ThreadPriority::Max)
                {
                    warn!("render thread keeps default priority: {e:?}");
                }
                render_loop(rx, engine, &shutdown, idle_wait, budget);
            })?;

        self.thread_handle = Some(handle);
        info!("render thread started");
        Ok(())
    }

    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        let _ = self.command_tx.try_send(RenderCommand::Shutdown);

        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
            info!("render thread stopped");
        }
    }
}

impl Drop for RenderThread {
    fn drop(&mut self) {
        self.stop();
    }
}

fn render_loop(
    rx: Receiver<RenderCommand>,
    mut engine: RenderEngine,
    shutdown: &AtomicBool,
    idle_wait: Duration,
    budget: usize,
) {
    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        loop {
            match rx.try_recv() {
                Ok(cmd) => {
                    if !engine.handle_command(cmd) {
                        return;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return,
            }
        }

        let mut rendered = 0;
        if engine.sync_ring() {
            while rendered < budget && engine.render_block() {
                rendered += 1;
            }
        }

        if rendered == 0 {
            match rx.recv_timeout(idle_wait) {
                Ok(cmd) => {
                    if !engine.handle_command(cmd) {
                        return;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockmix_core::{EngineConfig, RingBuffer, RingConsumer, SampleBuffer, SeekTarget};
    use std::time::Instant;

    fn render_thread() -> (RenderThread, RingConsumer) {
        let config = EngineConfig {
            block_size: 64,
            ring_capacity: 512,
            ..Default::default()
        };
        let render = RenderConfig {
            adaptive: false,
            ..Default::default()
        };
        let (producer, consumer) = RingBuffer::new(config.ring_capacity, config.block_size)
            .unwrap()
            .split();
        let engine =
            RenderEngine::new(&config, &render, producer, Arc::new(RenderStats::new())).unwrap();
        (RenderThread::new(engine, &render, 16), consumer)
    }

    fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        false
    }

    #[test]
    fn test_fills_ring_and_stops() {
        let (mut render, consumer) = render_thread();
        render.start().unwrap();
        assert!(render.is_running());
        assert!(wait_until(|| consumer.available() == 512));
        assert!(wait_until(|| render.stats().snapshot().blocks_rendered == 8));

        render.stop();
        assert!(!render.is_running());
    }

    #[test]
    fn test_start_twice_is_noop() {
        let (mut render, _consumer) = render_thread();
        render.start().unwrap();
        render.start().unwrap();
        render.stop();
        assert!(matches!(render.start(), Err(Error::NotRunning)));
    }

    #[test]
    fn test_reset_completes_after_consumer_parks() {
        let (mut render, mut consumer) = render_thread();
        let tx = render.command_sender();
        render.start().unwrap();
        assert!(wait_until(|| consumer.available() == 512));

        tx.send(RenderCommand::Sample {
            sample_id: 1,
            buffer: Arc::new(SampleBuffer::mono(vec![0.0; 16])),
        })
        .unwrap();
        tx.send(RenderCommand::Seek {
            target: SeekTarget::Seconds(0.5),
            epoch: 1,
        })
        .unwrap();

        // Nothing moves until the consumer parks
        thread::sleep(Duration::from_millis(20));
        assert!(!consumer.is_reset(1));

        consumer.park(1);
        assert!(wait_until(|| consumer.is_reset(1)));
        assert!(wait_until(|| consumer.available() == 512));
        assert!(wait_until(|| render.stats().snapshot().ring_resets == 1));
    }
}
