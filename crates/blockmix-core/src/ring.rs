//! Single-producer single-consumer stereo ring for the render → playback hand-off.
//!
//! Cursors are monotonic `u64` frame counts; storage is addressed modulo the
//! capacity. Only the producer advances `write_index` and only the consumer
//! advances `read_index`, so `0 <= write_index - read_index <= capacity` holds
//! between any two operations.
//!
//! Zeroing the cursors touches state owned by both sides. It is done by the
//! producer only after the consumer has parked for the same epoch, and the
//! consumer only resumes once the producer publishes that epoch as reset:
//!
//! ```text
//! consumer: park(e)          producer: wait parked >= e; zero cursors; reset_epoch = e
//! consumer: resume once reset_epoch >= e
//! ```

use crate::lockfree::AtomicCursor;
use crate::{Error, Result};
use atomic_float::AtomicF32;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Shared storage and state block.
#[derive(Debug)]
pub struct RingBuffer {
    samples: Box<[AtomicF32]>,
    voice_tags: Box<[AtomicU32]>,
    tag_frames: usize,
    capacity: usize,
    read_index: AtomicCursor,
    write_index: AtomicCursor,
    parked_epoch: AtomicCursor,
    reset_epoch: AtomicCursor,
}

/// Result of a consumer read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReadOutcome {
    /// Frames copied out. Less than requested means the ring ran dry.
    pub frames: usize,
    /// Voice count the producer tagged on the last frame read.
    pub voices: Option<u32>,
}

impl RingBuffer {
    /// Allocates a ring of `capacity` stereo frames.
    ///
    /// Voice counts are tagged per `tag_frames` frames, so `capacity` must be a
    /// non-zero multiple of it.
    pub fn new(capacity: usize, tag_frames: usize) -> Result<Self> {
        if capacity == 0 || tag_frames == 0 || capacity % tag_frames != 0 {
            return Err(Error::InvalidRing {
                capacity,
                block: tag_frames,
            });
        }
        let samples = (0..capacity * 2).map(|_| AtomicF32::new(0.0)).collect();
        let voice_tags = (0..capacity / tag_frames)
            .map(|_| AtomicU32::new(0))
            .collect();

        Ok(Self {
            samples,
            voice_tags,
            tag_frames,
            capacity,
            read_index: AtomicCursor::new(0),
            write_index: AtomicCursor::new(0),
            parked_epoch: AtomicCursor::new(0),
            reset_epoch: AtomicCursor::new(0),
        })
    }

    /// Splits the ring into its two endpoints.
    pub fn split(self) -> (RingProducer, RingConsumer) {
        let shared = Arc::new(self);
        (
            RingProducer {
                ring: Arc::clone(&shared),
            },
            RingConsumer { ring: shared },
        )
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Frames written but not yet read.
    #[inline]
    pub fn available(&self) -> usize {
        let (read, write) = self.cursors();
        write.saturating_sub(read) as usize
    }

    /// `(write - read) / capacity`.
    #[inline]
    pub fn fill_level(&self) -> f64 {
        self.available() as f64 / self.capacity as f64
    }

    /// `(read_index, write_index)`.
    #[inline]
    pub fn cursors(&self) -> (u64, u64) {
        let read = self.read_index.get();
        let write = self.write_index.get();
        (read, write)
    }

    #[inline]
    fn tag_slot(&self, frame: u64) -> usize {
        ((frame / self.tag_frames as u64) % self.voice_tags.len() as u64) as usize
    }
}

/// Producer endpoint, owned by the render thread.
#[derive(Debug)]
pub struct RingProducer {
    ring: Arc<RingBuffer>,
}

impl RingProducer {
    pub fn ring(&self) -> &RingBuffer {
        &self.ring
    }

    /// `capacity - (write - read) >= frames`.
    #[inline]
    pub fn has_space(&self, frames: usize) -> bool {
        let read = self.ring.read_index.get();
        let write = self.ring.write_index.get_relaxed();
        let used = write.saturating_sub(read) as usize;
        self.ring.capacity - used.min(self.ring.capacity) >= frames
    }

    /// Copies one block in and tags it with `voices`.
    ///
    /// Returns `false` without writing anything when the block does not fit.
    pub fn write(&mut self, left: &[f32], right: &[f32], voices: u32) -> bool {
        let frames = left.len().min(right.len());
        if frames == 0 {
            return true;
        }
        if !self.has_space(frames) {
            return false;
        }

        let ring = &*self.ring;
        let write = ring.write_index.get_relaxed();
        let mut slot = (write % ring.capacity as u64) as usize;
        for (&l, &r) in left[..frames].iter().zip(&right[..frames]) {
            ring.samples[slot * 2].store(l, Ordering::Relaxed);
            ring.samples[slot * 2 + 1].store(r, Ordering::Relaxed);
            slot += 1;
            if slot == ring.capacity {
                slot = 0;
            }
        }

        let first = write / ring.tag_frames as u64;
        let last = (write + frames as u64 - 1) / ring.tag_frames as u64;
        for block in first..=last {
            ring.voice_tags[ring.tag_slot(block * ring.tag_frames as u64)]
                .store(voices, Ordering::Relaxed);
        }

        ring.write_index.set(write + frames as u64);
        true
    }

    #[inline]
    pub fn fill_level(&self) -> f64 {
        self.ring.fill_level()
    }

    /// Zeroes both cursors once the consumer has parked for `epoch`.
    ///
    /// Returns `false` while the consumer may still be reading.
    pub fn try_reset(&mut self, epoch: u64) -> bool {
        if self.ring.reset_epoch.get() >= epoch {
            return true;
        }
        if self.ring.parked_epoch.get() < epoch {
            return false;
        }
        self.ring.read_index.set(0);
        self.ring.write_index.set(0);
        self.ring.reset_epoch.set(epoch);
        true
    }
}

/// Consumer endpoint, owned by the real-time callback.
#[derive(Debug)]
pub struct RingConsumer {
    ring: Arc<RingBuffer>,
}

impl RingConsumer {
    pub fn ring(&self) -> &RingBuffer {
        &self.ring
    }

    #[inline]
    pub fn available(&self) -> usize {
        self.ring.available()
    }

    #[inline]
    pub fn fill_level(&self) -> f64 {
        self.ring.fill_level()
    }

    /// Copies up to `min(out_left.len(), out_right.len())` frames out.
    ///
    /// Output past the returned frame count is left untouched.
    pub fn read(&mut self, out_left: &mut [f32], out_right: &mut [f32]) -> ReadOutcome {
        let ring = &*self.ring;
        let read = ring.read_index.get_relaxed();
        let write = ring.write_index.get();
        let available = write.saturating_sub(read) as usize;
        let frames = out_left.len().min(out_right.len()).min(available);
        if frames == 0 {
            return ReadOutcome::default();
        }

        let mut slot = (read % ring.capacity as u64) as usize;
        for (l, r) in out_left[..frames].iter_mut().zip(&mut out_right[..frames]) {
            *l = ring.samples[slot * 2].load(Ordering::Relaxed);
            *r = ring.samples[slot * 2 + 1].load(Ordering::Relaxed);
            slot += 1;
            if slot == ring.capacity {
                slot = 0;
            }
        }

        let last = read + frames as u64 - 1;
        let voices = ring.voice_tags[ring.tag_slot(last)].load(Ordering::Relaxed);

        ring.read_index.set(read + frames as u64);
        ReadOutcome {
            frames,
            voices: Some(voices),
        }
    }

    /// Stops reading until the producer resets the ring for `epoch`.
    #[inline]
    pub fn park(&mut self, epoch: u64) {
        self.ring.parked_epoch.set(epoch);
    }

    /// Whether the ring has been reset for `epoch`.
    #[inline]
    pub fn is_reset(&self, epoch: u64) -> bool {
        self.ring.reset_epoch.get() >= epoch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(capacity: usize) -> (RingProducer, RingConsumer) {
        RingBuffer::new(capacity, 128).unwrap().split()
    }

    #[test]
    fn test_full_ring_has_no_space() {
        let (mut tx, mut rx) = ring(512);
        let block = vec![0.5f32; 512];
        assert!(tx.write(&block, &block, 1));
        assert!(!tx.has_space(1));

        let mut l = vec![0.0; 100];
        let mut r = vec![0.0; 100];
        assert_eq!(rx.read(&mut l, &mut r).frames, 100);
        assert!(tx.has_space(100));
        assert!(!tx.has_space(101));
    }

    #[test]
    fn test_write_without_space_is_rejected() {
        let (mut tx, _rx) = ring(256);
        let block = vec![1.0f32; 128];
        assert!(tx.write(&block, &block, 0));
        assert!(tx.write(&block, &block, 0));
        assert!(!tx.write(&block, &block, 0));
        assert_eq!(tx.ring().cursors(), (0, 256));
    }

    #[test]
    fn test_wraparound_preserves_order() {
        let (mut tx, mut rx) = ring(256);
        let mut l = vec![0.0; 200];
        let mut r = vec![0.0; 200];

        let first: Vec<f32> = (0..200).map(|i| i as f32).collect();
        assert!(tx.write(&first, &first, 0));
        assert_eq!(rx.read(&mut l, &mut r).frames, 200);

        let second: Vec<f32> = (200..400).map(|i| i as f32).collect();
        let neg: Vec<f32> = second.iter().map(|v| -v).collect();
        assert!(tx.write(&second, &neg, 0));
        assert_eq!(rx.read(&mut l, &mut r).frames, 200);
        assert_eq!(l, second);
        assert_eq!(r, neg);
    }

    #[test]
    fn test_short_read() {
        let (mut tx, mut rx) = ring(256);
        let block = vec![0.25f32; 64];
        assert!(tx.write(&block, &block, 3));

        let mut l = vec![9.0; 128];
        let mut r = vec![9.0; 128];
        let outcome = rx.read(&mut l, &mut r);
        assert_eq!(outcome.frames, 64);
        assert_eq!(outcome.voices, Some(3));
        assert_eq!(l[63], 0.25);
        assert_eq!(l[64], 9.0);

        assert_eq!(rx.read(&mut l, &mut r), ReadOutcome::default());
    }

    #[test]
    fn test_voice_tags_follow_blocks() {
        let (mut tx, mut rx) = ring(512);
        let block = vec![0.0f32; 128];
        assert!(tx.write(&block, &block, 4));
        assert!(tx.write(&block, &block, 9));

        let mut l = vec![0.0; 128];
        let mut r = vec![0.0; 128];
        assert_eq!(rx.read(&mut l, &mut r).voices, Some(4));
        assert_eq!(rx.read(&mut l, &mut r).voices, Some(9));
    }

    #[test]
    fn test_reset_waits_for_park() {
        let (mut tx, mut rx) = ring(256);
        let block = vec![1.0f32; 128];
        assert!(tx.write(&block, &block, 0));

        assert!(!tx.try_reset(1));
        assert!(!rx.is_reset(1));
        assert_eq!(rx.available(), 128);

        rx.park(1);
        assert!(tx.try_reset(1));
        assert!(rx.is_reset(1));
        assert_eq!(tx.ring().cursors(), (0, 0));
        assert_eq!(rx.available(), 0);

        // Already reset for this epoch
        assert!(tx.try_reset(1));
        assert!(!tx.try_reset(2));
    }

    #[test]
    fn test_fill_level() {
        let (mut tx, _rx) = ring(512);
        assert_eq!(tx.fill_level(), 0.0);
        let block = vec![0.0f32; 128];
        assert!(tx.write(&block, &block, 0));
        assert!((tx.fill_level() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_geometry() {
        assert!(RingBuffer::new(0, 128).is_err());
        assert!(RingBuffer::new(500, 128).is_err());
        assert!(RingBuffer::new(512, 0).is_err());
    }
}
