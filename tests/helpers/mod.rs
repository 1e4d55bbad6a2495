//! Test helpers and fixtures for blockmix integration tests
//!
//! Tests drive the [`SinkProcessor`] by hand instead of opening an audio
//! device: [`pull`] waits until the render thread has produced enough audio
//! and then runs one callback, so output is deterministic regardless of how
//! fast the render thread is scheduled.
//!
//! ## Tolerance Levels
//!
//! Use the appropriate tolerance from [`tolerances`] module:
//! - `FLOAT_EPSILON` (1e-6): Exact operations (unity gain, hard pan)
//! - `INTERP_EPSILON` (1e-4): Interpolated reads
//! - `SILENCE_THRESHOLD` (0.0001): Silence detection (-80dB)

#![allow(dead_code)]

pub mod tolerances;

use blockmix::prelude::*;
use std::time::{Duration, Instant};

/// Default test sample rate
pub const TEST_SAMPLE_RATE: f64 = 48000.0;

/// Block size small enough that tick boundaries land mid-song quickly
pub const TEST_BLOCK_SIZE: usize = 64;

pub const TEST_RING_CAPACITY: usize = 1024;

/// 120 BPM at 4 ticks per beat
pub const FRAMES_PER_TICK: usize = 6000;

/// Route engine logs to the test harness output. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Create an initialized engine with fixed policy (no adaptive balancing,
/// nearest-neighbour reads) so sample values are exact.
pub fn test_engine() -> BlockmixEngine {
    test_engine_with(ResamplerTier::Nearest)
}

/// Same as [`test_engine`] with a fixed resampler tier.
pub fn test_engine_with(resampler: ResamplerTier) -> BlockmixEngine {
    init_tracing();
    let engine = BlockmixEngine::builder()
        .sample_rate(TEST_SAMPLE_RATE)
        .block_size(TEST_BLOCK_SIZE)
        .ring_capacity(TEST_RING_CAPACITY)
        .resampler(resampler)
        .adaptive(false)
        .build()
        .expect("Failed to build test engine");
    engine.init().expect("Failed to init test engine");
    engine
}

/// Song at 120 BPM, 4 ticks per beat, with the given notes.
pub fn test_song(notes: &[NoteEvent]) -> SongData {
    let mut song = SongData::new(120.0, 4);
    for note in notes {
        song.add_note(*note);
    }
    song
}

/// Poll `cond` every millisecond for up to `max_wait_ms`.
pub fn wait_for(max_wait_ms: u64, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_millis(max_wait_ms);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    false
}

/// Run callbacks of [`TEST_BLOCK_SIZE`] frames until `frames` frames are
/// collected, waiting before each one until the sink is unparked and has a
/// full block buffered.
pub fn pull(sink: &mut SinkProcessor, frames: usize) -> (Vec<f32>, Vec<f32>) {
    let mut left = vec![0.0; frames];
    let mut right = vec![0.0; frames];
    for start in (0..frames).step_by(TEST_BLOCK_SIZE) {
        let end = (start + TEST_BLOCK_SIZE).min(frames);
        let ready = wait_for(5000, || {
            sink.sync();
            !sink.is_parked() && sink.buffered_frames() >= end - start
        });
        assert!(ready, "render thread did not produce audio in time");
        sink.process(&mut left[start..end], &mut right[start..end]);
    }
    (left, right)
}

/// Run one callback of `frames` frames without waiting.
pub fn callback(sink: &mut SinkProcessor, frames: usize) -> (Vec<f32>, Vec<f32>) {
    let mut left = vec![0.0; frames];
    let mut right = vec![0.0; frames];
    sink.process(&mut left, &mut right);
    (left, right)
}

/// Generate a DC signal (constant value).
pub fn generate_dc(value: f32, num_samples: usize) -> Vec<f32> {
    vec![value; num_samples]
}

/// Generate a test signal: sine wave at given frequency for specified samples.
pub fn generate_sine(frequency: f64, sample_rate: f64, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|i| {
            let t = i as f64 / sample_rate;
            (2.0 * std::f64::consts::PI * frequency * t).sin() as f32
        })
        .collect()
}

/// Generate an integer staircase signal [0, 1, 2, ..., n-1] as f32.
///
/// Each sample equals its index, so a read position can be recovered exactly.
pub fn generate_integer_staircase(num_samples: usize) -> Vec<f32> {
    (0..num_samples).map(|i| i as f32).collect()
}

/// Calculate RMS of a signal.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Calculate peak amplitude of a signal.
pub fn peak(samples: &[f32]) -> f32 {
    samples
        .iter()
        .map(|s| s.abs())
        .fold(0.0_f32, |a, b| a.max(b))
}

/// Index of the first sample above the silence threshold.
pub fn first_sound(samples: &[f32]) -> Option<usize> {
    samples
        .iter()
        .position(|s| s.abs() > tolerances::SILENCE_THRESHOLD)
}

/// Assert that a signal is approximately silent (all values near zero).
pub fn assert_silence(samples: &[f32], tolerance: f32) {
    let max = peak(samples);
    assert!(
        max <= tolerance,
        "Expected silence, but peak amplitude was {}",
        max
    );
}

/// Assert that a signal has content (not silent).
pub fn assert_has_audio(samples: &[f32], min_rms: f32) {
    let r = rms(samples);
    assert!(
        r >= min_rms,
        "Expected audio content with RMS >= {}, but RMS was {}",
        min_rms,
        r
    );
}
