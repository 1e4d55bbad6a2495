//! Tolerance constants for audio testing.

/// Floating point rounding errors (unity gain, hard pan, summing a few voices).
pub const FLOAT_EPSILON: f32 = 1e-6;

/// Interpolated reads of smooth signals.
pub const INTERP_EPSILON: f32 = 1e-4;

/// Silence threshold (~-80dB).
/// Values below this are considered silent.
pub const SILENCE_THRESHOLD: f32 = 0.0001;

/// Tick positions are published in thousandths.
pub const TICK_EPSILON: f64 = 1e-3;
