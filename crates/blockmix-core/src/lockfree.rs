//! Lock-free primitives for real-time audio.

use atomic_float::{AtomicF32, AtomicF64};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Cache-line aligned atomic f32.
#[derive(Debug)]
#[repr(align(64))]
pub struct AtomicFloat {
    value: AtomicF32,
}

impl AtomicFloat {
    pub fn new(value: f32) -> Self {
        Self {
            value: AtomicF32::new(value),
        }
    }

    #[inline]
    pub fn get(&self) -> f32 {
        self.value.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set(&self, value: f32) {
        self.value.store(value, Ordering::Release);
    }
}

impl Default for AtomicFloat {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Cache-line aligned atomic bool.
#[derive(Debug)]
#[repr(align(64))]
pub struct AtomicFlag {
    value: AtomicBool,
}

impl AtomicFlag {
    pub fn new(value: bool) -> Self {
        Self {
            value: AtomicBool::new(value),
        }
    }

    #[inline]
    pub fn get(&self) -> bool {
        self.value.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set(&self, value: bool) {
        self.value.store(value, Ordering::Release);
    }

    #[inline]
    pub fn swap(&self, value: bool) -> bool {
        self.value.swap(value, Ordering::AcqRel)
    }
}

impl Default for AtomicFlag {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Cache-line aligned atomic f64.
#[derive(Debug)]
#[repr(align(64))]
pub struct AtomicDouble {
    value: AtomicF64,
}

impl AtomicDouble {
    pub fn new(value: f64) -> Self {
        Self {
            value: AtomicF64::new(value),
        }
    }

    #[inline]
    pub fn get(&self) -> f64 {
        self.value.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set(&self, value: f64) {
        self.value.store(value, Ordering::Release);
    }
}

impl Default for AtomicDouble {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Cache-line aligned monotonic cursor.
///
/// Keeps the producer's and consumer's indices on separate lines so the two
/// sides of a ring do not false-share.
#[derive(Debug, Default)]
#[repr(align(64))]
pub struct AtomicCursor {
    value: AtomicU64,
}

impl AtomicCursor {
    pub fn new(value: u64) -> Self {
        Self {
            value: AtomicU64::new(value),
        }
    }

    #[inline]
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Acquire)
    }

    /// Load for the side that owns this cursor.
    #[inline]
    pub fn get_relaxed(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set(&self, value: u64) {
        self.value.store(value, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atomic_float() {
        let val = AtomicFloat::new(1.0);
        assert_eq!(val.get(), 1.0);
        val.set(2.5);
        assert_eq!(val.get(), 2.5);
    }

    #[test]
    fn test_atomic_flag() {
        let flag = AtomicFlag::new(false);
        assert!(!flag.get());
        flag.set(true);
        assert!(flag.get());
        assert!(flag.swap(false));
        assert!(!flag.get());
    }

    #[test]
    fn test_atomic_cursor_alignment() {
        assert_eq!(std::mem::align_of::<AtomicCursor>(), 64);
        let cursor = AtomicCursor::new(7);
        cursor.set(512);
        assert_eq!(cursor.get(), 512);
        assert_eq!(cursor.get_relaxed(), 512);
    }
}
