// Audio timing - the audio clock the scheduler reconciles against

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of "current audio time" in seconds.
///
/// The scheduler only ever reads this clock; it never sleeps on it.
pub trait AudioClock: Send + Sync {
    fn current_time(&self) -> f64;
}

/// Shared audio timing state driven by the output callback
#[derive(Clone, Debug)]
pub struct AudioTiming {
    /// Frames rendered so far (incremented by the audio callback)
    sample_position: Arc<AtomicU64>,
    sample_rate: f64,
}

impl AudioTiming {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_position: Arc::new(AtomicU64::new(0)),
            sample_rate: sample_rate as f64,
        }
    }

    pub fn current_sample(&self) -> u64 {
        self.sample_position.load(Ordering::Relaxed)
    }

    /// Advance the sample position (called from audio callback)
    pub fn advance(&self, frames: usize) {
        self.sample_position
            .fetch_add(frames as u64, Ordering::Relaxed);
    }
}

impl AudioClock for AudioTiming {
    fn current_time(&self) -> f64 {
        self.current_sample() as f64 / self.sample_rate
    }
}

/// Clock moved by hand, for tests and headless runs
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    bits: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(start.to_bits())),
        }
    }

    pub fn set(&self, seconds: f64) {
        self.bits.store(seconds.to_bits(), Ordering::Relaxed);
    }

    pub fn advance(&self, seconds: f64) {
        self.set(self.current_time() + seconds);
    }
}

impl AudioClock for ManualClock {
    fn current_time(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }
}
