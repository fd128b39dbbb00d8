// Timeline - tempo and step/loop time arithmetic
// Shared by the realtime scheduler and the offline renderer so that both
// map a step index to exactly the same time.

use super::grid::StepCount;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Steps per beat: the grid is subdivided in sixteenth notes
pub const STEPS_PER_BEAT: f64 = 4.0;

/// Sequencer error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SequencerError {
    #[error("Tempo must be a positive number of BPM (got {0})")]
    InvalidTempo(u32),

    #[error("Tempo {bpm} BPM is outside the allowed range {min}..={max}")]
    TempoOutOfRange { bpm: u32, min: u32, max: u32 },

    #[error("Step {step} is outside the grid ({len} steps)")]
    StepOutOfRange { step: usize, len: usize },
}

/// Tempo in BPM (Beats Per Minute)
///
/// Always positive: a zero tempo cannot be constructed, so the step duration
/// below never divides by zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Tempo {
    bpm: u32,
}

impl Tempo {
    pub fn new(bpm: u32) -> Result<Self, SequencerError> {
        if bpm == 0 {
            return Err(SequencerError::InvalidTempo(bpm));
        }
        Ok(Self { bpm })
    }

    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    /// Duration of one beat in seconds
    pub fn beat_duration_seconds(&self) -> f64 {
        60.0 / self.bpm as f64
    }

    /// Duration of one step (a sixteenth note): `(60 / bpm) / 4 = 15 / bpm`
    pub fn seconds_per_step(&self) -> f64 {
        self.beat_duration_seconds() / STEPS_PER_BEAT
    }

    /// Duration of one full traversal of the grid
    pub fn loop_duration_seconds(&self, step_count: StepCount) -> f64 {
        step_count.len() as f64 * self.seconds_per_step()
    }

    /// Offset of a cell from the start of the first loop
    pub fn step_offset_seconds(&self, step_count: StepCount, loop_index: u32, step: usize) -> f64 {
        loop_index as f64 * self.loop_duration_seconds(step_count)
            + step as f64 * self.seconds_per_step()
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self { bpm: 120 }
    }
}

impl TryFrom<u32> for Tempo {
    type Error = SequencerError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Tempo> for u32 {
    fn from(value: Tempo) -> Self {
        value.bpm
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} BPM", self.bpm)
    }
}
