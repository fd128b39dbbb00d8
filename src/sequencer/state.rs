// Sequencer state - grid + tempo, owned by the controller
//
// The scheduler tick reads this through a shared handle; edits land at the
// next step boundary the scheduler computes.

use super::grid::{Grid, StepCount};
use super::timeline::{SequencerError, Tempo};
use crate::synth::instrument::Instrument;
use std::sync::{Arc, Mutex, MutexGuard};

pub type SharedSequencerState = Arc<Mutex<SequencerState>>;

/// Lock, taking the data back from a poisoned mutex.
/// Grid and tempo stay valid whatever a panicking holder was doing.
pub fn lock_recovering<'a, T>(mutex: &'a Mutex<T>, what: &str) -> MutexGuard<'a, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        log::error!("{} lock poisoned by a panicked thread, recovering", what);
        mutex.clear_poison();
        poisoned.into_inner()
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencerState {
    grid: Grid,
    tempo: Tempo,
}

impl SequencerState {
    pub fn new(grid: Grid, tempo: Tempo) -> Self {
        Self { grid, tempo }
    }

    /// Starter pattern: four-on-the-floor kick, backbeat snare, eighth hats
    pub fn default_pattern() -> Self {
        let mut grid = Grid::new(StepCount::Sixteen);
        for step in 0..16 {
            if step % 4 == 0 {
                grid.set(Instrument::Kick.index(), step, true);
            }
            if step % 8 == 4 {
                grid.set(Instrument::Snare.index(), step, true);
            }
            if step % 2 == 0 {
                grid.set(Instrument::HiHat.index(), step, true);
            }
        }
        Self::new(grid, Tempo::default())
    }

    pub fn into_shared(self) -> SharedSequencerState {
        Arc::new(Mutex::new(self))
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    pub fn set_tempo(&mut self, tempo: Tempo) {
        self.tempo = tempo;
    }

    pub fn step_count(&self) -> StepCount {
        self.grid.step_count()
    }

    /// Toggle one cell, returning its new value
    pub fn toggle(&mut self, instrument: Instrument, step: usize) -> Result<bool, SequencerError> {
        let len = self.grid.step_count().len();
        if step >= len {
            return Err(SequencerError::StepOutOfRange { step, len });
        }
        Ok(self.grid.toggle(instrument.index(), step))
    }

    /// Rebuild the grid at a new length (all cells cleared)
    pub fn resize(&mut self, step_count: StepCount) {
        self.grid.resize(step_count);
    }
}

impl Default for SequencerState {
    fn default() -> Self {
        Self::default_pattern()
    }
}
