// Grid - the (instrument x step) hit matrix

use crate::synth::instrument::Instrument;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of steps in one loop of the pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub enum StepCount {
    Eight,
    #[default]
    Sixteen,
    ThirtyTwo,
}

impl StepCount {
    pub const ALL: [StepCount; 3] = [StepCount::Eight, StepCount::Sixteen, StepCount::ThirtyTwo];

    pub fn len(self) -> usize {
        match self {
            StepCount::Eight => 8,
            StepCount::Sixteen => 16,
            StepCount::ThirtyTwo => 32,
        }
    }
}

impl TryFrom<usize> for StepCount {
    type Error = String;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        match value {
            8 => Ok(StepCount::Eight),
            16 => Ok(StepCount::Sixteen),
            32 => Ok(StepCount::ThirtyTwo),
            other => Err(format!("Unsupported step count {} (expected 8, 16 or 32)", other)),
        }
    }
}

impl From<StepCount> for usize {
    fn from(value: StepCount) -> Self {
        value.len()
    }
}

impl fmt::Display for StepCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.len())
    }
}

/// Boolean matrix of hits, one row per instrument.
///
/// All rows always share the same length (the step count). Changing the step
/// count rebuilds every row cleared to `false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    cells: Vec<Vec<bool>>,
    step_count: StepCount,
}

impl Grid {
    /// Create an empty grid with one row per instrument
    pub fn new(step_count: StepCount) -> Self {
        Self::with_rows(Instrument::COUNT, step_count)
    }

    pub fn with_rows(rows: usize, step_count: StepCount) -> Self {
        Self {
            cells: vec![vec![false; step_count.len()]; rows],
            step_count,
        }
    }

    /// Build a grid from a row-major matrix.
    ///
    /// Returns `None` if the matrix is empty, ragged, or its row length is
    /// not a supported step count.
    pub fn from_rows(cells: Vec<Vec<bool>>) -> Option<Self> {
        let len = cells.first()?.len();
        let step_count = StepCount::try_from(len).ok()?;
        if cells.iter().any(|row| row.len() != len) {
            return None;
        }
        Some(Self { cells, step_count })
    }

    pub fn rows(&self) -> &[Vec<bool>] {
        &self.cells
    }

    pub fn row_count(&self) -> usize {
        self.cells.len()
    }

    pub fn step_count(&self) -> StepCount {
        self.step_count
    }

    pub fn get(&self, row: usize, step: usize) -> bool {
        self.cells
            .get(row)
            .and_then(|r| r.get(step))
            .copied()
            .unwrap_or(false)
    }

    pub fn is_active(&self, instrument: Instrument, step: usize) -> bool {
        self.get(instrument.index(), step)
    }

    pub fn set(&mut self, row: usize, step: usize, value: bool) {
        if let Some(cell) = self.cells.get_mut(row).and_then(|r| r.get_mut(step)) {
            *cell = value;
        }
    }

    /// Flip a cell, returning its new value
    pub fn toggle(&mut self, row: usize, step: usize) -> bool {
        let value = !self.get(row, step);
        self.set(row, step, value);
        self.get(row, step)
    }

    /// Instruments with an active cell at `step`, in row order
    pub fn active_at(&self, step: usize) -> impl Iterator<Item = Instrument> + '_ {
        Instrument::ALL
            .into_iter()
            .filter(move |instrument| self.is_active(*instrument, step))
    }

    /// Rebuild at a new length; every cell is cleared
    pub fn resize(&mut self, step_count: StepCount) {
        let rows = self.cells.len();
        self.cells = vec![vec![false; step_count.len()]; rows];
        self.step_count = step_count;
    }

    pub fn active_cell_count(&self) -> usize {
        self.cells.iter().flatten().filter(|cell| **cell).count()
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(StepCount::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_creation() {
        let grid = Grid::new(StepCount::Sixteen);
        assert_eq!(grid.row_count(), Instrument::COUNT);
        assert!(grid.rows().iter().all(|row| row.len() == 16));
        assert_eq!(grid.active_cell_count(), 0);
    }

    #[test]
    fn test_grid_toggle() {
        let mut grid = Grid::new(StepCount::Eight);
        assert!(grid.toggle(0, 3));
        assert!(grid.get(0, 3));
        assert!(!grid.toggle(0, 3));
        assert!(!grid.get(0, 3));
    }

    #[test]
    fn test_out_of_range_access_is_ignored() {
        let mut grid = Grid::new(StepCount::Eight);
        grid.set(99, 0, true);
        grid.set(0, 99, true);
        assert!(!grid.get(99, 0));
        assert_eq!(grid.active_cell_count(), 0);
    }

    #[test]
    fn test_resize_clears_and_keeps_rows() {
        let mut grid = Grid::new(StepCount::Sixteen);
        grid.set(0, 0, true);
        grid.set(5, 15, true);

        grid.resize(StepCount::ThirtyTwo);

        assert_eq!(grid.step_count(), StepCount::ThirtyTwo);
        assert_eq!(grid.row_count(), Instrument::COUNT);
        assert!(grid.rows().iter().all(|row| row.len() == 32));
        assert_eq!(grid.active_cell_count(), 0);
    }

    #[test]
    fn test_active_at_follows_row_order() {
        let mut grid = Grid::new(StepCount::Eight);
        grid.set(Instrument::Rim.index(), 2, true);
        grid.set(Instrument::Kick.index(), 2, true);

        let active: Vec<_> = grid.active_at(2).collect();
        assert_eq!(active, vec![Instrument::Kick, Instrument::Rim]);
        assert_eq!(grid.active_at(3).count(), 0);
    }

    #[test]
    fn test_from_rows_rejects_bad_shapes() {
        assert!(Grid::from_rows(vec![]).is_none());
        assert!(Grid::from_rows(vec![vec![false; 12]]).is_none());
        assert!(Grid::from_rows(vec![vec![false; 8], vec![false; 16]]).is_none());

        let grid = Grid::from_rows(vec![vec![true; 8]; 6]).unwrap();
        assert_eq!(grid.step_count(), StepCount::Eight);
        assert_eq!(grid.active_cell_count(), 48);
    }

    #[test]
    fn test_step_count_conversion() {
        for step_count in StepCount::ALL {
            assert_eq!(StepCount::try_from(step_count.len()), Ok(step_count));
        }
        assert!(StepCount::try_from(4).is_err());
    }
}
