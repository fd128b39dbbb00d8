// Persisted pattern - grid + tempo under a single JSON key
//
// Stored shape: { "grid": [[bool; steps]; rows], "tempo": bpm }
// Loading is tolerant: each field is taken when present and valid, the
// rest comes from the default pattern.

use super::store::{KeyValueStore, StoreError};
use crate::sequencer::grid::Grid;
use crate::sequencer::state::SequencerState;
use crate::sequencer::timeline::Tempo;
use crate::synth::instrument::Instrument;
use serde::{Deserialize, Serialize};

pub const PATTERN_KEY: &str = "beatSequencerPattern";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedPattern {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<Vec<Vec<bool>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo: Option<u32>,
}

impl PersistedPattern {
    pub fn from_state(state: &SequencerState) -> Self {
        Self {
            grid: Some(state.grid().rows().to_vec()),
            tempo: Some(state.tempo().bpm()),
        }
    }

    /// Merge the stored fields over the default pattern
    pub fn into_state(self) -> SequencerState {
        let mut state = SequencerState::default_pattern();

        if let Some(rows) = self.grid {
            match Grid::from_rows(rows) {
                Some(grid) if grid.row_count() == Instrument::COUNT => *state.grid_mut() = grid,
                _ => log::warn!("Stored grid has an invalid shape, using default grid"),
            }
        }

        if let Some(bpm) = self.tempo {
            match Tempo::new(bpm) {
                Ok(tempo) => state.set_tempo(tempo),
                Err(e) => log::warn!("Stored tempo rejected: {}", e),
            }
        }

        state
    }
}

pub fn save_pattern(store: &mut dyn KeyValueStore, state: &SequencerState) -> Result<(), StoreError> {
    let json = serde_json::to_string(&PersistedPattern::from_state(state))?;
    store.set(PATTERN_KEY, &json)?;
    log::debug!("Saved pattern ({} steps, {})", state.step_count(), state.tempo());
    Ok(())
}

/// Load the stored pattern, or the default pattern when absent or unreadable.
/// Never fails.
pub fn load_pattern(store: &dyn KeyValueStore) -> SequencerState {
    let json = match store.get(PATTERN_KEY) {
        Ok(Some(json)) => json,
        Ok(None) => return SequencerState::default_pattern(),
        Err(e) => {
            log::warn!("Failed to read stored pattern: {}", e);
            return SequencerState::default_pattern();
        }
    };

    match serde_json::from_str::<PersistedPattern>(&json) {
        Ok(persisted) => persisted.into_state(),
        Err(e) => {
            log::warn!("Corrupt stored pattern, using default: {}", e);
            SequencerState::default_pattern()
        }
    }
}
