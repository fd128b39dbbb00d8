// Integration test for pattern and theme persistence
// File-backed store, reopened between steps like separate app launches

use beat_sequencer::audio::mixer::VoiceMixer;
use beat_sequencer::persistence::{PATTERN_KEY, load_pattern, load_theme, save_pattern};
use beat_sequencer::{
    FileStore, Grid, Instrument, KeyValueStore, ManualClock, SequencerConfig, SequencerController,
    SequencerState, StepCount, Tempo, Theme, create_notification_channel,
};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn controller(store_path: &Path) -> SequencerController {
    let (tx, _rx) = create_notification_channel(8);
    SequencerController::new(
        SequencerConfig::default(),
        Box::new(FileStore::open(store_path)),
        Arc::new(ManualClock::new(0.0)),
        Box::new(VoiceMixer::new(8000.0, 0.8)),
        8000,
        Arc::new(Mutex::new(tx)),
    )
}

#[test]
fn test_pattern_round_trip_through_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("storage.json");

    let mut grid = Grid::new(StepCount::ThirtyTwo);
    for step in (0..32).step_by(3) {
        grid.set(Instrument::Tom.index(), step, true);
    }
    let state = SequencerState::new(grid, Tempo::new(133).unwrap());

    let mut store = FileStore::open(&path);
    save_pattern(&mut store, &state).unwrap();
    drop(store);

    let reopened = FileStore::open(&path);
    assert_eq!(load_pattern(&reopened), state);
}

#[test]
fn test_controller_edits_survive_restart() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("storage.json");

    {
        let mut controller = controller(&path);
        controller.set_step_count(StepCount::Eight).unwrap();
        controller.toggle_cell(Instrument::Snare, 2).unwrap();
        controller.toggle_cell(Instrument::HiHat, 7).unwrap();
        controller.set_tempo(88).unwrap();
        controller.set_theme(Theme::Light);
    }

    let controller = controller(&path);
    let state = controller.snapshot();
    assert_eq!(state.step_count(), StepCount::Eight);
    assert_eq!(state.tempo().bpm(), 88);
    assert_eq!(state.grid().active_cell_count(), 2);
    assert!(state.grid().is_active(Instrument::Snare, 2));
    assert!(state.grid().is_active(Instrument::HiHat, 7));
    assert_eq!(controller.theme(), Theme::Light);
}

#[test]
fn test_corrupt_store_file_falls_back_to_default() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("storage.json");
    fs::write(&path, "\u{0}\u{1}garbage").unwrap();

    let controller = controller(&path);
    assert_eq!(controller.snapshot(), SequencerState::default_pattern());
    assert_eq!(controller.theme(), Theme::Dark);
}

#[test]
fn test_corrupt_pattern_value_falls_back_to_default() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("storage.json");

    let mut store = FileStore::open(&path);
    store.set(PATTERN_KEY, "[1, 2").unwrap();
    store.set("theme", "light").unwrap();

    assert_eq!(load_pattern(&store), SequencerState::default_pattern());
    assert_eq!(load_theme(&store), Theme::Light);
}
