// Integration test for look-ahead scheduling
// Drives the scheduler with a simulated 25ms timer across tempos and grid sizes

use beat_sequencer::audio::sink::SoundSink;
use beat_sequencer::synth::voice::Voice;
use beat_sequencer::{Grid, Instrument, LookAheadScheduler, NoteEvent, SequencerState, StepCount, Tempo};

const WINDOW: f64 = 0.1;
const TICK: f64 = 0.025;

struct CollectingSink {
    starts: Vec<f64>,
}

impl SoundSink for CollectingSink {
    fn sample_rate(&self) -> f32 {
        8000.0
    }

    fn schedule(&mut self, voice: Voice) {
        self.starts.push(voice.start_time());
    }
}

fn every_step(step_count: StepCount, bpm: u32) -> SequencerState {
    let mut grid = Grid::new(step_count);
    for step in 0..step_count.len() {
        grid.set(Instrument::Rim.index(), step, true);
    }
    SequencerState::new(grid, Tempo::new(bpm).unwrap())
}

#[test]
fn test_one_loop_advances_by_loop_duration() {
    for step_count in StepCount::ALL {
        for bpm in [1, 60, 97, 120, 174, 200, 999] {
            let state = every_step(step_count, bpm);
            let mut scheduler = LookAheadScheduler::new(WINDOW, 0.05);
            let mut sink = CollectingSink { starts: Vec::new() };

            scheduler.start(0.0);
            let start_time = scheduler.cursor().unwrap().next_note_time;

            let mut now = 0.0;
            let mut events: Vec<NoteEvent> = Vec::new();
            while events.len() < step_count.len() {
                events.extend(scheduler.tick(now, &state, &mut sink));
                now += TICK;
            }

            // A tick can run past the loop end; count only the first loop
            let cursor = scheduler.cursor().unwrap();
            let emitted = events.len() as f64;
            let expected = start_time + emitted * 15.0 / bpm as f64;
            assert!(
                (cursor.next_note_time - expected).abs() < 1e-9,
                "S={} T={}: {} vs {}",
                step_count,
                bpm,
                cursor.next_note_time,
                expected
            );

            let steps: Vec<usize> = events.iter().take(step_count.len()).map(|e| e.step).collect();
            assert_eq!(steps, (0..step_count.len()).collect::<Vec<_>>());
            assert_eq!(sink.starts.len(), events.len());
        }
    }
}

#[test]
fn test_every_event_inside_look_ahead_window() {
    let state = every_step(StepCount::Sixteen, 200);
    let mut scheduler = LookAheadScheduler::new(WINDOW, 0.05);
    let mut sink = CollectingSink { starts: Vec::new() };

    scheduler.start(0.0);
    let mut now = 0.0;
    // Irregular timer: 25ms nominal with occasional long stalls
    for i in 0..400 {
        let events = scheduler.tick(now, &state, &mut sink);
        for event in events {
            assert!(event.time >= now, "event in the past at tick {}", i);
            assert!(event.time < now + WINDOW, "event beyond window at tick {}", i);
        }
        now += if i % 37 == 0 { 0.4 } else { TICK };
    }
}

#[test]
fn test_no_step_dropped_under_stalls() {
    let state = every_step(StepCount::Eight, 120);
    let mut scheduler = LookAheadScheduler::new(WINDOW, 0.05);
    let mut sink = CollectingSink { starts: Vec::new() };

    scheduler.start(0.0);
    let mut steps = Vec::new();
    for now in [0.0, 0.9, 0.95, 3.0, 3.1] {
        steps.extend(scheduler.tick(now, &state, &mut sink).into_iter().map(|e| e.step));
    }

    // Cursor reaches 3.1 + 0.1 = 3.2: steps at 0.05 + k*0.125 < 3.2 -> k = 0..=25
    assert_eq!(steps.len(), 26);
    for (i, step) in steps.iter().enumerate() {
        assert_eq!(*step, i % 8);
    }
}

#[test]
fn test_stop_then_restart() {
    let state = every_step(StepCount::Eight, 120);
    let mut scheduler = LookAheadScheduler::new(WINDOW, 0.05);
    let mut sink = CollectingSink { starts: Vec::new() };

    scheduler.start(0.0);
    scheduler.tick(1.0, &state, &mut sink);
    scheduler.stop();

    let emitted = sink.starts.len();
    for i in 0..10 {
        assert!(scheduler.tick(2.0 + i as f64 * TICK, &state, &mut sink).is_empty());
    }
    assert_eq!(sink.starts.len(), emitted);

    scheduler.start(5.0);
    let events = scheduler.tick(5.0, &state, &mut sink);
    assert_eq!(events[0].step, 0);
    assert!((events[0].time - 5.05).abs() < 1e-12);
}
