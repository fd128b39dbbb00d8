// Look-ahead scheduler - step grid + tempo -> precisely timed note events
//
// A coarse timer calls `tick` every few tens of milliseconds. Each tick
// schedules every step whose time falls before `now + schedule_ahead` and
// tags its notes with the cursor time rather than the time the tick ran, so
// timer jitter never reaches the audible result.

use super::state::SequencerState;
use crate::audio::sink::SoundSink;
use crate::config::SequencerConfig;
use crate::synth::instrument::Instrument;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// One "render instrument at time T" decision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteEvent {
    pub instrument: Instrument,
    pub step: usize,
    /// Absolute audio-clock time in seconds
    pub time: f64,
}

/// Per-session playback position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerCursor {
    /// Audio-clock time of the next unscheduled step
    pub next_note_time: f64,
    /// Step the next tick will emit (0..step_count)
    pub current_step: usize,
}

#[derive(Debug)]
pub struct LookAheadScheduler {
    schedule_ahead_secs: f64,
    start_delay_secs: f64,
    cursor: Option<SchedulerCursor>,
    /// Step being handed to the sink (display playhead), shared with readers
    playhead: Arc<AtomicUsize>,
}

impl LookAheadScheduler {
    pub fn new(schedule_ahead_secs: f64, start_delay_secs: f64) -> Self {
        Self {
            schedule_ahead_secs,
            start_delay_secs,
            cursor: None,
            playhead: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn from_config(config: &SequencerConfig) -> Self {
        Self::new(config.schedule_ahead_secs, config.start_delay_secs)
    }

    pub fn schedule_ahead_secs(&self) -> f64 {
        self.schedule_ahead_secs
    }

    /// Reset the cursor to step 0, a short lead after `now`
    pub fn start(&mut self, now: f64) {
        self.cursor = Some(SchedulerCursor {
            next_note_time: now + self.start_delay_secs,
            current_step: 0,
        });
        self.playhead.store(0, Ordering::Relaxed);
    }

    /// Drop the cursor; already scheduled notes are left to play out
    pub fn stop(&mut self) {
        self.cursor = None;
        self.playhead.store(0, Ordering::Relaxed);
    }

    pub fn cursor(&self) -> Option<SchedulerCursor> {
        self.cursor
    }

    pub fn playhead(&self) -> usize {
        self.playhead.load(Ordering::Relaxed)
    }

    /// Atomic the playhead is published to, updated before each step's notes
    pub fn playhead_handle(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.playhead)
    }

    /// Schedule every step due before `now + schedule_ahead`.
    ///
    /// A late tick catches up step by step: nothing is skipped. Notes whose
    /// cursor time already passed are sent at `now` while the cursor keeps
    /// its own grid, so later steps stay drift-free.
    pub fn tick(
        &mut self,
        now: f64,
        state: &SequencerState,
        sink: &mut dyn SoundSink,
    ) -> Vec<NoteEvent> {
        let mut events = Vec::new();
        let Some(cursor) = self.cursor.as_mut() else {
            return events;
        };

        let horizon = now + self.schedule_ahead_secs;
        let step_count = state.step_count().len();

        while cursor.next_note_time < horizon {
            // The grid may have shrunk since the last advance
            let step = if cursor.current_step < step_count {
                cursor.current_step
            } else {
                0
            };
            let time = cursor.next_note_time.max(now);
            self.playhead.store(step, Ordering::Relaxed);

            for instrument in state.grid().active_at(step) {
                instrument.render(time, sink);
                events.push(NoteEvent {
                    instrument,
                    step,
                    time,
                });
            }

            // Tempo is re-read on every advance
            cursor.next_note_time += state.tempo().seconds_per_step();
            cursor.current_step = (step + 1) % step_count;
        }

        events
    }
}
