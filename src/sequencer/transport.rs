// Transport - Playback control and playhead
// Drives the look-ahead scheduler from a recurring timer against an audio clock

use super::scheduler::{LookAheadScheduler, NoteEvent};
use super::state::{SharedSequencerState, lock_recovering};
use super::task::RecurringTask;
use crate::audio::sink::SoundSink;
use crate::audio::timing::AudioClock;
use crate::config::SequencerConfig;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to start scheduler timer: {0}")]
    Timer(#[from] std::io::Error),
}

/// Scheduler + the sink it feeds, locked together by each tick
struct PlaybackCore {
    scheduler: LookAheadScheduler,
    sink: Box<dyn SoundSink + Send>,
}

/// Playhead and counters readable from any thread
#[derive(Debug)]
pub struct TransportStatus {
    /// Written by the scheduler as each step is emitted
    playhead: Arc<AtomicUsize>,
    events_scheduled: AtomicU64,
}

impl TransportStatus {
    pub fn current_step(&self) -> usize {
        self.playhead.load(Ordering::Relaxed)
    }

    /// Note events handed to the sink since the transport was created
    pub fn events_scheduled(&self) -> u64 {
        self.events_scheduled.load(Ordering::Relaxed)
    }
}

pub struct Transport {
    state: SharedSequencerState,
    clock: Arc<dyn AudioClock>,
    core: Arc<Mutex<PlaybackCore>>,
    status: Arc<TransportStatus>,
    task: Option<RecurringTask>,
    interval: Duration,
}

impl Transport {
    pub fn new(
        state: SharedSequencerState,
        clock: Arc<dyn AudioClock>,
        sink: Box<dyn SoundSink + Send>,
        config: &SequencerConfig,
    ) -> Self {
        let scheduler = LookAheadScheduler::from_config(config);
        let status = TransportStatus {
            playhead: scheduler.playhead_handle(),
            events_scheduled: AtomicU64::new(0),
        };
        Self {
            state,
            clock,
            core: Arc::new(Mutex::new(PlaybackCore { scheduler, sink })),
            status: Arc::new(status),
            task: None,
            interval: config.look_ahead_interval(),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.task.is_some()
    }

    /// Step most recently handed to the sink (0 while stopped)
    pub fn current_step(&self) -> usize {
        self.status.current_step()
    }

    pub fn status(&self) -> Arc<TransportStatus> {
        Arc::clone(&self.status)
    }

    /// Start playback from step 0. No-op when already playing.
    pub fn start(&mut self) -> Result<(), TransportError> {
        if self.task.is_some() {
            return Ok(());
        }

        let now = self.clock.current_time();
        lock_recovering(&self.core, "Playback core").scheduler.start(now);

        let core = Arc::clone(&self.core);
        let state = Arc::clone(&self.state);
        let clock = Arc::clone(&self.clock);
        let status = Arc::clone(&self.status);

        let task = RecurringTask::spawn("sequencer-scheduler", self.interval, move || {
            let events = run_tick(&core, &state, clock.as_ref());
            if !events.is_empty() {
                status
                    .events_scheduled
                    .fetch_add(events.len() as u64, Ordering::Relaxed);
                log::trace!("Scheduled {} notes", events.len());
            }
        });

        match task {
            Ok(task) => {
                self.task = Some(task);
                log::info!("Playback started at t={:.3}s", now);
                Ok(())
            }
            Err(e) => {
                lock_recovering(&self.core, "Playback core").scheduler.stop();
                Err(TransportError::Timer(e))
            }
        }
    }

    /// Stop playback: no note is scheduled after this returns.
    /// Notes already handed to the sink play out.
    pub fn stop(&mut self) {
        let Some(mut task) = self.task.take() else {
            return;
        };
        // Joins the timer thread; no lock may be held here
        task.cancel();

        lock_recovering(&self.core, "Playback core").scheduler.stop();
        log::info!("Playback stopped");
    }

    /// Run one scheduler pass on the caller's thread
    #[cfg(test)]
    fn tick_now(&self) -> Vec<NoteEvent> {
        let events = run_tick(&self.core, &self.state, self.clock.as_ref());
        self.status
            .events_scheduled
            .fetch_add(events.len() as u64, Ordering::Relaxed);
        events
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.stop();
    }
}

/// One look-ahead pass. Lock order: core, then state.
fn run_tick(
    core: &Mutex<PlaybackCore>,
    state: &SharedSequencerState,
    clock: &dyn AudioClock,
) -> Vec<NoteEvent> {
    let now = clock.current_time();
    let mut core = lock_recovering(core, "Playback core");
    let state = lock_recovering(state, "Sequencer state");
    let PlaybackCore { scheduler, sink } = &mut *core;
    scheduler.tick(now, &state, sink.as_mut())
}
