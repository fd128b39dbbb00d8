// Sequencer controller - single owner of pattern state, transport, export
// and persistence. Front-ends (CLI, tests) only talk to this type.

use crate::audio::sink::SoundSink;
use crate::audio::timing::AudioClock;
use crate::config::SequencerConfig;
use crate::export::{ExportArtifact, ExportError, ExportRequest, Exporter};
use crate::messaging::channels::{SharedNotificationProducer, try_notify};
use crate::messaging::notification::{Notification, NotificationCategory};
use crate::persistence::pattern::{load_pattern, save_pattern};
use crate::persistence::store::KeyValueStore;
use crate::persistence::theme::{Theme, load_theme, save_theme};
use crate::sequencer::grid::StepCount;
use crate::sequencer::state::{SequencerState, SharedSequencerState, lock_recovering};
use crate::sequencer::timeline::{SequencerError, Tempo};
use crate::sequencer::transport::{Transport, TransportError};
use crate::synth::instrument::Instrument;
use std::path::PathBuf;
use std::sync::{Arc, MutexGuard};

pub const EXPORT_FAILED_MESSAGE: &str = "Export failed, please try again";

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error(transparent)]
    Sequencer(#[from] SequencerError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

pub struct SequencerController {
    config: SequencerConfig,
    state: SharedSequencerState,
    transport: Transport,
    exporter: Exporter,
    store: Box<dyn KeyValueStore>,
    theme: Theme,
    notifications: SharedNotificationProducer,
}

impl SequencerController {
    /// Build the controller around a loaded (or default) pattern.
    ///
    /// `sample_rate` is the live output rate; exports render at it.
    pub fn new(
        config: SequencerConfig,
        store: Box<dyn KeyValueStore>,
        clock: Arc<dyn AudioClock>,
        sink: Box<dyn SoundSink + Send>,
        sample_rate: u32,
        notifications: SharedNotificationProducer,
    ) -> Self {
        let mut state = load_pattern(store.as_ref());
        let bpm = state.tempo().bpm();
        let clamped = bpm.clamp(config.min_tempo, config.max_tempo);
        if clamped != bpm {
            log::warn!("Stored tempo {} outside slider range, using {}", bpm, clamped);
            if let Ok(tempo) = Tempo::new(clamped) {
                state.set_tempo(tempo);
            }
        }
        let theme = load_theme(store.as_ref());

        let state = state.into_shared();
        let transport = Transport::new(Arc::clone(&state), clock, sink, &config);
        let exporter = Exporter::new(sample_rate, &config);

        Self {
            config,
            state,
            transport,
            exporter,
            store,
            theme,
            notifications,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SequencerState> {
        lock_recovering(&self.state, "Sequencer state")
    }

    /// Copy of the current pattern
    pub fn snapshot(&self) -> SequencerState {
        self.lock_state().clone()
    }

    pub fn toggle_cell(&mut self, instrument: Instrument, step: usize) -> Result<bool, ControllerError> {
        let active = self.lock_state().toggle(instrument, step)?;
        log::debug!("{} step {} -> {}", instrument, step, active);
        self.persist_pattern();
        Ok(active)
    }

    /// Set the tempo; takes effect at the next scheduled step
    pub fn set_tempo(&mut self, bpm: u32) -> Result<Tempo, ControllerError> {
        let (min, max) = (self.config.min_tempo, self.config.max_tempo);
        if !(min..=max).contains(&bpm) {
            return Err(SequencerError::TempoOutOfRange { bpm, min, max }.into());
        }
        let tempo = Tempo::new(bpm)?;
        self.lock_state().set_tempo(tempo);
        self.persist_pattern();
        Ok(tempo)
    }

    /// Rebuild the grid at a new length (cells cleared).
    /// Playback is stopped around the rebuild and resumed if it was running.
    pub fn set_step_count(&mut self, step_count: StepCount) -> Result<(), ControllerError> {
        let was_playing = self.transport.is_playing();
        self.transport.stop();

        self.lock_state().resize(step_count);
        log::info!("Grid resized to {} steps", step_count);
        self.persist_pattern();

        if was_playing {
            self.transport.start()?;
        }
        Ok(())
    }

    pub fn play(&mut self) -> Result<(), ControllerError> {
        self.transport.start().map_err(|e| {
            self.notify(Notification::error(
                NotificationCategory::Playback,
                format!("Playback failed: {}", e),
            ));
            e.into()
        })
    }

    pub fn stop(&mut self) {
        self.transport.stop();
    }

    pub fn is_playing(&self) -> bool {
        self.transport.is_playing()
    }

    /// Display playhead
    pub fn current_step(&self) -> usize {
        self.transport.current_step()
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn exporter(&self) -> &Exporter {
        &self.exporter
    }

    /// Render the current pattern. Failures are also reported to the user
    /// as a retry-able notification.
    pub fn export(&self, request: ExportRequest) -> Result<ExportArtifact, ExportError> {
        let snapshot = self.snapshot();
        self.exporter
            .export(&snapshot, request)
            .inspect_err(|e| self.report_export_failure(e))
    }

    /// Export and write the file into the configured export directory
    pub fn export_to_dir(&self, request: ExportRequest) -> Result<PathBuf, ExportError> {
        let artifact = self.export(request)?;
        artifact
            .write_to(&self.config.export_dir())
            .inspect_err(|e| self.report_export_failure(e))
    }

    fn report_export_failure(&self, error: &ExportError) {
        log::error!("Export failed: {}", error);
        if !matches!(error, ExportError::AlreadyInProgress) {
            self.notify(Notification::error(
                NotificationCategory::Export,
                EXPORT_FAILED_MESSAGE.to_string(),
            ));
        }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        if let Err(e) = save_theme(self.store.as_mut(), theme) {
            log::warn!("Failed to save theme: {}", e);
            self.notify(Notification::warning(
                NotificationCategory::Storage,
                "Theme could not be saved".to_string(),
            ));
        }
    }

    pub fn toggle_theme(&mut self) -> Theme {
        let theme = self.theme.toggled();
        self.set_theme(theme);
        theme
    }

    fn persist_pattern(&mut self) {
        let snapshot = self.snapshot();
        if let Err(e) = save_pattern(self.store.as_mut(), &snapshot) {
            log::warn!("Failed to save pattern: {}", e);
            self.notify(Notification::warning(
                NotificationCategory::Storage,
                "Pattern could not be saved".to_string(),
            ));
        }
    }

    fn notify(&self, notification: Notification) {
        if !try_notify(&self.notifications, notification) {
            log::debug!("Notification queue full");
        }
    }
}
