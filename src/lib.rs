// Beat Sequencer - Library exports for the binary, tests and benchmarks

pub mod audio;
pub mod config;
pub mod controller;
pub mod export;
pub mod messaging;
pub mod persistence;
pub mod sequencer;
pub mod synth;

// Re-export commonly used types for convenience
pub use audio::engine::{AudioEngine, RealtimeSink};
pub use audio::offline::OfflineRenderer;
pub use audio::timing::{AudioClock, AudioTiming, ManualClock};
pub use audio::wav::encode_wav;
pub use config::SequencerConfig;
pub use controller::{ControllerError, SequencerController};
pub use export::{ExportArtifact, ExportError, ExportFormat, ExportRequest, Exporter};
pub use messaging::channels::create_notification_channel;
pub use persistence::{FileStore, KeyValueStore, MemoryStore, Theme};
pub use sequencer::{Grid, LookAheadScheduler, NoteEvent, SequencerState, StepCount, Tempo, Transport};
pub use synth::instrument::Instrument;
