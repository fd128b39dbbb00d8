// Sequencer module
// Step grid, tempo, look-ahead scheduling and transport

pub mod grid;
pub mod scheduler;
pub mod state;
pub mod task;
pub mod timeline;
pub mod transport;

pub use grid::{Grid, StepCount};
pub use scheduler::{LookAheadScheduler, NoteEvent};
pub use state::{SequencerState, SharedSequencerState};
pub use timeline::{SequencerError, Tempo};
pub use transport::{Transport, TransportError};
