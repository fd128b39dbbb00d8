// Module audio - backend CPAL, mixage des voix, rendu offline et encodage WAV

pub mod buffer;
pub mod dsp_utils;
pub mod engine;
pub mod format_conversion;
pub mod mixer;
pub mod offline;
pub mod parameters;
pub mod sink;
pub mod timing;
pub mod wav;

pub use buffer::AudioBuffer;
pub use mixer::VoiceMixer;
pub use offline::{OfflineRenderer, RenderError};
pub use sink::SoundSink;
pub use timing::{AudioClock, AudioTiming, ManualClock};
pub use wav::{WavError, encode_wav};
