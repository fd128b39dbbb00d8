// Synth module - procedural drum synthesis (the instrument renderer)

pub mod envelope;
pub mod filter;
pub mod instrument;
pub mod noise;
pub mod oscillator;
pub mod voice;

pub use instrument::Instrument;
pub use voice::Voice;
