// Sound sink - destination for scheduled voices
//
// Instruments only know this trait, so the very same recipe code feeds the
// live audio thread and the offline renderer.

use crate::synth::voice::Voice;

pub trait SoundSink {
    /// Sample rate voices must be built for
    fn sample_rate(&self) -> f32;

    /// Queue a voice to start at its own absolute start time.
    /// Fire-and-forget: scheduling never blocks.
    fn schedule(&mut self, voice: Voice);
}
