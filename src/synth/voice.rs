// Voice - one scheduled sound: generator -> optional filter -> gain envelope
//
// A voice carries its own absolute start time so the same value can be
// handed to any sound sink (realtime or offline).

use super::envelope::ExponentialRamp;
use super::filter::{FilterParams, StateVariableFilter};
use super::noise::NoiseGenerator;
use super::oscillator::{Oscillator, SweepOscillator};

/// Sound source of a voice
#[derive(Debug, Clone)]
pub enum Generator {
    Tone(SweepOscillator),
    Noise(NoiseGenerator),
}

impl Generator {
    #[inline]
    fn next_sample(&mut self) -> f32 {
        match self {
            Generator::Tone(osc) => osc.next_sample(),
            Generator::Noise(noise) => noise.next_sample(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Voice {
    start_time: f64,
    generator: Generator,
    filter: Option<StateVariableFilter>,
    gain: ExponentialRamp,
    remaining_samples: u64,
}

impl Voice {
    /// # Arguments
    /// * `start_time` - Absolute audio-clock time in seconds
    /// * `duration_secs` - The voice stops after this long
    pub fn new(
        start_time: f64,
        generator: Generator,
        gain: ExponentialRamp,
        duration_secs: f64,
        sample_rate: f32,
    ) -> Self {
        Self {
            start_time,
            generator,
            filter: None,
            gain,
            remaining_samples: (duration_secs.max(0.0) * sample_rate as f64).round() as u64,
        }
    }

    pub fn with_filter(mut self, params: FilterParams, sample_rate: f32) -> Self {
        self.filter = Some(StateVariableFilter::new(params, sample_rate));
        self
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    /// First sample frame this voice sounds on at the given rate
    pub fn start_sample(&self, sample_rate: f32) -> u64 {
        (self.start_time.max(0.0) * sample_rate as f64).round() as u64
    }

    pub fn remaining_samples(&self) -> u64 {
        self.remaining_samples
    }

    pub fn is_finished(&self) -> bool {
        self.remaining_samples == 0
    }

    /// Next mono sample; silence once the voice has finished
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        if self.remaining_samples == 0 {
            return 0.0;
        }
        self.remaining_samples -= 1;

        let mut sample = self.generator.next_sample();
        if let Some(filter) = self.filter.as_mut() {
            sample = filter.process(sample);
        }
        sample * self.gain.next_value() as f32
    }
}
