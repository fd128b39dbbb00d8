// Oscillateurs - Générateurs de formes d'onde

use super::envelope::ExponentialRamp;
use std::f64::consts::PI;

pub trait Oscillator {
    fn next_sample(&mut self) -> f32;
    fn reset(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaveformType {
    Sine,
    Square,
    Triangle,
}

/// Periodic oscillator whose frequency follows an exponential ramp
///
/// A constant ramp gives a fixed pitch; a falling ramp gives the pitch sweep
/// of kick and tom voices.
#[derive(Debug, Clone)]
pub struct SweepOscillator {
    waveform: WaveformType,
    phase: f64,
    frequency: ExponentialRamp,
    sample_rate: f64,
}

impl SweepOscillator {
    pub fn new(waveform: WaveformType, frequency: ExponentialRamp, sample_rate: f32) -> Self {
        Self {
            waveform,
            phase: 0.0,
            frequency,
            sample_rate: sample_rate as f64,
        }
    }

    pub fn fixed(waveform: WaveformType, frequency: f64, sample_rate: f32) -> Self {
        Self::new(waveform, ExponentialRamp::constant(frequency), sample_rate)
    }
}

impl Oscillator for SweepOscillator {
    fn next_sample(&mut self) -> f32 {
        let sample = match self.waveform {
            WaveformType::Sine => (self.phase * 2.0 * PI).sin(),
            WaveformType::Square => {
                if self.phase < 0.5 { 1.0 } else { -1.0 }
            }
            WaveformType::Triangle => {
                // Starts at 0 and rises, like a sine
                if self.phase < 0.25 {
                    self.phase * 4.0
                } else if self.phase < 0.75 {
                    2.0 - self.phase * 4.0
                } else {
                    self.phase * 4.0 - 4.0
                }
            }
        };

        self.phase += self.frequency.next_value() / self.sample_rate;
        self.phase -= self.phase.floor();

        sample as f32
    }

    fn reset(&mut self) {
        self.phase = 0.0;
    }
}
