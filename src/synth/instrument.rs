// Instrument catalog - fixed drum kit and its synthesis recipes
//
// Every recipe is a small chain (generator -> optional filter -> exponential
// gain decay) scheduled on a `SoundSink` at an absolute time.

use super::envelope::ExponentialRamp;
use super::filter::FilterParams;
use super::noise::NoiseGenerator;
use super::oscillator::{SweepOscillator, WaveformType};
use super::voice::{Generator, Voice};
use crate::audio::sink::SoundSink;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Gain every decay ends on
const DECAY_FLOOR: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Instrument {
    Kick,
    Snare,
    HiHat,
    Tom,
    Clap,
    Rim,
}

impl Instrument {
    /// Grid row order
    pub const ALL: [Instrument; 6] = [
        Instrument::Kick,
        Instrument::Snare,
        Instrument::HiHat,
        Instrument::Tom,
        Instrument::Clap,
        Instrument::Rim,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Instrument::Kick => "KICK",
            Instrument::Snare => "SNARE",
            Instrument::HiHat => "HI-HAT",
            Instrument::Tom => "TOM",
            Instrument::Clap => "CLAP",
            Instrument::Rim => "RIM",
        }
    }

    /// Whether the recipe contains random noise (output differs per render)
    pub fn uses_noise(self) -> bool {
        matches!(self, Instrument::Snare | Instrument::HiHat | Instrument::Clap)
    }

    /// Longest voice of the recipe, in seconds
    pub fn tail_seconds(self) -> f64 {
        match self {
            Instrument::Kick => 0.5,
            Instrument::Snare => 0.2,
            Instrument::HiHat => 0.05,
            Instrument::Tom => 0.3,
            Instrument::Clap => 0.15,
            Instrument::Rim => 0.05,
        }
    }

    /// Synthesize this instrument at `time` (seconds, on the sink's clock)
    pub fn render(self, time: f64, sink: &mut dyn SoundSink) {
        let sr = sink.sample_rate();

        match self {
            Instrument::Kick => {
                sink.schedule(tone(time, WaveformType::Sine, (150.0, 0.01), 1.0, 0.5, sr));
            }
            Instrument::Snare => {
                sink.schedule(
                    noise(time, 1.0, 0.2, sr).with_filter(FilterParams::high_pass(1000.0), sr),
                );
                sink.schedule(tone(time, WaveformType::Triangle, (100.0, 100.0), 0.7, 0.1, sr));
            }
            Instrument::HiHat => {
                sink.schedule(
                    noise(time, 0.3, 0.05, sr).with_filter(FilterParams::high_pass(7000.0), sr),
                );
            }
            Instrument::Tom => {
                sink.schedule(tone(time, WaveformType::Sine, (200.0, 80.0), 0.8, 0.3, sr));
            }
            Instrument::Clap => {
                sink.schedule(
                    noise(time, 0.8, 0.15, sr).with_filter(FilterParams::band_pass(1500.0), sr),
                );
            }
            Instrument::Rim => {
                sink.schedule(tone(time, WaveformType::Triangle, (800.0, 800.0), 0.5, 0.05, sr));
            }
        }
    }
}

fn tone(
    time: f64,
    waveform: WaveformType,
    (freq_start, freq_end): (f64, f64),
    gain: f64,
    duration: f64,
    sample_rate: f32,
) -> Voice {
    let frequency = ExponentialRamp::new(freq_start, freq_end, duration, sample_rate);
    Voice::new(
        time,
        Generator::Tone(SweepOscillator::new(waveform, frequency, sample_rate)),
        ExponentialRamp::new(gain, DECAY_FLOOR, duration, sample_rate),
        duration,
        sample_rate,
    )
}

fn noise(time: f64, gain: f64, duration: f64, sample_rate: f32) -> Voice {
    Voice::new(
        time,
        Generator::Noise(NoiseGenerator::new()),
        ExponentialRamp::new(gain, DECAY_FLOOR, duration, sample_rate),
        duration,
        sample_rate,
    )
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Instrument {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase().replace(['_', ' '], "-");
        Self::ALL
            .into_iter()
            .find(|instrument| {
                instrument.name() == wanted || instrument.name().replace('-', "") == wanted
            })
            .ok_or_else(|| format!("Unknown instrument '{}'", s))
    }
}
