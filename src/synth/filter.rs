// Filter - State Variable Filter (Chamberlin)
//
// Digital implementation of a 2-pole State Variable Filter with simultaneous
// low-pass, high-pass and band-pass outputs.
//
// References:
// - Hal Chamberlin's "Musical Applications of Microprocessors" (1985)
// - https://www.earlevel.com/main/2003/03/02/the-digital-state-variable-filter/
//
// Drum voices use fixed cutoffs, so coefficients are computed once.
// Stability: with cutoff <= Fs/6 (f <= 1) and Q >= 0.707 (q <= 1.414) the
// update matrix satisfies f^2 + 2fq < 4.

use crate::audio::dsp_utils::flush_denormals_to_zero;
use std::f32::consts::PI;

/// Filter type/mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterType {
    /// Low-pass filter (12dB/octave)
    #[default]
    LowPass,
    /// High-pass filter (12dB/octave)
    HighPass,
    /// Band-pass filter (6dB/octave on each side)
    BandPass,
}

/// Filter parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterParams {
    /// Cutoff (or center) frequency in Hz
    pub cutoff: f32,
    /// Q factor (clamped to 0.707 - 20.0)
    pub resonance: f32,
    pub filter_type: FilterType,
}

impl FilterParams {
    pub fn high_pass(cutoff: f32) -> Self {
        Self {
            cutoff,
            filter_type: FilterType::HighPass,
            ..Default::default()
        }
    }

    pub fn band_pass(cutoff: f32) -> Self {
        Self {
            cutoff,
            filter_type: FilterType::BandPass,
            ..Default::default()
        }
    }
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            cutoff: 1000.0,
            resonance: 0.707, // Butterworth response
            filter_type: FilterType::LowPass,
        }
    }
}

/// State Variable Filter (Chamberlin) implementation
#[derive(Debug, Clone)]
pub struct StateVariableFilter {
    filter_type: FilterType,

    // State variables
    low: f32,
    band: f32,

    // Coefficients
    f: f32, // Frequency coefficient
    q: f32, // Damping (1/Q)
}

impl StateVariableFilter {
    pub fn new(params: FilterParams, sample_rate: f32) -> Self {
        // Clamp cutoff to safe range: 20Hz to Fs/6 (stability limit)
        let max_cutoff = sample_rate / 6.0;
        let safe_cutoff = params.cutoff.clamp(20.0, max_cutoff.max(20.0));

        Self {
            filter_type: params.filter_type,
            low: 0.0,
            band: 0.0,
            f: 2.0 * (PI * safe_cutoff / sample_rate).sin(),
            q: 1.0 / params.resonance.clamp(0.707, 20.0),
        }
    }

    pub fn reset(&mut self) {
        self.low = 0.0;
        self.band = 0.0;
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let high = input - self.low - self.q * self.band;
        self.band = flush_denormals_to_zero(self.band + self.f * high);
        self.low = flush_denormals_to_zero(self.low + self.f * self.band);

        match self.filter_type {
            FilterType::LowPass => self.low,
            FilterType::HighPass => high,
            FilterType::BandPass => self.band,
        }
    }
}
