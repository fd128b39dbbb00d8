// Envelope - exponential parameter ramps
//
// Drum voices are shaped by a single exponential move from a start value to
// an end value over a fixed duration:
//
//   v(t) = v0 * (v1 / v0) ^ (t / d)      for 0 <= t < d
//   v(t) = v1                            for t >= d
//
// The ramp is evaluated incrementally with one multiply per sample.

/// Exponential ramp between two strictly positive values
#[derive(Debug, Clone)]
pub struct ExponentialRamp {
    value: f64,
    end_value: f64,
    ratio: f64,
    remaining: u64,
}

impl ExponentialRamp {
    /// Smallest value a ramp may reach; exponential curves cannot cross zero
    pub const MIN_VALUE: f64 = 1e-4;

    /// # Arguments
    /// * `start` - Value at t = 0
    /// * `end` - Value reached at t = `duration_secs`
    /// * `duration_secs` - Length of the ramp in seconds
    /// * `sample_rate` - Audio sample rate in Hz
    pub fn new(start: f64, end: f64, duration_secs: f64, sample_rate: f32) -> Self {
        let start = start.max(Self::MIN_VALUE);
        let end = end.max(Self::MIN_VALUE);
        let samples = (duration_secs.max(0.0) * sample_rate as f64).round() as u64;

        let ratio = if samples > 0 {
            (end / start).powf(1.0 / samples as f64)
        } else {
            1.0
        };

        Self {
            value: if samples > 0 { start } else { end },
            end_value: end,
            ratio,
            remaining: samples,
        }
    }

    /// Constant value (no movement)
    pub fn constant(value: f64) -> Self {
        let value = value.max(Self::MIN_VALUE);
        Self {
            value,
            end_value: value,
            ratio: 1.0,
            remaining: 0,
        }
    }

    /// Return the current value and advance by one sample
    #[inline]
    pub fn next_value(&mut self) -> f64 {
        let current = self.value;
        if self.remaining > 0 {
            self.remaining -= 1;
            self.value = if self.remaining == 0 {
                self.end_value
            } else {
                self.value * self.ratio
            };
        }
        current
    }

    pub fn is_finished(&self) -> bool {
        self.remaining == 0
    }
}
