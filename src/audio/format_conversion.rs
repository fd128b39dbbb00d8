// Format conversion for CPAL audio streams and 16-bit PCM export
//
// Internal processing is f32. Conversions here are allocation-free and safe
// to call from the realtime callback.

use cpal::{FromSample, Sample};

/// Convert f32 sample to i16
///
/// Clamps to [-1.0, 1.0], then scales negative values by 32768 and
/// non-negative values by 32767, truncating toward zero.
#[inline]
pub fn f32_to_i16(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);

    if clamped >= 0.0 {
        (clamped * i16::MAX as f32) as i16
    } else {
        (clamped * -(i16::MIN as f32)) as i16
    }
}

/// Convert i16 sample to f32 (inverse of [`f32_to_i16`] up to quantization)
#[inline]
pub fn i16_to_f32(sample: i16) -> f32 {
    if sample >= 0 {
        sample as f32 / i16::MAX as f32
    } else {
        sample as f32 / -(i16::MIN as f32)
    }
}

/// Write a stereo f32 sample into one interleaved output frame
///
/// Extra channels get silence; a mono device gets the L/R average.
#[inline]
pub fn write_stereo_to_interleaved_frame<T>(
    (left_sample, right_sample): (f32, f32),
    output_frame: &mut [T],
) where
    T: Sample + FromSample<f32>,
{
    if output_frame.len() >= 2 {
        output_frame[0] = Sample::from_sample::<f32>(left_sample);
        output_frame[1] = Sample::from_sample::<f32>(right_sample);
        for channel_sample in output_frame.iter_mut().skip(2) {
            *channel_sample = Sample::from_sample::<f32>(0.0);
        }
    } else if let Some(channel_sample) = output_frame.first_mut() {
        let mono_sample = (left_sample + right_sample) * 0.5;
        *channel_sample = Sample::from_sample::<f32>(mono_sample);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f32_to_i16_conversion() {
        assert_eq!(f32_to_i16(0.0), 0);
        assert_eq!(f32_to_i16(1.0), i16::MAX);
        assert_eq!(f32_to_i16(-1.0), i16::MIN);
        assert_eq!(f32_to_i16(0.5), 16383);
        assert_eq!(f32_to_i16(-0.5), -16384);
    }

    #[test]
    fn test_clamping() {
        assert_eq!(f32_to_i16(2.0), i16::MAX);
        assert_eq!(f32_to_i16(-2.0), i16::MIN);
    }

    #[test]
    fn test_roundtrip_i16() {
        let test_values = [-1.0f32, -0.5, -0.1, 0.0, 0.1, 0.5, 0.9, 1.0];

        for &original in &test_values {
            let back = i16_to_f32(f32_to_i16(original));
            assert!(
                (back - original).abs() < 0.001,
                "Roundtrip failed for {}: got {}",
                original,
                back
            );
        }
    }

    #[test]
    fn test_write_stereo_to_interleaved() {
        let mut output: [f32; 4] = [9.0; 4];
        write_stereo_to_interleaved_frame((0.25, -0.25), &mut output);
        assert_eq!(output, [0.25, -0.25, 0.0, 0.0]);

        let mut mono: [f32; 1] = [0.0];
        write_stereo_to_interleaved_frame((0.5, 0.0), &mut mono);
        assert_eq!(mono[0], 0.25);

        let mut output_i16: [i16; 2] = [0; 2];
        write_stereo_to_interleaved_frame((0.5, 0.5), &mut output_i16);
        assert!(output_i16[0] > 0);
        assert_eq!(output_i16[0], output_i16[1]);
    }
}
