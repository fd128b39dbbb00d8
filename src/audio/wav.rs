// WAV encoding - canonical 16-bit PCM RIFF/WAVE byte stream
//
// Layout (little-endian, 44-byte header):
//
//   0  "RIFF"   4  36 + data_len   8  "WAVE"
//   12 "fmt "   16 16              20 1 (PCM)       22 channels
//   24 rate     28 rate*ch*2       32 ch*2          34 16
//   36 "data"   40 data_len        44 interleaved i16 samples
//
// hound writes exactly this header for integer PCM with at most two
// channels and 16 bits per sample; wider layouts would switch it to
// WAVE_FORMAT_EXTENSIBLE, so they are rejected up front.

use super::buffer::AudioBuffer;
use super::format_conversion::f32_to_i16;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;

pub const WAV_HEADER_LEN: usize = 44;
pub const BITS_PER_SAMPLE: u16 = 16;
pub const MIME_TYPE: &str = "audio/wav";

#[derive(Debug, thiserror::Error)]
pub enum WavError {
    #[error("Unsupported channel count {0} (expected 1 or 2)")]
    UnsupportedChannelCount(usize),

    #[error("Invalid sample rate {0}")]
    InvalidSampleRate(u32),

    #[error("Audio data of {0} bytes does not fit in a WAV file")]
    TooLarge(u64),

    #[error("WAV writer error: {0}")]
    Hound(#[from] hound::Error),
}

/// Size of the encoded file for a buffer shape
pub fn encoded_len(frames: usize, channels: usize) -> u64 {
    WAV_HEADER_LEN as u64 + data_len(frames, channels)
}

fn data_len(frames: usize, channels: usize) -> u64 {
    frames as u64 * channels as u64 * (BITS_PER_SAMPLE as u64 / 8)
}

/// Encode a float buffer as 16-bit PCM WAV bytes
pub fn encode_wav(buffer: &AudioBuffer) -> Result<Vec<u8>, WavError> {
    let channels = buffer.channel_count();
    if !(1..=2).contains(&channels) {
        return Err(WavError::UnsupportedChannelCount(channels));
    }
    if buffer.sample_rate() == 0 {
        return Err(WavError::InvalidSampleRate(buffer.sample_rate()));
    }

    let data_bytes = data_len(buffer.frames(), channels);
    if data_bytes > (u32::MAX as u64 - 36) {
        return Err(WavError::TooLarge(data_bytes));
    }

    let spec = WavSpec {
        channels: channels as u16,
        sample_rate: buffer.sample_rate(),
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    };

    let mut bytes = Vec::with_capacity(encoded_len(buffer.frames(), channels) as usize);
    {
        let mut writer = WavWriter::new(Cursor::new(&mut bytes), spec)?;
        for sample in buffer.interleaved() {
            writer.write_sample(f32_to_i16(sample))?;
        }
        writer.finalize()?;
    }

    log::debug!(
        "Encoded {:.3}s ({} frames x {} channels) at {} Hz ({} bytes)",
        buffer.duration_seconds(),
        buffer.frames(),
        channels,
        buffer.sample_rate(),
        bytes.len()
    );

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u32_at(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    fn u16_at(bytes: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes(bytes[offset..offset + 2].try_into().unwrap())
    }

    #[test]
    fn test_header_layout() {
        let buffer = AudioBuffer::new(2, 10, 44100);
        let bytes = encode_wav(&buffer).unwrap();

        assert_eq!(bytes.len(), 44 + 10 * 2 * 2);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(u32_at(&bytes, 4), 36 + 40);
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        assert_eq!(u32_at(&bytes, 16), 16);
        assert_eq!(u16_at(&bytes, 20), 1);
        assert_eq!(u16_at(&bytes, 22), 2);
        assert_eq!(u32_at(&bytes, 24), 44100);
        assert_eq!(u32_at(&bytes, 28), 44100 * 2 * 2);
        assert_eq!(u16_at(&bytes, 32), 4);
        assert_eq!(u16_at(&bytes, 34), 16);
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(u32_at(&bytes, 40), 40);
    }

    #[test]
    fn test_mono_header() {
        let buffer = AudioBuffer::new(1, 3, 8000);
        let bytes = encode_wav(&buffer).unwrap();
        assert_eq!(bytes.len(), 44 + 6);
        assert_eq!(u16_at(&bytes, 22), 1);
        assert_eq!(u32_at(&bytes, 28), 16000);
        assert_eq!(u16_at(&bytes, 32), 2);
    }

    #[test]
    fn test_sample_mapping_and_interleaving() {
        let buffer = AudioBuffer::from_channels(
            vec![vec![1.0, -1.0, 0.5], vec![-0.5, 2.0, -3.0]],
            8000,
        )
        .unwrap();
        let bytes = encode_wav(&buffer).unwrap();

        let samples: Vec<i16> = bytes[44..]
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        assert_eq!(samples, vec![32767, -16384, -32768, 32767, 16383, -32768]);
    }

    #[test]
    fn test_empty_buffer() {
        let buffer = AudioBuffer::new(2, 0, 44100);
        let bytes = encode_wav(&buffer).unwrap();
        assert_eq!(bytes.len(), 44);
        assert_eq!(u32_at(&bytes, 4), 36);
        assert_eq!(u32_at(&bytes, 40), 0);
    }

    #[test]
    fn test_rejects_unsupported_shapes() {
        assert!(matches!(
            encode_wav(&AudioBuffer::new(3, 4, 44100)),
            Err(WavError::UnsupportedChannelCount(3))
        ));
        assert!(matches!(
            encode_wav(&AudioBuffer::new(0, 4, 44100)),
            Err(WavError::UnsupportedChannelCount(0))
        ));
        assert!(matches!(
            encode_wav(&AudioBuffer::new(2, 4, 0)),
            Err(WavError::InvalidSampleRate(0))
        ));
    }

    #[test]
    fn test_encoded_len() {
        assert_eq!(encoded_len(100, 2), 444);
        assert_eq!(encoded_len(0, 1), 44);
    }
}
