// Audio buffers - planar floating-point sample storage

/// Planar multi-channel audio (one Vec per channel, equal lengths)
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl AudioBuffer {
    /// Silent buffer of `frames` frames
    pub fn new(channel_count: usize, frames: usize, sample_rate: u32) -> Self {
        Self {
            channels: vec![vec![0.0; frames]; channel_count],
            sample_rate,
        }
    }

    /// Build from planar channel data; `None` if channel lengths differ
    pub fn from_channels(channels: Vec<Vec<f32>>, sample_rate: u32) -> Option<Self> {
        let frames = channels.first().map_or(0, Vec::len);
        if channels.iter().any(|c| c.len() != frames) {
            return None;
        }
        Some(Self {
            channels,
            sample_rate,
        })
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    pub fn channels_mut(&mut self) -> &mut [Vec<f32>] {
        &mut self.channels
    }

    /// Samples in frame order: frame0-ch0, frame0-ch1, frame1-ch0, ...
    pub fn interleaved(&self) -> impl Iterator<Item = f32> + '_ {
        (0..self.frames()).flat_map(move |frame| self.channels.iter().map(move |c| c[frame]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_buffer_is_silent() {
        let buffer = AudioBuffer::new(2, 100, 48000);
        assert_eq!(buffer.channel_count(), 2);
        assert_eq!(buffer.frames(), 100);
        assert!(buffer.interleaved().all(|s| s == 0.0));
    }

    #[test]
    fn test_interleaved_order() {
        let buffer =
            AudioBuffer::from_channels(vec![vec![1.0, 2.0, 3.0], vec![-1.0, -2.0, -3.0]], 8000)
                .unwrap();
        let samples: Vec<f32> = buffer.interleaved().collect();
        assert_eq!(samples, vec![1.0, -1.0, 2.0, -2.0, 3.0, -3.0]);
    }

    #[test]
    fn test_ragged_channels_rejected() {
        assert!(AudioBuffer::from_channels(vec![vec![0.0; 3], vec![0.0; 2]], 8000).is_none());
    }

    #[test]
    fn test_duration() {
        let buffer = AudioBuffer::new(2, 22050, 44100);
        assert_eq!(buffer.duration_seconds(), 0.5);
    }
}
