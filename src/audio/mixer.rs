// Voice mixer - sums scheduled voices into a stereo output
//
// Used unchanged by the realtime callback and by the offline renderer, so
// live playback and exported audio go through the same gain stage.

use super::dsp_utils::flush_denormals_to_zero;
use super::sink::SoundSink;
use crate::synth::voice::Voice;

struct PendingVoice {
    start_sample: u64,
    voice: Voice,
}

pub struct VoiceMixer {
    sample_rate: f32,
    master_gain: f32,
    /// Absolute frame index of the next frame to render
    position: u64,
    /// Sorted by start sample
    pending: Vec<PendingVoice>,
    active: Vec<PendingVoice>,
    /// Voice limit the buffers were sized for (None = grow freely)
    voice_capacity: Option<usize>,
}

impl VoiceMixer {
    pub fn new(sample_rate: f32, master_gain: f32) -> Self {
        Self {
            sample_rate,
            master_gain,
            position: 0,
            pending: Vec::new(),
            active: Vec::new(),
            voice_capacity: None,
        }
    }

    /// Pre-allocate room for `voices` scheduled voices (realtime use)
    pub fn with_capacity(sample_rate: f32, master_gain: f32, voices: usize) -> Self {
        let mut mixer = Self::new(sample_rate, master_gain);
        mixer.pending.reserve(voices);
        mixer.active.reserve(voices);
        mixer.voice_capacity = Some(voices);
        mixer
    }

    /// Voices scheduled or still sounding
    pub fn voice_count(&self) -> usize {
        self.pending.len() + self.active.len()
    }

    /// Whether one more voice fits without growing the pre-allocated buffers
    pub fn has_room(&self) -> bool {
        self.voice_capacity
            .is_none_or(|capacity| self.voice_count() < capacity)
    }

    /// Render the next block into `left`/`right` (added to their contents).
    ///
    /// Voices whose start time already passed start at the beginning of the
    /// block; nothing scheduled is ever skipped.
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        let frames = left.len().min(right.len());
        let block_start = self.position;
        let block_end = block_start + frames as u64;

        let ready = self
            .pending
            .partition_point(|p| p.start_sample < block_end);
        self.active.extend(self.pending.drain(..ready));

        for pending in &mut self.active {
            let offset = pending.start_sample.saturating_sub(block_start) as usize;
            for i in offset..frames {
                if pending.voice.is_finished() {
                    break;
                }
                let sample = flush_denormals_to_zero(pending.voice.next_sample() * self.master_gain);
                left[i] += sample;
                right[i] += sample;
            }
        }

        self.active.retain(|p| !p.voice.is_finished());
        self.position = block_end;
    }
}

impl SoundSink for VoiceMixer {
    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn schedule(&mut self, voice: Voice) {
        let start_sample = voice.start_sample(self.sample_rate);
        let index = self
            .pending
            .partition_point(|p| p.start_sample <= start_sample);
        self.pending.insert(
            index,
            PendingVoice {
                start_sample,
                voice,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::envelope::ExponentialRamp;
    use crate::synth::oscillator::{SweepOscillator, WaveformType};
    use crate::synth::voice::Generator;

    const SAMPLE_RATE: f32 = 1000.0;

    /// Square wave at 0 Hz = constant 1.0 with a flat gain
    fn dc_voice(start: f64, duration: f64) -> Voice {
        Voice::new(
            start,
            Generator::Tone(SweepOscillator::fixed(WaveformType::Square, 0.0, SAMPLE_RATE)),
            ExponentialRamp::constant(1.0),
            duration,
            SAMPLE_RATE,
        )
    }

    fn render_block(mixer: &mut VoiceMixer, frames: usize) -> (Vec<f32>, Vec<f32>) {
        let mut left = vec![0.0; frames];
        let mut right = vec![0.0; frames];
        mixer.render(&mut left, &mut right);
        (left, right)
    }

    #[test]
    fn test_voice_starts_at_its_sample() {
        let mut mixer = VoiceMixer::new(SAMPLE_RATE, 0.5);
        mixer.schedule(dc_voice(0.010, 0.005));

        let (left, right) = render_block(&mut mixer, 32);
        assert!(left[..10].iter().all(|s| *s == 0.0));
        assert!(left[10..15].iter().all(|s| *s == 0.5));
        assert!(left[15..].iter().all(|s| *s == 0.0));
        assert_eq!(left, right);
        assert_eq!(mixer.voice_count(), 0);
    }

    #[test]
    fn test_voice_spanning_blocks() {
        let mut mixer = VoiceMixer::new(SAMPLE_RATE, 1.0);
        mixer.schedule(dc_voice(0.006, 0.008));

        let (first, _) = render_block(&mut mixer, 10);
        let (second, _) = render_block(&mut mixer, 10);

        assert_eq!(first.iter().filter(|s| **s == 1.0).count(), 4);
        assert_eq!(second.iter().filter(|s| **s == 1.0).count(), 4);
        assert!(second[..4].iter().all(|s| *s == 1.0));
        assert_eq!(mixer.position, 20);
    }

    #[test]
    fn test_late_voice_starts_immediately() {
        let mut mixer = VoiceMixer::new(SAMPLE_RATE, 1.0);
        render_block(&mut mixer, 100);

        mixer.schedule(dc_voice(0.050, 0.003));
        let (left, _) = render_block(&mut mixer, 10);
        assert_eq!(&left[..4], &[1.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_overlapping_voices_sum() {
        let mut mixer = VoiceMixer::new(SAMPLE_RATE, 0.25);
        mixer.schedule(dc_voice(0.0, 0.010));
        mixer.schedule(dc_voice(0.0, 0.010));
        mixer.schedule(dc_voice(0.005, 0.010));

        let (left, _) = render_block(&mut mixer, 20);
        assert_eq!(left[0], 0.5);
        assert_eq!(left[7], 0.75);
        assert_eq!(left[12], 0.25);
        assert_eq!(left[16], 0.0);
    }

    #[test]
    fn test_room_tracks_reserved_voices() {
        let mut mixer = VoiceMixer::with_capacity(SAMPLE_RATE, 1.0, 2);
        assert!(mixer.has_room());
        mixer.schedule(dc_voice(0.0, 0.005));
        mixer.schedule(dc_voice(0.001, 0.005));
        assert!(!mixer.has_room());

        // Finished voices give their slot back
        render_block(&mut mixer, 10);
        assert!(mixer.has_room());
        assert!(VoiceMixer::new(SAMPLE_RATE, 1.0).has_room());
    }

    #[test]
    fn test_out_of_order_scheduling() {
        let mut mixer = VoiceMixer::new(SAMPLE_RATE, 1.0);
        mixer.schedule(dc_voice(0.015, 0.001));
        mixer.schedule(dc_voice(0.002, 0.001));
        assert_eq!(mixer.voice_count(), 2);

        let (left, _) = render_block(&mut mixer, 20);
        assert_eq!(left[2], 1.0);
        assert_eq!(left[15], 1.0);
        assert_eq!(left.iter().filter(|s| **s != 0.0).count(), 2);
    }
}
