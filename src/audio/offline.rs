// Offline rendering - non-realtime render of N loops into a buffer
//
// Unlike the realtime path, nothing here is gated on a wall clock: every
// note of every loop is submitted up front at its exact time, then a single
// render pass produces the finished buffer as fast as possible.

use super::buffer::AudioBuffer;
use super::mixer::VoiceMixer;
use crate::sequencer::state::SequencerState;

/// Output is always stereo
pub const RENDER_CHANNELS: usize = 2;

/// Accepted sample rates (Hz)
pub const MIN_SAMPLE_RATE: u32 = 3000;
pub const MAX_SAMPLE_RATE: u32 = 768_000;

/// Upper bound on rendered frames: 1 GiB of planar f32, so an oversized
/// request is refused before anything is allocated
pub const MAX_RENDER_FRAMES: u64 = (1 << 30) / (RENDER_CHANNELS as u64 * 4);

/// Frames processed per render iteration
const RENDER_BLOCK: usize = 512;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    #[error("Invalid sample rate {0} Hz (expected 3000..=768000)")]
    InvalidSampleRate(u32),

    #[error("Loop count must be at least 1")]
    InvalidLoopCount,

    #[error("Render of {frames} frames exceeds the {} frame limit", MAX_RENDER_FRAMES)]
    BufferTooLarge { frames: u64 },
}

/// Timing summary of a render request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderPlan {
    pub seconds_per_step: f64,
    pub loop_duration_seconds: f64,
    pub total_duration_seconds: f64,
    pub total_frames: u64,
}

impl RenderPlan {
    pub fn new(state: &SequencerState, loops: u32, sample_rate: u32) -> Self {
        let tempo = state.tempo();
        let seconds_per_step = tempo.seconds_per_step();
        let loop_duration_seconds = tempo.loop_duration_seconds(state.grid().step_count());
        let total_duration_seconds = loop_duration_seconds * loops as f64;

        Self {
            seconds_per_step,
            loop_duration_seconds,
            total_duration_seconds,
            total_frames: (total_duration_seconds * sample_rate as f64).ceil() as u64,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OfflineRenderer {
    sample_rate: u32,
    master_gain: f32,
}

impl OfflineRenderer {
    pub fn new(sample_rate: u32, master_gain: f32) -> Self {
        Self {
            sample_rate,
            master_gain,
        }
    }

    /// Render `loops` repetitions of the pattern in `state`
    pub fn render(&self, state: &SequencerState, loops: u32) -> Result<AudioBuffer, RenderError> {
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&self.sample_rate) {
            return Err(RenderError::InvalidSampleRate(self.sample_rate));
        }
        if loops == 0 {
            return Err(RenderError::InvalidLoopCount);
        }

        let plan = RenderPlan::new(state, loops, self.sample_rate);
        if plan.total_frames > MAX_RENDER_FRAMES {
            return Err(RenderError::BufferTooLarge {
                frames: plan.total_frames,
            });
        }

        log::info!(
            "Offline render: {} loops x {} steps at {} -> {:.3}s ({} frames @ {} Hz)",
            loops,
            state.grid().step_count(),
            state.tempo(),
            plan.total_duration_seconds,
            plan.total_frames,
            self.sample_rate
        );

        // One mixer = one master gain stage for the whole session
        let mut mixer = VoiceMixer::new(self.sample_rate as f32, self.master_gain);
        let step_count = state.grid().step_count();
        let tempo = state.tempo();

        let mut events = 0usize;
        let mut noisy = false;
        for loop_index in 0..loops {
            for step in 0..step_count.len() {
                let time = tempo.step_offset_seconds(step_count, loop_index, step);
                for instrument in state.grid().active_at(step) {
                    instrument.render(time, &mut mixer);
                    noisy |= instrument.uses_noise();
                    events += 1;
                }
            }
        }
        log::debug!(
            "Submitted {} note events ({})",
            events,
            if noisy { "noise voices, output varies per render" } else { "deterministic" }
        );

        let frames = plan.total_frames as usize;
        let mut buffer = AudioBuffer::new(RENDER_CHANNELS, frames, self.sample_rate);
        {
            let channels = buffer.channels_mut();
            let (left, right) = channels.split_at_mut(1);
            let (left, right) = (&mut left[0], &mut right[0]);

            let mut offset = 0;
            while offset < frames {
                let end = (offset + RENDER_BLOCK).min(frames);
                mixer.render(&mut left[offset..end], &mut right[offset..end]);
                offset = end;
            }
        }

        Ok(buffer)
    }
}
