// Moteur audio - Callback CPAL temps-réel
//
// # Format Support
//
// Le moteur détecte le format préféré du device (F32, I16, U16) et crée le
// stream approprié. Tout le rendu se fait en f32 ; la conversion vers le
// format du device se fait à l'écriture dans le buffer de sortie via
// `write_stereo_to_interleaved_frame()`.
//
// # Scheduling
//
// Le scheduler (thread timer) pousse des `Voice` dans un ringbuf lock-free.
// Le callback les draine dans son propre `VoiceMixer`, rend le bloc, puis
// avance `AudioTiming`, qui sert d'horloge audio au scheduler.
//
// Note: sur macOS (CoreAudio) le Stream n'est pas Send ; l'engine reste sur
// le thread qui l'a créé.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};

use crate::audio::dsp_utils::{hard_clip, peak_level};
use crate::audio::format_conversion::write_stereo_to_interleaved_frame;
use crate::audio::mixer::VoiceMixer;
use crate::audio::parameters::AtomicF32;
use crate::audio::sink::SoundSink;
use crate::audio::timing::AudioTiming;
use crate::config::SequencerConfig;
use crate::messaging::channels::{
    SharedNotificationProducer, VoiceConsumer, VoiceProducer, create_voice_channel, try_notify,
};
use crate::messaging::notification::{Notification, NotificationCategory};
use crate::synth::voice::Voice;

/// Voices in flight between scheduler and callback
const VOICE_QUEUE_CAPACITY: usize = 1024;

/// Voices the callback mixer holds without reallocating
const MIXER_VOICE_CAPACITY: usize = 256;

/// Scratch block size for the callback (frames)
const CALLBACK_BLOCK: usize = 1024;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("No audio output device found")]
    NoDevice,

    #[error("Audio configuration error: {0}")]
    Config(#[from] cpal::DefaultStreamConfigError),

    #[error("Error in stream creation: {0}")]
    Build(#[from] cpal::BuildStreamError),

    #[error("Error in stream beginning: {0}")]
    Play(#[from] cpal::PlayStreamError),

    #[error("Unsupported sample format: {0}. Supported formats: F32, I16, U16")]
    UnsupportedFormat(String),
}

/// Realtime destination for scheduled voices
pub struct RealtimeSink {
    producer: VoiceProducer,
    sample_rate: f32,
}

impl SoundSink for RealtimeSink {
    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn schedule(&mut self, voice: Voice) {
        if ringbuf::traits::Producer::try_push(&mut self.producer, voice).is_err() {
            log::warn!("Voice queue full, note dropped");
        }
    }
}

pub struct AudioEngine {
    _device: Device,
    _stream: Stream,
    sample_rate: f32,
    timing: AudioTiming,
    sink: Option<RealtimeSink>,
    /// Peak output level of the last callback
    pub output_level: AtomicF32,
}

impl AudioEngine {
    /// Open the default output device and start the stream
    pub fn start(
        config: &SequencerConfig,
        notification_tx: SharedNotificationProducer,
    ) -> Result<Self, EngineError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(EngineError::NoDevice)?;

        log::info!(
            "Audio device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let supported_config = device.default_output_config()?;
        let sample_format = supported_config.sample_format();
        log::debug!("Audio config: {:?}", supported_config);

        let sample_rate = supported_config.sample_rate().0 as f32;
        let channels = supported_config.channels() as usize;
        let stream_config: StreamConfig = supported_config.into();

        let timing = AudioTiming::new(sample_rate);
        let output_level = AtomicF32::new(0.0);
        let (producer, consumer) = create_voice_channel(VOICE_QUEUE_CAPACITY);

        let callback = CallbackState {
            consumer,
            mixer: VoiceMixer::with_capacity(sample_rate, config.master_gain, MIXER_VOICE_CAPACITY),
            timing: timing.clone(),
            output_level: output_level.clone(),
            left: vec![0.0; CALLBACK_BLOCK],
            right: vec![0.0; CALLBACK_BLOCK],
        };

        let stream = match sample_format {
            SampleFormat::F32 => Self::build_stream::<f32>(
                &device,
                &stream_config,
                channels,
                callback,
                notification_tx.clone(),
            ),
            SampleFormat::I16 => Self::build_stream::<i16>(
                &device,
                &stream_config,
                channels,
                callback,
                notification_tx.clone(),
            ),
            SampleFormat::U16 => Self::build_stream::<u16>(
                &device,
                &stream_config,
                channels,
                callback,
                notification_tx.clone(),
            ),
            other => return Err(EngineError::UnsupportedFormat(format!("{:?}", other))),
        }?;

        stream.play()?;

        log::info!("Audio engine started: {} Hz, {} channels", sample_rate, channels);
        try_notify(
            &notification_tx,
            Notification::info(
                NotificationCategory::Audio,
                format!("Audio connected: {} Hz", sample_rate),
            ),
        );

        Ok(Self {
            _device: device,
            _stream: stream,
            sample_rate,
            timing,
            sink: Some(RealtimeSink {
                producer,
                sample_rate,
            }),
            output_level,
        })
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Audio clock advanced by the output callback
    pub fn clock(&self) -> AudioTiming {
        self.timing.clone()
    }

    /// Hand out the voice sink (single producer, so only once)
    pub fn take_sink(&mut self) -> Option<RealtimeSink> {
        self.sink.take()
    }

    fn build_stream<T>(
        device: &Device,
        config: &StreamConfig,
        channels: usize,
        mut callback: CallbackState,
        notification_tx: SharedNotificationProducer,
    ) -> Result<Stream, EngineError>
    where
        T: SizedSample + FromSample<f32> + Send + 'static,
    {
        let stream = device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                // ========== SACRED ZONE ==========
                // No allocations, No I/O, No blocking locks
                callback.process(data, channels);
                // ========== SACRED ZONE END ==========
            },
            move |err| {
                // Hors callback audio : I/O autorisées
                log::error!("Audio stream error: {}", err);
                try_notify(
                    &notification_tx,
                    Notification::error(
                        NotificationCategory::Audio,
                        format!("Audio stream error: {}", err),
                    ),
                );
            },
            None,
        )?;

        Ok(stream)
    }
}

/// Everything the output callback owns
struct CallbackState {
    consumer: VoiceConsumer,
    mixer: VoiceMixer,
    timing: AudioTiming,
    output_level: AtomicF32,
    left: Vec<f32>,
    right: Vec<f32>,
}

impl CallbackState {
    fn process<T>(&mut self, data: &mut [T], channels: usize)
    where
        T: Sample + FromSample<f32>,
    {
        if channels == 0 {
            return;
        }

        // Voices beyond the mixer's reserved room wait in the ring
        while self.mixer.has_room() {
            let Some(voice) = ringbuf::traits::Consumer::try_pop(&mut self.consumer) else {
                break;
            };
            self.mixer.schedule(voice);
        }

        let mut peak = 0.0f32;
        for chunk in data.chunks_mut(CALLBACK_BLOCK * channels) {
            let frames = chunk.len() / channels;
            let left = &mut self.left[..frames];
            let right = &mut self.right[..frames];
            left.fill(0.0);
            right.fill(0.0);

            self.mixer.render(left, right);
            peak = peak.max(peak_level(left)).max(peak_level(right));

            for (i, frame) in chunk.chunks_mut(channels).enumerate() {
                write_stereo_to_interleaved_frame((hard_clip(left[i]), hard_clip(right[i])), frame);
            }
            self.timing.advance(frames);
        }

        self.output_level.set(peak);
    }
}
