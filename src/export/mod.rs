// Audio Export - Offline rendering of the current pattern to a WAV file
//
// Unlike the realtime path this runs as fast as possible. At most one export
// is in flight at a time; a failed export never leaves a partial file.

use crate::audio::offline::{OfflineRenderer, RenderError};
use crate::audio::wav::{self, WavError};
use crate::config::SequencerConfig;
use crate::sequencer::state::SequencerState;
use chrono::{DateTime, Utc};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Audio export format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Wav,
    /// Not encoded yet: exported as WAV
    Mp3,
}

impl ExportFormat {
    /// Format actually written for this request
    pub fn effective(self) -> ExportFormat {
        ExportFormat::Wav
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Wav => "wav",
            ExportFormat::Mp3 => "mp3",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wav" => Ok(ExportFormat::Wav),
            "mp3" => Ok(ExportFormat::Mp3),
            other => Err(format!("Unknown export format '{}' (expected wav or mp3)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportRequest {
    pub format: ExportFormat,
    pub loops: u32,
}

impl ExportRequest {
    pub fn new(format: ExportFormat, loops: u32) -> Self {
        Self { format, loops }
    }
}

impl Default for ExportRequest {
    fn default() -> Self {
        Self::new(ExportFormat::Wav, 1)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("An export is already in progress")]
    AlreadyInProgress,

    #[error("Loop count {loops} out of range (1..={max})")]
    InvalidLoopCount { loops: u32, max: u32 },

    #[error("Render failed: {0}")]
    Render(#[from] RenderError),

    #[error("Encoding failed: {0}")]
    Encode(#[from] WavError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Finished export, ready to be written or handed to the user
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    /// `beat-<unix epoch millis>.wav`
    pub fn file_name_at(timestamp: DateTime<Utc>) -> String {
        format!("beat-{}.wav", timestamp.timestamp_millis())
    }

    /// Write into `dir`, creating it if needed.
    /// The final name only appears once every byte is on disk.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        let part_path = dir.join(format!("{}.part", self.file_name));

        if let Err(e) = fs::write(&part_path, &self.bytes).and_then(|()| fs::rename(&part_path, &path)) {
            let _ = fs::remove_file(&part_path);
            return Err(e.into());
        }

        log::info!("Exported {} ({} bytes)", path.display(), self.bytes.len());
        Ok(path)
    }
}

/// Clears the in-flight flag however the export ends
struct InFlightGuard {
    flag: Arc<AtomicBool>,
}

impl InFlightGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                flag: Arc::clone(flag),
            })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Single-flight exporter. Clones share the in-flight flag.
#[derive(Debug, Clone)]
pub struct Exporter {
    sample_rate: u32,
    master_gain: f32,
    max_loops: u32,
    in_flight: Arc<AtomicBool>,
}

impl Exporter {
    pub fn new(sample_rate: u32, config: &SequencerConfig) -> Self {
        Self {
            sample_rate,
            master_gain: config.master_gain,
            max_loops: config.max_loops,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Render `request.loops` loops of `state` and encode them
    pub fn export(
        &self,
        state: &SequencerState,
        request: ExportRequest,
    ) -> Result<ExportArtifact, ExportError> {
        let _guard = InFlightGuard::acquire(&self.in_flight).ok_or(ExportError::AlreadyInProgress)?;

        if request.loops == 0 || request.loops > self.max_loops {
            return Err(ExportError::InvalidLoopCount {
                loops: request.loops,
                max: self.max_loops,
            });
        }

        if request.format != request.format.effective() {
            log::warn!(
                "{} export is not supported yet, exporting as {}",
                request.format,
                request.format.effective()
            );
        }

        let buffer = OfflineRenderer::new(self.sample_rate, self.master_gain).render(state, request.loops)?;
        let bytes = wav::encode_wav(&buffer)?;

        Ok(ExportArtifact {
            file_name: ExportArtifact::file_name_at(Utc::now()),
            mime_type: wav::MIME_TYPE,
            bytes,
        })
    }
}
