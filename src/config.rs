// Sequencer configuration - timing constants, control bounds and paths
//
// Every value here has a sensible default; a RON file can override any
// subset of them (missing fields keep their defaults).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Highest loop count an export control may offer
pub const MAX_LOOPS_LIMIT: u32 = 64;

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    /// Period of the coarse scheduling timer (milliseconds)
    pub look_ahead_interval_ms: u64,
    /// How far ahead of the audio clock notes are scheduled (seconds)
    pub schedule_ahead_secs: f64,
    /// Lead applied to the first step when playback starts (seconds)
    pub start_delay_secs: f64,
    /// Tempo slider bounds (inclusive)
    pub min_tempo: u32,
    pub max_tempo: u32,
    /// Upper bound of the export loop count control
    pub max_loops: u32,
    /// Master gain applied once per mixer session
    pub master_gain: f32,
    /// Sample rate used for offline rendering when no device is running
    pub fallback_sample_rate: u32,
    /// Directory exported files are written to (None = current directory)
    pub export_dir: Option<PathBuf>,
    /// Key-value store file (None = platform data directory)
    pub store_path: Option<PathBuf>,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            look_ahead_interval_ms: 25,
            schedule_ahead_secs: 0.1,
            start_delay_secs: 0.05,
            min_tempo: 60,
            max_tempo: 200,
            max_loops: 16,
            master_gain: 0.8,
            fallback_sample_rate: 44100,
            export_dir: None,
            store_path: None,
        }
    }
}

impl SequencerConfig {
    /// Load a configuration from a RON file and validate it
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: SequencerConfig = ron::from_str(&text)?;
        config.validate()?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load a configuration if the file exists, otherwise use defaults
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            log::debug!("No configuration at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.look_ahead_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "look_ahead_interval_ms must be > 0".to_string(),
            ));
        }

        if !(self.schedule_ahead_secs > 0.0) {
            return Err(ConfigError::Invalid(
                "schedule_ahead_secs must be > 0".to_string(),
            ));
        }

        // Window must cover at least one timer period
        if self.look_ahead_interval().as_secs_f64() >= self.schedule_ahead_secs {
            return Err(ConfigError::Invalid(
                "look_ahead_interval_ms must be shorter than schedule_ahead_secs".to_string(),
            ));
        }

        if !(self.start_delay_secs >= 0.0) {
            return Err(ConfigError::Invalid(
                "start_delay_secs must be >= 0".to_string(),
            ));
        }

        if self.min_tempo == 0 || self.min_tempo > self.max_tempo {
            return Err(ConfigError::Invalid(format!(
                "Tempo bounds must satisfy 0 < min ({}) <= max ({})",
                self.min_tempo, self.max_tempo
            )));
        }

        if self.max_loops == 0 || self.max_loops > MAX_LOOPS_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "max_loops must be in 1..={} (got {})",
                MAX_LOOPS_LIMIT, self.max_loops
            )));
        }

        if !(self.master_gain > 0.0 && self.master_gain.is_finite()) {
            return Err(ConfigError::Invalid(
                "master_gain must be a positive number".to_string(),
            ));
        }

        if self.fallback_sample_rate == 0 {
            return Err(ConfigError::Invalid(
                "fallback_sample_rate must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn look_ahead_interval(&self) -> Duration {
        Duration::from_millis(self.look_ahead_interval_ms)
    }

    /// Resolve the export directory
    pub fn export_dir(&self) -> PathBuf {
        self.export_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Resolve the store file, falling back to the platform data directory
    pub fn store_path(&self) -> PathBuf {
        if let Some(path) = &self.store_path {
            return path.clone();
        }

        dirs::data_dir()
            .map(|dir| dir.join("beat_sequencer"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("storage.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = SequencerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.look_ahead_interval(), Duration::from_millis(25));
        assert_eq!(config.schedule_ahead_secs, 0.1);
    }

    #[test]
    fn test_interval_must_be_shorter_than_window() {
        let config = SequencerConfig {
            look_ahead_interval_ms: 100,
            schedule_ahead_secs: 0.1,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_tempo_bounds_validation() {
        let config = SequencerConfig {
            min_tempo: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SequencerConfig {
            min_tempo: 150,
            max_tempo: 100,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_loops_bounded() {
        for max_loops in [0, MAX_LOOPS_LIMIT + 1, u32::MAX] {
            let config = SequencerConfig {
                max_loops,
                ..Default::default()
            };
            assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        }

        let config = SequencerConfig {
            max_loops: MAX_LOOPS_LIMIT,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_ron_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "(max_loops: 4, master_gain: 0.5)").unwrap();

        let config = SequencerConfig::load(file.path()).unwrap();
        assert_eq!(config.max_loops, 4);
        assert_eq!(config.master_gain, 0.5);
        // Untouched fields keep their defaults
        assert_eq!(config.look_ahead_interval_ms, 25);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = SequencerConfig::load_or_default(&dir.path().join("missing.ron")).unwrap();
        assert_eq!(config, SequencerConfig::default());
    }
}
